//! 提交存储操作

use super::SeaOrmStorage;
use super::homeworks::apply_status_change;
use crate::entity::submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{HWSystemError, Result};
use crate::models::submissions::{
    entities::{HomeworkStatusChange, Submission, SubmissionCounts, SubmissionStatus},
    requests::{NewSubmission, ReviewUpdate},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建提交
    ///
    /// (homework_id, student_id) 的唯一索引保证并发提交只有一份成功。
    pub async fn create_submission_impl(
        &self,
        submission: NewSubmission,
        status_change: Option<HomeworkStatusChange>,
    ) -> Result<Submission> {
        let answers = serde_json::to_string(&submission.answers)?;
        let homework_id = submission.homework_id;
        let student_id = submission.student_id;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ActiveModel {
            homework_id: Set(homework_id),
            student_id: Set(student_id),
            answers: Set(answers),
            status: Set(SubmissionStatus::Pending.as_str().to_string()),
            teacher_comment: Set(None),
            submitted_at: Set(submission.submitted_at.timestamp()),
            reviewed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                HWSystemError::already_submitted(format!(
                    "学生 {student_id} 已提交过作业 {homework_id}"
                ))
            } else {
                HWSystemError::database_operation(format!("创建提交失败: {e}"))
            }
        })?;

        if let Some(change) = status_change {
            apply_status_change(&txn, &change).await?;
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        model.into_submission()
    }

    pub async fn get_submission_by_id_impl(&self, submission_id: i64) -> Result<Option<Submission>> {
        let result = Submissions::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

        result.map(|m| m.into_submission()).transpose()
    }

    pub async fn get_submission_for_impl(
        &self,
        homework_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        let result = Submissions::find()
            .filter(Column::HomeworkId.eq(homework_id))
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

        result.map(|m| m.into_submission()).transpose()
    }

    pub async fn list_submissions_by_homework_impl(
        &self,
        homework_id: i64,
    ) -> Result<Vec<Submission>> {
        let models = Submissions::find()
            .filter(Column::HomeworkId.eq(homework_id))
            .order_by_asc(Column::SubmittedAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交列表失败: {e}")))?;

        models.into_iter().map(|m| m.into_submission()).collect()
    }

    pub async fn list_submissions_by_student_impl(
        &self,
        student_id: i64,
    ) -> Result<Vec<Submission>> {
        let models = Submissions::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_desc(Column::SubmittedAt)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交列表失败: {e}")))?;

        models.into_iter().map(|m| m.into_submission()).collect()
    }

    /// 统计提交数与已批改数
    pub async fn count_submissions_impl(&self, homework_id: i64) -> Result<SubmissionCounts> {
        let submitted = Submissions::find()
            .filter(Column::HomeworkId.eq(homework_id))
            .count(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计提交失败: {e}")))?;

        let reviewed = Submissions::find()
            .filter(Column::HomeworkId.eq(homework_id))
            .filter(Column::Status.ne(SubmissionStatus::Pending.as_str()))
            .count(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计提交失败: {e}")))?;

        Ok(SubmissionCounts {
            submitted: submitted as i64,
            reviewed: reviewed as i64,
        })
    }

    /// 保存批改结果
    pub async fn save_review_impl(
        &self,
        submission_id: i64,
        review: ReviewUpdate,
        status_change: Option<HomeworkStatusChange>,
    ) -> Result<Submission> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = Submissions::find_by_id(submission_id)
            .one(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found(format!("提交 {submission_id} 不存在")))?;

        let mut model = existing.into_active_model();
        model.status = Set(SubmissionStatus::from(review.decision).as_str().to_string());
        if review.comment.is_some() {
            model.teacher_comment = Set(review.comment);
        }
        model.reviewed_at = Set(Some(review.reviewed_at.timestamp()));

        let updated = model
            .update(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("保存批改失败: {e}")))?;

        if let Some(change) = status_change {
            apply_status_change(&txn, &change).await?;
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        updated.into_submission()
    }
}
