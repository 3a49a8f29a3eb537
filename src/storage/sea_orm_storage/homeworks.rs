//! 作业存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::homework_students::{
    ActiveModel as HomeworkStudentActiveModel, Column as HomeworkStudentColumn,
    Entity as HomeworkStudents,
};
use crate::entity::homeworks::{ActiveModel, Column, Entity as Homeworks, Model};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::errors::{HWSystemError, Result};
use crate::models::{
    homeworks::{
        entities::{AssignmentType, Homework, HomeworkStatus},
        requests::HomeworkDraft,
    },
    submissions::entities::HomeworkStatusChange,
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

/// 读取单独布置作业的接收学生
async fn load_student_ids<C: ConnectionTrait>(
    conn: &C,
    homework_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>> {
    let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
    if homework_ids.is_empty() {
        return Ok(map);
    }

    let rows = HomeworkStudents::find()
        .filter(HomeworkStudentColumn::HomeworkId.is_in(homework_ids.iter().copied()))
        .order_by_asc(HomeworkStudentColumn::StudentId)
        .all(conn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("查询作业对象失败: {e}")))?;

    for row in rows {
        map.entry(row.homework_id).or_default().push(row.student_id);
    }
    Ok(map)
}

async fn into_homeworks<C: ConnectionTrait>(conn: &C, models: Vec<Model>) -> Result<Vec<Homework>> {
    let ids: Vec<i64> = models
        .iter()
        .filter(|m| m.assignment_type == AssignmentType::Individual.as_str())
        .map(|m| m.id)
        .collect();
    let mut audiences = load_student_ids(conn, &ids).await?;

    models
        .into_iter()
        .map(|m| {
            let student_ids = audiences.remove(&m.id).unwrap_or_default();
            m.into_homework(student_ids)
        })
        .collect()
}

/// 写入单独布置作业的接收学生
async fn insert_audience_rows<C: ConnectionTrait>(
    conn: &C,
    homework_id: i64,
    student_ids: &[i64],
) -> Result<()> {
    for student_id in student_ids {
        HomeworkStudentActiveModel {
            homework_id: Set(homework_id),
            student_id: Set(*student_id),
        }
        .insert(conn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("写入作业对象失败: {e}")))?;
    }
    Ok(())
}

async fn ensure_no_submissions<C: ConnectionTrait>(conn: &C, homework_id: i64) -> Result<()> {
    let count = Submissions::find()
        .filter(SubmissionColumn::HomeworkId.eq(homework_id))
        .count(conn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("统计提交失败: {e}")))?;

    if count > 0 {
        return Err(HWSystemError::homework_locked(format!(
            "作业 {homework_id} 已有 {count} 份提交，不能再修改小题、类别、对象或截止时间"
        )));
    }
    Ok(())
}

/// 回写作业状态
pub(super) async fn apply_status_change<C: ConnectionTrait>(
    conn: &C,
    change: &HomeworkStatusChange,
) -> Result<()> {
    Homeworks::update_many()
        .col_expr(Column::Status, Expr::value(change.status.as_str()))
        .col_expr(
            Column::ReviewOutcome,
            Expr::value(change.review_outcome.map(|d| d.as_str().to_string())),
        )
        .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().timestamp()))
        .filter(Column::Id.eq(change.homework_id))
        .exec(conn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("更新作业状态失败: {e}")))?;
    Ok(())
}

impl SeaOrmStorage {
    /// 创建作业
    pub async fn create_homework_impl(
        &self,
        teacher_id: i64,
        draft: HomeworkDraft,
    ) -> Result<Homework> {
        let now = chrono::Utc::now().timestamp();
        let assignments = serde_json::to_string(&draft.assignments)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let model = ActiveModel {
            teacher_id: Set(teacher_id),
            description: Set(draft.description),
            deadline: Set(draft.deadline.map(|dt| dt.timestamp())),
            category: Set(draft.category.to_string()),
            link: Set(draft.link),
            assignment_type: Set(draft.audience.assignment_type().as_str().to_string()),
            group_id: Set(draft.audience.group_id()),
            assignments: Set(assignments),
            status: Set(HomeworkStatus::New.as_str().to_string()),
            review_outcome: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("创建作业失败: {e}")))?;

        let student_ids = draft.audience.student_ids().to_vec();
        insert_audience_rows(&txn, model.id, &student_ids).await?;

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        model.into_homework(student_ids)
    }

    /// 通过 ID 获取作业
    pub async fn get_homework_by_id_impl(&self, homework_id: i64) -> Result<Option<Homework>> {
        let result = Homeworks::find_by_id(homework_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业失败: {e}")))?;

        match result {
            Some(model) => Ok(into_homeworks(&self.db, vec![model]).await?.pop()),
            None => Ok(None),
        }
    }

    /// 教师布置的作业，新的在前
    pub async fn list_homeworks_by_teacher_impl(&self, teacher_id: i64) -> Result<Vec<Homework>> {
        let models = Homeworks::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业列表失败: {e}")))?;

        into_homeworks(&self.db, models).await
    }

    /// 学生可见的作业，新的在前
    pub async fn list_homeworks_for_student_impl(
        &self,
        student_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<Homework>> {
        let individual_ids: Vec<i64> = HomeworkStudents::find()
            .select_only()
            .column(HomeworkStudentColumn::HomeworkId)
            .filter(HomeworkStudentColumn::StudentId.eq(student_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业对象失败: {e}")))?;

        let mut condition = Condition::any().add(Column::Id.is_in(individual_ids));
        if let Some(group_id) = group_id {
            condition = condition.add(
                Condition::all()
                    .add(Column::AssignmentType.eq(AssignmentType::Group.as_str()))
                    .add(Column::GroupId.eq(group_id)),
            );
        }

        let models = Homeworks::find()
            .filter(condition)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业列表失败: {e}")))?;

        into_homeworks(&self.db, models).await
    }

    /// 更新作业
    pub async fn update_homework_impl(
        &self,
        homework_id: i64,
        draft: HomeworkDraft,
        structural: bool,
    ) -> Result<Homework> {
        let assignments = serde_json::to_string(&draft.assignments)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = Homeworks::find_by_id(homework_id)
            .one(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询作业失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found(format!("作业 {homework_id} 不存在")))?;

        let mut model = existing.into_active_model();
        model.description = Set(draft.description);
        model.link = Set(draft.link);

        if structural {
            // 写入前在事务内再次确认没有提交
            ensure_no_submissions(&txn, homework_id).await?;

            model.deadline = Set(draft.deadline.map(|dt| dt.timestamp()));
            model.category = Set(draft.category.to_string());
            model.assignment_type = Set(draft.audience.assignment_type().as_str().to_string());
            model.group_id = Set(draft.audience.group_id());
            model.assignments = Set(assignments);

            HomeworkStudents::delete_many()
                .filter(HomeworkStudentColumn::HomeworkId.eq(homework_id))
                .exec(&txn)
                .await
                .map_err(|e| HWSystemError::database_operation(format!("清理作业对象失败: {e}")))?;
            insert_audience_rows(&txn, homework_id, draft.audience.student_ids()).await?;
        }

        model.updated_at = Set(chrono::Utc::now().timestamp());
        let updated = model
            .update(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新作业失败: {e}")))?;

        let homework = into_homeworks(&txn, vec![updated]).await?.pop();

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        homework.ok_or_else(|| HWSystemError::not_found(format!("作业 {homework_id} 不存在")))
    }

    /// 删除作业
    pub async fn delete_homework_impl(&self, homework_id: i64) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        ensure_no_submissions(&txn, homework_id).await?;

        HomeworkStudents::delete_many()
            .filter(HomeworkStudentColumn::HomeworkId.eq(homework_id))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("清理作业对象失败: {e}")))?;

        let result = Homeworks::delete_by_id(homework_id)
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除作业失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(HWSystemError::not_found(format!("作业 {homework_id} 不存在")));
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }
}
