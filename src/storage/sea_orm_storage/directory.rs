//! 小组与学生存储操作

use super::SeaOrmStorage;
use super::homeworks::apply_status_change;
use crate::entity::groups::{ActiveModel as GroupActiveModel, Column as GroupColumn, Entity as Groups};
use crate::entity::homework_students::{Column as HomeworkStudentColumn, Entity as HomeworkStudents};
use crate::entity::homeworks::{Column as HomeworkColumn, Entity as Homeworks};
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::entity::submissions::{Column as SubmissionColumn, Entity as Submissions};
use crate::entity::uploads::{Column as UploadColumn, Entity as Uploads};
use crate::entity::users::{
    ActiveModel as UserActiveModel, Column as UserColumn, Entity as Users,
};
use crate::errors::{HWSystemError, Result};
use crate::models::{
    directory::{
        entities::{Group, GroupSchedule, Student},
        requests::{NewStudent, StudentUpdate},
    },
    homeworks::entities::{Assignment, AssignmentType, HomeworkStatus},
    submissions::entities::{Answer, HomeworkStatusChange},
    users::entities::{User, UserRole},
};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

fn unique_username_error(e: sea_orm::DbErr, username: &str, action: &str) -> HWSystemError {
    if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        HWSystemError::invalid_field("username", format!("'{username}' 已被占用"))
    } else {
        HWSystemError::database_operation(format!("{action}失败: {e}"))
    }
}

/// 指定作业的提交中引用的答案文件路径
async fn answer_file_paths<C: ConnectionTrait>(
    conn: &C,
    homework_ids: &[i64],
) -> Result<Vec<String>> {
    let rows: Vec<String> = Submissions::find()
        .select_only()
        .column(SubmissionColumn::Answers)
        .filter(SubmissionColumn::HomeworkId.is_in(homework_ids.iter().copied()))
        .into_tuple()
        .all(conn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("查询提交失败: {e}")))?;

    let mut paths = Vec::new();
    for raw in rows {
        let answers: Vec<Answer> = serde_json::from_str(&raw)?;
        paths.extend(
            answers
                .into_iter()
                .filter_map(|a| a.file_reference)
                .map(|f| f.storage_path),
        );
    }
    Ok(paths)
}

impl SeaOrmStorage {
    /// 创建小组
    pub async fn create_group_impl(
        &self,
        teacher_id: i64,
        name: &str,
        schedule: GroupSchedule,
    ) -> Result<Group> {
        let now = chrono::Utc::now().timestamp();
        let days_of_week = serde_json::to_string(&schedule.days_of_week)?;

        let model = GroupActiveModel {
            teacher_id: Set(teacher_id),
            name: Set(name.to_string()),
            start_time: Set(schedule.start_time),
            end_time: Set(schedule.end_time),
            days_of_week: Set(days_of_week),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建小组失败: {e}")))?;

        result.into_group()
    }

    pub async fn get_group_by_id_impl(&self, group_id: i64) -> Result<Option<Group>> {
        let result = Groups::find_by_id(group_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询小组失败: {e}")))?;

        result.map(|m| m.into_group()).transpose()
    }

    pub async fn list_groups_by_teacher_impl(&self, teacher_id: i64) -> Result<Vec<Group>> {
        let groups = Groups::find()
            .filter(GroupColumn::TeacherId.eq(teacher_id))
            .order_by_asc(GroupColumn::Name)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询小组列表失败: {e}")))?;

        groups.into_iter().map(|m| m.into_group()).collect()
    }

    /// 更新小组名称与上课时间
    pub async fn update_group_impl(
        &self,
        group_id: i64,
        name: &str,
        schedule: GroupSchedule,
    ) -> Result<Group> {
        let existing = Groups::find_by_id(group_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询小组失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found(format!("小组 {group_id} 不存在")))?;

        let mut model = existing.into_active_model();
        model.name = Set(name.to_string());
        model.start_time = Set(schedule.start_time);
        model.end_time = Set(schedule.end_time);
        model.days_of_week = Set(serde_json::to_string(&schedule.days_of_week)?);
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新小组失败: {e}")))?;

        result.into_group()
    }

    /// 删除小组
    ///
    /// 成员移出小组，布置给该小组的作业连同提交一起删除。返回待清理的文件路径。
    pub async fn delete_group_impl(&self, group_id: i64) -> Result<Vec<String>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let homeworks: Vec<(i64, String)> = Homeworks::find()
            .select_only()
            .column(HomeworkColumn::Id)
            .column(HomeworkColumn::Assignments)
            .filter(HomeworkColumn::AssignmentType.eq(AssignmentType::Group.as_str()))
            .filter(HomeworkColumn::GroupId.eq(group_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询小组作业失败: {e}")))?;

        let homework_ids: Vec<i64> = homeworks.iter().map(|(id, _)| *id).collect();
        let mut paths = Vec::new();
        for (_, raw) in &homeworks {
            let assignments: Vec<Assignment> = serde_json::from_str(raw)?;
            paths.extend(
                assignments
                    .into_iter()
                    .flat_map(|a| a.images)
                    .map(|image| image.storage_path),
            );
        }
        paths.extend(answer_file_paths(&txn, &homework_ids).await?);

        Submissions::delete_many()
            .filter(SubmissionColumn::HomeworkId.is_in(homework_ids.iter().copied()))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除小组作业提交失败: {e}")))?;

        HomeworkStudents::delete_many()
            .filter(HomeworkStudentColumn::HomeworkId.is_in(homework_ids.iter().copied()))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("清理作业对象失败: {e}")))?;

        Homeworks::delete_many()
            .filter(HomeworkColumn::Id.is_in(homework_ids.iter().copied()))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除小组作业失败: {e}")))?;

        Students::update_many()
            .col_expr(Column::GroupId, Expr::value(Option::<i64>::None))
            .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().timestamp()))
            .filter(Column::GroupId.eq(group_id))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("移出小组成员失败: {e}")))?;

        let result = Groups::delete_by_id(group_id)
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除小组失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(HWSystemError::not_found(format!("小组 {group_id} 不存在")));
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(paths)
    }

    /// 创建学生与登录账号
    pub async fn create_student_impl(
        &self,
        teacher_id: i64,
        req: NewStudent,
    ) -> Result<(Student, User)> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let student = ActiveModel {
            teacher_id: Set(teacher_id),
            group_id: Set(req.group_id),
            full_name: Set(req.full_name.clone()),
            phone: Set(req.phone),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("创建学生失败: {e}")))?;

        let user = UserActiveModel {
            username: Set(req.username.clone()),
            password_hash: Set(req.password_hash),
            role: Set(UserRole::Student.to_string()),
            student_id: Set(Some(student.id)),
            full_name: Set(req.full_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| unique_username_error(e, &req.username, "创建学生账号"))?;

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok((student.into_student(), user.into_user()?))
    }

    pub async fn get_student_by_id_impl(&self, student_id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    pub async fn get_students_by_ids_impl(&self, student_ids: &[i64]) -> Result<Vec<Student>> {
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let students = Students::find()
            .filter(Column::Id.is_in(student_ids.iter().copied()))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    pub async fn list_students_by_teacher_impl(&self, teacher_id: i64) -> Result<Vec<Student>> {
        let students = Students::find()
            .filter(Column::TeacherId.eq(teacher_id))
            .order_by_asc(Column::FullName)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    pub async fn list_students_by_group_impl(&self, group_id: i64) -> Result<Vec<Student>> {
        let students = Students::find()
            .filter(Column::GroupId.eq(group_id))
            .order_by_asc(Column::FullName)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询小组成员失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    pub async fn count_students_in_group_impl(&self, group_id: i64) -> Result<u64> {
        Students::find()
            .filter(Column::GroupId.eq(group_id))
            .count(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计小组成员失败: {e}")))
    }

    /// 调整学生所在小组
    pub async fn set_student_group_impl(
        &self,
        student_id: i64,
        group_id: Option<i64>,
    ) -> Result<Student> {
        let existing = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found(format!("学生 {student_id} 不存在")))?;

        let mut model = existing.into_active_model();
        model.group_id = Set(group_id);
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新学生失败: {e}")))?;

        Ok(result.into_student())
    }

    /// 更新学生档案，同步登录账号的姓名、用户名与密码
    pub async fn update_student_impl(
        &self,
        student_id: i64,
        update: StudentUpdate,
    ) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = Students::find_by_id(student_id)
            .one(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生失败: {e}")))?
            .ok_or_else(|| HWSystemError::not_found(format!("学生 {student_id} 不存在")))?;

        let mut model = existing.into_active_model();
        model.full_name = Set(update.full_name.clone());
        model.phone = Set(update.phone);
        model.updated_at = Set(now);
        let student = model
            .update(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新学生失败: {e}")))?;

        let account = Users::find()
            .filter(UserColumn::StudentId.eq(student_id))
            .one(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生账号失败: {e}")))?;

        if let Some(account) = account {
            let mut account = account.into_active_model();
            account.full_name = Set(update.full_name);
            if let Some(username) = &update.username {
                account.username = Set(username.clone());
            }
            if let Some(password_hash) = update.password_hash {
                account.password_hash = Set(password_hash);
            }
            account.updated_at = Set(now);

            let username = update.username.unwrap_or_default();
            account
                .update(&txn)
                .await
                .map_err(|e| unique_username_error(e, &username, "更新学生账号"))?;
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(student.into_student())
    }

    /// 删除学生，返回其上传文件的存储路径
    pub async fn delete_student_impl(&self, student_id: i64) -> Result<Vec<String>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let user_ids: Vec<i64> = Users::find()
            .select_only()
            .column(UserColumn::Id)
            .filter(UserColumn::StudentId.eq(student_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生账号失败: {e}")))?;

        let paths: Vec<String> = Uploads::find()
            .select_only()
            .column(UploadColumn::StoragePath)
            .filter(UploadColumn::UploaderId.is_in(user_ids.iter().copied()))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询上传记录失败: {e}")))?;

        let submitted_homework_ids: Vec<i64> = Submissions::find()
            .select_only()
            .column(SubmissionColumn::HomeworkId)
            .filter(SubmissionColumn::StudentId.eq(student_id))
            .into_tuple()
            .all(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询学生提交失败: {e}")))?;

        Submissions::delete_many()
            .filter(SubmissionColumn::StudentId.eq(student_id))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除学生提交失败: {e}")))?;

        // 状态只跟踪单人作业，提交删除后回到未提交
        for homework_id in submitted_homework_ids {
            let change = HomeworkStatusChange {
                homework_id,
                status: HomeworkStatus::New,
                review_outcome: None,
            };
            apply_status_change(&txn, &change).await?;
        }

        HomeworkStudents::delete_many()
            .filter(HomeworkStudentColumn::StudentId.eq(student_id))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除作业对象失败: {e}")))?;

        Uploads::delete_many()
            .filter(UploadColumn::UploaderId.is_in(user_ids.iter().copied()))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除上传记录失败: {e}")))?;

        Users::delete_many()
            .filter(UserColumn::StudentId.eq(student_id))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除学生账号失败: {e}")))?;

        let result = Students::delete_by_id(student_id)
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除学生失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(HWSystemError::not_found(format!("学生 {student_id} 不存在")));
        }

        txn.commit()
            .await
            .map_err(|e| HWSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(paths)
    }
}
