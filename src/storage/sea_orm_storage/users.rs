use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{HWSystemError, Result};
use crate::models::users::{
    entities::{User, UserRole},
    requests::CreateUserRequest,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set, SqlErr,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            username: Set(req.username.clone()),
            password_hash: Set(req.password_hash),
            role: Set(req.role.to_string()),
            student_id: Set(None),
            full_name: Set(req.full_name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                HWSystemError::invalid_field("username", format!("'{}' 已被占用", req.username))
            } else {
                HWSystemError::database_operation(format!("创建用户失败: {e}"))
            }
        })?;

        result.into_user()
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询用户失败: {e}")))?;

        result.map(|m| m.into_user()).transpose()
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询用户失败: {e}")))?;

        result.map(|m| m.into_user()).transpose()
    }

    /// 获取学生的登录账号
    pub async fn get_user_by_student_id_impl(&self, student_id: i64) -> Result<Option<User>> {
        let result = Users::find()
            .filter(Column::StudentId.eq(student_id))
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询用户失败: {e}")))?;

        result.map(|m| m.into_user()).transpose()
    }

    /// 统计教师账号
    pub async fn count_teachers_impl(&self) -> Result<u64> {
        Users::find()
            .filter(Column::Role.eq(UserRole::TEACHER))
            .count(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计教师失败: {e}")))
    }
}
