//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod directory;
mod homeworks;
mod submissions;
mod uploads;
mod users;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{HWSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 使用全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        Self::connect(&AppConfig::get().database).await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| HWSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .busy_timeout(Duration::from_secs(5))
            .pragma("temp_store", "memory");

        let pool_options = if in_memory {
            // 内存库随连接存在，只能使用单个常驻连接
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            opt = opt
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("wal_autocheckpoint", "1000");
            SqlitePoolOptions::new()
                .max_connections(config.pool_size)
                .min_connections(1)
                .idle_timeout(Duration::from_secs(300))
        };

        let pool = pool_options
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .connect_with(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| HWSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(HWSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite:, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use std::collections::HashSet;

use crate::models::{
    directory::{
        entities::{Group, GroupSchedule, Student},
        requests::{NewStudent, StudentUpdate},
    },
    files::entities::Upload,
    homeworks::{entities::Homework, requests::HomeworkDraft},
    submissions::{
        entities::{HomeworkStatusChange, Submission, SubmissionCounts},
        requests::{NewSubmission, ReviewUpdate},
    },
    users::{entities::User, requests::CreateUserRequest},
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_student_id(&self, student_id: i64) -> Result<Option<User>> {
        self.get_user_by_student_id_impl(student_id).await
    }

    async fn count_teachers(&self) -> Result<u64> {
        self.count_teachers_impl().await
    }

    // 小组模块
    async fn create_group(
        &self,
        teacher_id: i64,
        name: &str,
        schedule: GroupSchedule,
    ) -> Result<Group> {
        self.create_group_impl(teacher_id, name, schedule).await
    }

    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        self.get_group_by_id_impl(group_id).await
    }

    async fn list_groups_by_teacher(&self, teacher_id: i64) -> Result<Vec<Group>> {
        self.list_groups_by_teacher_impl(teacher_id).await
    }

    async fn update_group(
        &self,
        group_id: i64,
        name: &str,
        schedule: GroupSchedule,
    ) -> Result<Group> {
        self.update_group_impl(group_id, name, schedule).await
    }

    async fn delete_group(&self, group_id: i64) -> Result<Vec<String>> {
        self.delete_group_impl(group_id).await
    }

    // 学生模块
    async fn create_student(
        &self,
        teacher_id: i64,
        student: NewStudent,
    ) -> Result<(Student, User)> {
        self.create_student_impl(teacher_id, student).await
    }

    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(student_id).await
    }

    async fn get_students_by_ids(&self, student_ids: &[i64]) -> Result<Vec<Student>> {
        self.get_students_by_ids_impl(student_ids).await
    }

    async fn list_students_by_teacher(&self, teacher_id: i64) -> Result<Vec<Student>> {
        self.list_students_by_teacher_impl(teacher_id).await
    }

    async fn list_students_by_group(&self, group_id: i64) -> Result<Vec<Student>> {
        self.list_students_by_group_impl(group_id).await
    }

    async fn count_students_in_group(&self, group_id: i64) -> Result<u64> {
        self.count_students_in_group_impl(group_id).await
    }

    async fn set_student_group(&self, student_id: i64, group_id: Option<i64>) -> Result<Student> {
        self.set_student_group_impl(student_id, group_id).await
    }

    async fn update_student(&self, student_id: i64, update: StudentUpdate) -> Result<Student> {
        self.update_student_impl(student_id, update).await
    }

    async fn delete_student(&self, student_id: i64) -> Result<Vec<String>> {
        self.delete_student_impl(student_id).await
    }

    // 上传模块
    async fn record_upload(&self, upload: Upload) -> Result<Upload> {
        self.record_upload_impl(upload).await
    }

    async fn get_upload_by_token(&self, token: &str) -> Result<Option<Upload>> {
        self.get_upload_by_token_impl(token).await
    }

    async fn delete_upload_by_path(&self, storage_path: &str) -> Result<bool> {
        self.delete_upload_by_path_impl(storage_path).await
    }

    async fn list_uploads_before(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Upload>> {
        self.list_uploads_before_impl(cutoff).await
    }

    async fn referenced_upload_paths(&self) -> Result<HashSet<String>> {
        self.referenced_upload_paths_impl().await
    }

    // 作业模块
    async fn create_homework(&self, teacher_id: i64, draft: HomeworkDraft) -> Result<Homework> {
        self.create_homework_impl(teacher_id, draft).await
    }

    async fn get_homework_by_id(&self, homework_id: i64) -> Result<Option<Homework>> {
        self.get_homework_by_id_impl(homework_id).await
    }

    async fn list_homeworks_by_teacher(&self, teacher_id: i64) -> Result<Vec<Homework>> {
        self.list_homeworks_by_teacher_impl(teacher_id).await
    }

    async fn list_homeworks_for_student(
        &self,
        student_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<Homework>> {
        self.list_homeworks_for_student_impl(student_id, group_id)
            .await
    }

    async fn update_homework(
        &self,
        homework_id: i64,
        draft: HomeworkDraft,
        structural: bool,
    ) -> Result<Homework> {
        self.update_homework_impl(homework_id, draft, structural)
            .await
    }

    async fn delete_homework(&self, homework_id: i64) -> Result<()> {
        self.delete_homework_impl(homework_id).await
    }

    // 提交模块
    async fn create_submission(
        &self,
        submission: NewSubmission,
        status_change: Option<HomeworkStatusChange>,
    ) -> Result<Submission> {
        self.create_submission_impl(submission, status_change).await
    }

    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn get_submission_for(
        &self,
        homework_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>> {
        self.get_submission_for_impl(homework_id, student_id).await
    }

    async fn list_submissions_by_homework(&self, homework_id: i64) -> Result<Vec<Submission>> {
        self.list_submissions_by_homework_impl(homework_id).await
    }

    async fn list_submissions_by_student(&self, student_id: i64) -> Result<Vec<Submission>> {
        self.list_submissions_by_student_impl(student_id).await
    }

    async fn count_submissions(&self, homework_id: i64) -> Result<SubmissionCounts> {
        self.count_submissions_impl(homework_id).await
    }

    async fn save_review(
        &self,
        submission_id: i64,
        review: ReviewUpdate,
        status_change: Option<HomeworkStatusChange>,
    ) -> Result<Submission> {
        self.save_review_impl(submission_id, review, status_change)
            .await
    }
}
