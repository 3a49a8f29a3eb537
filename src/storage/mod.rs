use std::collections::HashSet;
use std::sync::Arc;

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

use crate::errors::Result;

pub mod file_store;
pub mod sea_orm_storage;

pub use file_store::{FileStore, LocalFileStore};

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 获取学生的登录账号
    async fn get_user_by_student_id(&self, student_id: i64) -> Result<Option<User>>;
    // 统计教师账号数量
    async fn count_teachers(&self) -> Result<u64>;

    /// 小组管理方法
    async fn create_group(
        &self,
        teacher_id: i64,
        name: &str,
        schedule: GroupSchedule,
    ) -> Result<Group>;
    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>>;
    async fn list_groups_by_teacher(&self, teacher_id: i64) -> Result<Vec<Group>>;
    async fn update_group(
        &self,
        group_id: i64,
        name: &str,
        schedule: GroupSchedule,
    ) -> Result<Group>;
    // 成员移出小组，小组作业及其提交一并删除，返回待清理的文件路径
    async fn delete_group(&self, group_id: i64) -> Result<Vec<String>>;

    /// 学生管理方法
    // 创建学生及其登录账号（同一事务）
    async fn create_student(&self, teacher_id: i64, student: NewStudent) -> Result<(Student, User)>;
    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>>;
    async fn get_students_by_ids(&self, student_ids: &[i64]) -> Result<Vec<Student>>;
    async fn list_students_by_teacher(&self, teacher_id: i64) -> Result<Vec<Student>>;
    async fn list_students_by_group(&self, group_id: i64) -> Result<Vec<Student>>;
    async fn count_students_in_group(&self, group_id: i64) -> Result<u64>;
    // 调整学生所在小组
    async fn set_student_group(&self, student_id: i64, group_id: Option<i64>) -> Result<Student>;
    // 学生档案与登录账号在同一事务中更新
    async fn update_student(&self, student_id: i64, update: StudentUpdate) -> Result<Student>;
    // 删除学生及其提交、作业对象记录、登录账号与上传记录，被提交过的作业状态回到 NEW，
    // 返回待清理的文件路径
    async fn delete_student(&self, student_id: i64) -> Result<Vec<String>>;

    /// 上传文件管理方法
    async fn record_upload(&self, upload: Upload) -> Result<Upload>;
    async fn get_upload_by_token(&self, token: &str) -> Result<Option<Upload>>;
    async fn delete_upload_by_path(&self, storage_path: &str) -> Result<bool>;
    async fn list_uploads_before(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<Upload>>;
    // 作业附件与答案文件仍在引用的存储路径
    async fn referenced_upload_paths(&self) -> Result<HashSet<String>>;

    /// 作业管理方法
    // 原子写入作业及其作业对象
    async fn create_homework(&self, teacher_id: i64, draft: HomeworkDraft) -> Result<Homework>;
    async fn get_homework_by_id(&self, homework_id: i64) -> Result<Option<Homework>>;
    async fn list_homeworks_by_teacher(&self, teacher_id: i64) -> Result<Vec<Homework>>;
    // 学生可见的作业：所在小组的作业与单独布置给本人的作业
    async fn list_homeworks_for_student(
        &self,
        student_id: i64,
        group_id: Option<i64>,
    ) -> Result<Vec<Homework>>;
    // structural 为真时在事务内重新检查是否已有提交
    async fn update_homework(
        &self,
        homework_id: i64,
        draft: HomeworkDraft,
        structural: bool,
    ) -> Result<Homework>;
    // 已有提交时拒绝删除
    async fn delete_homework(&self, homework_id: i64) -> Result<()>;

    /// 提交管理方法
    // 依赖唯一约束拒绝重复提交，可选地在同一事务中回写作业状态
    async fn create_submission(
        &self,
        submission: NewSubmission,
        status_change: Option<HomeworkStatusChange>,
    ) -> Result<Submission>;
    async fn get_submission_by_id(&self, submission_id: i64) -> Result<Option<Submission>>;
    async fn get_submission_for(
        &self,
        homework_id: i64,
        student_id: i64,
    ) -> Result<Option<Submission>>;
    async fn list_submissions_by_homework(&self, homework_id: i64) -> Result<Vec<Submission>>;
    async fn list_submissions_by_student(&self, student_id: i64) -> Result<Vec<Submission>>;
    async fn count_submissions(&self, homework_id: i64) -> Result<SubmissionCounts>;
    async fn save_review(
        &self,
        submission_id: i64,
        review: ReviewUpdate,
        status_change: Option<HomeworkStatusChange>,
    ) -> Result<Submission>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
