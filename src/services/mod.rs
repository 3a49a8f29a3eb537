pub mod auth;
pub mod directory;
pub mod files;
pub mod homeworks;
pub mod submissions;

pub use auth::AuthService;
pub use directory::DirectoryService;
pub use files::FileService;
pub use homeworks::HomeworkService;
pub use submissions::SubmissionService;

use crate::errors::{HWSystemError, Result};
use crate::models::{directory::entities::Student, users::entities::User};
use crate::storage::Storage;

/// 当前学生用户对应的学生档案
pub(crate) async fn current_student(storage: &dyn Storage, user: &User) -> Result<Student> {
    let student_id = user
        .student_id
        .filter(|_| user.is_student())
        .ok_or_else(|| HWSystemError::authorization("this operation is for students only"))?;

    storage
        .get_student_by_id(student_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("student {student_id} not found")))
}
