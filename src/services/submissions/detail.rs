use super::SubmissionService;
use crate::errors::{HWSystemError, Result};
use crate::models::submissions::entities::Submission;
use crate::models::users::entities::User;

pub async fn get_submission(
    service: &SubmissionService,
    user: &User,
    submission_id: i64,
) -> Result<Submission> {
    let submission = service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("submission {submission_id} not found")))?;

    let allowed = if user.is_teacher() {
        service
            .storage
            .get_homework_by_id(submission.homework_id)
            .await?
            .is_some_and(|h| h.teacher_id == user.id)
    } else {
        user.student_id == Some(submission.student_id)
    };

    if !allowed {
        return Err(HWSystemError::authorization(format!(
            "submission {submission_id} is not visible to you"
        )));
    }

    Ok(service.present(submission))
}
