use super::SubmissionService;
use crate::domain::{parse_decision, status_after_review};
use crate::errors::{HWSystemError, Result};
use crate::models::submissions::{
    entities::Submission,
    requests::{ReviewSubmissionRequest, ReviewUpdate},
};
use crate::models::users::entities::User;

/// 批改提交，已批改的提交允许再次批改并覆盖结论
pub async fn review_submission(
    service: &SubmissionService,
    user: &User,
    submission_id: i64,
    req: ReviewSubmissionRequest,
) -> Result<Submission> {
    let submission = service
        .storage
        .get_submission_by_id(submission_id)
        .await?
        .ok_or_else(|| HWSystemError::not_found(format!("submission {submission_id} not found")))?;

    let homework = service
        .storage
        .get_homework_by_id(submission.homework_id)
        .await?
        .ok_or_else(|| {
            HWSystemError::not_found(format!("homework {} not found", submission.homework_id))
        })?;

    if homework.teacher_id != user.id {
        return Err(HWSystemError::authorization(format!(
            "submission {submission_id} belongs to another teacher's homework"
        )));
    }

    let decision = parse_decision(&req.decision)?;
    let comment = req
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if submission.status.is_reviewed() {
        tracing::info!(
            "提交 {} 重新批改: {} -> {}",
            submission_id,
            submission.status.as_str(),
            decision.as_str()
        );
    }

    let reviewed = service
        .storage
        .save_review(
            submission_id,
            ReviewUpdate {
                decision,
                comment,
                reviewed_at: chrono::Utc::now(),
            },
            status_after_review(&homework, decision),
        )
        .await
        .inspect_err(|e| {
            if e.is_internal() {
                tracing::error!(
                    "保存批改失败: submission={}, teacher={}, error={}",
                    submission_id,
                    user.id,
                    e
                );
            }
        })?;

    tracing::info!(
        "教师 {} 批改提交 {}: {}",
        user.id,
        submission_id,
        decision.as_str()
    );
    Ok(service.present(reviewed))
}
