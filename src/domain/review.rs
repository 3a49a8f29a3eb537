use crate::errors::{HWSystemError, Result};
use crate::models::homeworks::entities::{Homework, HomeworkStatus};
use crate::models::submissions::entities::{HomeworkStatusChange, ReviewDecision};

/// 解析批改结论，只接受 APPROVED 与 REJECTED
pub fn parse_decision(raw: &str) -> Result<ReviewDecision> {
    raw.trim().to_ascii_uppercase().parse().map_err(|_| {
        HWSystemError::invalid_field("decision", format!("'{raw}' is not APPROVED or REJECTED"))
    })
}

/// 提交后作业状态的变化
///
/// 只有单人的单独布置作业会随提交进入 PENDING，小组作业与多人作业保持 NEW，
/// 以免第一份提交挡住其他学生。
pub fn status_after_submit(homework: &Homework) -> Option<HomeworkStatusChange> {
    (homework.audience.is_single_recipient() && homework.status == HomeworkStatus::New).then(
        || HomeworkStatusChange {
            homework_id: homework.id,
            status: HomeworkStatus::Pending,
            review_outcome: None,
        },
    )
}

/// 批改后作业状态的变化，保留具体结论
pub fn status_after_review(
    homework: &Homework,
    decision: ReviewDecision,
) -> Option<HomeworkStatusChange> {
    homework
        .audience
        .is_single_recipient()
        .then(|| HomeworkStatusChange {
            homework_id: homework.id,
            status: HomeworkStatus::Reviewed,
            review_outcome: Some(decision),
        })
}
