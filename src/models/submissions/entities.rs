use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::files::entities::Attachment;

/// 提交状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "submission.ts")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_reviewed(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SubmissionStatus::Pending),
            "APPROVED" => Ok(SubmissionStatus::Approved),
            "REJECTED" => Ok(SubmissionStatus::Rejected),
            _ => Err(format!("Invalid submission status: {s}")),
        }
    }
}

/// 批改结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "submission.ts")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approved => "APPROVED",
            ReviewDecision::Rejected => "REJECTED",
        }
    }
}

impl From<ReviewDecision> for SubmissionStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => SubmissionStatus::Approved,
            ReviewDecision::Rejected => SubmissionStatus::Rejected,
        }
    }
}

impl std::str::FromStr for ReviewDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPROVED" => Ok(ReviewDecision::Approved),
            "REJECTED" => Ok(ReviewDecision::Rejected),
            _ => Err(format!("Invalid review decision: {s}")),
        }
    }
}

/// 单道小题的答案
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct Answer {
    pub assignment_id: String,
    // 提交时小题名称的快照
    pub assignment_name: String,
    pub text_content: Option<String>,
    pub file_reference: Option<Attachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct Submission {
    pub id: i64,
    pub homework_id: i64,
    pub student_id: i64,
    pub answers: Vec<Answer>,
    pub status: SubmissionStatus,
    pub teacher_comment: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
    pub reviewed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Submission {
    /// 为答案文件补全访问地址
    pub fn with_urls(mut self, resolve: impl Fn(&str) -> String) -> Self {
        for answer in &mut self.answers {
            if let Some(file) = answer.file_reference.take() {
                answer.file_reference = Some(file.with_url(&resolve));
            }
        }
        self
    }
}

/// 作业状态回写，与提交或批改在同一事务中完成
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomeworkStatusChange {
    pub homework_id: i64,
    pub status: crate::models::homeworks::entities::HomeworkStatus,
    pub review_outcome: Option<ReviewDecision>,
}

/// 某份作业的提交统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    pub submitted: i64,
    pub reviewed: i64,
}
