use serde::Deserialize;
use ts_rs::TS;

/// 单道小题的答案输入
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct AnswerInput {
    pub assignment_id: String,
    pub text_content: Option<String>,
    /// 上传凭证
    pub file_token: Option<String>,
}

/// 提交作业请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct SubmitHomeworkRequest {
    pub answers: Vec<AnswerInput>,
}

/// 批改请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "submission.ts")]
pub struct ReviewSubmissionRequest {
    /// APPROVED 或 REJECTED
    pub decision: String,
    pub comment: Option<String>,
}

// 存储层使用的提交写入参数
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub homework_id: i64,
    pub student_id: i64,
    pub answers: Vec<crate::models::submissions::entities::Answer>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

// 存储层使用的批改写入参数
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub decision: crate::models::submissions::entities::ReviewDecision,
    pub comment: Option<String>,
    pub reviewed_at: chrono::DateTime<chrono::Utc>,
}
