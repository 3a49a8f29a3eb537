use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use crate::models::homeworks::entities::{Audience, HomeworkCategory};

/// 小题输入
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct AssignmentInput {
    /// 更新时用于保留已有小题的标识
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    /// 上传凭证列表
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// 创建作业请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct CreateHomeworkRequest {
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>, // RFC 3339 格式，如 "2026-01-24T12:00:00Z"
    pub category: HomeworkCategory,
    pub link: Option<String>,
    pub audience: Audience,
    pub assignments: Vec<AssignmentInput>,
}

/// 更新作业请求，所有字段可选
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct UpdateHomeworkRequest {
    pub description: Option<String>,
    /// 空字符串表示移除链接
    pub link: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    /// 移除截止时间
    #[serde(default)]
    pub clear_deadline: bool,
    pub category: Option<HomeworkCategory>,
    pub audience: Option<Audience>,
    pub assignments: Option<Vec<AssignmentInput>>,
}

impl UpdateHomeworkRequest {
    /// 是否修改了提交后冻结的字段
    pub fn touches_structure(&self) -> bool {
        self.deadline.is_some()
            || self.clear_deadline
            || self.category.is_some()
            || self.audience.is_some()
            || self.assignments.is_some()
    }
}

// 存储层使用的作业写入参数（小题标识与附件均已解析）
#[derive(Debug, Clone)]
pub struct HomeworkDraft {
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub category: HomeworkCategory,
    pub link: Option<String>,
    pub audience: Audience,
    pub assignments: Vec<crate::models::homeworks::entities::Assignment>,
}
