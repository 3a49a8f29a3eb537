use serde::Serialize;
use ts_rs::TS;

use crate::models::directory::entities::Student;
use crate::models::homeworks::entities::Homework;
use crate::models::submissions::entities::Submission;

/// 教师视角的提交进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct HomeworkProgress {
    pub audience_size: i64,
    pub submitted_count: i64,
    pub reviewed_count: i64,
}

/// 作业列表项
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct HomeworkListItem {
    #[serde(flatten)]
    #[ts(flatten)]
    pub homework: Homework,
    /// 学生视角：本人的提交
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
    /// 学生视角：当前是否可以提交
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_submit: Option<bool>,
    /// 教师视角：提交进度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<HomeworkProgress>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct HomeworkListResponse {
    pub items: Vec<HomeworkListItem>,
}

/// 作业详情
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "homework.ts")]
pub struct HomeworkDetailResponse {
    pub homework: Homework,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_submit: Option<bool>,
    /// 教师视角：全部提交
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submissions: Option<Vec<Submission>>,
    /// 教师视角：作业对象中的学生
    #[serde(skip_serializing_if = "Option::is_none")]
    pub students: Option<Vec<Student>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<HomeworkProgress>,
}
