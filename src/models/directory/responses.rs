use serde::Serialize;
use ts_rs::TS;

use super::entities::{Group, Student};
use crate::models::homeworks::responses::HomeworkListItem;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct GroupListResponse {
    pub items: Vec<Group>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct StudentListResponse {
    pub items: Vec<Student>,
}

/// 新建学生及其登录名
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct StudentCreatedResponse {
    pub student: Student,
    pub username: String,
}

/// 小组详情及成员
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct GroupDetailResponse {
    pub group: Group,
    pub students: Vec<Student>,
}

/// 学生详情，附带所在小组与作业记录
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct StudentDetailResponse {
    pub student: Student,
    pub group: Option<Group>,
    pub homeworks: Vec<HomeworkListItem>,
}
