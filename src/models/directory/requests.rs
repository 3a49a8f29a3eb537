use serde::Deserialize;
use ts_rs::TS;

use super::entities::Weekday;

/// 创建小组请求，上课时间可选
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct CreateGroupRequest {
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,
}

/// 更新小组请求，未提供的字段保持不变，时间传空字符串表示清除
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub days_of_week: Option<Vec<Weekday>>,
}

/// 创建学生请求，同时创建登录账号
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct CreateStudentRequest {
    pub full_name: String,
    pub phone: Option<String>,
    pub group_id: Option<i64>,
    pub username: String,
    pub password: String,
}

/// 更新学生请求，未提供的字段保持不变，电话传空字符串表示清除
#[derive(Debug, Default, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct UpdateStudentRequest {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// 调整学生所在小组，null 表示移出小组
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct SetStudentGroupRequest {
    pub group_id: Option<i64>,
}

/// 学生列表查询参数
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "directory.ts")]
pub struct StudentListQuery {
    pub group_id: Option<i64>,
}

// 存储层使用的学生创建参数（密码已哈希）
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub full_name: String,
    pub phone: Option<String>,
    pub group_id: Option<i64>,
    pub username: String,
    pub password_hash: String,
}

// 存储层使用的学生更新参数，None 表示不修改登录账号对应字段
#[derive(Debug, Clone)]
pub struct StudentUpdate {
    pub full_name: String,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub password_hash: Option<String>,
}
