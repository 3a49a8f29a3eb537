use serde::Serialize;
use ts_rs::TS;

use crate::models::homeworks::entities::HomeworkCategory;

/// 文件上传结果
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct FileUploadResponse {
    /// 上传凭证，作业与答案通过它引用文件
    pub token: String,
    /// 原始文件名
    pub filename: String,
    pub category: HomeworkCategory,
    pub storage_path: String,
    pub mime_type: String,
    /// 文件大小(字节)
    pub size_bytes: i64,
    pub url: String,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}
