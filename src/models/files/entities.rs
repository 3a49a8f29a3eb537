use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::homeworks::entities::HomeworkCategory;

/// 附件引用，作业附件与答案文件共用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct Attachment {
    // 上传凭证
    pub token: String,
    // 原始文件名
    pub filename: String,
    // 相对上传根目录的存储路径
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    // 读取时根据 storage_path 拼接的访问地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Attachment {
    /// 补全访问地址
    pub fn with_url(mut self, resolve: &impl Fn(&str) -> String) -> Self {
        self.url = Some(resolve(&self.storage_path));
        self
    }
}

/// 由存储路径构造可访问的地址
pub fn url_for(public_base_url: &str, storage_path: &str) -> String {
    format!(
        "{}/{}",
        public_base_url.trim_end_matches('/'),
        storage_path.trim_start_matches('/')
    )
}

/// 上传记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "file.ts")]
pub struct Upload {
    pub token: String,
    pub uploader_id: i64,
    pub category: HomeworkCategory,
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
}

impl Upload {
    pub fn to_attachment(&self) -> Attachment {
        Attachment {
            token: self.token.clone(),
            filename: self.filename.clone(),
            storage_path: self.storage_path.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            url: None,
        }
    }
}

/// 已写入磁盘的文件信息（尚未登记上传记录）
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
    pub size_bytes: i64,
}
