//! 文件上传与上传凭证解析

pub mod upload;

use std::sync::Arc;

use crate::errors::{HWSystemError, Result};
use crate::models::{
    files::{entities::Upload, responses::FileUploadResponse},
    homeworks::entities::HomeworkCategory,
    users::entities::User,
};
use crate::storage::{FileStore, Storage};

pub struct FileService {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileStore>,
    max_size: usize,
}

impl FileService {
    pub fn new(storage: Arc<dyn Storage>, files: Arc<dyn FileStore>, max_size: usize) -> Self {
        Self {
            storage,
            files,
            max_size,
        }
    }

    /// 单文件大小上限（字节）
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // 保存上传文件并签发凭证
    pub async fn upload(
        &self,
        user: &User,
        category: HomeworkCategory,
        original_name: &str,
        data: &[u8],
    ) -> Result<FileUploadResponse> {
        upload::handle_upload(self, user, category, original_name, data).await
    }
}

/// 解析上传凭证，只能引用本人上传的文件
pub async fn resolve_upload(
    storage: &dyn Storage,
    token: &str,
    user_id: i64,
    field: &str,
) -> Result<Upload> {
    let upload = storage.get_upload_by_token(token).await?.ok_or_else(|| {
        HWSystemError::not_found(format!("{field}: upload '{token}' does not exist"))
    })?;

    if upload.uploader_id != user_id {
        return Err(HWSystemError::authorization(format!(
            "{field}: upload '{token}' belongs to another user"
        )));
    }

    Ok(upload)
}

/// 尽力删除文件及其上传记录，失败只记录日志
///
/// 同一上传凭证可以被多份作业或答案引用，仍被引用的路径保留。
/// 引用关系查询失败时整批跳过。
pub async fn purge_paths<I>(storage: &dyn Storage, files: &dyn FileStore, paths: I)
where
    I: IntoIterator<Item = String>,
{
    let mut paths: Vec<String> = paths.into_iter().collect();
    if paths.is_empty() {
        return;
    }
    paths.sort();
    paths.dedup();

    let referenced = match storage.referenced_upload_paths().await {
        Ok(referenced) => referenced,
        Err(e) => {
            tracing::warn!("查询文件引用失败，跳过清理 {} 个文件: {}", paths.len(), e);
            return;
        }
    };

    for path in paths {
        if referenced.contains(&path) {
            tracing::debug!("文件仍被引用，保留 {}", path);
            continue;
        }
        if let Err(e) = files.remove(&path).await {
            tracing::warn!("清理文件失败 {}: {}", path, e);
            continue;
        }
        if let Err(e) = storage.delete_upload_by_path(&path).await {
            tracing::warn!("清理上传记录失败 {}: {}", path, e);
        }
    }
}

/// 清理早于 older_than 且没有被任何作业或答案引用的上传文件，返回清理的数量
pub async fn sweep_orphan_uploads(
    storage: &dyn Storage,
    files: &dyn FileStore,
    older_than: chrono::Duration,
) -> Result<usize> {
    let cutoff = chrono::Utc::now() - older_than;
    let candidates = storage.list_uploads_before(cutoff).await?;
    if candidates.is_empty() {
        return Ok(0);
    }

    let referenced = storage.referenced_upload_paths().await?;
    let mut removed = 0;
    for upload in candidates {
        if referenced.contains(&upload.storage_path) {
            continue;
        }
        if let Err(e) = files.remove(&upload.storage_path).await {
            tracing::warn!("清理孤立文件失败 {}: {}", upload.storage_path, e);
            continue;
        }
        storage.delete_upload_by_path(&upload.storage_path).await?;
        removed += 1;
    }

    if removed > 0 {
        tracing::info!("清理孤立上传文件 {} 个", removed);
    }
    Ok(removed)
}
