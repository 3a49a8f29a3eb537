use uuid::Uuid;

use super::FileService;
use crate::errors::{HWSystemError, Result};
use crate::models::{
    files::{entities::Upload, responses::FileUploadResponse},
    homeworks::entities::HomeworkCategory,
    users::entities::User,
};
use crate::storage::file_store::extension_of;
use crate::utils::validate_magic_bytes;

pub async fn handle_upload(
    service: &FileService,
    user: &User,
    category: HomeworkCategory,
    original_name: &str,
    data: &[u8],
) -> Result<FileUploadResponse> {
    // 1. 校验扩展名
    let extension = extension_of(original_name)
        .ok_or_else(|| HWSystemError::invalid_field("file", "file name has no extension"))?;

    if !category.allows_extension(&extension) {
        return Err(HWSystemError::invalid_field(
            "file",
            format!("'.{extension}' files are not accepted for {category} homework"),
        ));
    }

    // 2. 校验大小与内容
    if data.is_empty() {
        return Err(HWSystemError::invalid_field("file", "file is empty"));
    }
    if data.len() > service.max_size {
        return Err(HWSystemError::invalid_field(
            "file",
            format!("file exceeds the {} byte limit", service.max_size),
        ));
    }
    if !validate_magic_bytes(data, &extension) {
        return Err(HWSystemError::invalid_field(
            "file",
            "file content does not match its extension",
        ));
    }

    // 3. 写入磁盘并登记
    let stored = service.files.save(category, original_name, data).await?;

    let upload = Upload {
        token: Uuid::new_v4().to_string(),
        uploader_id: user.id,
        category,
        filename: stored.filename,
        storage_path: stored.storage_path.clone(),
        mime_type: stored.mime_type,
        size_bytes: stored.size_bytes,
        uploaded_at: chrono::Utc::now(),
    };

    let upload = match service.storage.record_upload(upload).await {
        Ok(upload) => upload,
        Err(e) => {
            if let Err(remove_err) = service.files.remove(&stored.storage_path).await {
                tracing::warn!(
                    "登记失败后删除文件失败 {}: {}",
                    stored.storage_path,
                    remove_err
                );
            }
            return Err(e);
        }
    };

    tracing::info!(
        "用户 {} 上传文件 {} ({} 字节)",
        user.id,
        upload.storage_path,
        upload.size_bytes
    );

    Ok(FileUploadResponse {
        url: service.files.url_for(&upload.storage_path),
        token: upload.token,
        filename: upload.filename,
        category: upload.category,
        storage_path: upload.storage_path,
        mime_type: upload.mime_type,
        size_bytes: upload.size_bytes,
        uploaded_at: upload.uploaded_at,
    })
}
