//! 上传文件的磁盘存储

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::config::UploadConfig;
use crate::errors::{HWSystemError, Result};
use crate::models::files::entities::{StoredFile, url_for};
use crate::models::homeworks::entities::HomeworkCategory;
use crate::utils::file_magic::mime_type_for;

#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    /// 保存文件，路径为 `<子目录>/<时间戳>-<uuid>.<扩展名>`
    async fn save(
        &self,
        category: HomeworkCategory,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile>;
    /// 删除文件，文件不存在视为成功
    async fn remove(&self, storage_path: &str) -> Result<()>;
    /// 构造访问地址
    fn url_for(&self, storage_path: &str) -> String;
}

/// 本地磁盘实现
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(&config.dir, &config.public_base_url)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, storage_path: &str) -> Result<PathBuf> {
        let relative = Path::new(storage_path);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(HWSystemError::file_operation(format!(
                "非法的存储路径: {storage_path}"
            )));
        }
        Ok(self.root.join(relative))
    }
}

/// 提取小写扩展名
pub fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[async_trait::async_trait]
impl FileStore for LocalFileStore {
    async fn save(
        &self,
        category: HomeworkCategory,
        original_name: &str,
        data: &[u8],
    ) -> Result<StoredFile> {
        let extension = extension_of(original_name).ok_or_else(|| {
            HWSystemError::invalid_field("file", format!("'{original_name}' 缺少扩展名"))
        })?;

        let subdir = category.storage_subdir();
        let storage_path = format!(
            "{subdir}/{}-{}.{extension}",
            chrono::Utc::now().timestamp(),
            Uuid::new_v4()
        );

        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(self.resolve(&storage_path)?, data).await?;

        tracing::debug!("文件已保存: {}", storage_path);

        Ok(StoredFile {
            filename: original_name.to_string(),
            mime_type: mime_type_for(&extension).to_string(),
            size_bytes: data.len() as i64,
            storage_path,
        })
    }

    async fn remove(&self, storage_path: &str) -> Result<()> {
        let path = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(HWSystemError::file_operation(format!(
                "删除文件 {storage_path} 失败: {e}"
            ))),
        }
    }

    fn url_for(&self, storage_path: &str) -> String {
        url_for(&self.public_base_url, storage_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> LocalFileStore {
        let root = std::env::temp_dir().join(format!("hwtracker-test-{}", Uuid::new_v4()));
        LocalFileStore::new(root, "/uploads")
    }

    #[tokio::test]
    async fn test_save_uses_category_subdir() {
        let store = temp_store();
        let stored = store
            .save(HomeworkCategory::Audio, "Lesson 1.MP3", b"ID3\x04")
            .await
            .unwrap();

        assert!(stored.storage_path.starts_with("audio/"));
        assert!(stored.storage_path.ends_with(".mp3"));
        assert_eq!(stored.filename, "Lesson 1.MP3");
        assert_eq!(stored.mime_type, "audio/mpeg");
        assert_eq!(stored.size_bytes, 4);
        assert!(store.root().join(&stored.storage_path).exists());
        assert_eq!(
            store.url_for(&stored.storage_path),
            format!("/uploads/{}", stored.storage_path)
        );

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = temp_store();
        let stored = store
            .save(HomeworkCategory::Document, "notes.txt", b"hello")
            .await
            .unwrap();

        store.remove(&stored.storage_path).await.unwrap();
        assert!(!store.root().join(&stored.storage_path).exists());
        store.remove(&stored.storage_path).await.unwrap();

        let _ = std::fs::remove_dir_all(store.root());
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let store = temp_store();
        assert!(store.remove("../etc/passwd").await.is_err());
        assert!(store.remove("/etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_save_requires_extension() {
        let store = temp_store();
        let err = store
            .save(HomeworkCategory::File, "README", b"x")
            .await
            .unwrap_err();
        assert!(err.message().starts_with("file:"));
    }
}
