use crate::cache::{MokaCacheWrapper, ObjectCache};
use crate::config::AppConfig;
use crate::errors::{HWSystemError, Result};
use crate::services::files::sweep_orphan_uploads;
use crate::services::{
    AuthService, DirectoryService, FileService, HomeworkService, SubmissionService,
};
use crate::storage::{FileStore, LocalFileStore, Storage};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub auth: Arc<AuthService>,
    pub directory: Arc<DirectoryService>,
    pub files: Arc<FileService>,
    pub homeworks: Arc<HomeworkService>,
    pub submissions: Arc<SubmissionService>,
}

/// 检查是否已初始化教师账号
async fn check_teacher_account(storage: &Arc<dyn Storage>) {
    match storage.count_teachers().await {
        Ok(0) => {
            warn!("==========================================================");
            warn!("  NO TEACHER ACCOUNT FOUND");
            warn!("  Run the `provision` binary to create the first teacher");
            warn!("==========================================================");
        }
        Ok(count) => debug!("Found {} teacher account(s)", count),
        Err(e) => warn!("Failed to count teacher accounts: {}", e),
    }
}

/// 定期清理没有被作业或答案引用的过期上传文件
fn spawn_orphan_sweep(storage: Arc<dyn Storage>, files: Arc<dyn FileStore>, ttl_hours: u64) {
    if ttl_hours == 0 {
        info!("Orphan upload sweep disabled");
        return;
    }

    let ttl = chrono::Duration::hours(ttl_hours as i64);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            if let Err(e) = sweep_orphan_uploads(storage.as_ref(), files.as_ref(), ttl).await {
                warn!("Orphan upload sweep failed: {}", e);
            }
        }
    });
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、文件存储与各业务服务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let config = AppConfig::get();
    if config.jwt.secret.trim().is_empty() {
        return Err(HWSystemError::validation(
            "jwt.secret is empty, set JWT_SECRET before starting the server",
        ));
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    check_teacher_account(&storage).await;

    // 创建缓存实例
    let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::new(&config.cache));
    warn!("Cache backend initialized");

    // 准备上传目录
    let local_files = LocalFileStore::from_config(&config.upload);
    tokio::fs::create_dir_all(local_files.root())
        .await
        .map_err(|e| {
            HWSystemError::file_operation(format!(
                "创建上传目录 {} 失败: {e}",
                local_files.root().display()
            ))
        })?;
    let files: Arc<dyn FileStore> = Arc::new(local_files);
    spawn_orphan_sweep(storage.clone(), files.clone(), config.upload.orphan_ttl_hours);

    Ok(StartupContext {
        auth: Arc::new(AuthService::new(storage.clone(), config.jwt.clone())),
        directory: Arc::new(DirectoryService::new(
            storage.clone(),
            files.clone(),
            cache.clone(),
        )),
        files: Arc::new(FileService::new(
            storage.clone(),
            files.clone(),
            config.upload.max_size,
        )),
        homeworks: Arc::new(HomeworkService::new(storage.clone(), files.clone())),
        submissions: Arc::new(SubmissionService::new(storage.clone(), files)),
        storage,
        cache,
    })
}
