//! 初始化第一个教师账号
//!
//! 读取 `TEACHER_USERNAME`（默认 `teacher`）与 `TEACHER_PASSWORD`；未设置密码时生成随机密码并只打印一次。
//! 已存在教师账号时不做任何修改。

use dotenv::dotenv;
use tracing::info;

use homework_tracker::config::AppConfig;
use homework_tracker::services::auth::{ProvisionOutcome, provision_teacher};
use homework_tracker::storage::create_storage;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    if let Err(e) = AppConfig::init() {
        eprintln!("Failed to initialize configuration: {e}");
        std::process::exit(1);
    }
    let config = AppConfig::get();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.app.log_level))
        .init();

    let storage = create_storage()
        .await
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    let outcome = provision_teacher(
        storage.as_ref(),
        std::env::var("TEACHER_USERNAME").ok(),
        std::env::var("TEACHER_PASSWORD").ok(),
    )
    .await
    .map_err(|e| std::io::Error::other(e.to_string()))?;

    match outcome {
        ProvisionOutcome::AlreadyProvisioned => {
            info!("Teacher account already exists, nothing to do");
        }
        ProvisionOutcome::Created {
            username,
            generated_password,
        } => {
            println!("Created teacher account: {username}");
            if let Some(password) = generated_password {
                println!("Generated password (shown once): {password}");
            }
        }
    }

    Ok(())
}
