pub mod auth;
pub mod common;
pub mod directory;
pub mod files;
pub mod homeworks;
pub mod submissions;
pub mod system;
pub mod users;

pub use common::{ApiResponse, ErrorCode};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
