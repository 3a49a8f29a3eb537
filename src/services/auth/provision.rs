//! 部署时的教师账号初始化，可重复执行

use rand::Rng;
use rand::distr::Alphanumeric;

use crate::errors::{HWSystemError, Result};
use crate::models::users::{entities::UserRole, requests::CreateUserRequest};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_password, validate_username};

const DEFAULT_USERNAME: &str = "teacher";
const GENERATED_PASSWORD_LENGTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// 已存在教师账号，未做任何修改
    AlreadyProvisioned,
    /// 新建了教师账号；未指定密码时返回生成的密码
    Created {
        username: String,
        generated_password: Option<String>,
    },
}

/// 没有任何教师账号时创建一个
pub async fn provision_teacher(
    storage: &dyn Storage,
    username: Option<String>,
    password: Option<String>,
) -> Result<ProvisionOutcome> {
    if storage.count_teachers().await? > 0 {
        return Ok(ProvisionOutcome::AlreadyProvisioned);
    }

    let username = username
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
    validate_username(&username).map_err(|e| HWSystemError::invalid_field("username", e))?;

    let (password, generated) = match password.filter(|p| !p.is_empty()) {
        Some(password) => {
            validate_password(&password)
                .map_err(|e| HWSystemError::invalid_field("password", e))?;
            (password, false)
        }
        None => (generate_password(), true),
    };

    let user = storage
        .create_user(CreateUserRequest {
            username: username.clone(),
            password_hash: hash_password(&password)?,
            role: UserRole::Teacher,
            full_name: username.clone(),
        })
        .await?;

    tracing::info!("已创建教师账号 {} (id {})", user.username, user.id);
    Ok(ProvisionOutcome::Created {
        username,
        generated_password: generated.then_some(password),
    })
}

fn generate_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}
