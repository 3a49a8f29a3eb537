use super::AuthService;
use crate::errors::{HWSystemError, Result};
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

const LOGIN_FAILED: &str = "Username or password is incorrect";

pub async fn handle_login(service: &AuthService, req: LoginRequest) -> Result<LoginResponse> {
    // 1. 根据用户名获取用户信息
    let user = service
        .storage
        .get_user_by_username(req.username.trim())
        .await?
        .ok_or_else(|| HWSystemError::authentication(LOGIN_FAILED))?;

    // 2. 验证密码
    if !verify_password(&req.password, &user.password_hash) {
        tracing::info!("用户 {} 密码错误", user.username);
        return Err(HWSystemError::authentication(LOGIN_FAILED));
    }

    // 3. 签发访问令牌
    let access_token = JwtUtils::generate_access_token(&service.jwt, user.id, &user.role.to_string())
        .map_err(|e| HWSystemError::serialization(format!("生成令牌失败: {e}")))?;

    tracing::info!("User {} logged in successfully", user.username);

    Ok(LoginResponse {
        access_token,
        expires_in: service.jwt.access_token_expiry * 60, // 转换为秒
        user,
        created_at: chrono::Utc::now(),
    })
}
