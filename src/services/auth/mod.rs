pub mod login;
pub mod profile;
pub mod provision;

use std::sync::Arc;

use crate::config::JwtConfig;
use crate::errors::Result;
use crate::models::{
    auth::{LoginRequest, LoginResponse, UserInfoResponse},
    users::entities::User,
};
use crate::storage::Storage;

pub use provision::{ProvisionOutcome, provision_teacher};

pub struct AuthService {
    storage: Arc<dyn Storage>,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(storage: Arc<dyn Storage>, jwt: JwtConfig) -> Self {
        Self { storage, jwt }
    }

    // 登录验证
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse> {
        login::handle_login(self, req).await
    }

    // 获取当前用户信息
    pub async fn me(&self, user: &User) -> Result<UserInfoResponse> {
        profile::handle_me(self, user).await
    }
}
