use super::AuthService;
use crate::errors::Result;
use crate::models::{auth::UserInfoResponse, users::entities::User};
use crate::services::current_student;

pub async fn handle_me(service: &AuthService, user: &User) -> Result<UserInfoResponse> {
    let student = if user.is_student() {
        Some(current_student(service.storage.as_ref(), user).await?)
    } else {
        None
    };

    Ok(UserInfoResponse {
        user: user.clone(),
        student,
    })
}
