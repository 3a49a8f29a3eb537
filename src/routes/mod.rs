pub mod auth;

pub mod directory;

pub mod files;

pub mod health;

pub mod homeworks;

pub mod submissions;

pub use auth::configure_auth_routes;
pub use directory::configure_directory_routes;
pub use files::configure_file_routes;
pub use health::configure_health_routes;
pub use homeworks::configure_homeworks_routes;
pub use submissions::configure_submissions_routes;

use actix_web::{HttpRequest, HttpResponse, http::StatusCode};
use serde::Serialize;
use ts_rs::TS;

use crate::errors::{ErrorKind, HWSystemError, Result};
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode, users::entities::User};

/// 错误分类对应的 HTTP 状态码
pub(crate) fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict | ErrorKind::DeadlinePassed => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 将业务错误转换为响应，内部错误只记录日志，不向调用方暴露细节
pub(crate) fn error_response(operation: &str, err: &HWSystemError) -> HttpResponse {
    let message = if err.is_internal() {
        tracing::error!("{} failed: {}", operation, err);
        "Internal server error".to_string()
    } else {
        err.message().to_string()
    };

    HttpResponse::build(status_for(err.kind()))
        .json(ApiResponse::error_empty(ErrorCode::from(err), message))
}

/// 以指定状态码返回成功结果或错误
pub(crate) fn respond<T: Serialize + TS>(
    operation: &str,
    status: StatusCode,
    message: &str,
    result: Result<T>,
) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::build(status).json(ApiResponse::success(data, message)),
        Err(e) => error_response(operation, &e),
    }
}

/// 读取 RequireJWT 解析出的当前用户
pub(crate) fn current_user(req: &HttpRequest) -> std::result::Result<User, HttpResponse> {
    RequireJWT::extract_user_claims(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "无法获取用户信息",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(ErrorKind::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::DeadlinePassed), StatusCode::CONFLICT);
        assert_eq!(
            status_for(ErrorKind::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let resp = error_response("test", &HWSystemError::database_operation("db is down"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = error_response("test", &HWSystemError::homework_locked("locked"));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
