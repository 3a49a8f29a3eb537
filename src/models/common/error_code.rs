use serde::Serialize;

use crate::errors::{ErrorKind, HWSystemError};

/// 响应体中的业务错误码
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 请求参数
    BadRequest = 1000,
    Validation = 1001,

    // 认证
    Unauthorized = 2000,
    AuthFailed = 2001,

    // 权限
    Forbidden = 3000,

    // 资源
    NotFound = 4000,

    // 作业与提交
    Conflict = 5000,
    AlreadySubmitted = 5001,
    HomeworkLocked = 5002,
    DeadlinePassed = 5003,

    // 文件
    FileUploadFailed = 6000,
    FileSizeExceeded = 6002,
    MultifileUploadNotAllowed = 6003,

    InternalServerError = 9000,
}

impl From<&HWSystemError> for ErrorCode {
    fn from(err: &HWSystemError) -> Self {
        match err {
            HWSystemError::AlreadySubmitted(_) => ErrorCode::AlreadySubmitted,
            HWSystemError::HomeworkLocked(_) => ErrorCode::HomeworkLocked,
            HWSystemError::Authentication(_) => ErrorCode::AuthFailed,
            _ => match err.kind() {
                ErrorKind::NotFound => ErrorCode::NotFound,
                ErrorKind::Forbidden => ErrorCode::Forbidden,
                ErrorKind::Unauthenticated => ErrorCode::Unauthorized,
                ErrorKind::Validation => ErrorCode::Validation,
                ErrorKind::Conflict => ErrorCode::Conflict,
                ErrorKind::DeadlinePassed => ErrorCode::DeadlinePassed,
                ErrorKind::Internal => ErrorCode::InternalServerError,
            },
        }
    }
}
