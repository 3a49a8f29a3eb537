//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，每个变体带有错误代码、类型名称与对外暴露的错误分类。

use std::fmt;

/// 对调用方稳定的错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Unauthenticated,
    Validation,
    Conflict,
    DeadlinePassed,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::DeadlinePassed => "DEADLINE_PASSED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - kind() 方法 - 返回错误分类
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_hwsystem_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $kind:ident)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum HWSystemError {
            $($variant(String),)*
        }

        impl HWSystemError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误分类
            pub fn kind(&self) -> ErrorKind {
                match self {
                    $(HWSystemError::$variant(_) => ErrorKind::$kind,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(HWSystemError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl HWSystemError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        HWSystemError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_hwsystem_errors! {
    DatabaseConfig("E001", "Database Configuration Error", Internal),
    DatabaseConnection("E002", "Database Connection Error", Internal),
    DatabaseOperation("E003", "Database Operation Error", Internal),
    FileOperation("E004", "File Operation Error", Internal),
    Serialization("E005", "Serialization Error", Internal),
    DateParse("E006", "Date Parse Error", Validation),
    Validation("E007", "Validation Error", Validation),
    NotFound("E008", "Resource Not Found", NotFound),
    Authentication("E009", "Authentication Error", Unauthenticated),
    Authorization("E010", "Authorization Error", Forbidden),
    AlreadySubmitted("E011", "Already Submitted", Conflict),
    HomeworkLocked("E012", "Homework Locked", Conflict),
    DeadlinePassed("E013", "Deadline Passed", DeadlinePassed),
}

impl HWSystemError {
    /// 字段级校验错误，消息以字段名开头
    pub fn invalid_field(field: &str, reason: impl fmt::Display) -> Self {
        HWSystemError::Validation(format!("{field}: {reason}"))
    }

    /// 是否属于基础设施故障（不应向调用方暴露细节）
    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for HWSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for HWSystemError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for HWSystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        HWSystemError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for HWSystemError {
    fn from(err: std::io::Error) -> Self {
        HWSystemError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for HWSystemError {
    fn from(err: serde_json::Error) -> Self {
        HWSystemError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for HWSystemError {
    fn from(err: chrono::ParseError) -> Self {
        HWSystemError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HWSystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(HWSystemError::database_config("test").code(), "E001");
        assert_eq!(HWSystemError::validation("test").code(), "E007");
        assert_eq!(HWSystemError::authentication("test").code(), "E009");
        assert_eq!(HWSystemError::deadline_passed("test").code(), "E013");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            HWSystemError::already_submitted("test").error_type(),
            "Already Submitted"
        );
        assert_eq!(
            HWSystemError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(HWSystemError::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(HWSystemError::authorization("x").kind(), ErrorKind::Forbidden);
        assert_eq!(
            HWSystemError::already_submitted("x").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(HWSystemError::homework_locked("x").kind(), ErrorKind::Conflict);
        assert_eq!(
            HWSystemError::deadline_passed("x").kind(),
            ErrorKind::DeadlinePassed
        );
        assert!(HWSystemError::database_operation("x").is_internal());
        assert!(!HWSystemError::validation("x").is_internal());
    }

    #[test]
    fn test_invalid_field_names_the_field() {
        let err = HWSystemError::invalid_field("assignments[1].name", "must not be blank");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "assignments[1].name: must not be blank");
    }

    #[test]
    fn test_format_simple() {
        let err = HWSystemError::validation("Invalid URL");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid URL"));
    }
}
