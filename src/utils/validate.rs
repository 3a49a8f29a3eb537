use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("Invalid username regex"));

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[A-Za-z0-9.-]+(:\d{1,5})?(/[^\s]*)?$").expect("Invalid link regex")
});

static CLOCK_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("Invalid time regex"));

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 用户名长度校验：3 <= x <= 32
    if username.len() < 3 || username.len() > 32 {
        return Err("Username length must be between 3 and 32 characters");
    }
    // 用户名格式校验：只能包含字母、数字、下划线、点或连字符
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores, dots or hyphens");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err("Password must be at least 6 characters long");
    }
    Ok(())
}

/// 外部链接必须是 http(s) 地址
pub fn validate_link(link: &str) -> Result<(), &'static str> {
    if !LINK_RE.is_match(link) {
        return Err("Link must be an http or https URL");
    }
    Ok(())
}

/// 上课时间为 24 小时制 HH:MM
pub fn validate_clock_time(time: &str) -> Result<(), &'static str> {
    if !CLOCK_TIME_RE.is_match(time) {
        return Err("Time must be in HH:MM 24-hour format");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("anna.k").is_ok());
        assert!(validate_username("s_01-b").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert!(validate_username("anna k").is_err());
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_link_rules() {
        assert!(validate_link("https://example.com").is_ok());
        assert!(validate_link("http://example.com:8080/path?q=1").is_ok());
        assert!(validate_link("ftp://example.com").is_err());
        assert!(validate_link("javascript:alert(1)").is_err());
        assert!(validate_link("https://exa mple.com").is_err());
    }

    #[test]
    fn test_clock_time_rules() {
        assert!(validate_clock_time("00:00").is_ok());
        assert!(validate_clock_time("09:30").is_ok());
        assert!(validate_clock_time("23:59").is_ok());
        assert!(validate_clock_time("24:00").is_err());
        assert!(validate_clock_time("9:30").is_err());
        assert!(validate_clock_time("09:60").is_err());
        assert!(validate_clock_time("09:30:00").is_err());
    }
}
