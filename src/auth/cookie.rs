use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::SecurityConfig;

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Set-Cookie value carrying the refresh token.
pub fn refresh_cookie(token: &str, security: &SecurityConfig) -> String {
    let max_age = security.refresh_token_days * 24 * 60 * 60;
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Strict",
        REFRESH_COOKIE, token, max_age
    );
    if security.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Set-Cookie value that expires the refresh token immediately.
pub fn clear_refresh_cookie(security: &SecurityConfig) -> String {
    let mut cookie = format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Strict", REFRESH_COOKIE);
    if security.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Finds a cookie by name across all `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value: &HeaderValue| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| unquote(value.trim()).to_string())
        .filter(|value| !value.is_empty())
}

/// Strips the optional DQUOTE pair around a cookie value.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn reads_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; refreshToken=abc.def.ghi; lang=en"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE).as_deref(), Some("abc.def.ghi"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn quoted_values_are_unwrapped() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken=\"abc.def\"; lang=en"));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE).as_deref(), Some("abc.def"));

        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken=\"\""));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn empty_cookie_value_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert_eq!(read_cookie(&headers, REFRESH_COOKIE), None);
    }

    #[test]
    fn refresh_cookie_attributes() {
        let mut security = AppConfig::development().security;
        let cookie = refresh_cookie("tok", &security);
        assert!(cookie.starts_with("refreshToken=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));

        security.cookie_secure = true;
        assert!(refresh_cookie("tok", &security).ends_with("; Secure"));
        assert!(clear_refresh_cookie(&security).contains("Max-Age=0"));
    }
}
