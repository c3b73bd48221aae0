//! Network configuration handed to the external HTTP client.
//!
//! This module builds values only; it never performs requests.

use once_cell::sync::OnceCell;

/// Base URL used when no override is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://89.168.27.59:8080/";
/// Environment variable overriding [`DEFAULT_API_BASE_URL`].
pub const API_BASE_URL_ENV: &str = "TASKLET_API_URL";

static ENV_CONFIG: OnceCell<ApiConfig> = OnceCell::new();

/// Remote API endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl ApiConfig {
    /// Resolves the configuration from the environment once per process.
    ///
    /// Blank overrides fall back to the default.
    pub fn from_env() -> &'static ApiConfig {
        ENV_CONFIG.get_or_init(|| Self::from_override(std::env::var(API_BASE_URL_ENV).ok()))
    }

    fn from_override(raw: Option<String>) -> Self {
        match raw.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Self {
                base_url: value.to_string(),
            },
            _ => Self::default(),
        }
    }
}

/// Headers attached to every authenticated API request.
pub fn request_headers(token: &str) -> [(&'static str, String); 2] {
    [
        ("Authorization", format!("Bearer {token}")),
        ("Content-Type", "application/json".to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::{request_headers, ApiConfig, DEFAULT_API_BASE_URL};

    #[test]
    fn headers_carry_bearer_token_and_json_content_type() {
        let headers = request_headers("abc123");
        assert_eq!(headers[0], ("Authorization", "Bearer abc123".to_string()));
        assert_eq!(
            headers[1],
            ("Content-Type", "application/json".to_string())
        );
    }

    #[test]
    fn blank_override_falls_back_to_default() {
        assert_eq!(
            ApiConfig::from_override(Some("   ".to_string())).base_url,
            DEFAULT_API_BASE_URL
        );
        assert_eq!(ApiConfig::from_override(None), ApiConfig::default());
        assert_eq!(
            ApiConfig::from_override(Some(" https://api.local/ ".to_string())).base_url,
            "https://api.local/"
        );
    }
}
