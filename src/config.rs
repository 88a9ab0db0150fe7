//! Engine configuration.

use std::env;
use std::fmt;
use std::path::PathBuf;

/// Exchange API credentials. Never persisted; the secret is redacted in `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Both parts present and non-blank.
    pub fn from_parts(api_key: Option<&str>, api_secret: Option<&str>) -> Option<Self> {
        match (api_key.map(str::trim), api_secret.map(str::trim)) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(Self::new(key, secret))
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Settings that decide which exchange client a session gets.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the simulated ledger
    pub data_dir: PathBuf,

    /// Exchange credentials, if any were supplied
    pub credentials: Option<Credentials>,

    /// Explicit request for the real exchange client
    pub use_real: bool,

    /// Target the futures testnet rather than production
    pub testnet: bool,

    /// Whether the real client may be used at all in this deployment
    pub live_available: bool,

    /// Override for the exchange REST base URL
    pub base_url: Option<String>,

    /// `recvWindow` sent with signed requests (milliseconds)
    pub recv_window_ms: u64,

    /// Symbols listed by the live client's price table
    pub tracked_symbols: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            credentials: None,
            use_real: false,
            testnet: true,
            live_available: true,
            base_url: None,
            recv_window_ms: 5000,
            tracked_symbols: crate::models::TRACKED_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Build from environment variables:
    /// - BINANCE_API_KEY / BINANCE_API_SECRET
    /// - BINANCE_USE_REAL (defaults to false)
    /// - BINANCE_TESTNET (defaults to true)
    /// - BINANCE_BASE_URL
    /// - PAPER_DATA_DIR (defaults to ./data)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let key = env::var("BINANCE_API_KEY").ok();
        let secret = env::var("BINANCE_API_SECRET").ok();

        Self {
            data_dir: env::var("PAPER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            credentials: Credentials::from_parts(key.as_deref(), secret.as_deref()),
            use_real: env_flag("BINANCE_USE_REAL").unwrap_or(defaults.use_real),
            testnet: env_flag("BINANCE_TESTNET").unwrap_or(defaults.testnet),
            base_url: env::var("BINANCE_BASE_URL").ok().filter(|s| !s.is_empty()),
            ..defaults
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    parse_flag(&env::var(name).ok()?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_credentials_are_absent() {
        assert!(Credentials::from_parts(Some("key"), Some("  ")).is_none());
        assert!(Credentials::from_parts(None, Some("secret")).is_none());
        assert_eq!(
            Credentials::from_parts(Some(" key "), Some("secret")),
            Some(Credentials::new("key", "secret"))
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", Credentials::new("key", "hunter2"));
        assert!(rendered.contains("key"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_defaults_are_mock_on_testnet() {
        let config = EngineConfig::default();
        assert!(!config.use_real);
        assert!(config.testnet);
        assert!(config.credentials.is_none());
        assert_eq!(config.tracked_symbols.len(), 4);
    }
}
