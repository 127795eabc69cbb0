use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::adapter::SharedAdapter;
use crate::errors::{WalletError, WalletResult};
use crate::storage::SharedStore;

pub const DEFAULT_STORAGE_KEY: &str = "walletName";

pub const STORAGE_KEY_ENV: &str = "WALLET_SESSION_STORAGE_KEY";
pub const AUTO_CONNECT_ENV: &str = "WALLET_SESSION_AUTO_CONNECT";

/// Receives every error the session observes, alongside the caller.
pub type ErrorHandler = Arc<dyn Fn(&WalletError) + Send + Sync>;

/// Opens an adapter's install page when connect finds it not ready.
pub type UrlOpener = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionOptions {
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
    #[serde(default)]
    pub auto_connect: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            auto_connect: false,
        }
    }
}

impl SessionOptions {
    /// Read options from a JSON file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> WalletResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let bytes = fs::read(path)?;
        let options: SessionOptions = serde_json::from_slice(&bytes)?;
        options.validate()?;
        Ok(options)
    }

    /// Apply `WALLET_SESSION_*` environment overrides.
    pub fn with_env_overrides(mut self) -> WalletResult<Self> {
        if let Ok(key) = std::env::var(STORAGE_KEY_ENV) {
            self.storage_key = key;
        }
        if let Ok(raw) = std::env::var(AUTO_CONNECT_ENV) {
            self.auto_connect = parse_flag(&raw).ok_or_else(|| {
                WalletError::ValidationError(format!(
                    "{} must be a boolean, got {:?}",
                    AUTO_CONNECT_ENV, raw
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> WalletResult<()> {
        if self.storage_key.trim().is_empty() {
            return Err(WalletError::ValidationError(
                "Storage key cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Everything `WalletSession::init` needs.
#[derive(Clone, Default)]
pub struct SessionConfig {
    pub wallets: Vec<SharedAdapter>,
    pub on_error: Option<ErrorHandler>,
    pub options: SessionOptions,
    pub storage: Option<SharedStore>,
    pub url_opener: Option<UrlOpener>,
    /// Runtime auto-connect attempts are spawned on. Defaults to the runtime
    /// `init` runs inside, if any.
    pub runtime: Option<Handle>,
}

impl SessionConfig {
    pub fn new(wallets: Vec<SharedAdapter>) -> Self {
        Self {
            wallets,
            ..Self::default()
        }
    }

    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = Some(handler);
        self
    }

    pub fn with_storage(mut self, storage: SharedStore) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.options.storage_key = key.into();
        self
    }

    pub fn with_auto_connect(mut self, enabled: bool) -> Self {
        self.options.auto_connect = enabled;
        self
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_url_opener(mut self, opener: UrlOpener) -> Self {
        self.url_opener = Some(opener);
        self
    }

    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let names: Vec<&str> = self.wallets.iter().map(|adapter| adapter.name()).collect();
        f.debug_struct("SessionConfig")
            .field("wallets", &names)
            .field("on_error", &self.on_error.is_some())
            .field("options", &self.options)
            .field("storage", &self.storage.is_some())
            .field("url_opener", &self.url_opener.is_some())
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let options = SessionOptions::default();
        assert_eq!(options.storage_key, "walletName");
        assert!(!options.auto_connect);

        let config = SessionConfig::default();
        assert!(config.wallets.is_empty());
        assert!(config.on_error.is_none());
    }

    #[test]
    fn load_fills_missing_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");
        fs::write(&path, br#"{"auto_connect": true}"#).unwrap();

        let options = SessionOptions::load(&path).unwrap();
        assert!(options.auto_connect);
        assert_eq!(options.storage_key, DEFAULT_STORAGE_KEY);

        let missing = SessionOptions::load(temp.path().join("absent.json")).unwrap();
        assert_eq!(missing, SessionOptions::default());
    }

    #[test]
    fn empty_storage_key_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("session.json");
        fs::write(&path, br#"{"storage_key": "  "}"#).unwrap();

        let result = SessionOptions::load(&path);
        assert!(matches!(result, Err(WalletError::ValidationError(_))));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        std::env::set_var(STORAGE_KEY_ENV, "selectedWallet");
        std::env::set_var(AUTO_CONNECT_ENV, "yes");
        let options = SessionOptions::default().with_env_overrides().unwrap();
        assert_eq!(options.storage_key, "selectedWallet");
        assert!(options.auto_connect);

        std::env::set_var(AUTO_CONNECT_ENV, "sometimes");
        let result = SessionOptions::default().with_env_overrides();
        assert!(matches!(result, Err(WalletError::ValidationError(_))));

        std::env::set_var(AUTO_CONNECT_ENV, "off");
        std::env::set_var(STORAGE_KEY_ENV, " ");
        let result = SessionOptions::default().with_env_overrides();
        assert!(matches!(result, Err(WalletError::ValidationError(_))));

        std::env::remove_var(STORAGE_KEY_ENV);
        std::env::remove_var(AUTO_CONNECT_ENV);
        let options = SessionOptions::default().with_env_overrides().unwrap();
        assert_eq!(options, SessionOptions::default());
    }

    #[test]
    fn parses_flags() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
