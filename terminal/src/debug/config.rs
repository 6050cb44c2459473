//! Logging configuration from environment variables

use std::path::PathBuf;

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "vault_terminal=info,lib_evm=info,warn";

/// File name prefix of the rotated log
pub const LOG_FILE_PREFIX: &str = "vault-terminal.log";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level filter (e.g., "vault_terminal=debug,info")
    pub log_level: String,
    /// Directory for the rotated file log, if any
    pub log_dir: Option<PathBuf>,
    /// Emit JSON lines to the file log instead of plain text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_FILTER.to_string(),
            log_dir: None,
            json: false,
        }
    }
}

impl LogConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            log_level: non_empty("RUST_LOG").unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            log_dir: non_empty("VAULT_LOG_DIR").map(PathBuf::from),
            json: non_empty("VAULT_LOG_JSON").map(|v| v == "1").unwrap_or(false),
        }
    }

    /// Path of today's log file prefix, when file logging is enabled
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_dir.as_ref().map(|dir| dir.join(LOG_FILE_PREFIX))
    }

    /// Check if debug logging is enabled
    pub fn is_debug_enabled(&self) -> bool {
        self.log_level.contains("debug") || self.log_level.contains("trace")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LogConfig::from_lookup(lookup(&[]));
        assert_eq!(config, LogConfig::default());
        assert!(config.log_file().is_none());
        assert!(!config.is_debug_enabled());
    }

    #[test]
    fn test_env_overrides() {
        let config = LogConfig::from_lookup(lookup(&[
            ("RUST_LOG", "lib_evm=debug"),
            ("VAULT_LOG_DIR", "/tmp/vault-logs"),
            ("VAULT_LOG_JSON", "1"),
        ]));
        assert_eq!(config.log_level, "lib_evm=debug");
        assert_eq!(
            config.log_file(),
            Some(PathBuf::from("/tmp/vault-logs/vault-terminal.log"))
        );
        assert!(config.json);
        assert!(config.is_debug_enabled());
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = LogConfig::from_lookup(lookup(&[("RUST_LOG", "  "), ("VAULT_LOG_DIR", "")]));
        assert_eq!(config.log_level, DEFAULT_FILTER);
        assert!(config.log_dir.is_none());
    }
}
