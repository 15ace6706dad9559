//! Server configuration, loaded from environment variables at startup.

use std::str::FromStr;

use strum::{Display, EnumString};

/// Which [`crate::entities::ShortcutStore`] implementation backs the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreKind {
    /// Process-lifetime catalog, lost on restart.
    Memory,
    /// SQLite database at [`Config::database_url`].
    Sqlite,
}

/// Runtime configuration for keyref-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Storage backend (default: memory).
    pub store: StoreKind,

    /// sqlx SQLite URL (default: `"sqlite://keyref.db"`). Ignored by the
    /// memory backend.
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated CORS origin allow-list. `None` allows any origin.
    pub cors_allowed_origins: Option<String>,

    /// Serve the OpenAPI document at `/api-docs/openapi.json`.
    pub enable_docs: bool,

    /// Load the bundled dataset into an empty store on startup.
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            store: StoreKind::Memory,
            database_url: "sqlite://keyref.db".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            cors_allowed_origins: None,
            enable_docs: true,
            seed: true,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_address: lookup("KEYREF_BIND").unwrap_or(defaults.bind_address),
            store: lookup("KEYREF_STORE")
                .map(|raw| parse_store(&raw))
                .unwrap_or(defaults.store),
            database_url: lookup("KEYREF_DATABASE_URL").unwrap_or(defaults.database_url),
            log_level: lookup("KEYREF_LOG").unwrap_or(defaults.log_level),
            log_json: lookup("KEYREF_LOG_JSON")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.log_json),
            cors_allowed_origins: lookup("KEYREF_CORS_ORIGINS").filter(|v| !v.trim().is_empty()),
            enable_docs: lookup("KEYREF_ENABLE_DOCS")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.enable_docs),
            seed: lookup("KEYREF_SEED")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.seed),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn parse_store(raw: &str) -> StoreKind {
    StoreKind::from_str(raw.trim()).unwrap_or_else(|_| {
        // Tracing is not initialised yet when the config is read.
        eprintln!("WARN: KEYREF_STORE='{raw}' is not 'memory' or 'sqlite'; using memory");
        StoreKind::Memory
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let cfg = config_with(&[]);
        assert_eq!(cfg.bind_address, "0.0.0.0:3000");
        assert_eq!(cfg.store, StoreKind::Memory);
        assert!(cfg.enable_docs);
        assert!(cfg.seed);
        assert!(!cfg.log_json);
        assert!(cfg.cors_allowed_origins.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_with(&[
            ("KEYREF_STORE", "SQLite"),
            ("KEYREF_DATABASE_URL", "sqlite://other.db"),
            ("KEYREF_LOG_JSON", "1"),
            ("KEYREF_SEED", "false"),
            ("KEYREF_CORS_ORIGINS", "http://localhost:5173"),
        ]);
        assert_eq!(cfg.store, StoreKind::Sqlite);
        assert_eq!(cfg.database_url, "sqlite://other.db");
        assert!(cfg.log_json);
        assert!(!cfg.seed);
        assert_eq!(cfg.cors_allowed_origins.as_deref(), Some("http://localhost:5173"));
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = config_with(&[
            ("KEYREF_STORE", "postgres"),
            ("KEYREF_ENABLE_DOCS", "maybe"),
            ("KEYREF_CORS_ORIGINS", "  "),
        ]);
        assert_eq!(cfg.store, StoreKind::Memory);
        assert!(cfg.enable_docs);
        assert!(cfg.cors_allowed_origins.is_none());
    }
}
