//! # edu-config
//!
//! Layered configuration loading for the enrollment engine using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`EDU_*` prefix, `__` as separator)
//! 2. Project-level `.edu/config.toml`
//! 3. User-level `~/.config/edu/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `EDU_GRAPH__PATH` -> `graph.path`, `EDU_AUDIT__SINK` -> `audit.sink`,
//! `EDU_RETRY__MAX_ATTEMPTS` -> `retry.max_attempts`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use edu_config::EduConfig;
//!
//! let config = EduConfig::load_with_dotenv().expect("config");
//! println!("graph store at {}", config.graph.path);
//! ```

mod audit;
mod error;
mod general;
mod stores;

pub use audit::{AuditConfig, AuditSinkKind};
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use stores::{DocumentStoreConfig, GraphStoreConfig, RetrySettings};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EduConfig {
    #[serde(default)]
    pub graph: GraphStoreConfig,
    #[serde(default)]
    pub documents: DocumentStoreConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl EduConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] if you need `.env` file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is out of range.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// This is public so tests can inspect the figment directly or add
    /// additional providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(".edu/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: Environment variables (highest priority)
        figment.merge(Env::prefixed("EDU_").split("__"))
    }

    /// Reject values that would make the stores unusable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.graph.path.trim().is_empty() {
            return Err(invalid("graph.path", "must not be empty"));
        }
        if self.documents.path.trim().is_empty() {
            return Err(invalid("documents.path", "must not be empty"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(invalid(
                "retry.base_delay_ms",
                "must not exceed retry.max_delay_ms",
            ));
        }
        if self.general.default_limit == 0 {
            return Err(invalid("general.default_limit", "must be at least 1"));
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("edu").join("config.toml"))
    }

    /// Load `.env` from the workspace root.
    ///
    /// Walks up from `CARGO_MANIFEST_DIR` (if available) or current dir looking
    /// for a `.env` file. Silently does nothing if no `.env` is found.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
