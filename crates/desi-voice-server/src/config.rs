// crates/desi-voice-server/src/config.rs
// ============================================================================
// Module: Server Configuration
// Description: Configuration loading and validation for the voice server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: desi-voice-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size limits and
//! unknown-field rejection. An explicitly named file must exist and validate;
//! only the implicit default path may fall back to built-in defaults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use desi_voice_core::CONTRACT_VERSION;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "desi-voice.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DESI_VOICE_CONFIG";
/// Maximum configuration file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;
/// Default bind address for the HTTP server.
const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
/// Minimum allowed request body limit.
const MIN_MAX_BODY_BYTES: usize = 1024;
/// Maximum allowed request body limit.
const MAX_MAX_BODY_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config file unreadable: {0}")]
    Read(String),
    /// Config file could not be parsed.
    #[error("config parse failed: {0}")]
    Parse(String),
    /// Config file violates a validation rule.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Voice server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceServerConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Contract source settings.
    #[serde(default)]
    pub contract: ContractConfig,
    /// Audit sink settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address the server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Contract source settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContractConfig {
    /// Contract file path; the built-in contract is used when absent.
    pub path: Option<PathBuf>,
    /// Contract version the engine requires at load.
    #[serde(default = "default_contract_version")]
    pub expected_version: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            path: None,
            expected_version: default_contract_version(),
        }
    }
}

/// Audit sink settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Audit log file; stderr is used when absent.
    pub path: Option<PathBuf>,
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default request body limit.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default expected contract version.
fn default_contract_version() -> String {
    CONTRACT_VERSION.to_string()
}

// ============================================================================
// SECTION: Loading and Validation
// ============================================================================

impl VoiceServerConfig {
    /// Loads configuration from an explicit path, the environment override,
    /// or the default file; a missing default file yields built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly named file is missing,
    /// unparsable, or invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&env_path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_NAME);
        if default_path.is_file() {
            return Self::from_file(default_path);
        }
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is unreadable, oversized,
    /// unparsable, or invalid.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let metadata = fs::metadata(path).map_err(|err| ConfigError::Read(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "config file exceeds {MAX_CONFIG_FILE_SIZE} bytes"
            )));
        }
        let raw = fs::read_to_string(path).map_err(|err| ConfigError::Read(err.to_string()))?;
        let config: Self =
            toml::from_str(&raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every hard limit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on any violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.server.bind)))?;
        if self.server.max_body_bytes < MIN_MAX_BODY_BYTES
            || self.server.max_body_bytes > MAX_MAX_BODY_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must be within {MIN_MAX_BODY_BYTES}..={MAX_MAX_BODY_BYTES}"
            )));
        }
        if self.contract.expected_version.trim().is_empty() {
            return Err(ConfigError::Invalid("expected_version must not be empty".to_string()));
        }
        if self.audit.enabled {
            if let Some(path) = &self.audit.path {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::Invalid("audit path must not be empty".to_string()));
                }
            }
        }
        Ok(())
    }
}
