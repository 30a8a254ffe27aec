//! # Config Loader
//!
//! Settings loading and credential lookup.
//!
//! Responsibilities:
//! - Parse TOML/JSON settings files
//! - Validate settings
//! - Resolve the inference bearer token from the environment
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let settings = ConfigLoader::load_from_path(Path::new("dispatch.toml")).unwrap();
//! let credentials = ConfigLoader::credentials_from_env(&settings).unwrap();
//! println!("Endpoint: {}", settings.inference.base_url);
//! # let _ = credentials;
//! ```

mod parser;
mod validator;

pub use contracts::DispatchSettings;
pub use parser::ConfigFormat;

use contracts::{ContractError, Credentials};
use std::path::Path;

/// Settings loader
///
/// Provides static methods to load settings from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DispatchSettings, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load settings from an optional path, falling back to validated defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<DispatchSettings, ContractError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let settings = DispatchSettings::default();
                validator::validate(&settings)?;
                Ok(settings)
            }
        }
    }

    /// Load settings from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<DispatchSettings, ContractError> {
        let settings = parser::parse(content, format)?;
        Self::validate(&settings)?;
        Ok(settings)
    }

    /// Validate settings that were built or modified in code
    pub fn validate(settings: &DispatchSettings) -> Result<(), ContractError> {
        validator::validate(settings)
    }

    /// Read the bearer token named by `settings.inference.token_env`
    ///
    /// # Errors
    /// `MissingCredential` when the variable is unset or blank
    pub fn credentials_from_env(settings: &DispatchSettings) -> Result<Credentials, ContractError> {
        Self::credentials_with(&settings.inference.token_env, |var| std::env::var(var).ok())
    }

    /// Resolve the bearer token through a custom lookup
    pub fn credentials_with<F>(var: &str, lookup: F) -> Result<Credentials, ContractError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        match lookup(var) {
            Some(token) if !token.trim().is_empty() => Ok(Credentials::new(token.trim())),
            _ => Err(ContractError::MissingCredential {
                var: var.to_string(),
            }),
        }
    }

    /// Serialize settings to TOML string
    pub fn to_toml(settings: &DispatchSettings) -> Result<String, ContractError> {
        toml::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize settings to JSON string
    pub fn to_json(settings: &DispatchSettings) -> Result<String, ContractError> {
        serde_json::to_string_pretty(settings)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer settings format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read settings file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
