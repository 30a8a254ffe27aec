//! Settings validation
//!
//! Rules:
//! - inference.base_url is a non-empty http(s) URL
//! - inference.timeout_secs > 0
//! - inference.token_env is non-empty
//! - storage.output_prefix is a non-empty relative key prefix

use contracts::{ContractError, DispatchSettings};

/// Validate settings
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(settings: &DispatchSettings) -> Result<(), ContractError> {
    validate_inference(settings)?;
    validate_storage(settings)?;
    Ok(())
}

fn validate_inference(settings: &DispatchSettings) -> Result<(), ContractError> {
    let inference = &settings.inference;

    if inference.base_url.trim().is_empty() {
        return Err(ContractError::config_validation(
            "inference.base_url",
            "base_url cannot be empty",
        ));
    }
    if !(inference.base_url.starts_with("http://") || inference.base_url.starts_with("https://"))
    {
        return Err(ContractError::config_validation(
            "inference.base_url",
            format!(
                "base_url must start with http:// or https://, got '{}'",
                inference.base_url
            ),
        ));
    }
    if inference.timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "inference.timeout_secs",
            "timeout_secs must be > 0",
        ));
    }
    if inference.token_env.trim().is_empty() {
        return Err(ContractError::config_validation(
            "inference.token_env",
            "token_env cannot be empty",
        ));
    }
    Ok(())
}

fn validate_storage(settings: &DispatchSettings) -> Result<(), ContractError> {
    let prefix = &settings.storage.output_prefix;

    if prefix.trim_matches('/').is_empty() {
        return Err(ContractError::config_validation(
            "storage.output_prefix",
            "output_prefix cannot be empty",
        ));
    }
    // Object keys are relative; the store rejects absolute or dotted keys
    if prefix.starts_with('/') {
        return Err(ContractError::config_validation(
            "storage.output_prefix",
            format!("output_prefix must be relative, got '{prefix}'"),
        ));
    }
    if prefix
        .trim_end_matches('/')
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(ContractError::config_validation(
            "storage.output_prefix",
            format!("output_prefix has an empty, '.' or '..' segment: '{prefix}'"),
        ));
    }
    Ok(())
}
