//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use config_loader::ConfigLoader;
use contracts::{DispatchSettings, TargetRegistry};

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SettingsSummary>,
}

#[derive(Serialize)]
struct SettingsSummary {
    base_url: String,
    timeout_secs: u64,
    token_env: String,
    store_root: String,
    output_prefix: String,
    mode: String,
    target_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let config_path = config_label(args);
    info!(config = %config_path, "Validating settings");

    let result = validate_settings(args, |var| std::env::var(var).ok());

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Settings validation failed")
    }
}

fn config_label(args: &ValidateArgs) -> String {
    match &args.config {
        Some(path) => path.display().to_string(),
        None => "<defaults>".to_string(),
    }
}

fn validate_settings<F>(args: &ValidateArgs, lookup: F) -> ValidationResult
where
    F: FnOnce(&str) -> Option<String>,
{
    let config_path = config_label(args);

    if let Some(ref path) = args.config {
        if !path.exists() {
            return ValidationResult {
                valid: false,
                config_path,
                error: Some(format!("File not found: {}", path.display())),
                warnings: None,
                summary: None,
            };
        }
    }

    let settings = match ConfigLoader::load_or_default(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            return ValidationResult {
                valid: false,
                config_path,
                error: Some(e.to_string()),
                warnings: None,
                summary: None,
            }
        }
    };

    let summary = Some(summarize(&settings));

    // A missing token is fatal: every target would fail at the remote
    if let Err(e) = ConfigLoader::credentials_with(&settings.inference.token_env, lookup) {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary,
        };
    }

    let warnings = collect_warnings(&settings);
    ValidationResult {
        valid: true,
        config_path,
        error: None,
        warnings: if warnings.is_empty() {
            None
        } else {
            Some(warnings)
        },
        summary,
    }
}

fn summarize(settings: &DispatchSettings) -> SettingsSummary {
    SettingsSummary {
        base_url: settings.inference.base_url.clone(),
        timeout_secs: settings.inference.timeout_secs,
        token_env: settings.inference.token_env.clone(),
        store_root: settings.storage.root.display().to_string(),
        output_prefix: settings.storage.output_prefix.clone(),
        mode: format!("{:?}", settings.dispatch.mode),
        target_count: TargetRegistry::reference().len(),
    }
}

/// Collect non-fatal issues
fn collect_warnings(settings: &DispatchSettings) -> Vec<String> {
    let mut warnings = Vec::new();

    if settings.inference.base_url.starts_with("http://") {
        warnings.push(format!(
            "inference.base_url '{}' is not TLS - the bearer token is sent in clear",
            settings.inference.base_url
        ));
    }

    if !settings.storage.root.exists() {
        warnings.push(format!(
            "storage.root '{}' does not exist - every fetch will fail",
            settings.storage.root.display()
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Settings are valid: {}", result.config_path);
    } else {
        println!("✗ Settings are invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }

    if let Some(ref summary) = result.summary {
        println!("\n  Base URL: {}", summary.base_url);
        println!("  Timeout: {}s", summary.timeout_secs);
        println!("  Token variable: {}", summary.token_env);
        println!("  Store root: {}", summary.store_root);
        println!("  Output prefix: {}", summary.output_prefix);
        println!("  Mode: {}", summary.mode);
        println!("  Targets: {}", summary.target_count);
    }

    if let Some(ref warnings) = result.warnings {
        println!("\n⚠ Warnings:");
        for warning in warnings {
            println!("  - {}", warning);
        }
    }
}
