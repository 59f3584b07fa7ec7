//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `DEALBRIDGE_DB_PATH`: Local store path (required)
//! - `DEALBRIDGE_DB_POOL_SIZE`: Local store pool size
//! - `DEALBRIDGE_ERP_KEYCHAIN_SERVICE`: Keychain service for ERP passwords
//! - `DEALBRIDGE_ERP_CONNECT_TIMEOUT`: ERP connect timeout in seconds
//! - `DEALBRIDGE_ERP_REQUEST_TIMEOUT`: ERP statement timeout in seconds
//! - `DEALBRIDGE_ERP_MAX_POOL_SIZE`: Maximum ERP connections
//! - `DEALBRIDGE_ERP_TEST_TIMEOUT`: Connection test timeout in seconds
//! - `DEALBRIDGE_ERP_ORDER_PREFIX`: Order number prefix
//! - `DEALBRIDGE_ERP_CURRENCY`: ISO currency code written on orders
//! - `DEALBRIDGE_ERP_CURRENCY_FACTOR`: Conversion factor for that currency
//! - `DEALBRIDGE_ERP_LANGUAGE_ID`: ERP language id for article texts
//! - `DEALBRIDGE_ERP_APPLICATION_NAME`: Application name sent at login
//!
//! Only `DEALBRIDGE_DB_PATH` is required; unset ERP variables keep their
//! defaults.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./dealbridge.json` or `./dealbridge.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use dealbridge_domain::{Config, DatabaseConfig, DealBridgeError, ErpConfig, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `DealBridgeError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    // Try loading from environment first
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            // Fall back to file
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `DealBridgeError::Config` if `DEALBRIDGE_DB_PATH` is missing or
/// any set variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("DEALBRIDGE_DB_PATH")?;
    let defaults = Config::default();

    let database = DatabaseConfig {
        path: db_path,
        pool_size: env_parse("DEALBRIDGE_DB_POOL_SIZE", "pool size")?
            .unwrap_or(defaults.database.pool_size),
    };

    let erp_defaults = defaults.erp;
    let erp = ErpConfig {
        keychain_service: env_string("DEALBRIDGE_ERP_KEYCHAIN_SERVICE")
            .unwrap_or(erp_defaults.keychain_service),
        connect_timeout_secs: env_parse("DEALBRIDGE_ERP_CONNECT_TIMEOUT", "connect timeout")?
            .unwrap_or(erp_defaults.connect_timeout_secs),
        request_timeout_secs: env_parse("DEALBRIDGE_ERP_REQUEST_TIMEOUT", "request timeout")?
            .unwrap_or(erp_defaults.request_timeout_secs),
        max_pool_size: env_parse("DEALBRIDGE_ERP_MAX_POOL_SIZE", "ERP pool size")?
            .unwrap_or(erp_defaults.max_pool_size),
        test_timeout_secs: env_parse("DEALBRIDGE_ERP_TEST_TIMEOUT", "test timeout")?
            .unwrap_or(erp_defaults.test_timeout_secs),
        order_number_prefix: env_string("DEALBRIDGE_ERP_ORDER_PREFIX")
            .unwrap_or(erp_defaults.order_number_prefix),
        currency_code: env_string("DEALBRIDGE_ERP_CURRENCY").unwrap_or(erp_defaults.currency_code),
        currency_factor: env_parse("DEALBRIDGE_ERP_CURRENCY_FACTOR", "currency factor")?
            .unwrap_or(erp_defaults.currency_factor),
        language_id: env_parse("DEALBRIDGE_ERP_LANGUAGE_ID", "language id")?
            .unwrap_or(erp_defaults.language_id),
        application_name: env_string("DEALBRIDGE_ERP_APPLICATION_NAME")
            .unwrap_or(erp_defaults.application_name),
    };

    Ok(Config { database, erp })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `DealBridgeError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DealBridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DealBridgeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DealBridgeError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Arguments
/// * `contents` - File contents as string
/// * `path` - Path to the file (for format detection and error messages)
///
/// # Errors
/// Returns `DealBridgeError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DealBridgeError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DealBridgeError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(DealBridgeError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./dealbridge.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("dealbridge.json"),
            cwd.join("dealbridge.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("dealbridge.json"),
                exe_dir.join("dealbridge.toml"),
                exe_dir.join("../config.json"),
                exe_dir.join("../config.toml"),
                exe_dir.join("../../config.json"),
                exe_dir.join("../../config.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `DealBridgeError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        DealBridgeError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Optional environment variable; blank counts as unset.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `DealBridgeError::Config` naming `what` if the value is set but
/// does not parse.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| DealBridgeError::Config(format!("Invalid {}: {}", what, e)))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use rust_decimal::Decimal;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ERP_VARS: [&str; 11] = [
        "DEALBRIDGE_ERP_KEYCHAIN_SERVICE",
        "DEALBRIDGE_ERP_CONNECT_TIMEOUT",
        "DEALBRIDGE_ERP_REQUEST_TIMEOUT",
        "DEALBRIDGE_ERP_MAX_POOL_SIZE",
        "DEALBRIDGE_ERP_TEST_TIMEOUT",
        "DEALBRIDGE_ERP_ORDER_PREFIX",
        "DEALBRIDGE_ERP_CURRENCY",
        "DEALBRIDGE_ERP_CURRENCY_FACTOR",
        "DEALBRIDGE_ERP_LANGUAGE_ID",
        "DEALBRIDGE_ERP_APPLICATION_NAME",
        "DEALBRIDGE_DB_POOL_SIZE",
    ];

    fn clear_env() {
        std::env::remove_var("DEALBRIDGE_DB_PATH");
        for key in ERP_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_only_db_path_required() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("DEALBRIDGE_DB_PATH", "/tmp/crm.db");

        let config = load_from_env().expect("db path alone is enough");
        assert_eq!(config.database.path, "/tmp/crm.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.erp, ErpConfig::default());

        clear_env();
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("DEALBRIDGE_DB_PATH", "/tmp/crm.db");
        std::env::set_var("DEALBRIDGE_DB_POOL_SIZE", "2");
        std::env::set_var("DEALBRIDGE_ERP_CONNECT_TIMEOUT", "30");
        std::env::set_var("DEALBRIDGE_ERP_MAX_POOL_SIZE", "4");
        std::env::set_var("DEALBRIDGE_ERP_ORDER_PREFIX", "CRM");
        std::env::set_var("DEALBRIDGE_ERP_CURRENCY", "CHF");
        std::env::set_var("DEALBRIDGE_ERP_CURRENCY_FACTOR", "0.95");
        std::env::set_var("DEALBRIDGE_ERP_LANGUAGE_ID", "2");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.database.pool_size, 2);
        assert_eq!(config.erp.connect_timeout_secs, 30);
        assert_eq!(config.erp.max_pool_size, 4);
        assert_eq!(config.erp.order_number_prefix, "CRM");
        assert_eq!(config.erp.currency_code, "CHF");
        assert_eq!(config.erp.currency_factor, Decimal::new(95, 2));
        assert_eq!(config.erp.language_id, 2);
        assert_eq!(config.erp.request_timeout_secs, 15);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let saved_db_path = std::env::var("DEALBRIDGE_DB_PATH").ok();
        std::env::remove_var("DEALBRIDGE_DB_PATH");

        let result = load_from_env();
        assert!(matches!(result, Err(DealBridgeError::Config(_))), "Should be a Config error");

        if let Some(val) = saved_db_path {
            std::env::set_var("DEALBRIDGE_DB_PATH", val);
        }
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("DEALBRIDGE_DB_PATH", "/tmp/crm.db");
        std::env::set_var("DEALBRIDGE_ERP_REQUEST_TIMEOUT", "soon");

        let err = load_from_env().unwrap_err();
        match err {
            DealBridgeError::Config(msg) => assert!(msg.contains("request timeout")),
            other => panic!("expected config error, got {:?}", other),
        }

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
            [database]
            path = "crm.db"
            pool_size = 3

            [erp]
            order_number_prefix = "CRM"
            currency_code = "CHF"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("toml config loaded");
        assert_eq!(config.database.path, "crm.db");
        assert_eq!(config.database.pool_size, 3);
        assert_eq!(config.erp.order_number_prefix, "CRM");
        assert_eq!(config.erp.max_pool_size, 10);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "database": { "path": "crm.db" },
            "erp": { "language_id": 2, "currency_factor": "1.08" }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("json config loaded");
        assert_eq!(config.erp.language_id, 2);
        assert_eq!(config.erp.currency_factor, Decimal::new(108, 2));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_missing_path() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/dealbridge.toml")));
        assert!(matches!(result, Err(DealBridgeError::Config(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = parse_config("path = 'x'", Path::new("config.yaml"));
        match result {
            Err(DealBridgeError::Config(msg)) => assert!(msg.contains("yaml")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
