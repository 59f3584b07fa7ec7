//! Application configuration structures
//!
//! Connection settings for the ERP database are deliberately absent here: they
//! live in the key/value settings store and the password lives in the OS
//! keychain. This config only carries process-level tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub erp: ErpConfig,
}

/// Local SQLite store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "dealbridge.db".to_string(), pool_size: default_pool_size() }
    }
}

fn default_pool_size() -> u32 {
    4
}

/// ERP connection tuning and order defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpConfig {
    /// Keychain service name under which passwords are stored.
    pub keychain_service: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_pool_size: u32,
    /// Timeout applied to both connect and probe during a connection test.
    pub test_timeout_secs: u64,
    pub order_number_prefix: String,
    pub currency_code: String,
    pub currency_factor: rust_decimal::Decimal,
    /// ERP language id used for article descriptions and the order header.
    pub language_id: i32,
    pub application_name: String,
}

impl Default for ErpConfig {
    fn default() -> Self {
        Self {
            keychain_service: constants::KEYCHAIN_SERVICE.to_string(),
            connect_timeout_secs: constants::LIVE_TIMEOUT_SECS,
            request_timeout_secs: constants::LIVE_TIMEOUT_SECS,
            max_pool_size: constants::LIVE_POOL_MAX_SIZE,
            test_timeout_secs: constants::TEST_TIMEOUT_SECS,
            order_number_prefix: constants::ORDER_NUMBER_PREFIX.to_string(),
            currency_code: "EUR".to_string(),
            currency_factor: rust_decimal::Decimal::ONE,
            language_id: 1,
            application_name: "DealBridge".to_string(),
        }
    }
}

impl ErpConfig {
    /// Pool limits for the shared, long-lived pool.
    #[must_use]
    pub fn live_limits(&self) -> PoolLimits {
        PoolLimits {
            max_size: self.max_pool_size.max(1),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            application_name: self.application_name.clone(),
        }
    }

    /// Pool limits for an isolated connection test.
    #[must_use]
    pub fn test_limits(&self) -> PoolLimits {
        let timeout = Duration::from_secs(self.test_timeout_secs);
        PoolLimits {
            max_size: 1,
            connect_timeout: timeout,
            request_timeout: timeout,
            application_name: self.application_name.clone(),
        }
    }
}

/// Size and timeout bounds for one ERP pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_size: u32,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub application_name: String,
}
