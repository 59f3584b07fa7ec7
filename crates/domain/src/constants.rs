//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! application.

// Connection pool bounds
pub const LIVE_TIMEOUT_SECS: u64 = 15;
pub const TEST_TIMEOUT_SECS: u64 = 5;
pub const LIVE_POOL_MAX_SIZE: u32 = 10;

// Keychain
pub const KEYCHAIN_SERVICE: &str = "DealBridge.erp";

// Order numbers: EXTERN-20261019-N0421
pub const ORDER_NUMBER_PREFIX: &str = "EXTERN";
pub const ORDER_NUMBER_SUFFIX_MARKER: char = 'N';

// Address types in the ERP order address table
pub const ADDRESS_TYPE_BILLING: i32 = 1;
pub const ADDRESS_TYPE_SHIPPING: i32 = 0;

// SQL Server caps a request at 2100 parameters; four per article row.
pub const ARTICLE_ROWS_PER_INSERT: usize = 500;
