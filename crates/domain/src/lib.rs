//! # DealBridge Domain
//!
//! Business domain types and models for the CRM → ERP bridge.
//!
//! This crate contains:
//! - Connection, reference-data, customer and order types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Pure helpers (salutation splitting, order numbers)
//!
//! ## Architecture
//! - No dependencies on other DealBridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::salutation::{split_salutation, SalutationParts};
