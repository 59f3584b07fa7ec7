//! # DealBridge App
//!
//! Application layer - commands and dependency wiring.
//!
//! This crate contains:
//! - Commands called by the CRM's UI/IPC layer
//! - Application context (dependency injection)
//! - Tracing setup
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Commands never panic or return raw errors to the caller

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
