//! ERP reference data synchronization

pub mod ports;
pub mod queries;
pub mod service;

pub use service::ReferenceSyncService;
