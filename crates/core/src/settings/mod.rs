//! ERP connection settings and credential handling

pub mod ports;
pub mod service;

pub use service::ConnectionSettingsService;
