//! Order placement: script building and transactional execution

pub mod ports;
pub mod script;
pub mod service;

pub use script::OrderScript;
pub use service::{OrderDefaults, OrderService};
