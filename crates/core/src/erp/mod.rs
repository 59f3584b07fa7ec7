//! ERP database access boundary
//!
//! The ERP is reached only through [`ports::ErpSession`]: a single pooled
//! connection that runs tagged, parameterized statements. Adapters live in
//! the infrastructure crate.

pub mod ports;

pub use ports::{ErpSession, ErpSessionSource, SqlRow, SqlValue, Statement, StatementKind};
