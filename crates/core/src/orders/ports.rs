//! Port interfaces for order placement

use async_trait::async_trait;
use dealbridge_domain::{Customer, Result};

/// Read-only view of the CRM's local customer table
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn get_customer_by_id(&self, id: i64) -> Result<Option<Customer>>;
}
