//! SQLite-backed CRM customer lookup.

use std::sync::Arc;

use async_trait::async_trait;
use dealbridge_core::CustomerDirectory;
use dealbridge_domain::{Customer, Result as DomainResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, LocalDbManager};

const CUSTOMER_COLUMNS: &str = "id, erp_customer_id, company, salutation, first_name, last_name, \
     street, postal_code, city, country, country_iso, phone, email";

/// Customers stored in the local `customers` table
pub struct SqliteCustomerDirectory {
    db: Arc<LocalDbManager>,
}

impl SqliteCustomerDirectory {
    pub fn new(db: Arc<LocalDbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace a customer record.
    pub async fn upsert(&self, customer: Customer) -> DomainResult<()> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            upsert_customer(&conn, &customer).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl CustomerDirectory for SqliteCustomerDirectory {
    async fn get_customer_by_id(&self, id: i64) -> DomainResult<Option<Customer>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<Customer>> {
            let conn = db.get_connection()?;
            query_customer(&conn, id).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

fn query_customer(conn: &Connection, id: i64) -> rusqlite::Result<Option<Customer>> {
    conn.query_row(
        &format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"),
        params![id],
        map_customer,
    )
    .optional()
}

fn upsert_customer(conn: &Connection, customer: &Customer) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().timestamp();
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO customers ({CUSTOMER_COLUMNS}, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
        ),
        params![
            customer.id,
            customer.erp_customer_id,
            customer.company,
            customer.salutation,
            customer.first_name,
            customer.last_name,
            customer.street,
            customer.postal_code,
            customer.city,
            customer.country,
            customer.country_iso,
            customer.phone,
            customer.email,
            now,
        ],
    )?;
    Ok(())
}

fn map_customer(row: &Row<'_>) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        erp_customer_id: row.get(1)?,
        company: row.get(2)?,
        salutation: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        street: row.get(6)?,
        postal_code: row.get(7)?,
        city: row.get(8)?,
        country: row.get(9)?,
        country_iso: row.get(10)?,
        phone: row.get(11)?,
        email: row.get(12)?,
    })
}
