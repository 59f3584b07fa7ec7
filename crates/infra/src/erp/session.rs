//! ERP session over one pooled TDS connection

use std::time::Duration;

use async_trait::async_trait;
use bb8::PooledConnection;
use dealbridge_core::erp::{ErpSession, SqlRow, SqlValue, Statement};
use dealbridge_domain::{DealBridgeError, Result};
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, Query, Row};
use tracing::{debug, warn};

use super::connection::TdsConnectionManager;
use super::error::TdsError;
use crate::errors::InfraError;

const BEGIN: &str = "SET XACT_ABORT ON; BEGIN TRANSACTION";
const COMMIT: &str = "COMMIT TRANSACTION";
const ROLLBACK: &str = "IF @@TRANCOUNT > 0 ROLLBACK TRANSACTION";

/// A checked-out connection. Every statement is bounded by the request
/// timeout; parameterless statements run as plain batches so session-scoped
/// temporary tables survive between calls.
pub struct TiberiusSession {
    conn: PooledConnection<'static, TdsConnectionManager>,
    request_timeout: Duration,
}

impl TiberiusSession {
    pub fn new(
        conn: PooledConnection<'static, TdsConnectionManager>,
        request_timeout: Duration,
    ) -> Self {
        Self { conn, request_timeout }
    }

    async fn batch(&mut self, sql: &str) -> Result<()> {
        let limit = self.request_timeout;
        let client = &mut self.conn.client;
        let outcome = tokio::time::timeout(limit, async move {
            client.simple_query(sql).await?.into_results().await?;
            Ok::<_, tiberius::error::Error>(())
        })
        .await;
        self.settle(outcome)
    }

    /// Maps a timed statement outcome, flagging the connection on transport
    /// failures so the pool discards it.
    fn settle<T>(
        &mut self,
        outcome: std::result::Result<
            std::result::Result<T, tiberius::error::Error>,
            tokio::time::error::Elapsed,
        >,
    ) -> Result<T> {
        let err: DealBridgeError = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => InfraError::from(err).into(),
            Err(_) => InfraError::from(TdsError::Timeout(self.request_timeout)).into(),
        };
        if err.is_connectivity() {
            self.conn.broken = true;
        }
        Err(err)
    }
}

#[async_trait]
impl ErpSession for TiberiusSession {
    async fn begin(&mut self) -> Result<()> {
        self.batch(BEGIN).await
    }

    async fn commit(&mut self) -> Result<()> {
        self.batch(COMMIT).await
    }

    async fn rollback(&mut self) -> Result<()> {
        let result = self.batch(ROLLBACK).await;
        if result.is_err() {
            // The server aborts the transaction itself once the link drops.
            warn!("rollback did not reach the ERP; discarding connection");
            self.conn.broken = true;
        }
        result
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        debug!(kind = ?statement.kind, params = statement.params.len(), "executing ERP statement");
        let limit = self.request_timeout;
        let client = &mut self.conn.client;
        let outcome = tokio::time::timeout(limit, async move {
            if statement.is_batch() {
                client.simple_query(statement.sql.as_str()).await?.into_results().await?;
                Ok::<_, tiberius::error::Error>(0)
            } else {
                Ok(bind(statement).execute(client).await?.total())
            }
        })
        .await;
        self.settle(outcome)
    }

    async fn query(&mut self, statement: &Statement) -> Result<Vec<SqlRow>> {
        debug!(kind = ?statement.kind, params = statement.params.len(), "querying ERP");
        let limit = self.request_timeout;
        let client = &mut self.conn.client;
        let outcome = tokio::time::timeout(limit, async move {
            let stream = if statement.is_batch() {
                client.simple_query(statement.sql.as_str()).await?
            } else {
                bind(statement).query(client).await?
            };
            let rows = stream.into_first_result().await?;
            Ok::<_, tiberius::error::Error>(rows.into_iter().map(convert_row).collect::<Vec<_>>())
        })
        .await;
        self.settle(outcome)
    }
}

/// Binds statement parameters positionally to `@P1..@Pn`.
fn bind(statement: &Statement) -> Query<'_> {
    let mut query = Query::new(statement.sql.as_str());
    for param in &statement.params {
        match param {
            SqlValue::Null => query.bind(Option::<&str>::None),
            SqlValue::Int(value) => query.bind(*value),
            SqlValue::BigInt(value) => query.bind(*value),
            SqlValue::Decimal(value) => query.bind(Numeric::new_with_scale(value.mantissa(), value.scale() as u8)),
            SqlValue::Text(value) => query.bind(value.as_str()),
            SqlValue::Bool(value) => query.bind(*value),
        }
    }
    query
}

fn convert_row(row: Row) -> SqlRow {
    SqlRow::new(row.into_iter().map(column_value).collect())
}

fn column_value(data: ColumnData<'static>) -> SqlValue {
    match data {
        ColumnData::U8(value) => value.map_or(SqlValue::Null, |v| SqlValue::Int(i32::from(v))),
        ColumnData::I16(value) => value.map_or(SqlValue::Null, |v| SqlValue::Int(i32::from(v))),
        ColumnData::I32(value) => value.map_or(SqlValue::Null, SqlValue::Int),
        ColumnData::I64(value) => value.map_or(SqlValue::Null, SqlValue::BigInt),
        ColumnData::Bit(value) => value.map_or(SqlValue::Null, SqlValue::Bool),
        ColumnData::String(value) => {
            value.map_or(SqlValue::Null, |v| SqlValue::Text(v.into_owned()))
        }
        ColumnData::Numeric(value) => value
            .and_then(|n| Decimal::try_from_i128_with_scale(n.value(), u32::from(n.scale())).ok())
            .map_or(SqlValue::Null, SqlValue::Decimal),
        ColumnData::F32(value) => value
            .and_then(|v| Decimal::try_from(v).ok())
            .map_or(SqlValue::Null, SqlValue::Decimal),
        ColumnData::F64(value) => value
            .and_then(|v| Decimal::try_from(v).ok())
            .map_or(SqlValue::Null, SqlValue::Decimal),
        _ => SqlValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use tiberius::numeric::Numeric;

    use super::*;

    #[test]
    fn numeric_columns_keep_their_scale() {
        let value = column_value(ColumnData::Numeric(Some(Numeric::new_with_scale(1999, 2))));
        assert_eq!(value, SqlValue::Decimal(Decimal::new(1999, 2)));
    }

    #[test]
    fn small_integers_widen_to_i32() {
        assert_eq!(column_value(ColumnData::U8(Some(7))), SqlValue::Int(7));
        assert_eq!(column_value(ColumnData::I16(Some(-3))), SqlValue::Int(-3));
        assert_eq!(column_value(ColumnData::I64(Some(1 << 40))), SqlValue::BigInt(1 << 40));
    }

    #[test]
    fn nulls_stay_null_for_every_type() {
        assert!(column_value(ColumnData::I32(None)).is_null());
        assert!(column_value(ColumnData::String(None)).is_null());
        assert!(column_value(ColumnData::Numeric(None)).is_null());
    }

    #[test]
    fn strings_are_owned() {
        let value = column_value(ColumnData::String(Some(Cow::Borrowed("AU-2024-0001"))));
        assert_eq!(value.as_str(), Some("AU-2024-0001"));
    }
}
