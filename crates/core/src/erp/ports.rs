//! Port interfaces for the ERP database
//!
//! Statements carry a [`StatementKind`] tag next to their SQL text so that
//! logs and test doubles can tell the protocol steps apart without parsing
//! T-SQL.

use async_trait::async_trait;
use dealbridge_domain::{DealBridgeError, ReferenceKind, Result};
use rust_decimal::Decimal;

/// A bound parameter or a result column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Int(i32),
    BigInt(i64),
    Decimal(Decimal),
    Text(String),
    Bool(bool),
}

impl SqlValue {
    /// Text parameter that maps empty or missing strings to SQL `NULL`.
    pub fn opt_text(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(text) if !text.is_empty() => Self::Text(text.to_string()),
            _ => Self::Null,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::BigInt(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            Self::Int(v) => Some(Decimal::from(*v)),
            Self::BigInt(v) => Some(Decimal::from(*v)),
            _ => None,
        }
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Option<i32>> for SqlValue {
    fn from(value: Option<i32>) -> Self {
        value.map_or(Self::Null, Self::Int)
    }
}

/// One positional result row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlRow {
    values: Vec<SqlValue>,
}

impl SqlRow {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    #[must_use]
    pub fn get_i32(&self, index: usize) -> Option<i32> {
        self.get(index).and_then(SqlValue::as_i32)
    }

    #[must_use]
    pub fn get_str(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(SqlValue::as_str)
    }

    #[must_use]
    pub fn get_decimal(&self, index: usize) -> Option<Decimal> {
        self.get(index).and_then(SqlValue::as_decimal)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Which protocol step a statement belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Probe,
    FetchReference(ReferenceKind),
    CreateArticleList,
    FillArticleList,
    InsertHeader,
    InsertAddress,
    ResolveArticles,
    InsertPosition,
    RecalculateTotals,
    DropArticleList,
    SelectResult,
}

/// A tagged SQL statement with positional `@P1..@Pn` parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(kind: StatementKind, sql: impl Into<String>) -> Self {
        Self { kind, sql: sql.into(), params: Vec::new() }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<SqlValue>) -> Self {
        self.params = params;
        self
    }

    /// Parameterless statements run as plain batches, so objects they create
    /// (such as `#temp` tables) outlive the statement on the same session.
    #[must_use]
    pub fn is_batch(&self) -> bool {
        self.params.is_empty()
    }
}

/// One checked-out ERP connection
///
/// Dropping the session returns the connection to its pool. Callers are
/// responsible for pairing `begin` with `commit` or `rollback`.
#[async_trait]
pub trait ErpSession: Send {
    /// `SET XACT_ABORT ON; BEGIN TRANSACTION`
    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    /// Rolls back the open transaction, if any.
    async fn rollback(&mut self) -> Result<()>;

    /// Runs a statement and returns the affected row count.
    async fn execute(&mut self, statement: &Statement) -> Result<u64>;

    /// Runs a statement and collects the rows of its first result set.
    async fn query(&mut self, statement: &Statement) -> Result<Vec<SqlRow>>;
}

/// Hands out ERP sessions
#[async_trait]
pub trait ErpSessionSource: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn ErpSession>>;

    /// Told about failures observed while using a session, so that a broken
    /// shared pool can be discarded.
    async fn report_failure(&self, _error: &DealBridgeError) {}
}
