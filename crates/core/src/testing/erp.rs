//! In-memory ERP double
//!
//! Interprets statements by their [`StatementKind`] tag instead of parsing
//! SQL. Writes made inside a transaction are staged per session and only
//! become visible through [`FakeErp::committed_orders`] on commit.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dealbridge_domain::{
    ArticleListEntry, DealBridgeError, ReferenceEntity, ReferenceKind, Result,
};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::erp::{ErpSession, ErpSessionSource, SqlRow, SqlValue, Statement, StatementKind};

/// Article known to the fake ERP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeArticle {
    pub number: String,
    pub name: String,
    pub tax_class_id: Option<i32>,
    pub tax_rate: Decimal,
}

impl FakeArticle {
    pub fn new(number: &str, name: &str, tax_rate: impl Into<Decimal>) -> Self {
        Self {
            number: number.to_string(),
            name: name.to_string(),
            tax_class_id: Some(1),
            tax_rate: tax_rate.into(),
        }
    }
}

/// Committed order as stored by the fake ERP
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeOrder {
    pub id: i32,
    pub number: String,
    pub erp_customer_id: i32,
    pub legal_entity_id: i32,
    pub warehouse_id: i32,
    pub payment_method_id: i32,
    pub shipping_method_id: i32,
    pub currency_code: String,
    pub addresses: Vec<FakeAddress>,
    pub positions: Vec<FakePosition>,
    pub totals_recalculated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeAddress {
    pub address_type: i32,
    pub salutation: Option<String>,
    pub title: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakePosition {
    pub erp_article_id: i32,
    pub article_number: String,
    pub quantity: Decimal,
    pub unit_price_net: Decimal,
    pub tax_rate: Decimal,
    pub sequence_number: i32,
}

struct InjectedFailure {
    kind: StatementKind,
    occurrence: usize,
    error: DealBridgeError,
}

#[derive(Default)]
struct ErpState {
    articles: HashMap<i32, FakeArticle>,
    references: HashMap<ReferenceKind, Vec<ReferenceEntity>>,
    committed: Vec<FakeOrder>,
    next_order_id: i32,
    acquire_count: usize,
    reported_failures: usize,
    rollback_count: usize,
    executed: Vec<Statement>,
    seen: HashMap<StatementKind, usize>,
    failures: Vec<InjectedFailure>,
    fail_acquire: Option<DealBridgeError>,
    fail_rollback: Option<DealBridgeError>,
}

/// Shared fake ERP; clones observe the same state
#[derive(Clone, Default)]
pub struct FakeErp {
    state: Arc<Mutex<ErpState>>,
}

impl FakeErp {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_article(self, erp_article_id: i32, article: FakeArticle) -> Self {
        self.state.lock().articles.insert(erp_article_id, article);
        self
    }

    #[must_use]
    pub fn with_reference(self, kind: ReferenceKind, rows: Vec<ReferenceEntity>) -> Self {
        self.state.lock().references.insert(kind, rows);
        self
    }

    /// Replaces the rows of a lookup table.
    pub fn set_reference(&self, kind: ReferenceKind, rows: Vec<ReferenceEntity>) {
        self.state.lock().references.insert(kind, rows);
    }

    /// Fails the `occurrence`-th (1-based) statement of `kind`.
    pub fn fail_on(&self, kind: StatementKind, occurrence: usize, error: DealBridgeError) {
        self.state.lock().failures.push(InjectedFailure { kind, occurrence, error });
    }

    /// Fails every `acquire` until [`FakeErp::clear_acquire_failure`].
    pub fn fail_acquire(&self, error: DealBridgeError) {
        self.state.lock().fail_acquire = Some(error);
    }

    pub fn clear_acquire_failure(&self) {
        self.state.lock().fail_acquire = None;
    }

    pub fn fail_rollback(&self, error: DealBridgeError) {
        self.state.lock().fail_rollback = Some(error);
    }

    #[must_use]
    pub fn acquire_count(&self) -> usize {
        self.state.lock().acquire_count
    }

    #[must_use]
    pub fn reported_failures(&self) -> usize {
        self.state.lock().reported_failures
    }

    #[must_use]
    pub fn rollback_count(&self) -> usize {
        self.state.lock().rollback_count
    }

    #[must_use]
    pub fn committed_orders(&self) -> Vec<FakeOrder> {
        self.state.lock().committed.clone()
    }

    #[must_use]
    pub fn executed_statements(&self) -> Vec<Statement> {
        self.state.lock().executed.clone()
    }

    #[must_use]
    pub fn executed_kinds(&self) -> Vec<StatementKind> {
        self.state.lock().executed.iter().map(|statement| statement.kind).collect()
    }
}

#[async_trait]
impl ErpSessionSource for FakeErp {
    async fn acquire(&self) -> Result<Box<dyn ErpSession>> {
        let mut state = self.state.lock();
        state.acquire_count += 1;
        if let Some(error) = state.fail_acquire.clone() {
            return Err(error);
        }
        Ok(Box::new(FakeSession { state: Arc::clone(&self.state), tx: None }))
    }

    async fn report_failure(&self, _error: &DealBridgeError) {
        self.state.lock().reported_failures += 1;
    }
}

#[derive(Default)]
struct StagedWrites {
    article_list: Option<Vec<ArticleListEntry>>,
    order: Option<FakeOrder>,
}

struct FakeSession {
    state: Arc<Mutex<ErpState>>,
    tx: Option<StagedWrites>,
}

impl FakeSession {
    fn run(&mut self, statement: &Statement) -> Result<(u64, Vec<SqlRow>)> {
        let mut state = self.state.lock();
        state.executed.push(statement.clone());
        let seen = {
            let n = state.seen.entry(statement.kind).or_insert(0);
            *n += 1;
            *n
        };
        if let Some(failure) =
            state.failures.iter().find(|f| f.kind == statement.kind && f.occurrence == seen)
        {
            return Err(failure.error.clone());
        }

        match statement.kind {
            StatementKind::Probe => Ok((1, vec![SqlRow::new(vec![SqlValue::Int(1)])])),
            StatementKind::FetchReference(kind) => {
                let rows: Vec<SqlRow> = state
                    .references
                    .get(&kind)
                    .map(|rows| {
                        rows.iter()
                            .map(|r| {
                                SqlRow::new(vec![
                                    SqlValue::Int(r.erp_id),
                                    SqlValue::Text(r.name.clone()),
                                ])
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Ok((count(rows.len()), rows))
            }
            kind => {
                let tx = self.tx.as_mut().ok_or_else(|| {
                    DealBridgeError::Transaction("statement outside of a transaction".to_string())
                })?;
                apply_write(&mut state, tx, kind, &statement.params)
            }
        }
    }
}

fn apply_write(
    state: &mut ErpState,
    tx: &mut StagedWrites,
    kind: StatementKind,
    params: &[SqlValue],
) -> Result<(u64, Vec<SqlRow>)> {
    match kind {
        StatementKind::CreateArticleList => {
            tx.article_list = Some(Vec::new());
            Ok((0, Vec::new()))
        }
        StatementKind::FillArticleList => {
            let list = tx.article_list.as_mut().ok_or_else(missing_article_list)?;
            for row in params.chunks(4) {
                list.push(ArticleListEntry {
                    erp_article_id: int(row, 0)?,
                    quantity: decimal(row, 1)?,
                    unit_price_net: decimal(row, 2)?,
                    sequence_number: int(row, 3)?,
                });
            }
            Ok((count(params.len() / 4), Vec::new()))
        }
        StatementKind::InsertHeader => {
            state.next_order_id += 1;
            let id = state.next_order_id;
            tx.order = Some(FakeOrder {
                id,
                number: text(params, 8).unwrap_or_default(),
                erp_customer_id: int(params, 0)?,
                legal_entity_id: int(params, 1)?,
                warehouse_id: int(params, 2)?,
                payment_method_id: int(params, 3)?,
                shipping_method_id: int(params, 4)?,
                currency_code: text(params, 6).unwrap_or_default(),
                addresses: Vec::new(),
                positions: Vec::new(),
                totals_recalculated: false,
            });
            Ok((1, vec![SqlRow::new(vec![SqlValue::Int(id)])]))
        }
        StatementKind::InsertAddress => {
            let order = staged_order(tx, params)?;
            order.addresses.push(FakeAddress {
                address_type: int(params, 2)?,
                salutation: text(params, 4),
                title: text(params, 5),
                last_name: text(params, 7),
            });
            Ok((1, Vec::new()))
        }
        StatementKind::ResolveArticles => {
            let mut list = tx.article_list.clone().ok_or_else(missing_article_list)?;
            list.sort_by_key(|entry| entry.sequence_number);
            let rows: Vec<SqlRow> = list
                .iter()
                .map(|entry| {
                    let article = state.articles.get(&entry.erp_article_id);
                    SqlRow::new(vec![
                        SqlValue::Int(entry.sequence_number),
                        SqlValue::Int(entry.erp_article_id),
                        article.map_or(SqlValue::Null, |a| SqlValue::Text(a.number.clone())),
                        article.map_or(SqlValue::Null, |a| SqlValue::Text(a.name.clone())),
                        SqlValue::from(article.and_then(|a| a.tax_class_id)),
                        SqlValue::Decimal(article.map_or(Decimal::ZERO, |a| a.tax_rate)),
                        SqlValue::Decimal(entry.quantity),
                        SqlValue::Decimal(entry.unit_price_net),
                    ])
                })
                .collect();
            Ok((count(rows.len()), rows))
        }
        StatementKind::InsertPosition => {
            let order = staged_order(tx, params)?;
            order.positions.push(FakePosition {
                erp_article_id: int(params, 1)?,
                article_number: text(params, 2).unwrap_or_default(),
                quantity: decimal(params, 4)?,
                unit_price_net: decimal(params, 5)?,
                tax_rate: decimal(params, 6)?,
                sequence_number: int(params, 8)?,
            });
            Ok((1, Vec::new()))
        }
        StatementKind::RecalculateTotals => {
            staged_order(tx, params)?.totals_recalculated = true;
            Ok((1, Vec::new()))
        }
        StatementKind::DropArticleList => {
            tx.article_list.take().ok_or_else(missing_article_list)?;
            Ok((0, Vec::new()))
        }
        StatementKind::SelectResult => {
            let order = staged_order(tx, params)?;
            let row = SqlRow::new(vec![SqlValue::Int(order.id), SqlValue::Text(order.number.clone())]);
            Ok((1, vec![row]))
        }
        StatementKind::Probe | StatementKind::FetchReference(_) => Ok((0, Vec::new())),
    }
}

fn staged_order<'a>(tx: &'a mut StagedWrites, params: &[SqlValue]) -> Result<&'a mut FakeOrder> {
    let id = int(params, 0)?;
    tx.order.as_mut().filter(|order| order.id == id).ok_or_else(|| {
        DealBridgeError::Transaction(format!("order {id} does not exist in this transaction"))
    })
}

fn missing_article_list() -> DealBridgeError {
    DealBridgeError::Transaction("Invalid object name '#ArticleList'.".to_string())
}

fn int(params: &[SqlValue], index: usize) -> Result<i32> {
    params.get(index).and_then(SqlValue::as_i32).ok_or_else(|| bad_param(index))
}

fn decimal(params: &[SqlValue], index: usize) -> Result<Decimal> {
    params.get(index).and_then(SqlValue::as_decimal).ok_or_else(|| bad_param(index))
}

fn text(params: &[SqlValue], index: usize) -> Option<String> {
    params.get(index).and_then(SqlValue::as_str).map(str::to_string)
}

fn bad_param(index: usize) -> DealBridgeError {
    DealBridgeError::Transaction(format!("unexpected value for parameter @P{}", index + 1))
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[async_trait]
impl ErpSession for FakeSession {
    async fn begin(&mut self) -> Result<()> {
        self.tx = Some(StagedWrites::default());
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        let staged = self.tx.take().ok_or_else(|| {
            DealBridgeError::Transaction(
                "The COMMIT TRANSACTION request has no corresponding BEGIN TRANSACTION."
                    .to_string(),
            )
        })?;
        if let Some(order) = staged.order {
            self.state.lock().committed.push(order);
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.tx = None;
        let mut state = self.state.lock();
        state.rollback_count += 1;
        match state.fail_rollback.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        self.run(statement).map(|(affected, _)| affected)
    }

    async fn query(&mut self, statement: &Statement) -> Result<Vec<SqlRow>> {
        self.run(statement).map(|(_, rows)| rows)
    }
}
