//! Order service - core business logic
//!
//! Turns a CRM deal into an ERP order. Validation happens before any
//! database contact; everything after that runs inside one explicit ERP
//! transaction that is rolled back on any failure.

use std::sync::Arc;

use chrono::Local;
use dealbridge_domain::utils::order_number::format_order_number;
use dealbridge_domain::{
    ArticleListEntry, Customer, DealBridgeError, ErpConfig, OrderInput, OrderResult, OrderStage,
    Result,
};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use super::ports::CustomerDirectory;
use super::script::{OrderHeader, OrderScript};
use crate::erp::{ErpSession, ErpSessionSource};

/// Per-installation values written into every order header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDefaults {
    pub order_number_prefix: String,
    pub currency_code: String,
    pub currency_factor: Decimal,
    pub language_id: i32,
}

impl From<&ErpConfig> for OrderDefaults {
    fn from(config: &ErpConfig) -> Self {
        Self {
            order_number_prefix: config.order_number_prefix.clone(),
            currency_code: config.currency_code.clone(),
            currency_factor: config.currency_factor,
            language_id: config.language_id,
        }
    }
}

impl Default for OrderDefaults {
    fn default() -> Self {
        Self::from(&ErpConfig::default())
    }
}

/// Order placement service
pub struct OrderService {
    erp: Arc<dyn ErpSessionSource>,
    customers: Arc<dyn CustomerDirectory>,
    defaults: OrderDefaults,
}

impl OrderService {
    pub fn new(
        erp: Arc<dyn ErpSessionSource>,
        customers: Arc<dyn CustomerDirectory>,
        defaults: OrderDefaults,
    ) -> Self {
        Self { erp, customers, defaults }
    }

    /// Places an order. Never fails: every error becomes a failed result.
    #[instrument(skip_all, fields(customer = input.local_customer_id, lines = input.line_items.len()))]
    pub async fn create_order(&self, input: OrderInput) -> OrderResult {
        match self.place_order(&input).await {
            Ok((order_id, order_number)) => {
                transition(OrderStage::Committed);
                info!(erp_order_id = order_id, order_number = %order_number, "order committed");
                OrderResult::created(order_id, order_number)
            }
            Err(err) => {
                transition(OrderStage::Failed);
                error!(error = %err, "order placement failed");
                OrderResult::failed(err.to_string())
            }
        }
    }

    async fn place_order(&self, input: &OrderInput) -> Result<(i32, String)> {
        transition(OrderStage::Validating);
        let (customer, header, articles) = self.validate(input).await?;

        transition(OrderStage::BuildingScript);
        let script = OrderScript::new(header, customer, articles);

        transition(OrderStage::Executing);
        let mut session = match self.erp.acquire().await {
            Ok(session) => session,
            Err(err) => {
                self.erp.report_failure(&err).await;
                return Err(err);
            }
        };

        match run_script(session.as_mut(), &script).await {
            Ok(created) => Ok(created),
            Err(err) => {
                transition(OrderStage::RollingBack);
                if let Err(rollback_err) = session.rollback().await {
                    warn!(error = %rollback_err, "rollback failed; reporting original error");
                }
                self.erp.report_failure(&err).await;
                Err(err)
            }
        }
    }

    async fn validate(
        &self,
        input: &OrderInput,
    ) -> Result<(Customer, OrderHeader, Vec<ArticleListEntry>)> {
        let mut missing = Vec::new();
        let mut require = |value: Option<i32>, name: &'static str| {
            let id = value.filter(|id| *id > 0);
            if id.is_none() {
                missing.push(name);
            }
            id.unwrap_or_default()
        };
        let legal_entity_id = require(input.legal_entity_id, "legal entity");
        let warehouse_id = require(input.warehouse_id, "warehouse");
        let payment_method_id = require(input.payment_method_id, "payment method");
        let shipping_method_id = require(input.shipping_method_id, "shipping method");
        if !missing.is_empty() {
            return Err(DealBridgeError::Config(format!(
                "missing ERP selection: {}",
                missing.join(", ")
            )));
        }

        let customer =
            self.customers.get_customer_by_id(input.local_customer_id).await?.ok_or_else(|| {
                DealBridgeError::NotFound(format!("customer {}", input.local_customer_id))
            })?;
        let erp_customer_id = customer.linked_erp_id().ok_or_else(|| {
            DealBridgeError::Validation(format!(
                "customer {} is not linked to an ERP customer",
                customer.id
            ))
        })?;

        let articles = input.article_list();
        if articles.is_empty() {
            return Err(DealBridgeError::Validation("order has no valid products".to_string()));
        }

        let header = OrderHeader {
            erp_customer_id,
            legal_entity_id,
            warehouse_id,
            payment_method_id,
            shipping_method_id,
            language_id: self.defaults.language_id,
            currency_code: self.defaults.currency_code.clone(),
            currency_factor: self.defaults.currency_factor,
            order_number: self.next_order_number(),
        };

        Ok((customer, header, articles))
    }

    fn next_order_number(&self) -> String {
        let suffix = rand::thread_rng().gen_range(0..10_000);
        format_order_number(&self.defaults.order_number_prefix, Local::now().date_naive(), suffix)
    }
}

async fn run_script(session: &mut dyn ErpSession, script: &OrderScript) -> Result<(i32, String)> {
    session.begin().await?;

    session.execute(&script.create_article_list()).await?;
    for statement in script.fill_article_list() {
        session.execute(&statement).await?;
    }

    let order_id = OrderScript::parse_order_id(&session.query(&script.insert_header()).await?)?;

    for statement in script.insert_addresses(order_id) {
        session.execute(&statement).await?;
    }

    let resolved = script.parse_resolved(&session.query(&script.resolve_articles()).await?)?;
    for article in &resolved {
        session.execute(&script.insert_position(order_id, article)).await?;
    }

    session.execute(&script.recalculate_totals(order_id)).await?;
    session.execute(&script.drop_article_list()).await?;
    let created = OrderScript::parse_result(&session.query(&script.select_result(order_id)).await?)?;

    session.commit().await?;
    Ok(created)
}

fn transition(stage: OrderStage) {
    info!(stage = %stage, "order stage");
}
