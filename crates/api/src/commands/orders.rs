//! Order placement command

use std::time::Instant;

use dealbridge_domain::{OrderInput, OrderResult};
use tracing::info;

use crate::utils::logging::log_command_execution;
use crate::AppContext;

/// Places an order in the ERP. Failures come back as
/// `{success: false, error}`.
pub async fn create_order(ctx: &AppContext, input: OrderInput) -> OrderResult {
    let command_name = "orders::create_order";
    let start = Instant::now();

    info!(
        command = command_name,
        customer = input.local_customer_id,
        lines = input.line_items.len(),
        "creating ERP order"
    );
    let result = ctx.orders.create_order(input).await;

    log_command_execution(command_name, start.elapsed(), result.success);
    result
}
