//! Order placement against the in-memory ERP: atomicity, ordering and the
//! end-to-end happy path.

use std::str::FromStr;
use std::sync::Arc;

use dealbridge_core::testing::{FakeArticle, FakeErp, InMemoryCustomerDirectory};
use dealbridge_core::{OrderDefaults, OrderService, StatementKind};
use dealbridge_domain::utils::order_number::is_order_number;
use dealbridge_domain::{Customer, DealBridgeError, OrderInput, OrderLineInput};
use rust_decimal::Decimal;

const ARTICLE_A: i32 = 100;
const ARTICLE_B: i32 = 200;
const ARTICLE_C: i32 = 300;
const WIDGET: i32 = 900;

fn erp() -> FakeErp {
    FakeErp::new()
        .with_article(ARTICLE_A, FakeArticle::new("A-100", "Alpha", 19))
        .with_article(ARTICLE_B, FakeArticle::new("B-200", "Beta", 7))
        .with_article(ARTICLE_C, FakeArticle::new("C-300", "Gamma", 19))
        .with_article(WIDGET, FakeArticle::new("W-900", "Widget", 19))
}

fn customers() -> InMemoryCustomerDirectory {
    InMemoryCustomerDirectory::new().with_customer(Customer {
        id: 12,
        erp_customer_id: Some(501),
        company: Some("Muster GmbH".into()),
        salutation: Some("Frau Prof. Dr.".into()),
        first_name: Some("Erika".into()),
        last_name: Some("Musterfrau".into()),
        street: Some("Hauptstr. 1".into()),
        postal_code: Some("10115".into()),
        city: Some("Berlin".into()),
        country: Some("Deutschland".into()),
        country_iso: Some("DE".into()),
        ..Customer::default()
    })
}

fn service(erp: &FakeErp) -> OrderService {
    OrderService::new(Arc::new(erp.clone()), Arc::new(customers()), OrderDefaults::default())
}

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn order(lines: Vec<OrderLineInput>) -> OrderInput {
    OrderInput {
        local_customer_id: 12,
        legal_entity_id: Some(1),
        warehouse_id: Some(2),
        payment_method_id: Some(3),
        shipping_method_id: Some(4),
        line_items: lines,
    }
}

#[tokio::test]
async fn end_to_end_order_is_committed_with_generated_number() {
    let erp = erp();

    let result = service(&erp)
        .create_order(order(vec![OrderLineInput::new(i64::from(WIDGET), dec("2"), dec("19.99"))]))
        .await;

    assert!(result.success, "{:?}", result.error);
    let order_id = result.erp_order_id.unwrap();
    assert!(order_id > 0);
    let number = result.erp_order_number.unwrap();
    assert!(is_order_number("EXTERN", &number), "unexpected order number {number}");

    let committed = erp.committed_orders();
    assert_eq!(committed.len(), 1);
    let stored = &committed[0];
    assert_eq!(stored.id, order_id);
    assert_eq!(stored.erp_customer_id, 501);
    assert_eq!(
        (stored.legal_entity_id, stored.warehouse_id, stored.payment_method_id, stored.shipping_method_id),
        (1, 2, 3, 4)
    );
    assert_eq!(stored.currency_code, "EUR");
    assert!(stored.totals_recalculated);
    assert_eq!(stored.positions.len(), 1);
    assert_eq!(stored.positions[0].quantity, dec("2"));
    assert_eq!(stored.positions[0].unit_price_net, dec("19.99"));
    assert_eq!(stored.positions[0].tax_rate, Decimal::from(19));
}

#[tokio::test]
async fn addresses_are_billing_then_shipping_with_split_salutation() {
    let erp = erp();

    service(&erp)
        .create_order(order(vec![OrderLineInput::new(i64::from(WIDGET), dec("1"), dec("1"))]))
        .await;

    let addresses = &erp.committed_orders()[0].addresses;
    assert_eq!(addresses.len(), 2);
    assert_eq!(addresses[0].address_type, 1);
    assert_eq!(addresses[1].address_type, 0);
    assert_eq!(addresses[0].salutation.as_deref(), Some("Frau"));
    assert_eq!(addresses[0].title.as_deref(), Some("Prof. Dr."));
    assert_eq!(addresses[1].last_name.as_deref(), Some("Musterfrau"));
}

#[tokio::test]
async fn positions_keep_input_order() {
    let erp = erp();
    let lines = vec![
        OrderLineInput::new(i64::from(ARTICLE_C), dec("1"), dec("3")),
        OrderLineInput::new(i64::from(ARTICLE_A), dec("1"), dec("1")),
        OrderLineInput::new(i64::from(ARTICLE_B), dec("1"), dec("2")),
    ];

    let result = service(&erp).create_order(order(lines)).await;

    assert!(result.success, "{:?}", result.error);
    let positions = &erp.committed_orders()[0].positions;
    let articles: Vec<i32> = positions.iter().map(|p| p.erp_article_id).collect();
    assert_eq!(articles, vec![ARTICLE_C, ARTICLE_A, ARTICLE_B]);
    let sequence: Vec<i32> = positions.iter().map(|p| p.sequence_number).collect();
    assert_eq!(sequence, vec![1, 2, 3]);
}

#[tokio::test]
async fn failure_mid_position_loop_leaves_nothing_behind() {
    let erp = erp();
    erp.fail_on(
        StatementKind::InsertPosition,
        2,
        DealBridgeError::Transaction("String or binary data would be truncated.".into()),
    );
    let lines = vec![
        OrderLineInput::new(i64::from(ARTICLE_A), dec("1"), dec("1")),
        OrderLineInput::new(i64::from(ARTICLE_B), dec("1"), dec("1")),
        OrderLineInput::new(i64::from(ARTICLE_C), dec("1"), dec("1")),
    ];

    let result = service(&erp).create_order(order(lines)).await;

    assert!(!result.success);
    assert!(result.erp_order_id.is_none());
    assert!(result.erp_order_number.is_none());
    assert!(result.error.unwrap().contains("truncated"));
    assert!(erp.committed_orders().is_empty());
    assert_eq!(erp.rollback_count(), 1);
    assert!(!erp.executed_kinds().contains(&StatementKind::RecalculateTotals));
}

#[tokio::test]
async fn invalid_lines_are_dropped_not_fatal() {
    let erp = erp();
    let lines = vec![
        OrderLineInput { erp_article_id: Some(-1), ..OrderLineInput::new(1, dec("1"), dec("1")) },
        OrderLineInput::new(i64::from(ARTICLE_B), dec("0.5"), dec("4.20")),
        OrderLineInput { unit_price: None, ..OrderLineInput::new(i64::from(ARTICLE_A), dec("1"), dec("1")) },
    ];

    let result = service(&erp).create_order(order(lines)).await;

    assert!(result.success, "{:?}", result.error);
    let positions = &erp.committed_orders()[0].positions;
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].erp_article_id, ARTICLE_B);
    assert_eq!(positions[0].sequence_number, 1);
}

#[tokio::test]
async fn large_orders_fill_the_article_list_in_chunks() {
    let erp = erp();
    let lines = (0..1_200)
        .map(|_| OrderLineInput::new(i64::from(WIDGET), dec("1"), dec("1")))
        .collect();

    let result = service(&erp).create_order(order(lines)).await;

    assert!(result.success, "{:?}", result.error);
    let fills = erp
        .executed_kinds()
        .into_iter()
        .filter(|kind| *kind == StatementKind::FillArticleList)
        .count();
    assert_eq!(fills, 3);
    assert_eq!(erp.committed_orders()[0].positions.len(), 1_200);
}

#[tokio::test]
async fn consecutive_orders_get_distinct_ids() {
    let erp = erp();
    let service = service(&erp);
    let line = || vec![OrderLineInput::new(i64::from(WIDGET), dec("1"), dec("1"))];

    let first = service.create_order(order(line())).await;
    let second = service.create_order(order(line())).await;

    assert_ne!(first.erp_order_id, second.erp_order_id);
    assert_eq!(erp.acquire_count(), 2);
}
