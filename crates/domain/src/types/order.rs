//! Order placement input, transaction-scoped rows and results

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::impl_domain_enum_conversions;

/// Order request from the CRM deal screen.
///
/// ERP ids are optional on the wire so that a missing picker value surfaces
/// as a configuration error instead of a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    #[serde(alias = "localCustomerReference")]
    pub local_customer_id: i64,
    pub legal_entity_id: Option<i32>,
    pub warehouse_id: Option<i32>,
    pub payment_method_id: Option<i32>,
    pub shipping_method_id: Option<i32>,
    #[serde(default)]
    pub line_items: Vec<OrderLineInput>,
}

/// One requested order line. Lines that are incomplete or non-numeric are
/// dropped during validation rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    #[serde(default)]
    pub erp_article_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub quantity: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub unit_price: Option<Decimal>,
}

impl OrderLineInput {
    pub fn new(erp_article_id: i64, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            erp_article_id: Some(erp_article_id),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        }
    }
}

impl OrderInput {
    /// Valid lines as numbered article-list rows, in input order.
    ///
    /// A line is kept when its article id is a strictly positive ERP key and
    /// both quantity and unit price are present. Sequence numbers are 1-based
    /// and count kept lines only.
    #[must_use]
    pub fn article_list(&self) -> Vec<ArticleListEntry> {
        self.line_items
            .iter()
            .filter_map(|line| {
                let article = line.erp_article_id.and_then(|id| i32::try_from(id).ok())?;
                if article <= 0 {
                    return None;
                }
                Some((article, line.quantity?, line.unit_price?))
            })
            .enumerate()
            .map(|(index, (erp_article_id, quantity, unit_price_net))| ArticleListEntry {
                erp_article_id,
                quantity,
                unit_price_net,
                sequence_number: i32::try_from(index + 1).unwrap_or(i32::MAX),
            })
            .collect()
    }
}

/// Row of the transaction-scoped article list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleListEntry {
    pub erp_article_id: i32,
    pub quantity: Decimal,
    pub unit_price_net: Decimal,
    pub sequence_number: i32,
}

/// Article metadata resolved inside the ERP for one article-list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArticle {
    pub sequence_number: i32,
    pub erp_article_id: i32,
    pub article_number: String,
    pub description: String,
    pub tax_class_id: Option<i32>,
    pub tax_rate: Decimal,
    pub quantity: Decimal,
    pub unit_price_net: Decimal,
}

/// Result of one `create_order` call. Either both identifiers are set or
/// neither is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_order_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erp_order_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OrderResult {
    pub fn created(erp_order_id: i32, erp_order_number: impl Into<String>) -> Self {
        Self {
            success: true,
            erp_order_id: Some(erp_order_id),
            erp_order_number: Some(erp_order_number.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, erp_order_id: None, erp_order_number: None, error: Some(error.into()) }
    }
}

/// Stages of the order-placement protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStage {
    Validating,
    BuildingScript,
    Executing,
    Committed,
    RollingBack,
    Failed,
}

impl_domain_enum_conversions!(OrderStage {
    Validating => "validating",
    BuildingScript => "building_script",
    Executing => "executing",
    Committed => "committed",
    RollingBack => "rolling_back",
    Failed => "failed",
});

fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => Decimal::from_str(&number.to_string())
            .or_else(|_| Decimal::from_scientific(&number.to_string()))
            .ok(),
        Some(serde_json::Value::String(text)) => Decimal::from_str(text.trim()).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(article: Option<i64>, quantity: Option<&str>, price: Option<&str>) -> OrderLineInput {
        OrderLineInput {
            erp_article_id: article,
            quantity: quantity.map(|q| Decimal::from_str(q).unwrap()),
            unit_price: price.map(|p| Decimal::from_str(p).unwrap()),
        }
    }

    #[test]
    fn article_list_drops_invalid_lines_and_numbers_from_one() {
        let input = OrderInput {
            local_customer_id: 7,
            line_items: vec![
                line(Some(0), Some("1"), Some("2.50")),
                line(Some(300), Some("2"), Some("19.99")),
                line(Some(-4), Some("1"), Some("1")),
                line(Some(100), None, Some("1")),
                line(Some(200), Some("1.5"), None),
                line(None, Some("1"), Some("1")),
                line(Some(100), Some("3"), Some("0.10")),
            ],
            ..OrderInput::default()
        };

        let entries = input.article_list();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].erp_article_id, 300);
        assert_eq!(entries[0].sequence_number, 1);
        assert_eq!(entries[1].erp_article_id, 100);
        assert_eq!(entries[1].sequence_number, 2);
        assert_eq!(entries[1].unit_price_net, Decimal::from_str("0.10").unwrap());
    }

    #[test]
    fn article_ids_beyond_int_range_are_dropped() {
        let input = OrderInput {
            line_items: vec![line(Some(i64::from(i32::MAX) + 1), Some("1"), Some("1"))],
            ..OrderInput::default()
        };
        assert!(input.article_list().is_empty());
    }

    #[test]
    fn json_numbers_keep_exact_decimal_value() {
        let input: OrderInput = serde_json::from_value(serde_json::json!({
            "localCustomerReference": 12,
            "legalEntityId": 1,
            "warehouseId": 2,
            "paymentMethodId": 3,
            "shippingMethodId": 4,
            "lineItems": [
                { "erpArticleId": 900, "quantity": 2, "unitPrice": 19.99 },
                { "erpArticleId": 901, "quantity": "abc", "unitPrice": 5 },
                { "erpArticleId": 902, "quantity": "1.25", "unitPrice": null }
            ]
        }))
        .unwrap();

        assert_eq!(input.local_customer_id, 12);
        assert_eq!(input.line_items[0].unit_price, Some(Decimal::new(1999, 2)));
        assert_eq!(input.line_items[1].quantity, None);
        assert_eq!(input.line_items[2].quantity, Some(Decimal::new(125, 2)));

        let entries = input.article_list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].quantity, Decimal::from(2));
    }

    #[test]
    fn failed_result_has_no_identifiers() {
        let result = OrderResult::failed("no valid products");
        assert!(!result.success);
        assert!(result.erp_order_id.is_none());
        assert!(result.erp_order_number.is_none());

        let json = serde_json::to_value(OrderResult::created(77, "EXTERN-20261019-N0001")).unwrap();
        assert_eq!(json["erpOrderId"], 77);
        assert_eq!(json["erpOrderNumber"], "EXTERN-20261019-N0001");
        assert!(json.get("error").is_none());
    }
}
