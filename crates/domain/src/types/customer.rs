//! CRM customer as seen by the order bridge

use serde::{Deserialize, Serialize};

/// Local CRM customer record.
///
/// Only the fields the order protocol needs: the ERP link and the contact
/// data copied into the order's billing and shipping addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    /// ERP customer key; `None` until the customer has been linked.
    pub erp_customer_id: Option<i32>,
    pub company: Option<String>,
    /// Free text such as "Herr Dr." or "Ms".
    pub salutation: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 code.
    pub country_iso: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Customer {
    /// ERP customer id when the customer is linked (ids are strictly positive).
    #[must_use]
    pub fn linked_erp_id(&self) -> Option<i32> {
        self.erp_customer_id.filter(|id| *id > 0)
    }
}
