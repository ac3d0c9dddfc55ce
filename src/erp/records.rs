//! Typed ERP records
//!
//! The server encodes "no value" as `false` for every field type and
//! references (many2one) as `[id, "display name"]`. Each record kind gets a
//! struct with those quirks handled by [`falsy`], so handlers work with
//! `Option`s instead of probing JSON.

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::ErpError;
use crate::catalog::CategoryRecord;

/// Reference to another record: `[id, display_name]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Many2One(pub i64, pub String);

impl Many2One {
    pub fn id(&self) -> i64 {
        self.0
    }

    pub fn name(&self) -> &str {
        &self.1
    }
}

/// Deserialize an optional field where the server sends `false` for empty.
pub fn falsy<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null | Value::Bool(false) => Ok(None),
        other => serde_json::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Decode a `search_read` result, skipping records that don't fit `T`.
///
/// A result that is not a list at all is an error.
pub fn decode_records<T: DeserializeOwned>(model: &str, value: Value) -> Result<Vec<T>, ErpError> {
    let Value::Array(items) = value else {
        return Err(ErpError::InvalidResponse(format!(
            "expected a list of {} records",
            model
        )));
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<T>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!(%model, error = %e, "Skipping malformed record"),
        }
    }

    Ok(records)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCategory {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "falsy")]
    pub parent_id: Option<Many2One>,
}

impl RemoteCategory {
    pub const MODEL: &'static str = "product.category";
    pub const FIELDS: &'static [&'static str] = &["id", "name", "parent_id"];
}

impl From<RemoteCategory> for CategoryRecord {
    fn from(c: RemoteCategory) -> Self {
        CategoryRecord {
            id: c.id,
            name: c.name,
            parent_id: c.parent_id.map(|p| p.id()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub list_price: f64,
    #[serde(default, deserialize_with = "falsy")]
    pub default_code: Option<String>,
    #[serde(default, deserialize_with = "falsy")]
    pub qty_available: Option<f64>,
    #[serde(default, deserialize_with = "falsy")]
    pub categ_id: Option<Many2One>,
    #[serde(default, deserialize_with = "falsy")]
    pub image_128: Option<String>,
}

impl RemoteProduct {
    pub const MODEL: &'static str = "product.product";
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "list_price",
        "default_code",
        "qty_available",
        "categ_id",
        "image_128",
    ];
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrder {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "falsy")]
    pub partner_id: Option<Many2One>,
    #[serde(default, deserialize_with = "falsy")]
    pub date_order: Option<String>,
    #[serde(default, deserialize_with = "falsy")]
    pub amount_untaxed: Option<f64>,
    #[serde(default, deserialize_with = "falsy")]
    pub amount_tax: Option<f64>,
    #[serde(default)]
    pub amount_total: f64,
    #[serde(default)]
    pub state: String,
}

impl RemoteOrder {
    pub const MODEL: &'static str = "sale.order";
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "partner_id",
        "date_order",
        "amount_untaxed",
        "amount_tax",
        "amount_total",
        "state",
    ];

    /// Confirmed sale (not a quotation, not cancelled)
    pub fn is_confirmed(&self) -> bool {
        matches!(self.state.as_str(), "sale" | "done")
    }

    pub fn is_quotation(&self) -> bool {
        matches!(self.state.as_str(), "draft" | "sent")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrderLine {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "falsy")]
    pub product_id: Option<Many2One>,
    #[serde(default)]
    pub product_uom_qty: f64,
    #[serde(default)]
    pub price_unit: f64,
    #[serde(default)]
    pub price_subtotal: f64,
}

impl RemoteOrderLine {
    pub const MODEL: &'static str = "sale.order.line";
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "product_id",
        "product_uom_qty",
        "price_unit",
        "price_subtotal",
    ];
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemotePartner {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "falsy")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "falsy")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "falsy")]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "falsy")]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "falsy")]
    pub total_due: Option<f64>,
}

impl RemotePartner {
    pub const MODEL: &'static str = "res.partner";
    pub const FIELDS: &'static [&'static str] =
        &["id", "name", "email", "phone", "street", "city", "total_due"];
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTicket {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "falsy")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "falsy")]
    pub stage_id: Option<Many2One>,
    #[serde(default, deserialize_with = "falsy")]
    pub product_id: Option<Many2One>,
    #[serde(default, deserialize_with = "falsy")]
    pub partner_id: Option<Many2One>,
    #[serde(default, deserialize_with = "falsy")]
    pub priority: Option<String>,
}

impl RemoteTicket {
    pub const MODEL: &'static str = "helpdesk.ticket";
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "description",
        "stage_id",
        "product_id",
        "partner_id",
        "priority",
    ];
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteInvoice {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "falsy")]
    pub partner_id: Option<Many2One>,
    #[serde(default, deserialize_with = "falsy")]
    pub invoice_date: Option<String>,
    #[serde(default)]
    pub amount_total: f64,
    #[serde(default, deserialize_with = "falsy")]
    pub amount_residual: Option<f64>,
    #[serde(default)]
    pub state: String,
    #[serde(default, deserialize_with = "falsy")]
    pub payment_state: Option<String>,
}

impl RemoteInvoice {
    pub const MODEL: &'static str = "account.move";
    pub const FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "partner_id",
        "invoice_date",
        "amount_total",
        "amount_residual",
        "state",
        "payment_state",
    ];
}
