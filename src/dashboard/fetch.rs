//! ERP queries behind the dashboard endpoints

use serde_json::{json, Value};
use tracing::warn;

use crate::erp::records::{
    RemoteCategory, RemoteInvoice, RemoteOrder, RemoteOrderLine, RemotePartner, RemoteProduct,
    RemoteTicket,
};
use crate::erp::{ErpConnection, ErpError, SearchOptions};

pub async fn customers(
    conn: &ErpConnection<'_>,
    domain: Value,
    limit: usize,
) -> Result<Vec<RemotePartner>, ErpError> {
    conn.search_read_as(
        RemotePartner::MODEL,
        domain,
        &SearchOptions::fields(RemotePartner::FIELDS).limit(limit),
    )
    .await
}

/// Partners flagged as customers
pub fn customer_domain() -> Value {
    json!([["customer_rank", ">", 0]])
}

pub async fn products(
    conn: &ErpConnection<'_>,
    domain: Value,
    limit: usize,
    include_images: bool,
) -> Result<Vec<RemoteProduct>, ErpError> {
    let fields: Vec<&str> = RemoteProduct::FIELDS
        .iter()
        .copied()
        .filter(|f| include_images || *f != "image_128")
        .collect();

    conn.search_read_as(
        RemoteProduct::MODEL,
        domain,
        &SearchOptions::fields(&fields).limit(limit).order("name asc"),
    )
    .await
}

pub fn saleable_domain() -> Value {
    json!([["sale_ok", "=", true]])
}

pub async fn orders(
    conn: &ErpConnection<'_>,
    domain: Value,
    limit: usize,
) -> Result<Vec<RemoteOrder>, ErpError> {
    conn.search_read_as(
        RemoteOrder::MODEL,
        domain,
        &SearchOptions::fields(RemoteOrder::FIELDS)
            .limit(limit)
            .order("date_order desc"),
    )
    .await
}

pub async fn order_lines(
    conn: &ErpConnection<'_>,
    order_id: i64,
) -> Result<Vec<RemoteOrderLine>, ErpError> {
    conn.search_read_as(
        RemoteOrderLine::MODEL,
        json!([["order_id", "=", order_id]]),
        &SearchOptions::fields(RemoteOrderLine::FIELDS).order("sequence asc, id asc"),
    )
    .await
}

/// Every category; the tree needs the full set to place children
pub async fn categories(conn: &ErpConnection<'_>) -> Result<Vec<RemoteCategory>, ErpError> {
    conn.search_read_as(
        RemoteCategory::MODEL,
        json!([]),
        &SearchOptions::fields(RemoteCategory::FIELDS).order("id asc"),
    )
    .await
}

pub async fn tickets(
    conn: &ErpConnection<'_>,
    limit: usize,
) -> Result<Vec<RemoteTicket>, ErpError> {
    conn.search_read_as(
        RemoteTicket::MODEL,
        json!([]),
        &SearchOptions::fields(RemoteTicket::FIELDS)
            .limit(limit)
            .order("create_date desc"),
    )
    .await
}

pub async fn invoices(
    conn: &ErpConnection<'_>,
    domain: Value,
    limit: usize,
) -> Result<Vec<RemoteInvoice>, ErpError> {
    conn.search_read_as(
        RemoteInvoice::MODEL,
        domain,
        &SearchOptions::fields(RemoteInvoice::FIELDS)
            .limit(limit)
            .order("invoice_date desc"),
    )
    .await
}

/// Customer invoices, optionally for one partner
pub fn invoice_domain(partner_id: Option<i64>) -> Value {
    match partner_id {
        Some(id) => json!([["move_type", "=", "out_invoice"], ["partner_id", "=", id]]),
        None => json!([["move_type", "=", "out_invoice"]]),
    }
}

/// Optional sub-collections degrade to empty instead of failing the response.
pub fn or_empty<T>(what: &str, result: Result<Vec<T>, ErpError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(collection = what, error = %e, "Falling back to empty list");
        Vec::new()
    })
}
