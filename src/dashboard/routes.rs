//! Dashboard HTTP routes
//!
//! Handlers for the API endpoints. Every POST body carries the ERP
//! credentials; a [`Session`] is built from them per request.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use super::error::{ApiError, ApiJson};
use super::fetch;
use super::views::{
    monthly_sales, sales_stats, CustomerView, DashboardData, InvoiceView, OrderLineView,
    OrderView, ProductView, TicketView,
};
use super::SharedState;
use crate::cache::{generate_code, QuoteLine, QuoteSnapshot};
use crate::catalog::{build_category_tree, category_paths, CategoryRecord};
use crate::erp::records::{RemoteOrder, RemoteOrderLine};
use crate::erp::{http_fallback, normalize_url, ErpError, Session};

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

/// Credentials sent with every API call
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub db: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub uid: Option<i64>,
}

impl Credentials {
    /// Session for object calls. Requires a `uid` from a prior connect.
    pub fn session(&self) -> Result<Session, ApiError> {
        if self.url.trim().is_empty() {
            return Err(ApiError::MalformedPayload("url is required".to_string()));
        }
        let uid = self
            .uid
            .ok_or_else(|| ApiError::MalformedPayload("uid is required".to_string()))?;

        Ok(Session {
            url: normalize_url(&self.url),
            db: self.db.trim().to_string(),
            uid,
            password: self.password.trim().to_string(),
        })
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

impl StatusResponse {
    fn success(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
        })
    }
}

// === Session ===

#[derive(Serialize)]
pub struct ConnectResponse {
    pub status: &'static str,
    pub uid: i64,
    pub message: String,
    pub final_url: String,
}

/// POST /api/connect - Probe the server and authenticate
pub async fn api_connect(
    State(state): State<SharedState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> Result<Json<ConnectResponse>, ApiError> {
    if creds.url.trim().is_empty() {
        return Err(ApiError::MalformedPayload("url is required".to_string()));
    }

    let erp = &state.erp;
    let mut url = normalize_url(&creds.url);

    if let Err(e) = erp.version(&url).await {
        let Some(fallback) = http_fallback(&url) else {
            return Err(ApiError::Connection {
                message: e.to_string(),
                tried_url: url,
            });
        };

        warn!(url = %url, error = %e, "HTTPS probe failed, retrying over HTTP");
        if let Err(e) = erp.version(&fallback).await {
            return Err(ApiError::Connection {
                message: e.to_string(),
                tried_url: fallback,
            });
        }
        url = fallback;
    }

    let uid = erp
        .authenticate(
            &url,
            creds.db.trim(),
            creds.username.trim(),
            creds.password.trim(),
        )
        .await
        .map_err(|e| ApiError::Connection {
            message: e.to_string(),
            tried_url: url.clone(),
        })?
        .ok_or(ApiError::InvalidCredentials)?;

    info!(url = %url, uid, "ERP session established");

    Ok(Json(ConnectResponse {
        status: "success",
        uid,
        message: "Connection successful".to_string(),
        final_url: url,
    }))
}

// === Read endpoints ===

/// POST /api/customers
pub async fn api_customers(
    State(state): State<SharedState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> Result<Json<Vec<CustomerView>>, ApiError> {
    let session = creds.session()?;
    let conn = state.erp.connect(&session);

    let customers = fetch::customers(
        &conn,
        fetch::customer_domain(),
        state.config.dashboard.customer_limit,
    )
    .await?;

    Ok(Json(customers.into_iter().map(CustomerView::from).collect()))
}

/// POST /api/dashboard-data - Everything the main screen shows
pub async fn api_dashboard_data(
    State(state): State<SharedState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> Result<Json<DashboardData>, ApiError> {
    let session = creds.session()?;
    let conn = state.erp.connect(&session);
    let limits = &state.config.dashboard;

    let (products, orders, customers, categories, tickets, invoices) = tokio::join!(
        fetch::products(
            &conn,
            fetch::saleable_domain(),
            limits.product_limit,
            limits.include_images
        ),
        fetch::orders(&conn, json!([]), limits.order_limit),
        fetch::customers(&conn, fetch::customer_domain(), limits.customer_limit),
        fetch::categories(&conn),
        fetch::tickets(&conn, limits.ticket_limit),
        fetch::invoices(&conn, fetch::invoice_domain(None), limits.invoice_limit),
    );

    let categories: Vec<CategoryRecord> = categories?.into_iter().map(Into::into).collect();
    let paths = category_paths(&categories);
    let tree = build_category_tree(&categories);

    let orders = orders?;
    let today = Utc::now().date_naive();

    Ok(Json(DashboardData {
        sales_stats: sales_stats(&orders, today),
        monthly_sales: monthly_sales(&orders),
        products: products?
            .into_iter()
            .map(|p| ProductView::new(p, &paths, limits.include_images))
            .collect(),
        orders: orders.into_iter().map(OrderView::from).collect(),
        customers: customers?.into_iter().map(CustomerView::from).collect(),
        tickets: fetch::or_empty("tickets", tickets)
            .into_iter()
            .map(TicketView::from)
            .collect(),
        invoices: fetch::or_empty("invoices", invoices)
            .into_iter()
            .map(InvoiceView::from)
            .collect(),
        categories: tree,
    }))
}

#[derive(Deserialize)]
pub struct OrderDetailsRequest {
    #[serde(flatten)]
    pub creds: Credentials,
    pub order_id: i64,
}

#[derive(Serialize)]
pub struct OrderDetailsResponse {
    pub order_id: i64,
    pub lines: Vec<OrderLineView>,
}

/// POST /api/order-details - Lines of one sale order
pub async fn api_order_details(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<OrderDetailsRequest>,
) -> Result<Json<OrderDetailsResponse>, ApiError> {
    let session = req.creds.session()?;
    let conn = state.erp.connect(&session);

    let lines = fetch::order_lines(&conn, req.order_id).await?;

    Ok(Json(OrderDetailsResponse {
        order_id: req.order_id,
        lines: lines.into_iter().map(OrderLineView::from).collect(),
    }))
}

#[derive(Deserialize)]
pub struct CustomerHistoryRequest {
    #[serde(flatten)]
    pub creds: Credentials,
    pub partner_id: i64,
}

#[derive(Serialize)]
pub struct CustomerHistoryResponse {
    pub partner_id: i64,
    pub orders: Vec<OrderView>,
    pub invoices: Vec<InvoiceView>,
}

/// POST /api/customer-history - Orders and invoices of one partner
pub async fn api_customer_history(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CustomerHistoryRequest>,
) -> Result<Json<CustomerHistoryResponse>, ApiError> {
    let session = req.creds.session()?;
    let conn = state.erp.connect(&session);
    let limits = &state.config.dashboard;

    let (orders, invoices) = tokio::join!(
        fetch::orders(
            &conn,
            json!([["partner_id", "=", req.partner_id]]),
            limits.order_limit
        ),
        fetch::invoices(
            &conn,
            fetch::invoice_domain(Some(req.partner_id)),
            limits.invoice_limit
        ),
    );

    Ok(Json(CustomerHistoryResponse {
        partner_id: req.partner_id,
        orders: orders?.into_iter().map(OrderView::from).collect(),
        invoices: fetch::or_empty("invoices", invoices)
            .into_iter()
            .map(InvoiceView::from)
            .collect(),
    }))
}

#[derive(Deserialize)]
pub struct SearchRequest {
    #[serde(flatten)]
    pub creds: Credentials,
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub products: Vec<ProductView>,
    pub customers: Vec<CustomerView>,
    pub orders: Vec<OrderView>,
}

/// POST /api/search - Case-insensitive substring match over products, customers, orders
pub async fn api_search(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = req.query.trim().to_string();
    if query.is_empty() {
        return Err(ApiError::MalformedPayload("query is required".to_string()));
    }

    let session = req.creds.session()?;
    let conn = state.erp.connect(&session);
    let limits = &state.config.dashboard;
    let limit = req
        .limit
        .unwrap_or(limits.search_limit)
        .clamp(1, limits.search_limit.max(1));

    let (products, customers, orders) = tokio::join!(
        fetch::products(
            &conn,
            json!(["|", ["name", "ilike", query], ["default_code", "ilike", query]]),
            limit,
            limits.include_images
        ),
        fetch::customers(
            &conn,
            json!([
                "|", "|",
                ["name", "ilike", query],
                ["email", "ilike", query],
                ["phone", "ilike", query]
            ]),
            limit
        ),
        fetch::orders(
            &conn,
            json!(["|", ["name", "ilike", query], ["partner_id.name", "ilike", query]]),
            limit
        ),
    );

    let no_paths = HashMap::new();

    Ok(Json(SearchResponse {
        products: products?
            .into_iter()
            .map(|p| ProductView::new(p, &no_paths, limits.include_images))
            .collect(),
        customers: customers?.into_iter().map(CustomerView::from).collect(),
        orders: orders?.into_iter().map(OrderView::from).collect(),
        query,
    }))
}

// === Write endpoints ===

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteLineRequest {
    pub product_id: i64,
    #[serde(default = "default_qty")]
    pub qty: f64,
    pub price_unit: Option<f64>,
}

fn default_qty() -> f64 {
    1.0
}

#[derive(Deserialize)]
pub struct CreateQuoteRequest {
    #[serde(flatten)]
    pub creds: Credentials,
    pub partner_id: Option<i64>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub lines: Vec<QuoteLineRequest>,
}

impl CreateQuoteRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if self.lines.is_empty() {
            return Err(ApiError::MalformedPayload(
                "a quote needs at least one line".to_string(),
            ));
        }
        for line in &self.lines {
            if line.qty.is_nan() || line.qty <= 0.0 {
                return Err(ApiError::MalformedPayload(format!(
                    "quantity for product {} must be positive",
                    line.product_id
                )));
            }
            if line.price_unit.is_some_and(|p| p < 0.0) {
                return Err(ApiError::MalformedPayload(format!(
                    "price for product {} must not be negative",
                    line.product_id
                )));
            }
        }
        Ok(())
    }

    fn customer_name(&self) -> Option<&str> {
        self.customer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    fn phone(&self) -> Option<&str> {
        self.phone.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

#[derive(Serialize)]
pub struct CreateQuoteResponse {
    pub status: &'static str,
    pub order_id: i64,
    pub name: String,
    pub code: String,
    /// Whether the quote can be fetched through the public lookup
    pub cached: bool,
    pub quote: QuoteSnapshot,
}

/// POST /api/create-quote - Draft sale order plus a shareable snapshot
pub async fn api_create_quote(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<CreateQuoteRequest>,
) -> Result<Json<CreateQuoteResponse>, ApiError> {
    req.validate()?;
    let session = req.creds.session()?;
    let conn = state.erp.connect(&session);

    let partner_id = match (req.partner_id, req.customer_name()) {
        (Some(id), _) => id,
        (None, Some(name)) => {
            let mut values = json!({ "name": name });
            if let Some(phone) = req.phone() {
                values["phone"] = json!(phone);
            }
            let id = conn.create("res.partner", values).await?;
            info!(partner_id = id, "Created walk-in customer");
            id
        }
        (None, None) => {
            return Err(ApiError::MalformedPayload(
                "partner_id or customer_name is required".to_string(),
            ))
        }
    };

    let order_lines: Vec<Value> = req
        .lines
        .iter()
        .map(|line| {
            let mut values = json!({
                "product_id": line.product_id,
                "product_uom_qty": line.qty,
            });
            if let Some(price) = line.price_unit {
                values["price_unit"] = json!(price);
            }
            json!([0, 0, values])
        })
        .collect();

    let order_id = conn
        .create(
            RemoteOrder::MODEL,
            json!({ "partner_id": partner_id, "order_line": order_lines }),
        )
        .await?;

    let order = conn
        .read_as::<RemoteOrder>(RemoteOrder::MODEL, &[order_id], RemoteOrder::FIELDS)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            ErpError::InvalidResponse(format!("sale order {} not readable after create", order_id))
        })?;
    let lines = fetch::order_lines(&conn, order_id).await?;

    let snapshot = quote_snapshot(
        generate_code(&state.config.cache.code_prefix),
        &order,
        &lines,
        req.customer_name(),
        req.phone(),
        Utc::now().date_naive(),
    );

    let cached = match &state.quotes {
        Some(store) => match store.put(&snapshot).await {
            Ok(()) => true,
            Err(e) => {
                warn!(code = %snapshot.code, error = %e, "Quote not cached");
                false
            }
        },
        None => false,
    };

    info!(order = %order.name, code = %snapshot.code, cached, "Quote created");

    Ok(Json(CreateQuoteResponse {
        status: "success",
        order_id,
        name: order.name,
        code: snapshot.code.clone(),
        cached,
        quote: snapshot,
    }))
}

fn quote_snapshot(
    code: String,
    order: &RemoteOrder,
    lines: &[RemoteOrderLine],
    customer_name: Option<&str>,
    phone: Option<&str>,
    today: NaiveDate,
) -> QuoteSnapshot {
    let untaxed = order
        .amount_untaxed
        .unwrap_or_else(|| lines.iter().map(|l| l.price_subtotal).sum());

    QuoteSnapshot {
        code,
        order_id: order.id,
        order_name: order.name.clone(),
        customer: order
            .partner_id
            .as_ref()
            .map(|p| p.name().to_string())
            .or_else(|| customer_name.map(str::to_string))
            .unwrap_or_default(),
        phone: phone.map(str::to_string),
        date: order
            .date_order
            .as_deref()
            .and_then(|d| d.get(..10))
            .map(str::to_string)
            .unwrap_or_else(|| today.to_string()),
        lines: lines
            .iter()
            .map(|l| QuoteLine {
                name: l
                    .product_id
                    .as_ref()
                    .map(|p| p.name().to_string())
                    .unwrap_or_else(|| l.name.clone()),
                qty: l.product_uom_qty,
                price: l.price_unit,
                total: l.price_subtotal,
            })
            .collect(),
        untaxed,
        tax: order.amount_tax.unwrap_or(order.amount_total - untaxed),
        total: order.amount_total,
    }
}

#[derive(Deserialize)]
pub struct RegisterPaymentRequest {
    #[serde(flatten)]
    pub creds: Credentials,
    pub invoice_id: i64,
    pub amount: Option<f64>,
    pub journal_id: Option<i64>,
    pub payment_date: Option<String>,
}

/// POST /api/register-payment - Pay an invoice through the payment wizard
pub async fn api_register_payment(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<RegisterPaymentRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let mut values = Map::new();

    if let Some(amount) = req.amount {
        if amount.is_nan() || amount <= 0.0 {
            return Err(ApiError::MalformedPayload(
                "amount must be positive".to_string(),
            ));
        }
        values.insert("amount".to_string(), json!(amount));
    }
    if let Some(journal_id) = req.journal_id {
        values.insert("journal_id".to_string(), json!(journal_id));
    }
    if let Some(date) = req.payment_date.as_deref() {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
            ApiError::MalformedPayload("payment_date must be YYYY-MM-DD".to_string())
        })?;
        values.insert("payment_date".to_string(), json!(date.to_string()));
    }

    let session = req.creds.session()?;
    let conn = state.erp.connect(&session);

    let context = json!({
        "active_model": "account.move",
        "active_ids": [req.invoice_id],
    });

    let wizard_id = conn
        .create_with_context(
            "account.payment.register",
            Value::Object(values),
            Some(context.clone()),
        )
        .await?;
    conn.call_method(
        "account.payment.register",
        "action_create_payments",
        &[wizard_id],
        Some(context),
    )
    .await?;

    info!(invoice_id = req.invoice_id, amount = ?req.amount, "Payment registered");

    Ok(StatusResponse::success("Payment registered"))
}

#[derive(Deserialize)]
pub struct UpdateTicketRequest {
    #[serde(flatten)]
    pub creds: Credentials,
    pub ticket_id: i64,
    pub stage_id: Option<i64>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub user_id: Option<i64>,
}

impl UpdateTicketRequest {
    fn values(&self) -> Result<Map<String, Value>, ApiError> {
        let mut values = Map::new();

        if let Some(stage_id) = self.stage_id {
            values.insert("stage_id".to_string(), json!(stage_id));
        }
        if let Some(description) = &self.description {
            values.insert("description".to_string(), json!(description));
        }
        if let Some(priority) = &self.priority {
            if !matches!(priority.as_str(), "0" | "1" | "2" | "3") {
                return Err(ApiError::MalformedPayload(
                    "priority must be one of 0, 1, 2, 3".to_string(),
                ));
            }
            values.insert("priority".to_string(), json!(priority));
        }
        if let Some(user_id) = self.user_id {
            values.insert("user_id".to_string(), json!(user_id));
        }

        if values.is_empty() {
            return Err(ApiError::MalformedPayload(
                "nothing to update".to_string(),
            ));
        }
        Ok(values)
    }
}

/// POST /api/update-ticket - Change stage, description, priority or assignee
pub async fn api_update_ticket(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<UpdateTicketRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let values = req.values()?;
    let session = req.creds.session()?;
    let conn = state.erp.connect(&session);

    let fields: Vec<String> = values.keys().cloned().collect();
    let written = conn
        .write("helpdesk.ticket", &[req.ticket_id], Value::Object(values))
        .await?;
    if !written {
        return Err(ErpError::InvalidResponse(format!(
            "write on ticket {} was not applied",
            req.ticket_id
        ))
        .into());
    }

    info!(ticket_id = req.ticket_id, ?fields, "Ticket updated");

    Ok(StatusResponse::success("Ticket updated"))
}

// === Public ===

/// GET /api/quote/:code - Public quote lookup
pub async fn api_quote_lookup(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<QuoteSnapshot>, ApiError> {
    let Some(store) = &state.quotes else {
        return Err(ApiError::Unavailable(
            "Quote lookup is not enabled".to_string(),
        ));
    };

    let code = code.trim().to_uppercase();
    store
        .get(&code)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Quote {}", code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erp::records::Many2One;

    #[test]
    fn test_session_requires_uid() {
        let creds = Credentials {
            url: "erp.example.com/web".to_string(),
            db: "prod".to_string(),
            ..Default::default()
        };
        assert!(matches!(creds.session(), Err(ApiError::MalformedPayload(_))));

        let session = Credentials {
            uid: Some(2),
            ..creds
        }
        .session()
        .unwrap();
        assert_eq!(session.url, "https://erp.example.com");
        assert_eq!(session.uid, 2);
    }

    #[test]
    fn test_quote_validation() {
        let req: CreateQuoteRequest = serde_json::from_value(json!({
            "url": "x", "uid": 1, "customer_name": "Ayşe",
            "lines": [{"product_id": 3, "qty": 0}]
        }))
        .unwrap();
        assert!(matches!(req.validate(), Err(ApiError::MalformedPayload(_))));

        let req: CreateQuoteRequest = serde_json::from_value(json!({
            "url": "x", "uid": 1, "lines": [{"product_id": 3}]
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.lines[0].qty, 1.0);
    }

    #[test]
    fn test_ticket_update_needs_a_field() {
        let req: UpdateTicketRequest =
            serde_json::from_value(json!({"url": "x", "uid": 1, "ticket_id": 4})).unwrap();
        assert!(req.values().is_err());

        let req: UpdateTicketRequest = serde_json::from_value(
            json!({"url": "x", "uid": 1, "ticket_id": 4, "priority": "7"}),
        )
        .unwrap();
        assert!(req.values().is_err());

        let req: UpdateTicketRequest = serde_json::from_value(
            json!({"url": "x", "uid": 1, "ticket_id": 4, "stage_id": 3, "priority": "2"}),
        )
        .unwrap();
        let values = req.values().unwrap();
        assert_eq!(values["stage_id"], json!(3));
        assert_eq!(values["priority"], json!("2"));
    }

    #[test]
    fn test_quote_snapshot_from_order() {
        let order = RemoteOrder {
            id: 21,
            name: "S00021".to_string(),
            partner_id: Some(Many2One(8, "Mehmet Yılmaz".to_string())),
            date_order: Some("2026-10-15 08:30:00".to_string()),
            amount_untaxed: Some(200.0),
            amount_tax: Some(40.0),
            amount_total: 240.0,
            state: "draft".to_string(),
        };
        let lines = vec![RemoteOrderLine {
            id: 1,
            name: "[OAK-1] Oak Chair".to_string(),
            product_id: Some(Many2One(3, "Oak Chair".to_string())),
            product_uom_qty: 4.0,
            price_unit: 50.0,
            price_subtotal: 200.0,
        }];

        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let snapshot = quote_snapshot("ASC-0000ABCD".to_string(), &order, &lines, None, Some("555"), today);

        assert_eq!(snapshot.customer, "Mehmet Yılmaz");
        assert_eq!(snapshot.date, "2026-10-15");
        assert_eq!(snapshot.lines[0].name, "Oak Chair");
        assert_eq!(snapshot.total, 240.0);
        assert_eq!(snapshot.tax, 40.0);
        assert_eq!(snapshot.phone.as_deref(), Some("555"));
    }
}
