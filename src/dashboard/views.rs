//! Display shapes
//!
//! Flattened versions of the ERP records, named the way the dashboard reads
//! them. Many2one references become plain ids and names.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use scraper::Html;
use serde::Serialize;

use crate::catalog::CategoryNode;
use crate::erp::records::{
    Many2One, RemoteInvoice, RemoteOrder, RemoteOrderLine, RemotePartner, RemoteProduct,
    RemoteTicket,
};

fn ref_name(reference: &Option<Many2One>) -> Option<String> {
    reference.as_ref().map(|r| r.name().to_string())
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerView {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub total_due: f64,
}

impl From<RemotePartner> for CustomerView {
    fn from(p: RemotePartner) -> Self {
        Self {
            id: p.id,
            name: p.name,
            email: p.email,
            phone: p.phone,
            street: p.street,
            city: p.city,
            total_due: p.total_due.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub list_price: f64,
    pub default_code: Option<String>,
    pub qty_available: f64,
    pub categ_id: Option<i64>,
    pub categ_name: Option<String>,
    /// Category ancestry, outermost first; lets the UI filter by any ancestor
    pub categ_path: Vec<i64>,
    pub image_128: Option<String>,
}

impl ProductView {
    pub fn new(p: RemoteProduct, paths: &HashMap<i64, Vec<i64>>, include_image: bool) -> Self {
        let categ_id = p.categ_id.as_ref().map(Many2One::id);
        let categ_path = categ_id
            .map(|id| paths.get(&id).cloned().unwrap_or_else(|| vec![id]))
            .unwrap_or_default();

        Self {
            id: p.id,
            categ_name: ref_name(&p.categ_id),
            name: p.name,
            list_price: p.list_price,
            default_code: p.default_code,
            qty_available: p.qty_available.unwrap_or(0.0),
            categ_id,
            categ_path,
            image_128: if include_image { p.image_128 } else { None },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: i64,
    /// Record id used for drill-down calls
    pub id_raw: i64,
    pub name: String,
    pub customer: String,
    pub partner_id: Option<i64>,
    pub date: Option<String>,
    pub amount: f64,
    pub status: String,
    pub state: String,
}

impl From<RemoteOrder> for OrderView {
    fn from(o: RemoteOrder) -> Self {
        Self {
            id: o.id,
            id_raw: o.id,
            customer: ref_name(&o.partner_id).unwrap_or_default(),
            partner_id: o.partner_id.as_ref().map(Many2One::id),
            name: o.name,
            date: o.date_order,
            amount: o.amount_total,
            status: o.state.clone(),
            state: o.state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderLineView {
    pub id: i64,
    pub name: String,
    pub product: Option<String>,
    pub qty: f64,
    pub price: f64,
    pub total: f64,
}

impl From<RemoteOrderLine> for OrderLineView {
    fn from(l: RemoteOrderLine) -> Self {
        Self {
            id: l.id,
            product: ref_name(&l.product_id),
            name: l.name,
            qty: l.product_uom_qty,
            price: l.price_unit,
            total: l.price_subtotal,
        }
    }
}

/// Coarse ticket state the dashboard colours by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    New,
    Progress,
    Solved,
}

const CLOSED_STAGE_WORDS: [&str; 5] = ["solved", "resolved", "done", "closed", "cancel"];

impl TicketStatus {
    /// Stage names are free text, so match on whole words.
    pub fn from_stage(stage: Option<&str>) -> Self {
        let Some(stage) = stage else {
            return TicketStatus::New;
        };
        let stage = stage.to_lowercase();
        let words: Vec<&str> = stage
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        // "cancel" also covers "cancelled"/"canceled"
        let closed = words.iter().any(|word| {
            CLOSED_STAGE_WORDS
                .iter()
                .any(|closed| *word == *closed || (*closed == "cancel" && word.starts_with(closed)))
        });

        if closed {
            TicketStatus::Solved
        } else if words.contains(&"new") {
            TicketStatus::New
        } else {
            TicketStatus::Progress
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub id: i64,
    pub name: String,
    pub issue: String,
    pub product: Option<String>,
    pub customer: Option<String>,
    pub stage: Option<String>,
    pub status: TicketStatus,
    pub priority: Option<String>,
}

impl From<RemoteTicket> for TicketView {
    fn from(t: RemoteTicket) -> Self {
        let stage = ref_name(&t.stage_id);
        let issue = t
            .description
            .as_deref()
            .map(html_to_text)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| t.name.clone());

        Self {
            id: t.id,
            status: TicketStatus::from_stage(stage.as_deref()),
            product: ref_name(&t.product_id),
            customer: ref_name(&t.partner_id),
            name: t.name,
            issue,
            stage,
            priority: t.priority,
        }
    }
}

/// Descriptions are stored as HTML; the list view only wants text.
fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceView {
    pub id: i64,
    pub name: String,
    pub customer: Option<String>,
    pub date: Option<String>,
    pub amount: f64,
    pub residual: f64,
    pub state: String,
    pub payment_state: Option<String>,
}

impl From<RemoteInvoice> for InvoiceView {
    fn from(i: RemoteInvoice) -> Self {
        Self {
            id: i.id,
            customer: ref_name(&i.partner_id),
            name: i.name,
            date: i.invoice_date,
            amount: i.amount_total,
            residual: i.amount_residual.unwrap_or(0.0),
            state: i.state,
            payment_state: i.payment_state,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub total_revenue: f64,
    pub daily_store_revenue: f64,
    pub active_quotations: usize,
    pub confirmed_orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub name: String,
    pub sales: f64,
}

/// Day part of an ERP datetime (`2026-10-15 08:30:00`)
fn order_day(order: &RemoteOrder) -> Option<NaiveDate> {
    let date = order.date_order.as_deref()?;
    NaiveDate::parse_from_str(date.get(..10)?, "%Y-%m-%d").ok()
}

pub fn sales_stats(orders: &[RemoteOrder], today: NaiveDate) -> SalesStats {
    let mut stats = SalesStats::default();

    for order in orders {
        if order.is_confirmed() {
            stats.confirmed_orders += 1;
            stats.total_revenue += order.amount_total;
            if order_day(order) == Some(today) {
                stats.daily_store_revenue += order.amount_total;
            }
        } else if order.is_quotation() {
            stats.active_quotations += 1;
        }
    }

    stats
}

/// Confirmed revenue per calendar month, oldest first
pub fn monthly_sales(orders: &[RemoteOrder]) -> Vec<MonthlySales> {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();

    for order in orders.iter().filter(|o| o.is_confirmed()) {
        if let Some(day) = order_day(order) {
            *months.entry(day.format("%Y-%m").to_string()).or_default() += order.amount_total;
        }
    }

    months
        .into_iter()
        .map(|(name, sales)| MonthlySales { name, sales })
        .collect()
}

/// Full dashboard payload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub sales_stats: SalesStats,
    pub monthly_sales: Vec<MonthlySales>,
    pub products: Vec<ProductView>,
    pub orders: Vec<OrderView>,
    pub customers: Vec<CustomerView>,
    pub tickets: Vec<TicketView>,
    pub invoices: Vec<InvoiceView>,
    pub categories: Vec<CategoryNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, state: &str, date: &str, amount: f64) -> RemoteOrder {
        RemoteOrder {
            id,
            name: format!("S{:05}", id),
            partner_id: None,
            date_order: Some(date.to_string()),
            amount_untaxed: None,
            amount_tax: None,
            amount_total: amount,
            state: state.to_string(),
        }
    }

    #[test]
    fn test_sales_stats() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let orders = vec![
            order(1, "sale", "2026-10-15 09:00:00", 100.0),
            order(2, "done", "2026-10-01 12:00:00", 50.0),
            order(3, "draft", "2026-10-15 10:00:00", 999.0),
            order(4, "sent", "2026-10-14 10:00:00", 10.0),
            order(5, "cancel", "2026-10-15 11:00:00", 70.0),
        ];

        let stats = sales_stats(&orders, today);

        assert_eq!(
            stats,
            SalesStats {
                total_revenue: 150.0,
                daily_store_revenue: 100.0,
                active_quotations: 2,
                confirmed_orders: 2,
            }
        );
    }

    #[test]
    fn test_monthly_sales_sorted() {
        let orders = vec![
            order(1, "sale", "2026-10-15 09:00:00", 100.0),
            order(2, "sale", "2026-08-02 09:00:00", 40.0),
            order(3, "done", "2026-10-01 09:00:00", 25.0),
            order(4, "draft", "2026-09-01 09:00:00", 500.0),
        ];

        assert_eq!(
            monthly_sales(&orders),
            vec![
                MonthlySales { name: "2026-08".to_string(), sales: 40.0 },
                MonthlySales { name: "2026-10".to_string(), sales: 125.0 },
            ]
        );
    }

    #[test]
    fn test_ticket_status_from_stage() {
        assert_eq!(TicketStatus::from_stage(None), TicketStatus::New);
        assert_eq!(TicketStatus::from_stage(Some("New")), TicketStatus::New);
        assert_eq!(TicketStatus::from_stage(Some("In Progress")), TicketStatus::Progress);
        assert_eq!(TicketStatus::from_stage(Some("On Hold")), TicketStatus::Progress);
        assert_eq!(TicketStatus::from_stage(Some("Solved")), TicketStatus::Solved);
        assert_eq!(TicketStatus::from_stage(Some("Cancelled")), TicketStatus::Solved);
    }

    #[test]
    fn test_ticket_status_matches_whole_words() {
        assert_eq!(TicketStatus::from_stage(Some("Renewal")), TicketStatus::Progress);
        assert_eq!(TicketStatus::from_stage(Some("Newsletter follow-up")), TicketStatus::Progress);
        assert_eq!(TicketStatus::from_stage(Some("Undone work")), TicketStatus::Progress);
        assert_eq!(TicketStatus::from_stage(Some("New / Triage")), TicketStatus::New);
        assert_eq!(TicketStatus::from_stage(Some("Closed-Won")), TicketStatus::Solved);
    }

    #[test]
    fn test_html_to_text_decodes_entities() {
        assert_eq!(
            html_to_text("<p>Caf&eacute; &amp; chairs&nbsp;broken</p>"),
            "Café & chairs broken"
        );
        assert_eq!(
            html_to_text("<p>gap is 2 < 3 mm, please check</p>"),
            "gap is 2 < 3 mm, please check"
        );
        assert_eq!(html_to_text("<p>first</p><p>second</p>"), "first second");
    }

    #[test]
    fn test_ticket_issue_prefers_plain_description() {
        let ticket = RemoteTicket {
            id: 9,
            name: "Chair wobbles".to_string(),
            description: Some("<p>Left leg <b>loose</b></p>".to_string()),
            stage_id: Some(Many2One(2, "In Progress".to_string())),
            product_id: Some(Many2One(5, "Oak Chair".to_string())),
            partner_id: None,
            priority: Some("1".to_string()),
        };

        let view = TicketView::from(ticket);

        assert_eq!(view.issue, "Left leg loose");
        assert_eq!(view.product.as_deref(), Some("Oak Chair"));
        assert_eq!(view.status, TicketStatus::Progress);
    }

    #[test]
    fn test_product_path_fallback() {
        let product = RemoteProduct {
            id: 3,
            name: "Oak Chair".to_string(),
            list_price: 50.0,
            default_code: None,
            qty_available: None,
            categ_id: Some(Many2One(7, "All / Chairs".to_string())),
            image_128: Some("iVBOR".to_string()),
        };

        let view = ProductView::new(product, &HashMap::new(), false);

        assert_eq!(view.categ_path, vec![7]);
        assert_eq!(view.categ_name.as_deref(), Some("All / Chairs"));
        assert!(view.image_128.is_none());
    }
}
