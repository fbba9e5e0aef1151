// ── API-to-domain type conversions ──
//
// Bridges raw `cardshop_api` wire types into canonical `cardshop_core::model`
// types and back. Normalizes legacy field spellings, maps status codes,
// parses dates leniently, and fills defaults for missing optional data.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::debug;

use cardshop_api::types::{
    CardCreate, CardResponse, CardUpdate, OrderCreateUpdate, OrderItemPayload, OrderResponse,
    WorkerCreateUpdate, WorkerResponse,
};

use crate::model::{Card, CardKey, CardPatch, Order, OrderItem, OrderStatus, Worker};

const ORDER_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── Helpers ────────────────────────────────────────────────────────

/// Accepts ISO-8601 with or without offset or fractional seconds, a
/// space-separated variant, or a bare date. Anything else is dropped.
pub(crate) fn parse_order_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    if let Some(dt) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Some(dt);
    }
    debug!(raw, "unparseable order date dropped");
    None
}

pub(crate) fn format_order_date(date: &NaiveDateTime) -> String {
    date.format(ORDER_DATE_FORMAT).to_string()
}

/// Status code wins; the free-text description is the fallback; a record
/// with neither is treated as pending.
fn resolve_status(code: Option<u8>, description: Option<&str>) -> OrderStatus {
    let resolved = code
        .and_then(OrderStatus::from_code)
        .or_else(|| description.and_then(OrderStatus::parse_lenient));
    if resolved.is_none() && (code.is_some() || description.is_some()) {
        tracing::warn!(?code, ?description, "unrecognized order status, treating as pending");
    }
    resolved.unwrap_or_default()
}

// ━━ Cards ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl From<CardResponse> for Card {
    fn from(c: CardResponse) -> Self {
        Card {
            card_number: c.card_number,
            set_name: c.set_name,
            card_name: c.card_name,
            card_type: c.card_type.filter(|t| !t.trim().is_empty()),
            mana_value: c.mana_value.unwrap_or(0),
            price: c.price.unwrap_or(Decimal::ZERO),
            stock: c.stock.unwrap_or(0),
        }
    }
}

impl From<&Card> for CardCreate {
    fn from(c: &Card) -> Self {
        CardCreate {
            card_number: c.card_number,
            set_name: c.set_name.clone(),
            card_name: c.card_name.clone(),
            card_type: c.card_type.clone(),
            mana_value: c.mana_value,
            price: c.price,
            stock: c.stock,
        }
    }
}

impl From<&CardPatch> for CardUpdate {
    fn from(p: &CardPatch) -> Self {
        CardUpdate {
            card_name: p.card_name.clone(),
            card_type: p.card_type.clone(),
            mana_value: p.mana_value,
            price: p.price,
            stock: p.stock,
        }
    }
}

// ━━ Orders ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl From<OrderItemPayload> for OrderItem {
    fn from(p: OrderItemPayload) -> Self {
        let card = match (p.card_number, p.set_name) {
            (Some(number), Some(set)) => Some(CardKey::new(number, set)),
            _ => None,
        };
        OrderItem {
            card,
            name: p.name,
            quantity: p.quantity,
            unit_price: p.unit_price,
        }
    }
}

impl From<&OrderItem> for OrderItemPayload {
    fn from(i: &OrderItem) -> Self {
        OrderItemPayload {
            card_number: i.card.as_ref().map(|c| c.card_number),
            set_name: i.card.as_ref().map(|c| c.set_name.clone()),
            name: i.name.clone(),
            quantity: i.quantity,
            unit_price: i.unit_price,
        }
    }
}

impl From<OrderResponse> for Order {
    fn from(o: OrderResponse) -> Self {
        let status = resolve_status(o.order_status_type_id, o.status_description.as_deref());
        let mut order = Order::new(o.order_id, o.customer_email, status)
            .with_items(o.items.into_iter().map(OrderItem::from).collect());
        order.employee_id = o.employee_id;
        order.order_date = o.order_date.as_deref().and_then(parse_order_date);
        order
    }
}

/// Request body for an order. `order_id` is sent on create so the service
/// can honour the locally chosen id.
pub(crate) fn order_body(order: &Order) -> OrderCreateUpdate {
    OrderCreateUpdate {
        order_id: Some(order.order_id),
        order_status_type_id: order.status.code(),
        status_description: order.status.to_string(),
        customer_email: order.customer_email.clone(),
        employee_id: order.employee_id,
        order_date: order.order_date.as_ref().map(format_order_date),
        items: order.items().iter().map(OrderItemPayload::from).collect(),
    }
}

// ━━ Workers ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl From<WorkerResponse> for Worker {
    fn from(w: WorkerResponse) -> Self {
        Worker {
            employee_id: w.employee_id,
            first_name: w.first_name,
            last_name: w.last_name,
            email: w.email,
            role: w.role,
        }
    }
}

impl From<&Worker> for WorkerCreateUpdate {
    fn from(w: &Worker) -> Self {
        WorkerCreateUpdate {
            employee_id: Some(w.employee_id),
            first_name: w.first_name.clone(),
            last_name: w.last_name.clone(),
            email: w.email.clone(),
            role: w.role.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn card_defaults_missing_numbers() {
        let raw: CardResponse = serde_json::from_value(json!({
            "cardNumber": 7,
            "setName": "LEB",
            "cardName": "Time Walk",
            "cardType": ""
        }))
        .unwrap();
        let card = Card::from(raw);
        assert_eq!(card.card_type, None);
        assert_eq!(card.price, Decimal::ZERO);
        assert_eq!(card.stock, 0);
    }

    #[test]
    fn legacy_order_maps_to_canonical() {
        let raw: OrderResponse = serde_json::from_value(json!({
            "orderID": 5001,
            "statusDescription": "Cancelled",
            "customerEmail": "sara@mtgshop.com",
            "orderDate": "2025-10-01",
            "cards": [
                { "name": "Black Lotus", "price": 15000 },
                { "name": "Mox Sapphire", "price": 4000 }
            ]
        }))
        .unwrap();

        let order = Order::from(raw);
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.total_price(), dec!(19000));
        assert_eq!(
            order.order_date.unwrap().to_string(),
            "2025-10-01 00:00:00"
        );
    }

    #[test]
    fn status_code_beats_description() {
        assert_eq!(resolve_status(Some(3), Some("Pending")), OrderStatus::Fulfilled);
        assert_eq!(resolve_status(Some(42), Some("paid")), OrderStatus::Paid);
        assert_eq!(resolve_status(None, Some("nonsense")), OrderStatus::Pending);
    }

    #[test]
    fn order_dates_parse_leniently() {
        assert!(parse_order_date("2025-10-01T10:00:00").is_some());
        assert!(parse_order_date("2025-10-01T10:00:00.123").is_some());
        assert!(parse_order_date("2025-10-01T10:00:00Z").is_some());
        assert!(parse_order_date("2025-10-01 10:00:00").is_some());
        assert!(parse_order_date("yesterday").is_none());
        assert!(parse_order_date("  ").is_none());
    }

    #[test]
    fn item_card_needs_both_parts() {
        let half = OrderItemPayload {
            card_number: Some(42),
            set_name: None,
            name: Some("Sol Ring".into()),
            quantity: None,
            unit_price: dec!(2.5),
        };
        assert_eq!(OrderItem::from(half).card, None);
    }

    #[test]
    fn order_body_carries_code_and_description() {
        let order = Order::new(5001, "sara@mtgshop.com", OrderStatus::Paid)
            .with_items(vec![OrderItem::for_card(CardKey::new(1, "LEB"), 1, dec!(1))]);
        let body = order_body(&order);
        assert_eq!(body.order_status_type_id, 2);
        assert_eq!(body.status_description, "Paid");
        assert_eq!(body.items[0].set_name.as_deref(), Some("LEB"));
    }
}
