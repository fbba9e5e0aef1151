// Wire types for the storefront service.
//
// JSON is camelCase. Older deployments of the service used different
// spellings for a handful of order fields (`orderID`, `orderStatusTypeID`,
// `statusDescription`, `cards` with `count`/`price`); those are accepted
// on input through serde aliases.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ── Cards ────────────────────────────────────────────────────────────

/// A card as returned by `GET /card` and friends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub card_number: u32,
    pub set_name: String,
    #[serde(default)]
    pub card_name: String,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub mana_value: Option<u32>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<u32>,
}

/// Body for `POST /card`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardCreate {
    pub card_number: u32,
    pub set_name: String,
    pub card_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    pub mana_value: u32,
    pub price: Decimal,
    pub stock: u32,
}

/// Partial body for `PUT /card/{number}/{set}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mana_value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

// ── Orders ───────────────────────────────────────────────────────────

/// One line of an order, in both requests and responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_name: Option<String>,
    #[serde(default, alias = "itemName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "count", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, alias = "price")]
    pub unit_price: Decimal,
}

/// An order as returned by `GET /orders` and the order mutation endpoints.
///
/// `order_status_type_id` is the numeric status code (1=Pending, 2=Paid,
/// 3=Fulfilled, 4=Canceled); `status_description` is the free-text form
/// some deployments send instead of, or alongside, the code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(alias = "orderID")]
    pub order_id: u64,
    #[serde(default, rename = "orderStatusTypeID", alias = "statusId")]
    pub order_status_type_id: Option<u8>,
    #[serde(default, alias = "status")]
    pub status_description: Option<String>,
    #[serde(default)]
    pub customer_email: String,
    #[serde(default, alias = "employeeID")]
    pub employee_id: Option<u64>,
    #[serde(default)]
    pub order_date: Option<String>,
    #[serde(default, alias = "cards")]
    pub items: Vec<OrderItemPayload>,
    /// Informational only; consumers recompute the total from `items`.
    #[serde(default)]
    pub total_price: Option<Decimal>,
}

/// Body for `POST /orders` and `PUT /orders/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<u64>,
    #[serde(rename = "orderStatusTypeID")]
    pub order_status_type_id: u8,
    pub status_description: String,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>,
    pub items: Vec<OrderItemPayload>,
}

// ── Workers ──────────────────────────────────────────────────────────

/// A staff record as returned by `GET /workers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerResponse {
    #[serde(alias = "employeeID")]
    pub employee_id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
}

/// Body for `POST /workers` and `PUT /workers/{id}`.
///
/// `employee_id` may be omitted on create to let the service assign one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerCreateUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn order_accepts_legacy_field_names() {
        let raw = json!({
            "orderID": 5001,
            "orderStatusTypeID": 2,
            "statusDescription": "Paid",
            "customerEmail": "sara@mtgshop.com",
            "orderDate": "2025-10-01T10:00:00",
            "cards": [
                { "name": "Sol Ring", "count": 4, "price": 2.5 }
            ]
        });

        let order: OrderResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(order.order_id, 5001);
        assert_eq!(order.order_status_type_id, Some(2));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].name.as_deref(), Some("Sol Ring"));
        assert_eq!(order.items[0].quantity, Some(4));
        assert_eq!(order.items[0].unit_price, dec!(2.5));
    }

    #[test]
    fn item_name_alias_is_accepted() {
        let raw = json!({ "itemName": "Mox Pearl", "unitPrice": 4000.0 });
        let item: OrderItemPayload = serde_json::from_value(raw).unwrap();
        assert_eq!(item.name.as_deref(), Some("Mox Pearl"));
        assert_eq!(item.quantity, None);
        assert_eq!(item.unit_price, dec!(4000));
    }

    #[test]
    fn card_update_skips_unset_fields() {
        let body = CardUpdate {
            stock: Some(3),
            ..CardUpdate::default()
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "stock": 3 }));
    }

    #[test]
    fn order_body_uses_status_code_field() {
        let body = OrderCreateUpdate {
            order_id: None,
            order_status_type_id: 1,
            status_description: "Pending".into(),
            customer_email: "josh@mtgshop.com".into(),
            employee_id: Some(101),
            order_date: None,
            items: Vec::new(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["orderStatusTypeID"], json!(1));
        assert_eq!(value["employeeId"], json!(101));
        assert!(value.get("orderId").is_none());
    }
}
