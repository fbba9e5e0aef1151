// ── Order domain types ──

use std::borrow::Cow;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::card::CardKey;
use super::entity::{Entity, SearchField, Searchable, require_email};
use crate::error::CoreError;

/// Order ids below this are never handed out for new orders.
pub const ORDER_ID_FLOOR: u64 = 5000;

/// Canonical order lifecycle.
///
/// Parsing is case-insensitive and accepts the legacy spellings
/// `Cancelled` and `Delivered`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    #[strum(to_string = "Fulfilled", serialize = "Delivered")]
    #[serde(alias = "Delivered")]
    Fulfilled,
    #[strum(to_string = "Canceled", serialize = "Cancelled")]
    #[serde(alias = "Cancelled")]
    Canceled,
}

impl OrderStatus {
    /// Numeric code used by the service (`orderStatusTypeID`).
    pub fn code(self) -> u8 {
        match self {
            Self::Pending => 1,
            Self::Paid => 2,
            Self::Fulfilled => 3,
            Self::Canceled => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Pending),
            2 => Some(Self::Paid),
            3 => Some(Self::Fulfilled),
            4 => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Lenient parse for free-text status fields; surrounding whitespace is
    /// ignored.
    pub fn parse_lenient(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }

    /// Still needs work from staff.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Paid)
    }
}

/// One line of an order: a catalogue card or a free-text item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub card: Option<CardKey>,
    pub name: Option<String>,
    /// Absent means one.
    pub quantity: Option<u32>,
    pub unit_price: Decimal,
}

impl OrderItem {
    pub fn for_card(card: CardKey, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            card: Some(card),
            name: None,
            quantity: Some(quantity),
            unit_price,
        }
    }

    pub fn named(name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            card: None,
            name: Some(name.into()),
            quantity: None,
            unit_price,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity.unwrap_or(1)
    }

    /// Saturates at `Decimal::MAX`; [`OrderItem::validate`] rejects lines
    /// that would.
    pub fn line_total(&self) -> Decimal {
        self.checked_line_total().unwrap_or(Decimal::MAX)
    }

    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity()))
    }

    /// Free-text name if present, otherwise the card key.
    pub fn label(&self) -> String {
        match (&self.name, &self.card) {
            (Some(name), _) => name.clone(),
            (None, Some(card)) => card.to_string(),
            (None, None) => String::from("(unnamed item)"),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.quantity == Some(0) {
            return Err(CoreError::validation("item quantity must be positive"));
        }
        if self.unit_price.is_sign_negative() {
            return Err(CoreError::validation("item price must not be negative"));
        }
        if self.card.is_none() && self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(CoreError::validation("item needs a card or a name"));
        }
        if self.checked_line_total().is_none() {
            return Err(CoreError::validation("item total is too large"));
        }
        Ok(())
    }
}

/// A purchase order.
///
/// `items` and `total_price` are private: every item mutator recomputes the
/// total, and deserialization goes through [`OrderData`] so a decoded order
/// never carries a stale total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "OrderData")]
pub struct Order {
    pub order_id: u64,
    pub customer_email: String,
    pub employee_id: Option<u64>,
    pub status: OrderStatus,
    pub order_date: Option<NaiveDateTime>,
    items: Vec<OrderItem>,
    total_price: Decimal,
}

/// Serialized shape of an [`Order`] without the derived total.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub order_id: u64,
    pub customer_email: String,
    #[serde(default)]
    pub employee_id: Option<u64>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub order_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl From<OrderData> for Order {
    fn from(data: OrderData) -> Self {
        let mut order = Order::new(data.order_id, data.customer_email, data.status);
        order.employee_id = data.employee_id;
        order.order_date = data.order_date;
        order.set_items(data.items);
        order
    }
}

impl Order {
    pub fn new(order_id: u64, customer_email: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            order_id,
            customer_email: customer_email.into(),
            employee_id: None,
            status,
            order_date: None,
            items: Vec::new(),
            total_price: Decimal::ZERO,
        }
    }

    pub fn with_employee(mut self, employee_id: u64) -> Self {
        self.employee_id = Some(employee_id);
        self
    }

    pub fn with_date(mut self, date: NaiveDateTime) -> Self {
        self.order_date = Some(date);
        self
    }

    pub fn with_items(mut self, items: Vec<OrderItem>) -> Self {
        self.set_items(items);
        self
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Total number of units across all lines.
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity())).sum()
    }

    // ── Item mutators (all recompute the total) ─────────────────────

    pub fn set_items(&mut self, items: Vec<OrderItem>) {
        self.items = items;
        self.recompute_total();
    }

    pub fn push_item(&mut self, item: OrderItem) {
        self.items.push(item);
        self.recompute_total();
    }

    /// Remove the first line for `card`.
    pub fn remove_item(&mut self, card: &CardKey) -> Option<OrderItem> {
        let idx = self
            .items
            .iter()
            .position(|i| i.card.as_ref() == Some(card))?;
        let removed = self.items.remove(idx);
        self.recompute_total();
        Some(removed)
    }

    // An overflowing total saturates here and fails `validate`.
    fn recompute_total(&mut self) {
        self.total_price = checked_total(&self.items).unwrap_or(Decimal::MAX);
    }
}

fn checked_total(items: &[OrderItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.checked_line_total()?))
}

// ── Patches ──────────────────────────────────────────────────────────

/// Change to an order's item list.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemsChange {
    Replace(Vec<OrderItem>),
    Append(OrderItem),
    /// Remove the first line for this card.
    Remove(CardKey),
}

/// Partial update for an [`Order`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub customer_email: Option<String>,
    /// `Some(None)` unassigns the order.
    pub employee_id: Option<Option<u64>>,
    pub items: Option<ItemsChange>,
}

impl OrderPatch {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn add_item(item: OrderItem) -> Self {
        Self {
            items: Some(ItemsChange::Append(item)),
            ..Self::default()
        }
    }

    pub fn remove_item(card: CardKey) -> Self {
        Self {
            items: Some(ItemsChange::Remove(card)),
            ..Self::default()
        }
    }

    /// True when the patch changes nothing but the item list.
    pub fn items_only(&self) -> bool {
        self.status.is_none() && self.customer_email.is_none() && self.employee_id.is_none()
    }
}

impl Entity for Order {
    type Key = u64;
    type Patch = OrderPatch;
    const KIND: &'static str = "order";

    fn key(&self) -> u64 {
        self.order_id
    }

    fn apply_patch(&mut self, patch: &OrderPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(email) = &patch.customer_email {
            self.customer_email.clone_from(email);
        }
        if let Some(employee) = patch.employee_id {
            self.employee_id = employee;
        }
        match &patch.items {
            Some(ItemsChange::Replace(items)) => self.set_items(items.clone()),
            Some(ItemsChange::Append(item)) => self.push_item(item.clone()),
            Some(ItemsChange::Remove(card)) => {
                self.remove_item(card);
            }
            None => {}
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        require_email(&self.customer_email, "customer email")?;
        self.items.iter().try_for_each(OrderItem::validate)?;
        if checked_total(&self.items).is_none() {
            return Err(CoreError::validation("order total is too large"));
        }
        Ok(())
    }

    fn validate_patch(patch: &OrderPatch) -> Result<(), CoreError> {
        if *patch == OrderPatch::default() {
            return Err(CoreError::validation("nothing to update"));
        }
        if let Some(email) = &patch.customer_email {
            require_email(email, "customer email")?;
        }
        match &patch.items {
            Some(ItemsChange::Replace(items)) => items.iter().try_for_each(OrderItem::validate),
            Some(ItemsChange::Append(item)) => item.validate(),
            Some(ItemsChange::Remove(_)) | None => Ok(()),
        }
    }
}

fn order_id(order: &Order) -> Option<Cow<'_, str>> {
    Some(Cow::Owned(order.order_id.to_string()))
}

fn status(order: &Order) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(order.status.as_ref()))
}

fn customer_email(order: &Order) -> Option<Cow<'_, str>> {
    Some(Cow::Borrowed(order.customer_email.as_str()))
}

const ORDER_FIELDS: &[SearchField<Order>] = &[
    SearchField {
        name: "id",
        extract: order_id,
    },
    SearchField {
        name: "status",
        extract: status,
    },
    SearchField {
        name: "customer",
        extract: customer_email,
    },
];

impl Searchable for Order {
    fn search_fields() -> &'static [SearchField<Self>] {
        ORDER_FIELDS
    }
}

// ── Collection-level queries ─────────────────────────────────────────

/// Next free order id: one past the highest known id, never below
/// [`ORDER_ID_FLOOR`] + 1. `None` once `u64::MAX` is taken.
pub fn next_order_id<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Option<u64> {
    orders
        .into_iter()
        .map(|o| o.order_id)
        .fold(ORDER_ID_FLOOR, u64::max)
        .checked_add(1)
}

pub fn orders_for_employee<'a>(
    orders: impl IntoIterator<Item = &'a Order>,
    employee_id: u64,
) -> impl Iterator<Item = &'a Order> {
    orders
        .into_iter()
        .filter(move |o| o.employee_id == Some(employee_id))
}
