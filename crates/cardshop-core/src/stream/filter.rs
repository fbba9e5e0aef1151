// ── Structured filters for entity snapshots ──
//
// Applied by derived views on top of free-text search, without going back
// to the service.

use rust_decimal::Decimal;

use crate::model::{Card, Order, OrderStatus, Worker};

/// A predicate a view can hold onto.
pub trait Filter<T>: Send + Sync {
    fn matches(&self, item: &T) -> bool;
}

/// Filter predicate for card collections.
pub enum CardFilter {
    All,
    InSet(String),
    /// Case-insensitive substring of the type line.
    OfType(String),
    /// Stock at or below the threshold.
    LowStock(u32),
    InStock,
    PriceAtMost(Decimal),
    Custom(Box<dyn Fn(&Card) -> bool + Send + Sync>),
}

impl Filter<Card> for CardFilter {
    fn matches(&self, card: &Card) -> bool {
        match self {
            Self::All => true,
            Self::InSet(set) => card.set_name.eq_ignore_ascii_case(set),
            Self::OfType(wanted) => card
                .card_type
                .as_deref()
                .is_some_and(|t| t.to_lowercase().contains(&wanted.to_lowercase())),
            Self::LowStock(threshold) => card.stock <= *threshold,
            Self::InStock => card.in_stock(),
            Self::PriceAtMost(max) => card.price <= *max,
            Self::Custom(f) => f(card),
        }
    }
}

/// Filter predicate for order collections.
pub enum OrderFilter {
    All,
    ByStatus(OrderStatus),
    /// Pending or paid.
    Active,
    ByEmployee(u64),
    Unassigned,
    ByCustomer(String),
    Custom(Box<dyn Fn(&Order) -> bool + Send + Sync>),
}

impl Filter<Order> for OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        match self {
            Self::All => true,
            Self::ByStatus(status) => order.status == *status,
            Self::Active => order.status.is_active(),
            Self::ByEmployee(id) => order.employee_id == Some(*id),
            Self::Unassigned => order.employee_id.is_none(),
            Self::ByCustomer(email) => order.customer_email.eq_ignore_ascii_case(email),
            Self::Custom(f) => f(order),
        }
    }
}

/// Filter predicate for worker collections.
pub enum WorkerFilter {
    All,
    ByRole(String),
    Custom(Box<dyn Fn(&Worker) -> bool + Send + Sync>),
}

impl Filter<Worker> for WorkerFilter {
    fn matches(&self, worker: &Worker) -> bool {
        match self {
            Self::All => true,
            Self::ByRole(role) => worker.role.eq_ignore_ascii_case(role),
            Self::Custom(f) => f(worker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lotus() -> Card {
        Card {
            card_number: 1,
            set_name: "LEB".into(),
            card_name: "Black Lotus".into(),
            card_type: Some("Artifact".into()),
            mana_value: 0,
            price: dec!(150000),
            stock: 1,
        }
    }

    #[test]
    fn card_filters() {
        let card = lotus();
        assert!(CardFilter::LowStock(2).matches(&card));
        assert!(!CardFilter::LowStock(0).matches(&card));
        assert!(CardFilter::InSet("leb".into()).matches(&card));
        assert!(CardFilter::OfType("artif".into()).matches(&card));
        assert!(!CardFilter::PriceAtMost(dec!(100)).matches(&card));
        assert!(CardFilter::Custom(Box::new(|c| c.mana_value == 0)).matches(&card));
    }

    #[test]
    fn order_filters() {
        let order = Order::new(5001, "Sara@MTGShop.com", OrderStatus::Paid).with_employee(101);
        assert!(OrderFilter::Active.matches(&order));
        assert!(OrderFilter::ByEmployee(101).matches(&order));
        assert!(!OrderFilter::Unassigned.matches(&order));
        assert!(OrderFilter::ByCustomer("sara@mtgshop.com".into()).matches(&order));
        assert!(!OrderFilter::ByStatus(OrderStatus::Fulfilled).matches(&order));
    }
}
