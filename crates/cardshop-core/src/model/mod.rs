// ── Domain model ──
//
// Canonical record types for the storefront. Wire formats live in
// `cardshop-api`; `crate::convert` bridges the two.

pub mod card;
pub mod entity;
pub mod order;
pub mod worker;

pub use card::{Card, CardKey, CardPatch};
pub use entity::{Entity, SearchField, Searchable};
pub use order::{
    ItemsChange, ORDER_ID_FLOOR, Order, OrderData, OrderItem, OrderPatch, OrderStatus,
    next_order_id, orders_for_employee,
};
pub use worker::{Worker, WorkerPatch, has_active_orders, next_employee_id};
