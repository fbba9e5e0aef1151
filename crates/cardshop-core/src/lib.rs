//! Reactive data layer between `cardshop-api` and UI consumers (CLI and
//! anything else that wants live snapshots of the storefront).
//!
//! - **[`EntityCollection<T>`]**: ordered, keyed, reactive storage for one
//!   entity family. Every mutation is applied under one writer lock and
//!   then announced exactly once, both to synchronous handlers and to
//!   `watch`-based [`EntityStream`]s.
//!
//! - **[`DerivedView<T>`]**: a live projection of a collection (free-text
//!   query, structured filter, sort) recomputed lazily when either the
//!   collection or the view's parameters change. [`filter_items`] is the
//!   pure search underneath it.
//!
//! - **[`MutationCoordinator<T, G>`]**: optimistic create/update/delete.
//!   Applies the change locally, calls the [`Gateway`], then commits the
//!   server's value or restores exactly what was there before. Mutations
//!   on one key run in submission order.
//!
//! - **[`Storefront`]**: facade owning the card, order and worker caches
//!   over the HTTP gateways, plus initial load and periodic refresh.
//!
//! - **Domain model** ([`model`]): `Card`, `Order`, `OrderItem`, `Worker`
//!   and their patches, each implementing [`Entity`] and [`Searchable`].

pub mod config;
pub mod convert;
pub mod coordinator;
pub mod error;
pub mod gateway;
pub mod model;
pub mod store;
pub mod storefront;
pub mod stream;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DEFAULT_SERVICE_URL, ServiceConfig, TlsVerification};
pub use coordinator::{Mutation, MutationCoordinator, MutationHandle, MutationResult};
pub use error::{CoreError, ErrorKind};
pub use gateway::{CardGateway, Gateway, OrderGateway, WorkerGateway};
pub use store::{Change, EntityCollection, InsertPosition, Snapshot, StoreEvent, SubscriptionId};
pub use storefront::{ConnectionState, EntityCache, Storefront};
pub use stream::{CardFilter, EntityStream, Filter, OrderFilter, SnapshotStream, WorkerFilter};
pub use view::{DerivedView, filter_items};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Card, CardKey, CardPatch, Entity, ItemsChange, ORDER_ID_FLOOR, Order, OrderItem, OrderPatch,
    OrderStatus, SearchField, Searchable, Worker, WorkerPatch,
};
