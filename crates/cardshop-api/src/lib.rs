// cardshop-api: Async Rust client for the storefront service.
//
// One JSON-over-HTTP surface with three resource families: `/card`,
// `/orders`, `/workers`. Endpoint groups are inherent methods on
// `ShopClient`, split by resource into their own modules.

pub mod cards;
pub mod client;
pub mod error;
pub mod orders;
pub mod transport;
pub mod types;
pub mod workers;

pub use client::ShopClient;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
