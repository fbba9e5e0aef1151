// ── Remote gateway ──
//
// The boundary between the cache and the source of truth. The coordinator
// and the storefront only talk to `Gateway<T>`; `http` adapts it to the
// storefront service.

mod http;

use std::future::Future;

use crate::error::CoreError;
use crate::model::Entity;

pub use http::{CardGateway, OrderGateway, WorkerGateway};

/// Remote CRUD for one entity type. Every call may fail with a typed
/// [`CoreError`]; successful writes return the server's canonical value.
pub trait Gateway<T: Entity>: Send + Sync + 'static {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<T>, CoreError>> + Send;

    fn fetch_one(&self, key: &T::Key) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn create(&self, item: &T) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn update(
        &self,
        key: &T::Key,
        patch: &T::Patch,
    ) -> impl Future<Output = Result<T, CoreError>> + Send;

    fn delete(&self, key: &T::Key) -> impl Future<Output = Result<(), CoreError>> + Send;
}
