// ── Reactive entity streams ──
//
// Subscription types for consuming snapshots of an `EntityCollection`.

mod filter;

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Entity;
use crate::store::Snapshot;

pub use filter::{CardFilter, Filter, OrderFilter, WorkerFilter};

/// A subscription to one collection.
///
/// Holds the snapshot seen last and wakes on change. Bursts of changes
/// coalesce: a slow reader only ever sees the newest snapshot.
pub struct EntityStream<T: Entity> {
    current: Snapshot<T>,
    receiver: watch::Receiver<Snapshot<T>>,
}

impl<T: Entity> EntityStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<Snapshot<T>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last `changed()`.
    pub fn current(&self) -> &Snapshot<T> {
        &self.current
    }

    /// Newest snapshot, without waiting.
    pub fn latest(&self) -> Snapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Look a key up in the current snapshot.
    pub fn find(&self, key: &T::Key) -> Option<Arc<T>> {
        self.current.iter().find(|item| item.key() == *key).cloned()
    }

    /// Wait for the next change and return the new snapshot.
    /// `None` once the collection has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    /// The first item is the snapshot current at conversion time.
    pub fn into_stream(self) -> SnapshotStream<T> {
        SnapshotStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a snapshot per observed change.
pub struct SnapshotStream<T: Entity> {
    inner: WatchStream<Snapshot<T>>,
}

impl<T: Entity> Stream for SnapshotStream<T> {
    type Item = Snapshot<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
