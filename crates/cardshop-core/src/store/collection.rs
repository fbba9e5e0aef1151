// ── Generic reactive entity collection ──
//
// Ordered keyed storage for one entity type. Every mutation goes through
// one writer lock, rebuilds the snapshot, bumps the version, and then
// notifies synchronous handlers and `watch` subscribers exactly once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::model::Entity;
use crate::stream::EntityStream;

/// Immutable view of a collection at one version.
pub type Snapshot<T> = Arc<Vec<Arc<T>>>;

type Handler<T> = Arc<dyn Fn(&StoreEvent<T>) + Send + Sync>;

/// Where `upsert` places a key it has not seen before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InsertPosition {
    #[default]
    Append,
    /// Newest first (orders).
    Prepend,
}

/// What a single store mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<K> {
    Replaced { count: usize },
    Inserted(K),
    Updated(K),
    Removed(K),
    Rekeyed { from: K, to: K },
}

/// Delivered to synchronous subscribers after a change is fully applied.
#[derive(Debug, Clone)]
pub struct StoreEvent<T: Entity> {
    pub version: u64,
    pub change: Change<T::Key>,
    pub snapshot: Snapshot<T>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Value and position of a key before an optimistic write.
#[derive(Debug, Clone)]
pub struct Prior<T> {
    pub value: Option<Arc<T>>,
    pub index: Option<usize>,
}

/// Reactive collection for a single entity type.
///
/// Handlers registered with [`subscribe`](Self::subscribe) run on the
/// mutating thread while the writer lock is held, so they observe changes
/// in application order. A handler must not mutate the same collection.
pub struct EntityCollection<T: Entity> {
    entries: RwLock<IndexMap<T::Key, Arc<T>>>,
    /// Serializes mutate-then-notify.
    write_lock: Mutex<()>,
    insert_at: InsertPosition,
    version: AtomicU64,
    snapshot: watch::Sender<Snapshot<T>>,
    handlers: RwLock<Vec<(SubscriptionId, Handler<T>)>>,
    next_subscription: AtomicU64,
}

impl<T: Entity> Default for EntityCollection<T> {
    fn default() -> Self {
        Self::new(InsertPosition::default())
    }
}

impl<T: Entity> EntityCollection<T> {
    pub fn new(insert_at: InsertPosition) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            entries: RwLock::new(IndexMap::new()),
            write_lock: Mutex::new(()),
            insert_at,
            version: AtomicU64::new(0),
            snapshot,
            handlers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
        }
    }

    // ── Mutators ─────────────────────────────────────────────────────

    /// Substitute the whole collection. Duplicate keys keep the first
    /// position and the last value. Always notifies.
    pub fn replace(&self, items: impl IntoIterator<Item = T>) {
        let mut next = IndexMap::new();
        for item in items {
            next.insert(item.key(), Arc::new(item));
        }

        self.mutate(|entries| {
            *entries = next;
            (
                (),
                Some(Change::Replaced {
                    count: entries.len(),
                }),
            )
        });
    }

    /// Insert or overwrite. Existing keys keep their position; new keys go
    /// where the collection's [`InsertPosition`] says. Returns `true` if the
    /// key was new.
    pub fn upsert(&self, item: T) -> bool {
        let insert_at = self.insert_at;
        self.mutate(|entries| {
            let key = item.key();
            let value = Arc::new(item);
            if let Some(slot) = entries.get_mut(&key) {
                *slot = value;
                return (false, Some(Change::Updated(key)));
            }
            match insert_at {
                InsertPosition::Append => {
                    entries.insert(key.clone(), value);
                }
                InsertPosition::Prepend => {
                    entries.shift_insert(0, key.clone(), value);
                }
            }
            (true, Some(Change::Inserted(key)))
        })
    }

    /// Delete `key` if present. An absent key is a silent no-op.
    pub fn remove(&self, key: &T::Key) -> Option<Arc<T>> {
        self.mutate(|entries| match entries.shift_remove(key) {
            Some(removed) => (Some(removed), Some(Change::Removed(key.clone()))),
            None => (None, None),
        })
    }

    // ── Reconciliation helpers ───────────────────────────────────────

    /// Record the current value and position of `key`.
    pub fn capture(&self, key: &T::Key) -> Prior<T> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get_full(key) {
            Some((index, _, value)) => Prior {
                value: Some(Arc::clone(value)),
                index: Some(index),
            },
            None => Prior {
                value: None,
                index: None,
            },
        }
    }

    /// Put back exactly what [`capture`](Self::capture) saw: the prior value
    /// at its prior position, or no entry at all.
    pub fn restore(&self, key: &T::Key, prior: Prior<T>) {
        self.mutate(|entries| match prior.value {
            Some(value) => {
                let existed = entries.shift_remove(key).is_some();
                let index = prior.index.unwrap_or(entries.len()).min(entries.len());
                entries.shift_insert(index, key.clone(), value);
                let change = if existed {
                    Change::Updated(key.clone())
                } else {
                    Change::Inserted(key.clone())
                };
                ((), Some(change))
            }
            None => match entries.shift_remove(key) {
                Some(_) => ((), Some(Change::Removed(key.clone()))),
                None => ((), None),
            },
        });
    }

    /// Store `item` in the slot currently held by `old`, under the item's
    /// own key. Used when the service assigns a different key on create.
    /// Falls back to a plain upsert when `old` is absent.
    pub fn rekey(&self, old: &T::Key, item: T) -> Arc<T> {
        let insert_at = self.insert_at;
        self.mutate(|entries| {
            let new_key = item.key();
            let value = Arc::new(item);

            if new_key == *old {
                if let Some(slot) = entries.get_mut(old) {
                    *slot = Arc::clone(&value);
                    return (value, Some(Change::Updated(new_key)));
                }
            } else {
                // The target key may already be present (e.g. a reload
                // raced the create); the provisional slot wins.
                if entries.contains_key(old) {
                    entries.shift_remove(&new_key);
                }
                if let Some((index, _, _)) = entries.shift_remove_full(old) {
                    entries.shift_insert(index, new_key.clone(), Arc::clone(&value));
                    return (
                        value,
                        Some(Change::Rekeyed {
                            from: old.clone(),
                            to: new_key,
                        }),
                    );
                }
            }

            if let Some(slot) = entries.get_mut(&new_key) {
                *slot = Arc::clone(&value);
                return (value, Some(Change::Updated(new_key)));
            }
            match insert_at {
                InsertPosition::Append => {
                    entries.insert(new_key.clone(), Arc::clone(&value));
                }
                InsertPosition::Prepend => {
                    entries.shift_insert(0, new_key.clone(), Arc::clone(&value));
                }
            }
            (value, Some(Change::Inserted(new_key)))
        })
    }

    // ── Readers ──────────────────────────────────────────────────────

    pub fn get(&self, key: &T::Key) -> Option<Arc<T>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn position(&self, key: &T::Key) -> Option<usize> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get_index_of(key)
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshot.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in collection order.
    pub fn keys(&self) -> Vec<T::Key> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of changes applied so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn insert_position(&self) -> InsertPosition {
        self.insert_at
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Register a synchronous change handler.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StoreEvent<T>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        id
    }

    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(sid, _)| *sid != id);
        handlers.len() != before
    }

    /// Async, coalescing subscription to snapshots.
    pub fn stream(&self) -> EntityStream<T> {
        EntityStream::new(self.snapshot.subscribe())
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshot.subscribe()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Apply `f` under the writer lock. If it reports a change, publish a
    /// fresh snapshot and notify every subscriber before releasing the lock.
    fn mutate<R>(
        &self,
        f: impl FnOnce(&mut IndexMap<T::Key, Arc<T>>) -> (R, Option<Change<T::Key>>),
    ) -> R {
        let _writer = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let (result, published) = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            let (result, change) = f(&mut entries);
            let published = change.map(|c| {
                let values: Vec<Arc<T>> = entries.values().cloned().collect();
                (c, Arc::new(values))
            });
            (result, published)
        };

        if let Some((change, snapshot)) = published {
            self.publish(change, snapshot);
        }
        result
    }

    fn publish(&self, change: Change<T::Key>, snapshot: Snapshot<T>) {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        // `send_replace` updates unconditionally, even with zero receivers.
        self.snapshot.send_replace(Arc::clone(&snapshot));

        let handlers: Vec<Handler<T>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        if handlers.is_empty() {
            return;
        }

        let event = StoreEvent {
            version,
            change,
            snapshot,
        };
        for handler in &handlers {
            handler(&event);
        }
    }
}
