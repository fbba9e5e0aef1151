// ── Optimistic mutation coordinator ──
//
// Applies a create/update/delete to the store immediately, sends it to the
// gateway, then either commits the server's value or restores exactly what
// was there before. Mutations on the same key run strictly in submission
// order; different keys run concurrently.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::Entity;
use crate::store::{EntityCollection, Prior};

/// A single requested change.
#[derive(Debug, Clone)]
pub enum Mutation<T: Entity> {
    Create(T),
    Update { key: T::Key, patch: T::Patch },
    Delete(T::Key),
}

impl<T: Entity> Mutation<T> {
    pub fn key(&self) -> T::Key {
        match self {
            Self::Create(item) => item.key(),
            Self::Update { key, .. } | Self::Delete(key) => key.clone(),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Delete(_) => "delete",
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        match self {
            Self::Create(item) => item.validate(),
            Self::Update { patch, .. } => T::validate_patch(patch),
            Self::Delete(_) => Ok(()),
        }
    }
}

/// Terminal result of a mutation: the committed server value, or `None`
/// for a committed delete.
pub type MutationResult<T> = Result<Option<Arc<T>>, CoreError>;

/// Resolves when the mutation reaches a terminal state.
///
/// Dropping the handle does not cancel anything: the mutation still
/// commits or rolls back in the background.
pub struct MutationHandle<T: Entity> {
    key: T::Key,
    rx: oneshot::Receiver<MutationResult<T>>,
}

impl<T: Entity> MutationHandle<T> {
    pub fn key(&self) -> &T::Key {
        &self.key
    }

    fn ready(key: T::Key, result: MutationResult<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { key, rx }
    }
}

impl<T: Entity> Future for MutationHandle<T> {
    type Output = MutationResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|res| {
            res.unwrap_or_else(|_| Err(CoreError::Internal("mutation task was dropped".into())))
        })
    }
}

// Only the receiver is polled and it is Unpin; `T::Key` is never pinned.
impl<T: Entity> Unpin for MutationHandle<T> {}

/// Tail of a key's queue: the newest mutation's ticket and the signal it
/// fires on reaching a terminal state.
struct QueueSlot {
    ticket: u64,
    done: oneshot::Receiver<()>,
}

/// Cheaply cloneable via `Arc<CoordinatorInner>`.
pub struct MutationCoordinator<T: Entity, G> {
    inner: Arc<CoordinatorInner<T, G>>,
}

impl<T: Entity, G> Clone for MutationCoordinator<T, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<T: Entity, G> {
    store: Arc<EntityCollection<T>>,
    gateway: Arc<G>,
    default_timeout: Option<Duration>,
    queues: DashMap<T::Key, QueueSlot>,
    next_ticket: AtomicU64,
}

impl<T: Entity, G: Gateway<T>> MutationCoordinator<T, G> {
    pub fn new(store: Arc<EntityCollection<T>>, gateway: Arc<G>) -> Self {
        Self::with_default_timeout(store, gateway, None)
    }

    /// `timeout` applies to every gateway call that doesn't name its own.
    pub fn with_default_timeout(
        store: Arc<EntityCollection<T>>,
        gateway: Arc<G>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                gateway,
                default_timeout: timeout,
                queues: DashMap::new(),
                next_ticket: AtomicU64::new(1),
            }),
        }
    }

    pub fn store(&self) -> &Arc<EntityCollection<T>> {
        &self.inner.store
    }

    // ── Submission ───────────────────────────────────────────────────

    /// Submit with the coordinator's default timeout.
    pub fn submit(&self, mutation: Mutation<T>) -> MutationHandle<T> {
        self.submit_with_timeout(mutation, self.inner.default_timeout)
    }

    /// Validate, join the key's queue, and (if the key is idle) apply the
    /// optimistic change before returning. Must be called inside a Tokio
    /// runtime.
    pub fn submit_with_timeout(
        &self,
        mutation: Mutation<T>,
        timeout: Option<Duration>,
    ) -> MutationHandle<T> {
        let key = mutation.key();

        if let Err(e) = mutation.validate() {
            debug!(entity = T::KIND, key = %key, error = %e, "mutation rejected before submission");
            return MutationHandle::ready(key, Err(e));
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return MutationHandle::ready(
                key,
                Err(CoreError::Internal(
                    "mutations must be submitted from within a Tokio runtime".into(),
                )),
            );
        };

        let inner = &self.inner;
        let ticket = inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = oneshot::channel();
        let slot = QueueSlot {
            ticket,
            done: done_rx,
        };
        let predecessor = match inner.queues.entry(key.clone()) {
            Entry::Occupied(mut e) => Some(std::mem::replace(e.get_mut(), slot).done),
            Entry::Vacant(e) => {
                e.insert(slot);
                None
            }
        };

        // Idle key: go optimistic now so the caller sees it on return.
        let staged = match predecessor {
            None => Some(inner.stage(&mutation)),
            Some(_) => None,
        };

        let (result_tx, result_rx) = oneshot::channel();
        let task_inner = Arc::clone(inner);
        let task_key = key.clone();
        runtime.spawn(async move {
            let staged = match predecessor {
                Some(prev) => {
                    // An Err means the predecessor task died; its slot is
                    // still settled, so carry on.
                    let _ = prev.await;
                    task_inner.stage(&mutation)
                }
                None => staged.unwrap_or_else(|| task_inner.stage(&mutation)),
            };
            let result = match staged {
                Ok(prior) => task_inner.execute(mutation, prior, timeout).await,
                Err(e) => Err(e),
            };
            task_inner
                .queues
                .remove_if(&task_key, |_, slot| slot.ticket == ticket);
            let _ = done_tx.send(());
            let _ = result_tx.send(result);
        });

        MutationHandle { key, rx: result_rx }
    }

    pub fn create(&self, item: T) -> impl Future<Output = Result<Arc<T>, CoreError>> + use<T, G> {
        let handle = self.submit(Mutation::Create(item));
        async move {
            handle.await?.ok_or_else(|| {
                CoreError::Internal("create committed without a server value".into())
            })
        }
    }

    pub fn update(
        &self,
        key: T::Key,
        patch: T::Patch,
    ) -> impl Future<Output = Result<Arc<T>, CoreError>> + use<T, G> {
        let handle = self.submit(Mutation::Update { key, patch });
        async move {
            handle.await?.ok_or_else(|| {
                CoreError::Internal("update committed without a server value".into())
            })
        }
    }

    pub fn delete(&self, key: T::Key) -> impl Future<Output = Result<(), CoreError>> + use<T, G> {
        let handle = self.submit(Mutation::Delete(key));
        async move { handle.await.map(|_| ()) }
    }

    // ── Introspection ────────────────────────────────────────────────

    /// Whether any mutation on `key` has not reached a terminal state.
    pub fn pending(&self, key: &T::Key) -> bool {
        self.inner.queues.contains_key(key)
    }

    /// Number of keys with mutations in flight.
    pub fn pending_count(&self) -> usize {
        self.inner.queues.len()
    }
}

impl<T: Entity, G: Gateway<T>> CoordinatorInner<T, G> {
    /// Capture the prior state and apply the optimistic change.
    fn stage(&self, mutation: &Mutation<T>) -> Result<Prior<T>, CoreError> {
        let key = mutation.key();
        let prior = self.store.capture(&key);

        match mutation {
            Mutation::Create(item) => {
                self.store.upsert(item.clone());
            }
            Mutation::Update { patch, .. } => {
                let Some(current) = prior.value.as_deref() else {
                    return Err(CoreError::not_found(T::KIND, &key));
                };
                let mut next = current.clone();
                next.apply_patch(patch);
                next.validate()?;
                self.store.upsert(next);
            }
            Mutation::Delete(_) => {
                self.store.remove(&key);
            }
        }

        debug!(entity = T::KIND, key = %key, op = mutation.label(), "optimistic change applied");
        Ok(prior)
    }

    /// Call the gateway and settle the store.
    async fn execute(
        &self,
        mutation: Mutation<T>,
        prior: Prior<T>,
        timeout: Option<Duration>,
    ) -> MutationResult<T> {
        let key = mutation.key();
        let op = mutation.label();

        let call = async {
            match &mutation {
                Mutation::Create(item) => self.gateway.create(item).await.map(Some),
                Mutation::Update { key, patch } => self.gateway.update(key, patch).await.map(Some),
                Mutation::Delete(key) => self.gateway.delete(key).await.map(|()| None),
            }
        };
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(CoreError::timeout(limit))),
            None => call.await,
        };

        match outcome {
            Ok(Some(server)) => {
                let committed = self.store.rekey(&key, server);
                debug!(entity = T::KIND, key = %key, op, "mutation committed");
                Ok(Some(committed))
            }
            Ok(None) => {
                debug!(entity = T::KIND, key = %key, op, "mutation committed");
                Ok(None)
            }
            Err(e) => {
                warn!(entity = T::KIND, key = %key, op, error = %e, "mutation failed, rolling back");
                self.store.restore(&key, prior);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Card, CardKey, CardPatch, Order, OrderItem, OrderPatch, OrderStatus};
    use crate::store::InsertPosition;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    // ── Scripted gateway ─────────────────────────────────────────────

    /// Replies in call order from a script; records every call.
    struct ScriptedGateway<T: Entity> {
        replies: Mutex<Vec<Reply<T>>>,
        calls: Mutex<Vec<String>>,
    }

    enum Reply<T> {
        Echo { delay: Duration },
        Value(T),
        Fail(CoreError),
        Hang,
    }

    impl<T: Entity> ScriptedGateway<T> {
        fn new(replies: Vec<Reply<T>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into_iter().rev().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn reply(&self, call: String, echo: Option<T>) -> Result<Option<T>, CoreError> {
            self.calls.lock().unwrap().push(call);
            let next = self.replies.lock().unwrap().pop();
            match next.unwrap_or(Reply::Echo {
                delay: Duration::ZERO,
            }) {
                Reply::Echo { delay } => {
                    tokio::time::sleep(delay).await;
                    Ok(echo)
                }
                Reply::Value(v) => Ok(Some(v)),
                Reply::Fail(e) => Err(e),
                Reply::Hang => std::future::pending().await,
            }
        }
    }

    impl<T: Entity> Gateway<T> for ScriptedGateway<T> {
        async fn fetch_all(&self) -> Result<Vec<T>, CoreError> {
            Ok(Vec::new())
        }

        async fn fetch_one(&self, key: &T::Key) -> Result<T, CoreError> {
            Err(CoreError::not_found(T::KIND, key))
        }

        async fn create(&self, item: &T) -> Result<T, CoreError> {
            let out = self.reply(format!("create {}", item.key()), Some(item.clone())).await?;
            out.ok_or_else(|| CoreError::Internal("no value".into()))
        }

        async fn update(&self, key: &T::Key, patch: &T::Patch) -> Result<T, CoreError> {
            let call = format!("update {key} {patch:?}");
            self.reply(call, None)
                .await?
                .ok_or_else(|| CoreError::Internal("scripted update needs a value".into()))
        }

        async fn delete(&self, key: &T::Key) -> Result<(), CoreError> {
            self.reply(format!("delete {key}"), None).await.map(|_| ())
        }
    }

    fn card(number: u32, name: &str, stock: u32) -> Card {
        Card {
            card_number: number,
            set_name: "LEB".into(),
            card_name: name.into(),
            card_type: None,
            mana_value: 0,
            price: dec!(10),
            stock,
        }
    }

    fn key(number: u32) -> CardKey {
        CardKey::new(number, "LEB")
    }

    fn store_with(cards: Vec<Card>) -> Arc<EntityCollection<Card>> {
        let store = Arc::new(EntityCollection::default());
        store.replace(cards);
        store
    }

    // ── Tests ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn update_is_visible_before_the_gateway_answers() {
        let store = store_with(vec![card(1, "Black Lotus", 5)]);
        let gw = ScriptedGateway::new(vec![Reply::Value(card(1, "Black Lotus", 3))]);
        let coord = MutationCoordinator::new(Arc::clone(&store), Arc::clone(&gw));

        let handle = coord.submit(Mutation::Update {
            key: key(1),
            patch: CardPatch::stock(3),
        });
        assert_eq!(store.get(&key(1)).unwrap().stock, 3);
        assert!(coord.pending(&key(1)));

        let committed = handle.await.unwrap().unwrap();
        assert_eq!(committed.stock, 3);
        assert!(!coord.pending(&key(1)));
    }

    #[tokio::test]
    async fn rollback_restores_prior_value_on_not_found() {
        let store = store_with(vec![card(1, "Black Lotus", 5)]);
        let gw = ScriptedGateway::new(vec![Reply::Fail(CoreError::not_found("card", "1/LEB"))]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let err = coord.update(key(1), CardPatch::stock(3)).await.unwrap_err();

        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(store.get(&key(1)).unwrap().stock, 5);
    }

    #[tokio::test]
    async fn rollback_restores_position_after_failed_delete() {
        let store = store_with(vec![card(1, "a", 1), card(2, "b", 1), card(3, "c", 1)]);
        let gw = ScriptedGateway::new(vec![Reply::Fail(CoreError::RemoteRejected {
            status: Some(409),
            message: "card is on an order".into(),
        })]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let handle = coord.submit(Mutation::Delete(key(2)));
        assert!(!store.contains(&key(2)));

        let err = handle.await.unwrap_err();
        assert_eq!(err.to_string(), "Rejected by service (HTTP 409): card is on an order");
        assert_eq!(store.position(&key(2)), Some(1));
    }

    #[tokio::test]
    async fn failed_create_removes_provisional_entry() {
        let store = store_with(vec![card(1, "a", 1)]);
        let gw = ScriptedGateway::new(vec![Reply::Fail(CoreError::NetworkUnavailable {
            reason: "connection refused".into(),
        })]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let handle = coord.submit(Mutation::Create(card(9, "new", 1)));
        assert!(store.contains(&key(9)));

        assert!(handle.await.is_err());
        assert!(!store.contains(&key(9)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn validation_failure_touches_nothing() {
        let store = store_with(vec![card(1, "a", 1)]);
        let gw = ScriptedGateway::<Card>::new(Vec::new());
        let coord = MutationCoordinator::new(Arc::clone(&store), Arc::clone(&gw));
        let version = store.version();

        let err = coord
            .update(key(1), CardPatch::price(dec!(-5)))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(store.version(), version);
        assert!(gw.calls().is_empty());
        assert_eq!(coord.pending_count(), 0);
    }

    #[tokio::test]
    async fn update_of_missing_key_is_not_found_and_skips_gateway() {
        let store = store_with(Vec::new());
        let gw = ScriptedGateway::<Card>::new(Vec::new());
        let coord = MutationCoordinator::new(Arc::clone(&store), Arc::clone(&gw));

        let err = coord.update(key(7), CardPatch::stock(1)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(gw.calls().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn same_key_mutations_run_in_submission_order() {
        let store = store_with(vec![card(1, "Black Lotus", 5)]);
        let gw = ScriptedGateway::new(vec![
            Reply::Value(card(1, "Black Lotus", 4)),
            Reply::Value(card(1, "Black Lotus", 3)),
        ]);
        let coord = MutationCoordinator::new(Arc::clone(&store), Arc::clone(&gw));

        let first = coord.submit(Mutation::Update {
            key: key(1),
            patch: CardPatch::stock(4),
        });
        let second = coord.submit(Mutation::Update {
            key: key(1),
            patch: CardPatch::stock(3),
        });
        // Only the first is applied until it settles.
        assert_eq!(store.get(&key(1)).unwrap().stock, 4);

        let (a, b) = tokio::join!(second, first);
        assert_eq!(b.unwrap().unwrap().stock, 4);
        assert_eq!(a.unwrap().unwrap().stock, 3);
        assert_eq!(store.get(&key(1)).unwrap().stock, 3);

        let calls = gw.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("stock: Some(4)"));
        assert!(calls[1].contains("stock: Some(3)"));
    }

    #[tokio::test]
    async fn queued_mutation_sees_rolled_back_state() {
        let store = store_with(vec![card(1, "Black Lotus", 5)]);
        let gw = ScriptedGateway::new(vec![
            Reply::Fail(CoreError::RemoteRejected {
                status: Some(400),
                message: "no".into(),
            }),
            Reply::Value(card(1, "Black Lotus!", 5)),
        ]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let first = coord.update(key(1), CardPatch::stock(0));
        let second = coord.update(
            key(1),
            CardPatch {
                card_name: Some("Black Lotus!".into()),
                ..CardPatch::default()
            },
        );

        assert!(first.await.is_err());
        let renamed = second.await.unwrap();
        assert_eq!(renamed.stock, 5);
        assert_eq!(store.get(&key(1)).unwrap().card_name, "Black Lotus!");
    }

    #[tokio::test]
    async fn different_keys_run_concurrently() {
        let store = store_with(vec![card(1, "a", 1), card(2, "b", 1)]);
        let gw = ScriptedGateway::new(vec![Reply::Hang, Reply::Value(card(2, "b", 9))]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let _stuck = coord.submit(Mutation::Delete(key(1)));
        let other = coord.update(key(2), CardPatch::stock(9));

        let done = tokio::time::timeout(Duration::from_secs(1), other).await;
        assert_eq!(done.unwrap().unwrap().stock, 9);
        assert!(coord.pending(&key(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_rolls_back() {
        let store = store_with(vec![card(1, "Black Lotus", 5)]);
        let gw = ScriptedGateway::new(vec![Reply::Hang]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let handle = coord.submit_with_timeout(
            Mutation::Update {
                key: key(1),
                patch: CardPatch::stock(0),
            },
            Some(Duration::from_millis(250)),
        );
        assert_eq!(store.get(&key(1)).unwrap().stock, 0);

        let err = handle.await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::Timeout {
                timeout_ms: Some(250)
            }
        ));
        assert_eq!(store.get(&key(1)).unwrap().stock, 5);
    }

    #[tokio::test]
    async fn dropped_handle_still_settles() {
        let store = store_with(vec![card(1, "a", 1)]);
        let gw = ScriptedGateway::new(vec![Reply::Fail(CoreError::Internal("boom".into()))]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        drop(coord.submit(Mutation::Delete(key(1))));
        assert!(!store.contains(&key(1)));

        let mut stream = store.stream();
        while coord.pending(&key(1)) {
            let _ = tokio::time::timeout(Duration::from_millis(50), stream.changed()).await;
        }
        assert!(store.contains(&key(1)));
    }

    #[tokio::test]
    async fn create_with_server_assigned_key_rekeys_in_place() {
        let store = Arc::new(EntityCollection::new(InsertPosition::Prepend));
        store.replace([Order::new(5001, "a@b.c", OrderStatus::Paid)]);
        let gw = ScriptedGateway::new(vec![Reply::Value(Order::new(
            5010,
            "new@b.c",
            OrderStatus::Pending,
        ))]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let created = coord
            .create(Order::new(5002, "new@b.c", OrderStatus::Pending))
            .await
            .unwrap();

        assert_eq!(created.order_id, 5010);
        assert_eq!(store.keys(), vec![5010, 5001]);
    }

    #[tokio::test]
    async fn order_item_patch_recomputes_total_optimistically() {
        let order = Order::new(5001, "sara@mtgshop.com", OrderStatus::Pending).with_items(vec![
            OrderItem::named("Black Lotus", dec!(15000)),
            OrderItem::named("Mox Sapphire", dec!(4000)),
        ]);
        let store = Arc::new(EntityCollection::new(InsertPosition::Prepend));
        store.replace([order]);
        let gw = ScriptedGateway::new(vec![Reply::Hang]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let _handle = coord.submit(Mutation::Update {
            key: 5001,
            patch: OrderPatch::add_item(OrderItem::for_card(CardKey::new(42, "C21"), 4, dec!(2.5))),
        });

        assert_eq!(store.get(&5001).unwrap().total_price(), dec!(19010));
    }

    #[tokio::test]
    async fn order_total_overflow_is_rejected_without_sticking() {
        let order = Order::new(5001, "sara@mtgshop.com", OrderStatus::Pending)
            .with_items(vec![OrderItem::named("Black Lotus", Decimal::MAX)]);
        let store = Arc::new(EntityCollection::new(InsertPosition::Prepend));
        store.replace([order.clone()]);
        let gw = ScriptedGateway::new(Vec::new());
        let coord = MutationCoordinator::new(Arc::clone(&store), Arc::clone(&gw));

        let err = coord
            .update(5001, OrderPatch::add_item(OrderItem::named("Mox Pearl", dec!(1))))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::ErrorKind::Validation);
        assert!(!coord.pending(&5001));
        assert_eq!(coord.pending_count(), 0);
        assert_eq!(*store.get(&5001).unwrap(), order);
        assert!(gw.calls().is_empty());

        // The key is still usable afterwards.
        let mut paid = order.clone();
        paid.status = OrderStatus::Paid;
        let gw = ScriptedGateway::new(vec![Reply::Value(paid)]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);
        let saved = coord.update(5001, OrderPatch::status(OrderStatus::Paid)).await.unwrap();
        assert_eq!(saved.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn same_order_status_changes_run_in_submission_order() {
        let base = Order::new(5001, "sara@mtgshop.com", OrderStatus::Pending);
        let with_status = |status| {
            let mut o = base.clone();
            o.status = status;
            o
        };
        let store = Arc::new(EntityCollection::new(InsertPosition::Prepend));
        store.replace([base.clone()]);
        let gw = ScriptedGateway::new(vec![
            Reply::Value(with_status(OrderStatus::Paid)),
            Reply::Value(with_status(OrderStatus::Fulfilled)),
        ]);
        let coord = MutationCoordinator::new(Arc::clone(&store), Arc::clone(&gw));

        let first = coord.submit(Mutation::Update {
            key: 5001,
            patch: OrderPatch::status(OrderStatus::Paid),
        });
        let second = coord.submit(Mutation::Update {
            key: 5001,
            patch: OrderPatch::status(OrderStatus::Fulfilled),
        });
        assert_eq!(store.get(&5001).unwrap().status, OrderStatus::Paid);
        assert!(coord.pending(&5001));

        let (b, a) = tokio::join!(second, first);
        assert_eq!(a.unwrap().unwrap().status, OrderStatus::Paid);
        assert_eq!(b.unwrap().unwrap().status, OrderStatus::Fulfilled);
        assert_eq!(store.get(&5001).unwrap().status, OrderStatus::Fulfilled);
        assert!(!coord.pending(&5001));

        let calls = gw.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("Some(Paid)"));
        assert!(calls[1].contains("Some(Fulfilled)"));
    }

    fn assert_unpin<U: Unpin>() {}

    fn handles_are_unpin<T: Entity>() {
        assert_unpin::<MutationHandle<T>>();
    }

    #[tokio::test]
    async fn handle_can_be_polled_by_reference() {
        handles_are_unpin::<Card>();
        handles_are_unpin::<Order>();

        let store = store_with(vec![card(1, "Black Lotus", 5)]);
        let gw = ScriptedGateway::new(vec![
            Reply::Value(card(1, "Black Lotus", 2)),
            Reply::Fail(CoreError::Internal("boom".into())),
        ]);
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let mut handle = coord.submit(Mutation::Update {
            key: key(1),
            patch: CardPatch::stock(2),
        });
        let result = tokio::select! {
            res = &mut handle => res,
            () = tokio::time::sleep(Duration::from_secs(5)) => panic!("mutation never settled"),
        };
        assert_eq!(result.unwrap().unwrap().stock, 2);
        assert_eq!(handle.key(), &key(1));

        let mut again = coord.submit(Mutation::Update {
            key: key(1),
            patch: CardPatch::stock(1),
        });
        let polled = std::future::poll_fn(|cx| Pin::new(&mut again).poll(cx)).await;
        assert!(polled.is_err());
        assert_eq!(store.get(&key(1)).unwrap().stock, 2);
    }

    #[test]
    fn submit_outside_runtime_is_an_error() {
        let store = store_with(vec![card(1, "a", 1)]);
        let gw = ScriptedGateway::<Card>::new(Vec::new());
        let coord = MutationCoordinator::new(Arc::clone(&store), gw);

        let handle = coord.submit(Mutation::Delete(key(1)));
        let result = tokio_test::block_on(handle);
        assert!(matches!(result, Err(CoreError::Internal(_))));
        assert!(store.contains(&key(1)));
    }
}
