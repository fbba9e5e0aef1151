// ── HTTP gateways ──
//
// `Gateway` implementations over `cardshop_api::ShopClient`. Transport
// errors become `CoreError`s here, with not-found errors rewritten to name
// the entity and key that was asked for.

use std::sync::Arc;

use tracing::debug;

use cardshop_api::ShopClient;
use cardshop_api::types::{CardCreate, CardUpdate, OrderItemPayload, WorkerCreateUpdate};

use super::Gateway;
use crate::convert::order_body;
use crate::error::CoreError;
use crate::model::{
    Card, CardKey, CardPatch, Entity, ItemsChange, Order, OrderPatch, Worker, WorkerPatch,
};

fn not_found<K: ToString>(
    kind: &'static str,
    key: &K,
) -> impl FnOnce(cardshop_api::Error) -> CoreError + use<K> {
    let key = key.to_string();
    move |e| CoreError::from(e).for_entity(kind, &key)
}

// ━━ Cards ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Cards over `/card`.
#[derive(Clone)]
pub struct CardGateway {
    client: Arc<ShopClient>,
}

impl CardGateway {
    pub fn new(client: Arc<ShopClient>) -> Self {
        Self { client }
    }

    /// Server-side search (`GET /card/search?q=`), independent of the cache.
    pub async fn search(&self, query: &str) -> Result<Vec<Card>, CoreError> {
        let cards = self.client.search_cards(query).await?;
        Ok(cards.into_iter().map(Card::from).collect())
    }
}

impl Gateway<Card> for CardGateway {
    async fn fetch_all(&self) -> Result<Vec<Card>, CoreError> {
        let cards = self.client.list_cards().await?;
        Ok(cards.into_iter().map(Card::from).collect())
    }

    async fn fetch_one(&self, key: &CardKey) -> Result<Card, CoreError> {
        self.client
            .get_card(key.card_number, &key.set_name)
            .await
            .map(Card::from)
            .map_err(not_found(Card::KIND, key))
    }

    async fn create(&self, item: &Card) -> Result<Card, CoreError> {
        let body = CardCreate::from(item);
        Ok(self.client.create_card(&body).await?.into())
    }

    async fn update(&self, key: &CardKey, patch: &CardPatch) -> Result<Card, CoreError> {
        let body = CardUpdate::from(patch);
        self.client
            .update_card(key.card_number, &key.set_name, &body)
            .await
            .map(Card::from)
            .map_err(not_found(Card::KIND, key))
    }

    async fn delete(&self, key: &CardKey) -> Result<(), CoreError> {
        self.client
            .delete_card(key.card_number, &key.set_name)
            .await
            .map_err(not_found(Card::KIND, key))
    }
}

// ━━ Orders ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Orders over `/orders`.
///
/// Item-only patches use the item endpoints; any other change is a
/// read-modify-write of the whole order with `PUT`.
#[derive(Clone)]
pub struct OrderGateway {
    client: Arc<ShopClient>,
}

impl OrderGateway {
    pub fn new(client: Arc<ShopClient>) -> Self {
        Self { client }
    }
}

impl Gateway<Order> for OrderGateway {
    async fn fetch_all(&self) -> Result<Vec<Order>, CoreError> {
        let orders = self.client.list_orders().await?;
        Ok(orders.into_iter().map(Order::from).collect())
    }

    async fn fetch_one(&self, key: &u64) -> Result<Order, CoreError> {
        self.client
            .get_order(*key)
            .await
            .map(Order::from)
            .map_err(not_found(Order::KIND, key))
    }

    async fn create(&self, item: &Order) -> Result<Order, CoreError> {
        let body = order_body(item);
        Ok(self.client.create_order(&body).await?.into())
    }

    async fn update(&self, key: &u64, patch: &OrderPatch) -> Result<Order, CoreError> {
        if patch.items_only() {
            match &patch.items {
                Some(ItemsChange::Append(item)) => {
                    debug!(order_id = key, "adding order item");
                    let body = OrderItemPayload::from(item);
                    return self
                        .client
                        .add_order_item(*key, &body)
                        .await
                        .map(Order::from)
                        .map_err(not_found(Order::KIND, key));
                }
                Some(ItemsChange::Remove(card)) => {
                    debug!(order_id = key, card = %card, "removing order item");
                    return self
                        .client
                        .remove_order_item(*key, card.card_number, &card.set_name)
                        .await
                        .map(Order::from)
                        .map_err(not_found(Order::KIND, key));
                }
                Some(ItemsChange::Replace(_)) | None => {}
            }
        }

        let mut order = self.fetch_one(key).await?;
        order.apply_patch(patch);
        let body = order_body(&order);
        self.client
            .update_order(*key, &body)
            .await
            .map(Order::from)
            .map_err(not_found(Order::KIND, key))
    }

    async fn delete(&self, key: &u64) -> Result<(), CoreError> {
        self.client
            .delete_order(*key)
            .await
            .map_err(not_found(Order::KIND, key))
    }
}

// ━━ Workers ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Staff records over `/workers`. Updates are read-modify-write because
/// the service only accepts whole records.
#[derive(Clone)]
pub struct WorkerGateway {
    client: Arc<ShopClient>,
}

impl WorkerGateway {
    pub fn new(client: Arc<ShopClient>) -> Self {
        Self { client }
    }
}

impl Gateway<Worker> for WorkerGateway {
    async fn fetch_all(&self) -> Result<Vec<Worker>, CoreError> {
        let workers = self.client.list_workers().await?;
        Ok(workers.into_iter().map(Worker::from).collect())
    }

    async fn fetch_one(&self, key: &u64) -> Result<Worker, CoreError> {
        self.client
            .get_worker(*key)
            .await
            .map(Worker::from)
            .map_err(not_found(Worker::KIND, key))
    }

    async fn create(&self, item: &Worker) -> Result<Worker, CoreError> {
        let body = WorkerCreateUpdate::from(item);
        Ok(self.client.create_worker(&body).await?.into())
    }

    async fn update(&self, key: &u64, patch: &WorkerPatch) -> Result<Worker, CoreError> {
        let mut worker = self.fetch_one(key).await?;
        worker.apply_patch(patch);
        let body = WorkerCreateUpdate::from(&worker);
        self.client
            .update_worker(*key, &body)
            .await
            .map(Worker::from)
            .map_err(not_found(Worker::KIND, key))
    }

    async fn delete(&self, key: &u64) -> Result<(), CoreError> {
        self.client
            .delete_worker(*key)
            .await
            .map_err(not_found(Worker::KIND, key))
    }
}
