// Order endpoints: `/orders`, `/orders/{id}`, and the item sub-resources.

use crate::client::ShopClient;
use crate::error::Error;
use crate::types::{OrderCreateUpdate, OrderItemPayload, OrderResponse};

impl ShopClient {
    /// `GET /orders`
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>, Error> {
        self.get(self.url(&["orders"])?).await
    }

    /// `GET /orders/{id}`
    pub async fn get_order(&self, order_id: u64) -> Result<OrderResponse, Error> {
        let id = order_id.to_string();
        self.get(self.url(&["orders", &id])?).await
    }

    /// `POST /orders`
    pub async fn create_order(&self, body: &OrderCreateUpdate) -> Result<OrderResponse, Error> {
        self.post(self.url(&["orders"])?, body).await
    }

    /// `PUT /orders/{id}`
    pub async fn update_order(
        &self,
        order_id: u64,
        body: &OrderCreateUpdate,
    ) -> Result<OrderResponse, Error> {
        let id = order_id.to_string();
        self.put(self.url(&["orders", &id])?, body).await
    }

    /// `DELETE /orders/{id}`
    pub async fn delete_order(&self, order_id: u64) -> Result<(), Error> {
        let id = order_id.to_string();
        self.delete(self.url(&["orders", &id])?).await
    }

    /// Append one item to an order. Returns the updated order.
    ///
    /// `POST /orders/{id}/items`
    pub async fn add_order_item(
        &self,
        order_id: u64,
        item: &OrderItemPayload,
    ) -> Result<OrderResponse, Error> {
        let id = order_id.to_string();
        self.post(self.url(&["orders", &id, "items"])?, item).await
    }

    /// Remove the item referencing a card. Returns the updated order.
    ///
    /// `DELETE /orders/{id}/items/{cardNumber}/{set}`
    pub async fn remove_order_item(
        &self,
        order_id: u64,
        card_number: u32,
        set_name: &str,
    ) -> Result<OrderResponse, Error> {
        let id = order_id.to_string();
        let number = card_number.to_string();
        self.delete_with_response(self.url(&["orders", &id, "items", &number, set_name])?)
            .await
    }
}
