// Card endpoints: `/card`, `/card/{number}/{set}`, `/card/search`.

use crate::client::ShopClient;
use crate::error::Error;
use crate::types::{CardCreate, CardResponse, CardUpdate};

impl ShopClient {
    /// List every card in the catalog.
    ///
    /// `GET /card`
    pub async fn list_cards(&self) -> Result<Vec<CardResponse>, Error> {
        self.get(self.url(&["card"])?).await
    }

    /// Fetch a single card by its composite key.
    ///
    /// `GET /card/{number}/{set}`
    pub async fn get_card(&self, card_number: u32, set_name: &str) -> Result<CardResponse, Error> {
        let number = card_number.to_string();
        self.get(self.url(&["card", &number, set_name])?).await
    }

    /// Server-side card search.
    ///
    /// `GET /card/search?q={query}`
    pub async fn search_cards(&self, query: &str) -> Result<Vec<CardResponse>, Error> {
        self.get_with_params(self.url(&["card", "search"])?, &[("q", query)])
            .await
    }

    /// `POST /card`
    pub async fn create_card(&self, body: &CardCreate) -> Result<CardResponse, Error> {
        self.post(self.url(&["card"])?, body).await
    }

    /// `PUT /card/{number}/{set}`
    pub async fn update_card(
        &self,
        card_number: u32,
        set_name: &str,
        body: &CardUpdate,
    ) -> Result<CardResponse, Error> {
        let number = card_number.to_string();
        self.put(self.url(&["card", &number, set_name])?, body)
            .await
    }

    /// `DELETE /card/{number}/{set}`
    pub async fn delete_card(&self, card_number: u32, set_name: &str) -> Result<(), Error> {
        let number = card_number.to_string();
        self.delete(self.url(&["card", &number, set_name])?).await
    }
}
