// Worker endpoints: `/workers`, `/workers/{id}`.

use crate::client::ShopClient;
use crate::error::Error;
use crate::types::{WorkerCreateUpdate, WorkerResponse};

impl ShopClient {
    /// `GET /workers`
    pub async fn list_workers(&self) -> Result<Vec<WorkerResponse>, Error> {
        self.get(self.url(&["workers"])?).await
    }

    /// `GET /workers/{id}`
    pub async fn get_worker(&self, employee_id: u64) -> Result<WorkerResponse, Error> {
        let id = employee_id.to_string();
        self.get(self.url(&["workers", &id])?).await
    }

    /// `POST /workers`
    pub async fn create_worker(&self, body: &WorkerCreateUpdate) -> Result<WorkerResponse, Error> {
        self.post(self.url(&["workers"])?, body).await
    }

    /// `PUT /workers/{id}`
    pub async fn update_worker(
        &self,
        employee_id: u64,
        body: &WorkerCreateUpdate,
    ) -> Result<WorkerResponse, Error> {
        let id = employee_id.to_string();
        self.put(self.url(&["workers", &id])?, body).await
    }

    /// `DELETE /workers/{id}`
    pub async fn delete_worker(&self, employee_id: u64) -> Result<(), Error> {
        let id = employee_id.to_string();
        self.delete(self.url(&["workers", &id])?).await
    }
}
