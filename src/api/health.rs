use crate::models::HealthStatus;

use super::{ApiClient, ApiError};

impl ApiClient {
    /// `GET /health` lives next to `/api`, not under it.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let request = self.http.get(format!("{}/health", self.base_url));
        self.send_json("health", request).await
    }
}
