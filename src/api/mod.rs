//! Backend API client
//!
//! All backend calls go through the [`Backend`] trait so services can be
//! exercised against an in-memory fake in tests. [`ApiClient`] is the
//! production implementation over HTTP with JSON bodies and query
//! parameters; the API root is environment-configured.

pub mod memory;
pub mod models;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub use models::{
    Achievement, ArSettings, Checkpoint, Difficulty, Discovery, DiscoveryResponse, HealthResponse,
    MapImage, Plant, Position, ProgressDelta, ProgressSummary, Rarity, Session, Trail,
};

/// Remote operations consumed by the client engine.
///
/// One method per backend endpoint. Implementations must map transport
/// failures to [`AppError::Http`] and non-2xx statuses to
/// [`AppError::Api`]; callers convert those into the user-facing error
/// taxonomy.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_session(&self, device_id: &str) -> Result<Session>;
    async fn get_session(&self, session_id: &str) -> Result<Session>;

    async fn list_plants(&self) -> Result<Vec<Plant>>;
    async fn get_plant(&self, plant_id: &str) -> Result<Plant>;

    /// List checkpoints, optionally scoped to a trail. Supplying a
    /// session id annotates each checkpoint with that session's
    /// `discovered` state.
    async fn list_checkpoints(
        &self,
        trail_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Vec<Checkpoint>>;
    async fn get_checkpoint(
        &self,
        checkpoint_id: u32,
        session_id: Option<&str>,
    ) -> Result<Checkpoint>;

    /// Record a discovery. A `success: false` response is the server's
    /// idempotent rejection and comes back as `Ok`, not `Err`.
    async fn discover_checkpoint(
        &self,
        session_id: &str,
        checkpoint_id: u32,
    ) -> Result<DiscoveryResponse>;

    async fn list_achievements(&self) -> Result<Vec<Achievement>>;
    async fn get_progress(&self, session_id: &str) -> Result<ProgressSummary>;

    async fn list_trails(&self) -> Result<Vec<Trail>>;
    async fn get_trail(&self, trail_id: &str) -> Result<Trail>;

    async fn upload_map(
        &self,
        name: &str,
        trail_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MapImage>;
    async fn get_map(&self, trail_id: &str) -> Result<MapImage>;

    async fn get_settings(&self, session_id: &str) -> Result<ArSettings>;
    async fn update_settings(&self, session_id: &str, settings: &ArSettings)
        -> Result<ArSettings>;

    async fn health_check(&self) -> Result<HealthResponse>;
}

/// HTTP implementation of [`Backend`].
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_root: String,
}

impl ApiClient {
    /// Build a client for the given backend root URL. The `/api` prefix
    /// is appended here so callers configure just the host.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("trailhead/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_root: format!("{}/api", base_url.trim_end_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    /// Check the status and decode the JSON body, mapping non-2xx
    /// responses to `AppError::Api` with the body as the message.
    async fn expect_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!("API returned status {}: {}", status, message);
            return Err(AppError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn create_session(&self, device_id: &str) -> Result<Session> {
        let response = self
            .http
            .post(self.url("/sessions"))
            .query(&[("device_id", device_id)])
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Session> {
        let response = self
            .http
            .get(self.url(&format!("/sessions/{}", session_id)))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn list_plants(&self) -> Result<Vec<Plant>> {
        let response = self.http.get(self.url("/plants")).send().await?;
        Self::expect_json(response).await
    }

    async fn get_plant(&self, plant_id: &str) -> Result<Plant> {
        let response = self
            .http
            .get(self.url(&format!("/plants/{}", plant_id)))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn list_checkpoints(
        &self,
        trail_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<Vec<Checkpoint>> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(trail_id) = trail_id {
            query.push(("trail_id", trail_id));
        }
        if let Some(session_id) = session_id {
            query.push(("session_id", session_id));
        }

        let response = self
            .http
            .get(self.url("/checkpoints"))
            .query(&query)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn get_checkpoint(
        &self,
        checkpoint_id: u32,
        session_id: Option<&str>,
    ) -> Result<Checkpoint> {
        let mut request = self
            .http
            .get(self.url(&format!("/checkpoints/{}", checkpoint_id)));
        if let Some(session_id) = session_id {
            request = request.query(&[("session_id", session_id)]);
        }

        Self::expect_json(request.send().await?).await
    }

    async fn discover_checkpoint(
        &self,
        session_id: &str,
        checkpoint_id: u32,
    ) -> Result<DiscoveryResponse> {
        let response = self
            .http
            .post(self.url("/discoveries"))
            .query(&[
                ("session_id", session_id),
                ("checkpoint_id", &checkpoint_id.to_string()),
            ])
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        let response = self.http.get(self.url("/achievements")).send().await?;
        Self::expect_json(response).await
    }

    async fn get_progress(&self, session_id: &str) -> Result<ProgressSummary> {
        let response = self
            .http
            .get(self.url(&format!("/progress/{}", session_id)))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn list_trails(&self) -> Result<Vec<Trail>> {
        let response = self.http.get(self.url("/trails")).send().await?;
        Self::expect_json(response).await
    }

    async fn get_trail(&self, trail_id: &str) -> Result<Trail> {
        let response = self
            .http
            .get(self.url(&format!("/trails/{}", trail_id)))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn upload_map(
        &self,
        name: &str,
        trail_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<MapImage> {
        let file_part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("name", name.to_string())
            .text("trail_id", trail_id.to_string())
            .part("file", file_part);

        let response = self
            .http
            .post(self.url("/maps"))
            .multipart(form)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn get_map(&self, trail_id: &str) -> Result<MapImage> {
        let response = self
            .http
            .get(self.url(&format!("/maps/{}", trail_id)))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn get_settings(&self, session_id: &str) -> Result<ArSettings> {
        let response = self
            .http
            .get(self.url(&format!("/settings/{}", session_id)))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn update_settings(
        &self,
        session_id: &str,
        settings: &ArSettings,
    ) -> Result<ArSettings> {
        let response = self
            .http
            .put(self.url(&format!("/settings/{}", session_id)))
            .json(settings)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    async fn health_check(&self) -> Result<HealthResponse> {
        let response = self.http.get(self.url("/health")).send().await?;
        Self::expect_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_root_strips_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8000/api/health");
    }
}
