//! List Backend API Client
//!
//! The [`ListStore`] trait is the contract the sync engine consumes;
//! [`HttpListStore`] implements it against the list backend:
//!
//! - `GET  {base}/retrieve` returns `{"favorites": [...]}`
//! - `POST {base}/add` with `{"tmdb_id", "media_type"}`
//! - `DELETE {base}/delete/{tmdb_id}` with the same body

use crate::client::config::Config;
use crate::shared::content::{FavoriteRecord, FavoriteRequest, ItemKey, ListItem};
use crate::shared::error::ListError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;

/// Remote authority for a user's saved items
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Fetch every saved record belonging to the bearer of `token`
    async fn retrieve_all(&self, token: &str) -> Result<Vec<FavoriteRecord>, ListError>;

    /// Persist a saved item. May return the stored record when the backend
    /// echoes it back.
    async fn add(&self, token: &str, key: ItemKey) -> Result<Option<ListItem>, ListError>;

    /// Delete a saved item
    async fn remove(&self, token: &str, key: ItemKey) -> Result<(), ListError>;
}

/// Entries stay raw here and are converted one by one
#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    favorites: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AddResponse {
    Wrapped { favorite: FavoriteRecord },
    Bare(FavoriteRecord),
}

/// reqwest implementation of [`ListStore`]
#[derive(Debug, Clone)]
pub struct HttpListStore {
    config: Config,
    client: Client,
}

impl HttpListStore {
    pub fn new(config: Config) -> Result<Self, ListError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| ListError::remote(None, format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn request(&self, method: reqwest::Method, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.config.api_url(path))
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", token))
    }

    async fn check_status(response: Response, action: &str) -> Result<Response, ListError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .ok()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or_else(|| status.to_string());
        Err(ListError::remote(
            Some(status.as_u16()),
            format!("{} failed: {}", action, error_text),
        ))
    }
}

#[async_trait]
impl ListStore for HttpListStore {
    async fn retrieve_all(&self, token: &str) -> Result<Vec<FavoriteRecord>, ListError> {
        let response = self
            .request(reqwest::Method::GET, "/retrieve", token)
            .send()
            .await?;
        let response = Self::check_status(response, "retrieve").await?;

        let body = response.bytes().await?;
        let parsed: RetrieveResponse = serde_json::from_slice(&body)?;
        tracing::debug!(records = parsed.favorites.len(), "retrieved saved list");
        Ok(parsed.favorites.into_iter().map(FavoriteRecord::from).collect())
    }

    async fn add(&self, token: &str, key: ItemKey) -> Result<Option<ListItem>, ListError> {
        let response = self
            .request(reqwest::Method::POST, "/add", token)
            .json(&FavoriteRequest::from(key))
            .send()
            .await?;
        let response = Self::check_status(response, "add").await?;

        // The backend only has to signal success; an echoed record is a bonus.
        let body = response.bytes().await.unwrap_or_default();
        let echoed = serde_json::from_slice::<AddResponse>(&body)
            .ok()
            .map(|parsed| match parsed {
                AddResponse::Wrapped { favorite } => favorite,
                AddResponse::Bare(record) => record,
            })
            .and_then(|record| ListItem::try_from(record).ok())
            .filter(|item| item.key() == key);
        Ok(echoed)
    }

    async fn remove(&self, token: &str, key: ItemKey) -> Result<(), ListError> {
        let path = format!("/delete/{}", key.id);
        let response = self
            .request(reqwest::Method::DELETE, &path, token)
            .json(&FavoriteRequest::from(key))
            .send()
            .await?;
        Self::check_status(response, "delete").await?;
        Ok(())
    }
}
