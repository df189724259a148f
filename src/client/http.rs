//! HTTP backend for the portal client
//!
//! Talks to the chat-history read endpoint and the visibility write
//! endpoint, translating HTTP status codes back into the crate's error
//! taxonomy so callers never see raw status handling.

use crate::client::ChatBackend;
use crate::cursor;
use crate::error::{BackchatError, Result};
use crate::pagination::{ChatPage, PageParams};
use crate::storage::Visibility;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use url::Url;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct VisibilityBody {
    visibility: Visibility,
}

/// Client backend over the portal's HTTP API
///
/// The session token is sent as a bearer credential on every request;
/// the server resolves it to the owner id, so the owner never appears
/// in the request itself.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
    token: String,
}

impl HttpBackend {
    /// Create a backend against the given portal base URL
    pub fn new(base_url: Url, token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| BackchatError::Config(format!("Invalid portal URL: {}", e)).into())
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_page(&self, params: &PageParams) -> Result<ChatPage> {
        let mut url = self.endpoint("chats")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &params.limit().to_string());
            if let Some(id) = params.starting_after() {
                query.append_pair("starting_after", &cursor::encode_id(id));
            }
            if let Some(id) = params.ending_before() {
                query.append_pair("ending_before", &cursor::encode_id(id));
            }
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let page = response.json::<ChatPage>().await?;
                Ok(page)
            }
            StatusCode::BAD_REQUEST => {
                Err(BackchatError::BadRequest(body_or_status(response).await).into())
            }
            StatusCode::UNAUTHORIZED => {
                Err(BackchatError::Unauthorized(body_or_status(response).await).into())
            }
            StatusCode::NOT_FOUND => {
                Err(BackchatError::NotFound(body_or_status(response).await).into())
            }
            status => Err(anyhow::anyhow!("unexpected response status: {}", status)),
        }
    }

    async fn update_visibility(&self, chat_id: &str, visibility: Visibility) -> Result<()> {
        let url = self.endpoint(&format!("chats/{}/visibility", chat_id))?;

        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&VisibilityBody { visibility })
            .send()
            .await
            .map_err(|e| BackchatError::WriteFailure(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED => {
                Err(BackchatError::Unauthorized(body_or_status(response).await).into())
            }
            StatusCode::NOT_FOUND => {
                Err(BackchatError::NotFound(body_or_status(response).await).into())
            }
            status => Err(BackchatError::WriteFailure(format!(
                "unexpected response status: {}",
                status
            ))
            .into()),
        }
    }
}

/// Read the response body for an error message, falling back to the status
async fn body_or_status(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) if !body.is_empty() => body,
        _ => status.to_string(),
    }
}
