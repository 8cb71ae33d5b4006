//! HTTP client for a running ogte server.
//!
//! Configuration is via environment variables:
//! - `OGTE_URL` - Base URL (default: `http://localhost:3000/api/v1`)
//! - `OGTE_TOKEN` - Session token sent as a bearer token

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::List;

const DEFAULT_URL: &str = "http://localhost:3000/api/v1";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: session token missing or invalid")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct OgteClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl OgteClient {
    pub fn from_env() -> Self {
        let base_url = std::env::var("OGTE_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let token = std::env::var("OGTE_TOKEN").ok();
        Self::new(base_url, token)
    }

    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, body))
        }
    }

    /// The rendered view page of a course module, as JSON.
    pub async fn get_view(&self, cmid: i64) -> Result<serde_json::Value, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/modules/{}/view", cmid))
            .send()
            .await?;
        self.handle_response(response).await
    }

    pub async fn get_lists(&self, cmid: i64) -> Result<Vec<List>, ClientError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/modules/{}/lists", cmid))
            .send()
            .await?;
        self.handle_response(response).await
    }

}

fn status_error(status: StatusCode, body: String) -> ClientError {
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body),
        StatusCode::BAD_REQUEST => ClientError::BadRequest(body),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
        StatusCode::FORBIDDEN => ClientError::Forbidden,
        _ => ClientError::Server(format!("{}: {}", status, body)),
    }
}
