/*!
 * Client Module
 * Headless model of the management panel: an HTTP client for the API plus
 * one store per resource page, the nav bar and the home summary
 */
pub mod drafts;
pub mod home;
pub mod nav;
pub mod notify;
pub mod page;

use reqwest::{multipart::Form, Response};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{Document, Resource};
use crate::error::ErrorResponse;

pub use drafts::{BlogDraft, Draft, ImageFile, ProductDraft, ReviewDraft};
pub use home::HomeSummary;
pub use nav::{NavBar, Route};
pub use notify::{Level, Notification, Notifications};
pub use page::ResourcePage;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected before any request was sent
    #[error("{0}")]
    Validation(String),

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{message} ({status})")]
    Status { status: u16, message: String },
}

/// Request body of a create or update
pub enum Payload {
    Json(Value),
    Multipart(Form),
}

/// Thin wrapper over the `/api/<resource>` endpoints
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str, id: Option<Uuid>) -> String {
        match id {
            Some(id) => format!("{}/api/{}/{}", self.base_url, endpoint, id),
            None => format!("{}/api/{}", self.base_url, endpoint),
        }
    }

    pub async fn list<T: Resource>(&self, endpoint: &str) -> Result<Vec<Document<T>>, ClientError> {
        let response = self.http.get(self.url(endpoint, None)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn create(&self, endpoint: &str, payload: Payload) -> Result<Value, ClientError> {
        let request = self.http.post(self.url(endpoint, None));
        let response = attach(request, payload).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn update(
        &self,
        endpoint: &str,
        id: Uuid,
        payload: Payload,
    ) -> Result<Value, ClientError> {
        let request = self.http.put(self.url(endpoint, Some(id)));
        let response = attach(request, payload).send().await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete(&self, endpoint: &str, id: Uuid) -> Result<Value, ClientError> {
        let response = self.http.delete(self.url(endpoint, Some(id))).send().await?;
        Ok(check(response).await?.json().await?)
    }
}

fn attach(request: reqwest::RequestBuilder, payload: Payload) -> reqwest::RequestBuilder {
    match payload {
        Payload::Json(body) => request.json(&body),
        Payload::Multipart(form) => request.multipart(form),
    }
}

/// Turns a non-2xx response into [`ClientError::Status`] carrying the server message.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_string(),
    };
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
