use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;

use crate::models::member::{CreateMember, Member, UpdateMember};
use crate::models::ErrorResponse;
use crate::validation::FieldErrors;

#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a response (connection refused, DNS, ...).
    Http(reqwest::Error),
    Validation(FieldErrors),
    NotFound,
    ServerError { status: u16, body: String },
}

impl ClientError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ClientError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {e}"),
            ClientError::Validation(errors) => write!(f, "validation failed: {errors}"),
            ClientError::NotFound => write!(f, "member not found"),
            ClientError::ServerError { status, body } => {
                write!(f, "server returned {status}: {body}")
            }
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

/// Typed wrapper over the `/members` resource. One round trip per call.
#[derive(Clone)]
pub struct MemberClient {
    client: Client,
    base_url: String,
}

impl MemberClient {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn list(&self) -> Result<Vec<Member>, ClientError> {
        let resp = self.client.get(self.url("/members")).send().await?;
        decode(resp).await
    }

    pub async fn get(&self, id: i64) -> Result<Member, ClientError> {
        let resp = self
            .client
            .get(self.url(&format!("/members/{id}")))
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn create(&self, input: &CreateMember) -> Result<Member, ClientError> {
        let resp = self
            .client
            .post(self.url("/members"))
            .json(input)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn update(&self, id: i64, input: &UpdateMember) -> Result<Member, ClientError> {
        let resp = self
            .client
            .put(self.url(&format!("/members/{id}")))
            .json(input)
            .send()
            .await?;
        decode(resp).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClientError> {
        let resp = self
            .client
            .delete(self.url(&format!("/members/{id}")))
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let resp = check(resp).await?;
    Ok(resp.json().await?)
}

/// Maps non-success responses onto `ClientError`, keeping the server's
/// field-error report intact.
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound);
    }

    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Ok(ErrorResponse { error }) = serde_json::from_str::<ErrorResponse>(&body) {
            if let Some(errors) = error.errors {
                return Err(ClientError::Validation(errors));
            }
        }
    }
    tracing::debug!(status = status.as_u16(), "request failed");
    Err(ClientError::ServerError {
        status: status.as_u16(),
        body,
    })
}
