use futures::future;
use serde::Deserialize;
use uuid::Uuid;

use crate::card::{Card, CardContent};

/// A failed API call, folded into the server's error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },
    #[error("{message}")]
    RateLimited {
        retry_after_seconds: u64,
        message: String,
    },
}

#[derive(Default, Deserialize)]
struct WireError {
    error: Option<String>,
    message: Option<String>,
    retry_after_seconds: Option<u64>,
}

impl ClientError {
    /// Builds the error for a non-success status from the response
    /// body. Bodies that are not the expected JSON shape still produce
    /// a usable error.
    pub fn from_parts(status: u16, body: &str) -> Self {
        let wire: WireError = serde_json::from_str(body).unwrap_or_default();
        let message = wire
            .message
            .unwrap_or_else(|| format!("request failed with status {status}"));
        if status == 429 {
            return ClientError::RateLimited {
                retry_after_seconds: wire.retry_after_seconds.unwrap_or(60),
                message,
            };
        }
        ClientError::Api {
            status,
            kind: wire.error.unwrap_or_else(|| "UNKNOWN".to_string()),
            message,
        }
    }

    /// True when the failure signals a bad or expired token and the
    /// session must be torn down. A 403 for the card ceiling is an
    /// ordinary refusal, not an auth problem.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ClientError::Api { status: 401, .. } => true,
            ClientError::Api {
                status: 403, kind, ..
            } => kind != "CARD_LIMIT_EXCEEDED",
            _ => false,
        }
    }
}

/// What survived a fan-out of single-card deletes.
#[derive(Debug, Default)]
pub struct DeleteOutcome {
    pub deleted: Vec<Uuid>,
    pub failed: Vec<(Uuid, ClientError)>,
}

impl DeleteOutcome {
    /// The first failure that signals a dead session, if any.
    pub fn auth_failure(&self) -> Option<&ClientError> {
        self.failed
            .iter()
            .map(|(_, err)| err)
            .find(|err| err.is_auth_failure())
    }
}

/// Typed wrapper over the card service's REST surface. Holds the base
/// URL and the bearer token; every call returns the parsed body or a
/// [`ClientError`].
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn expect_success(res: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        if res.status().is_success() {
            return Ok(res);
        }
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        Err(ClientError::from_parts(status, &body))
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let res = self
            .http
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        Self::expect_success(res).await?;
        Ok(())
    }

    /// Returns the session token; the caller decides where it lives.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ClientError> {
        #[derive(Deserialize)]
        struct LoginResponse {
            token: String,
        }
        let res = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;
        let res = Self::expect_success(res).await?;
        let body: LoginResponse = res.json().await?;
        Ok(body.token)
    }

    pub async fn list_cards(&self) -> Result<Vec<Card>, ClientError> {
        let res = self
            .authorized(self.http.get(self.url("/cards")))
            .send()
            .await?;
        let res = Self::expect_success(res).await?;
        Ok(res.json().await?)
    }

    pub async fn create_card(&self, content: &CardContent) -> Result<Card, ClientError> {
        let res = self
            .authorized(self.http.post(self.url("/cards")))
            .json(content)
            .send()
            .await?;
        let res = Self::expect_success(res).await?;
        Ok(res.json().await?)
    }

    pub async fn update_card(&self, id: Uuid, content: &CardContent) -> Result<Card, ClientError> {
        let res = self
            .authorized(self.http.put(self.url(&format!("/cards/{id}"))))
            .json(content)
            .send()
            .await?;
        let res = Self::expect_success(res).await?;
        Ok(res.json().await?)
    }

    pub async fn delete_card(&self, id: Uuid) -> Result<(), ClientError> {
        let res = self
            .authorized(self.http.delete(self.url(&format!("/cards/{id}"))))
            .send()
            .await?;
        Self::expect_success(res).await?;
        Ok(())
    }

    pub async fn delete_all_cards(&self) -> Result<(), ClientError> {
        let res = self
            .authorized(self.http.delete(self.url("/cards/all")))
            .send()
            .await?;
        Self::expect_success(res).await?;
        Ok(())
    }

    /// Sends a whole batch in one request; returns the server's count.
    pub async fn bulk_import(&self, cards: &[CardContent]) -> Result<u64, ClientError> {
        #[derive(Deserialize)]
        struct ImportSummary {
            #[serde(rename = "importedCount")]
            imported_count: u64,
        }
        tracing::debug!(count = cards.len(), "importing cards");
        let res = self
            .authorized(self.http.post(self.url("/cards/bulk")))
            .json(cards)
            .send()
            .await?;
        let res = Self::expect_success(res).await?;
        let summary: ImportSummary = res.json().await?;
        Ok(summary.imported_count)
    }

    /// Deletes a set of cards concurrently. Partial failure is
    /// expected; the caller reconciles its mirror from `deleted` only.
    pub async fn delete_cards(&self, ids: &[Uuid]) -> DeleteOutcome {
        let deletes = ids
            .iter()
            .map(|&id| async move { (id, self.delete_card(id).await) });
        let mut outcome = DeleteOutcome::default();
        for (id, result) in future::join_all(deletes).await {
            match result {
                Ok(()) => outcome.deleted.push(id),
                Err(err) => {
                    tracing::warn!(card_id = %id, error = %err, "delete failed");
                    outcome.failed.push((id, err));
                }
            }
        }
        outcome
    }
}
