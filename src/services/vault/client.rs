//! Client for the vault's record-level authorization endpoint.
//!
//! The vault decides whether the caller may run the query. This client never
//! turns a vault rejection into an error: the status code and body are handed
//! back as an [`AuthorizationOutcome`] so the caller can pass them through.
//! Only transport failures (connect, timeout, body read) are mapped to 500.

use std::time::Duration;

use axum::http::{
    StatusCode,
    header::{ACCEPT, AUTHORIZATION},
};
use serde::Serialize;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, thiserror::Error)]
pub enum VaultClientError {
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Result of one authorization call. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationOutcome {
    /// `x-request-id` from the vault response (empty when absent).
    pub correlation_id: String,
    pub status: StatusCode,
    /// Response body as received; the vault may put validation diagnostics here.
    pub body_text: String,
    /// Set when no usable response was obtained (invalid input or transport failure).
    pub error_text: Option<String>,
}

impl AuthorizationOutcome {
    fn failed(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            correlation_id: String::new(),
            status,
            body_text: String::new(),
            error_text: Some(error.into()),
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.error_text.is_none() && self.status == StatusCode::OK
    }
}

#[derive(Serialize)]
struct QueryBody<'a> {
    query: &'a str,
}

#[derive(Clone, Debug)]
pub struct VaultClient {
    base_url: String,
    http: reqwest::Client,
}

impl VaultClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, VaultClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn query_url(&self, vault_id: &str) -> String {
        format!("{}/v1/vaults/{}/query", self.base_url, vault_id)
    }

    /// Ask the vault whether `credential` may run `query` against `vault_id`.
    ///
    /// An empty query is refused locally with 401 and no request is sent.
    pub async fn authorize(
        &self,
        credential: &str,
        query: &str,
        vault_id: &str,
        id: Uuid,
    ) -> AuthorizationOutcome {
        if query.is_empty() {
            tracing::warn!(%id, "got empty query");
            return AuthorizationOutcome::failed(StatusCode::UNAUTHORIZED, "Invalid Query");
        }

        tracing::info!(%id, vault_id, "requesting authorization from vault");

        let response = match self
            .http
            .post(self.query_url(vault_id))
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, format!("Bearer {credential}"))
            .json(&QueryBody { query })
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(%id, error = %err, timeout = err.is_timeout(), "vault authorization call failed");
                return AuthorizationOutcome::failed(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                );
            }
        };

        let status = response.status();
        let correlation_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body_text = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(%id, error = %err, "failed to read vault response body");
                return AuthorizationOutcome::failed(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                );
            }
        };

        if status != StatusCode::OK {
            tracing::warn!(%id, %status, body = %body_text, "vault rejected the query");
        }

        AuthorizationOutcome {
            correlation_id,
            status,
            body_text,
            error_text: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockVault, closed_port_url};

    fn client(base_url: &str) -> VaultClient {
        VaultClient::new(base_url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn empty_query_is_refused_without_a_call() {
        let vault = MockVault::spawn(StatusCode::OK, "{}", Some("abc123")).await;

        let outcome = client(&vault.url())
            .authorize("token", "", "vault-a", Uuid::new_v4())
            .await;

        assert_eq!(outcome.status, StatusCode::UNAUTHORIZED);
        assert_eq!(outcome.error_text.as_deref(), Some("Invalid Query"));
        assert!(!outcome.is_authorized());
        assert!(vault.requests().is_empty());
    }

    #[tokio::test]
    async fn forwards_query_and_credential() {
        let vault = MockVault::spawn(StatusCode::OK, r#"{"records":[]}"#, Some("abc123")).await;

        let outcome = client(&vault.url())
            .authorize("tok.en.sig", "SELECT * FROM cards", "vault-a", Uuid::new_v4())
            .await;

        assert!(outcome.is_authorized());
        assert_eq!(outcome.correlation_id, "abc123");
        assert_eq!(outcome.body_text, r#"{"records":[]}"#);

        let requests = vault.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.vault_id, "vault-a");
        assert_eq!(req.authorization.as_deref(), Some("Bearer tok.en.sig"));
        assert_eq!(req.accept.as_deref(), Some("application/json"));
        assert_eq!(req.content_type.as_deref(), Some("application/json"));
        assert_eq!(req.body, serde_json::json!({ "query": "SELECT * FROM cards" }));
    }

    #[tokio::test]
    async fn rejection_status_is_kept_verbatim() {
        let vault = MockVault::spawn(
            StatusCode::FORBIDDEN,
            r#"{"error":{"message":"no access"}}"#,
            Some("rej-1"),
        )
        .await;

        let outcome = client(&vault.url())
            .authorize("token", "SELECT 1", "vault-a", Uuid::new_v4())
            .await;

        assert_eq!(outcome.status, StatusCode::FORBIDDEN);
        assert_eq!(outcome.body_text, r#"{"error":{"message":"no access"}}"#);
        assert_eq!(outcome.correlation_id, "rej-1");
        assert!(outcome.error_text.is_none());
        assert!(!outcome.is_authorized());
    }

    #[tokio::test]
    async fn missing_request_id_header_is_empty() {
        let vault = MockVault::spawn(StatusCode::OK, "{}", None).await;

        let outcome = client(&vault.url())
            .authorize("token", "SELECT 1", "vault-a", Uuid::new_v4())
            .await;

        assert!(outcome.is_authorized());
        assert_eq!(outcome.correlation_id, "");
    }

    #[tokio::test]
    async fn transport_failure_is_a_server_error() {
        let base_url = closed_port_url().await;

        let outcome = client(&base_url)
            .authorize("token", "SELECT 1", "vault-a", Uuid::new_v4())
            .await;

        assert_eq!(outcome.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(outcome.error_text.is_some());
    }

    #[test]
    fn query_url_joins_base_and_vault() {
        let client = client("https://vault.example.com/");
        assert_eq!(
            client.query_url("abc"),
            "https://vault.example.com/v1/vaults/abc/query"
        );
    }
}
