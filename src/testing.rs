//! Shared test doubles: an in-process vault, fake job backend and fake audit log.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::repos::{AuditLog, AuditRecord, error::RepoError};
use crate::services::auth::AuthScheme;
use crate::services::export::ExportPolicy;
use crate::services::jobs::{ExportJob, JobSubmitError, JobSubmitter};
use crate::services::vault::{VaultAllowList, VaultClient};
use crate::state::AppState;

pub fn token_with_claims(claims: Value) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("encode test token")
}

pub fn unsigned_token(claims: Value, signature: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.{signature}")
}

pub fn bearer(claims: Value) -> String {
    format!("Bearer {}", token_with_claims(claims))
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub vault_id: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockVaultState {
    status: StatusCode,
    body: String,
    request_id: Option<String>,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
}

/// Vault stand-in serving `POST /v1/vaults/{vault_id}/query` on 127.0.0.1.
pub struct MockVault {
    addr: std::net::SocketAddr,
    captured: Arc<Mutex<Vec<CapturedRequest>>>,
    handle: JoinHandle<()>,
}

impl MockVault {
    pub async fn spawn(status: StatusCode, body: &str, request_id: Option<&str>) -> Self {
        async fn query(
            State(state): State<MockVaultState>,
            Path(vault_id): Path<String>,
            headers: HeaderMap,
            Json(body): Json<Value>,
        ) -> Response {
            let read = |name: header::HeaderName| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            state.captured.lock().unwrap().push(CapturedRequest {
                vault_id,
                authorization: read(header::AUTHORIZATION),
                accept: read(header::ACCEPT),
                content_type: read(header::CONTENT_TYPE),
                body,
            });

            let mut res = (state.status, state.body.clone()).into_response();
            if let Some(id) = &state.request_id {
                res.headers_mut()
                    .insert("x-request-id", HeaderValue::from_str(id).unwrap());
            }
            res
        }

        let captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/v1/vaults/{vault_id}/query", post(query))
            .with_state(MockVaultState {
                status,
                body: body.to_string(),
                request_id: request_id.map(str::to_string),
                captured: captured.clone(),
            });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let addr = listener.local_addr().expect("local_addr should succeed");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            captured,
            handle,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().unwrap().clone()
    }
}

impl Drop for MockVault {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Base URL of a local port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr = listener.local_addr().expect("local_addr should succeed");
    drop(listener);
    format!("http://{addr}")
}

pub struct FakeJobs {
    result: Result<String, String>,
    delay: Duration,
    calls: Mutex<Vec<ExportJob>>,
}

impl FakeJobs {
    pub fn succeeding(job_id: &str) -> Arc<Self> {
        Self::slow(job_id, Duration::ZERO)
    }

    /// Succeeds after sleeping `delay` (the call is recorded before the sleep).
    pub fn slow(job_id: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(job_id.to_string()),
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Err(message.to_string()),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<ExportJob> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobSubmitter for FakeJobs {
    fn backend_name(&self) -> &'static str {
        "fake"
    }

    async fn submit(&self, job: &ExportJob) -> Result<String, JobSubmitError> {
        self.calls.lock().unwrap().push(job.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone().map_err(JobSubmitError::Backend)
    }
}

pub struct FakeAudit {
    fail: bool,
    records: Mutex<Vec<AuditRecord>>,
}

impl FakeAudit {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            records: Mutex::new(Vec::new()),
        })
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLog for FakeAudit {
    async fn record(&self, record: &AuditRecord) -> Result<(), RepoError> {
        if self.fail {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// State with allow-list `["vault-a", "vault-b"]`, scheme `Bearer`, region `us-east-1`.
pub fn test_state(vault_url: &str, jobs: Arc<FakeJobs>, audit: Arc<FakeAudit>) -> AppState {
    let policy = ExportPolicy {
        auth_scheme: AuthScheme::default(),
        vault_ids: VaultAllowList::new(["vault-a".to_string(), "vault-b".to_string()]),
        default_region: "us-east-1".to_string(),
    };
    let vault = VaultClient::new(vault_url, Duration::from_secs(5)).expect("vault client");

    AppState::new(policy, vault, jobs, audit)
}
