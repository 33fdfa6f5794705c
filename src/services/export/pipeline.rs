//! Export request pipeline.
//!
//! Stages run strictly in order and each one either lets the request through
//! or ends it with a stage-specific status:
//!
//! | stage                 | failure status                  |
//! |-----------------------|---------------------------------|
//! | ValidatingDestination | 400                             |
//! | ValidatingAuthScheme  | 401                             |
//! | ExtractingClaim       | 403                             |
//! | ValidatingTenant      | 403                             |
//! | Authorizing           | vault status (500 on transport) |
//! | SubmittingJob         | 500                             |
//! | LoggingAudit          | 500                             |
//!
//! Every external call is attempted once. A submitted job is not cancelled when
//! the audit write fails afterwards. Once started, a pipeline runs to the end:
//! see [`ExportPipeline::spawn`].

use axum::http::StatusCode;
use chrono::Utc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::repos::AuditRecord;
use crate::services::auth::{AuthScheme, UnverifiedClaims, decode_unverified};
use crate::services::export::destination::S3Destination;
use crate::services::jobs::ExportJob;
use crate::services::vault::{AuthorizationOutcome, VaultAllowList};
use crate::state::AppState;

pub const JOB_STATUS_INITIATED: &str = "INITIATED";

pub const INVALID_DESTINATION: &str = "Invalid s3 destination path.";
pub const UNSUPPORTED_AUTH_SCHEME: &str = "Auth Scheme not supported";
pub const INVALID_VAULT_ID: &str = "Invalid Vault ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingDestination,
    ValidatingAuthScheme,
    ExtractingClaim,
    ValidatingTenant,
    Authorizing,
    SubmittingJob,
    LoggingAudit,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ValidatingDestination => "validating_destination",
            Stage::ValidatingAuthScheme => "validating_auth_scheme",
            Stage::ExtractingClaim => "extracting_claim",
            Stage::ValidatingTenant => "validating_tenant",
            Stage::Authorizing => "authorizing",
            Stage::SubmittingJob => "submitting_job",
            Stage::LoggingAudit => "logging_audit",
        }
    }
}

/// Process-wide, read-only request policy built from `Config` at startup.
#[derive(Debug, Clone)]
pub struct ExportPolicy {
    pub auth_scheme: AuthScheme,
    pub vault_ids: VaultAllowList,
    pub default_region: String,
}

impl ExportPolicy {
    /// Region the job runs in: the request override when given, else the configured one.
    pub fn effective_region<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        match requested.map(str::trim) {
            Some(region) if !region.is_empty() => region,
            _ => &self.default_region,
        }
    }
}

/// Per-request input collected by the handler.
#[derive(Debug, Clone, Default)]
pub struct ExportInput {
    pub vault_id: String,
    pub authorization: Option<String>,
    pub client_ip: Option<String>,
    pub query: String,
    pub destination: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportAccepted {
    pub id: Uuid,
    pub job_id: String,
    pub correlation_id: String,
    pub job_status: &'static str,
}

/// One export request. Owns a clone of `AppState` so it can run detached from
/// the connection that started it.
pub struct ExportPipeline {
    state: AppState,
    id: Uuid,
}

impl ExportPipeline {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            id: Uuid::new_v4(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Run on its own task so dropping the request future (client gone, outer
    /// timeout) cannot stop the pipeline between job submission and audit write.
    pub async fn spawn(self, input: ExportInput) -> Result<ExportAccepted, ApiError> {
        let id = self.id;
        tokio::spawn(async move { self.run(&input).await })
            .await
            .unwrap_or_else(|err| {
                tracing::error!(%id, error = %err, "export task did not complete");
                Err(ApiError::new(
                    id,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Export request aborted: {err}"),
                ))
            })
    }

    pub async fn run(&self, input: &ExportInput) -> Result<ExportAccepted, ApiError> {
        self.validate_destination(&input.destination)?;

        let authorization = input.authorization.as_deref().unwrap_or_default();
        self.validate_auth_scheme(authorization)?;
        let (credential, claims) = self.extract_claim(authorization)?;
        self.validate_tenant(&input.vault_id)?;

        let outcome = self
            .authorize(credential, &input.query, &input.vault_id)
            .await?;

        let region = self.state.policy.effective_region(input.region.as_deref());
        let job_id = self.submit_job(input, region).await?;

        let record = AuditRecord {
            request_id: self.id,
            job_id: job_id.clone(),
            job_status: JOB_STATUS_INITIATED.to_string(),
            correlation_id: outcome.correlation_id.clone(),
            query: input.query.clone(),
            destination: input.destination.clone(),
            cross_region: region != self.state.policy.default_region,
            claim_id: claims.jti,
            client_ip: input.client_ip.clone(),
            created_at: Utc::now(),
        };
        self.log_audit(&record).await?;

        tracing::info!(id = %self.id, job_id = %job_id, "export job initiated");

        Ok(ExportAccepted {
            id: self.id,
            job_id,
            correlation_id: outcome.correlation_id,
            job_status: JOB_STATUS_INITIATED,
        })
    }

    fn fail(&self, stage: Stage, status: StatusCode, message: impl Into<String>) -> ApiError {
        let message = message.into();
        tracing::warn!(
            id = %self.id,
            stage = stage.as_str(),
            status = status.as_u16(),
            message = %message,
            "export request failed"
        );
        ApiError::new(self.id, status, message)
    }

    fn validate_destination(&self, destination: &str) -> Result<(), ApiError> {
        match S3Destination::parse(destination) {
            Ok(dest) => {
                tracing::debug!(id = %self.id, bucket = dest.bucket, "destination accepted");
                Ok(())
            }
            Err(err) => {
                tracing::debug!(id = %self.id, error = %err, destination, "destination rejected");
                Err(self.fail(
                    Stage::ValidatingDestination,
                    StatusCode::BAD_REQUEST,
                    INVALID_DESTINATION,
                ))
            }
        }
    }

    fn validate_auth_scheme(&self, authorization: &str) -> Result<(), ApiError> {
        if self.state.policy.auth_scheme.accepts(authorization) {
            return Ok(());
        }
        Err(self.fail(
            Stage::ValidatingAuthScheme,
            StatusCode::UNAUTHORIZED,
            UNSUPPORTED_AUTH_SCHEME,
        ))
    }

    fn extract_claim<'i>(
        &self,
        authorization: &'i str,
    ) -> Result<(&'i str, UnverifiedClaims), ApiError> {
        let claims = decode_unverified(authorization).map_err(|err| {
            self.fail(Stage::ExtractingClaim, StatusCode::FORBIDDEN, err.to_string())
        })?;
        // scheme 検証と decode が通っていれば 2 番目のトークンは必ずある
        let credential = self
            .state
            .policy
            .auth_scheme
            .credential(authorization)
            .unwrap_or_default();

        Ok((credential, claims))
    }

    fn validate_tenant(&self, vault_id: &str) -> Result<(), ApiError> {
        if self.state.policy.vault_ids.contains(vault_id) {
            return Ok(());
        }
        Err(self.fail(
            Stage::ValidatingTenant,
            StatusCode::FORBIDDEN,
            INVALID_VAULT_ID,
        ))
    }

    async fn authorize(
        &self,
        credential: &str,
        query: &str,
        vault_id: &str,
    ) -> Result<AuthorizationOutcome, ApiError> {
        let outcome = self
            .state
            .vault
            .authorize(credential, query, vault_id, self.id)
            .await;

        if let Some(error) = &outcome.error_text {
            return Err(self.fail(Stage::Authorizing, outcome.status, error.clone()));
        }
        if !outcome.is_authorized() {
            return Err(self.fail(
                Stage::Authorizing,
                outcome.status,
                outcome.body_text.clone(),
            ));
        }

        tracing::info!(id = %self.id, request_id = %outcome.correlation_id, "successfully authorized");
        Ok(outcome)
    }

    async fn submit_job(&self, input: &ExportInput, region: &str) -> Result<String, ApiError> {
        let job = ExportJob {
            request_id: self.id,
            query: input.query.clone(),
            destination: input.destination.clone(),
            region: region.to_string(),
        };

        tracing::info!(
            id = %self.id,
            backend = self.state.jobs.backend_name(),
            destination = %job.destination,
            region = %job.region,
            "triggering spark job"
        );

        self.state.jobs.submit(&job).await.map_err(|err| {
            self.fail(
                Stage::SubmittingJob,
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to trigger Spark job with error: {err}"),
            )
        })
    }

    async fn log_audit(&self, record: &AuditRecord) -> Result<(), ApiError> {
        self.state.audit.record(record).await.map_err(|err| {
            self.fail(
                Stage::LoggingAudit,
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to log job with error: {err}"),
            )
        })?;

        tracing::info!(id = %self.id, job_id = %record.job_id, "audit record written");
        Ok(())
    }
}
