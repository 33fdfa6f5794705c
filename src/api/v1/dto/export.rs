/*
 * Responsibility
 * - export の request/response DTO
 * - JSON のキーは camelCase (jobId, requestId, jobStatus)
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::export::ExportAccepted;

// 欠けたフィールドは空文字として扱い、後段の検証で弾く
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExportQueryRequest {
    pub query: String,
    pub destination: String,
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQueryResponse {
    pub id: Uuid,
    pub job_id: String,
    // correlation id returned by the vault (x-request-id)
    pub request_id: String,
    pub job_status: &'static str,
}

impl From<ExportAccepted> for ExportQueryResponse {
    fn from(accepted: ExportAccepted) -> Self {
        Self {
            id: accepted.id,
            job_id: accepted.job_id,
            request_id: accepted.correlation_id,
            job_status: accepted.job_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailureResponse {
    pub id: Uuid,
    pub message: String,
}
