/*
 * Responsibility
 * - emr_job_details テーブルへの監査レコード INSERT (1 リクエスト 1 行、追記のみ)
 * - PgPool は起動時に作って使い回す。単発 INSERT なのでトランザクションは張らない
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub request_id: Uuid,
    pub job_id: String,
    pub job_status: String,
    pub correlation_id: String,
    pub query: String,
    pub destination: String,
    pub cross_region: bool,
    pub claim_id: String,
    pub client_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only sink for audit records.
#[async_trait]
pub trait AuditLog: Send + Sync + 'static {
    async fn record(&self, record: &AuditRecord) -> Result<(), RepoError>;
}

#[derive(Clone, Debug)]
pub struct PgAuditLog {
    db: PgPool,
}

impl PgAuditLog {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuditLog for PgAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<(), RepoError> {
        insert(&self.db, record).await
    }
}

pub async fn insert(db: &PgPool, record: &AuditRecord) -> Result<(), RepoError> {
    sqlx::query(
        r#"
        INSERT INTO "emr_job_details" (
            "id", "jobid", "jobstatus", "requestid", "query", "destination",
            "crossregion", "claimid", "clientip", "createdat"
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(record.request_id)
    .bind(&record.job_id)
    .bind(&record.job_status)
    .bind(&record.correlation_id)
    .bind(&record.query)
    .bind(&record.destination)
    .bind(record.cross_region)
    .bind(&record.claim_id)
    .bind(record.client_ip.as_deref())
    .bind(record.created_at)
    .execute(db)
    .await?;

    Ok(())
}
