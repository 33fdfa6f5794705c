/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - ex: policy (allow-list / auth scheme), vault client, job submitter, audit log
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - リクエスト間で共有するのは read-only な値と接続プールだけ
 */
use std::sync::Arc;

use crate::repos::AuditLog;
use crate::services::export::ExportPolicy;
use crate::services::jobs::JobSubmitter;
use crate::services::vault::VaultClient;

#[derive(Clone)]
pub struct AppState {
    pub policy: Arc<ExportPolicy>,
    pub vault: VaultClient,
    pub jobs: Arc<dyn JobSubmitter>,
    pub audit: Arc<dyn AuditLog>,
}

impl AppState {
    pub fn new(
        policy: ExportPolicy,
        vault: VaultClient,
        jobs: Arc<dyn JobSubmitter>,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            vault,
            jobs,
            audit,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("policy", &self.policy)
            .field("vault", &self.vault)
            .field("jobs", &self.jobs.backend_name())
            .finish()
    }
}
