pub mod error;
pub mod job_audit_repo;

pub use job_audit_repo::{AuditLog, AuditRecord, PgAuditLog};
