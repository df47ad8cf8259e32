//! Audit trail of gate decisions

pub mod logger;
pub mod models;
pub mod query;

pub use logger::AuditLogger;
pub use models::{AuditDecision, AuditLogEntry, AuditResult};
pub use query::{AuditQuery, Pagination, QueryFilter};
