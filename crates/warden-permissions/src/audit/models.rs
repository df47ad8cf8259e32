//! Audit record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::Caller;
use crate::permission::Action;
use crate::resource::ResourceType;

/// Authorization decision recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditDecision {
    /// Permission check passed
    Granted,
    /// Permission check failed
    Denied,
    /// Several patterns matched the resource id
    Ambiguous,
}

impl std::fmt::Display for AuditDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditDecision::Granted => write!(f, "granted"),
            AuditDecision::Denied => write!(f, "denied"),
            AuditDecision::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// What happened after the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    /// Hook ran and succeeded
    Success,
    /// Hook ran and reported failure
    Failed,
    /// Hook was not run
    Blocked,
    /// Call aborted with an error
    Aborted,
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditResult::Success => write!(f, "success"),
            AuditResult::Failed => write!(f, "failed"),
            AuditResult::Blocked => write!(f, "blocked"),
            AuditResult::Aborted => write!(f, "aborted"),
        }
    }
}

/// One recorded gate decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Random v4 uuid
    pub id: String,
    /// Gate clock time of the decision
    pub timestamp: DateTime<Utc>,
    pub client_id: String,
    pub client_type: String,
    pub resource_type: String,
    pub resource_id: String,
    pub action: Action,
    pub decision: AuditDecision,
    pub result: AuditResult,
    /// Optional additional context (denial reason, hook message)
    pub context: Option<String>,
}

impl AuditLogEntry {
    /// Create a new audit log entry stamped with the current time
    pub fn new(
        caller: &Caller,
        resource_type: &ResourceType,
        resource_id: &str,
        action: Action,
        decision: AuditDecision,
        result: AuditResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            client_id: caller.id.clone(),
            client_type: caller.client_type.clone(),
            resource_type: resource_type.to_string(),
            resource_id: resource_id.to_string(),
            action,
            decision,
            result,
            context: None,
        }
    }

    /// Override the timestamp (e.g., with an injected clock)
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach a denial reason or hook message
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}
