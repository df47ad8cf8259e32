//! Filtering and paging over recorded gate decisions

use chrono::{DateTime, Utc};

use super::models::{AuditDecision, AuditLogEntry};
use crate::permission::Action;

/// Criteria an entry must meet; `None` fields accept anything
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub client_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub action: Option<Action>,
    pub decision: Option<AuditDecision>,
    /// Inclusive
    pub since: Option<DateTime<Utc>>,
    /// Inclusive
    pub until: Option<DateTime<Utc>>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(self, client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            ..self
        }
    }

    pub fn with_resource_type(self, resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: Some(resource_type.into()),
            ..self
        }
    }

    pub fn with_resource_id(self, resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            ..self
        }
    }

    pub fn with_action(self, action: Action) -> Self {
        Self {
            action: Some(action),
            ..self
        }
    }

    pub fn with_decision(self, decision: AuditDecision) -> Self {
        Self {
            decision: Some(decision),
            ..self
        }
    }

    /// Restrict to entries stamped within `[since, until]`
    pub fn between(self, since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
            ..self
        }
    }

    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        fn accepts<T: PartialEq + ?Sized>(wanted: Option<&T>, actual: &T) -> bool {
            wanted.map_or(true, |wanted| wanted == actual)
        }

        accepts(self.client_id.as_deref(), entry.client_id.as_str())
            && accepts(self.resource_type.as_deref(), entry.resource_type.as_str())
            && accepts(self.resource_id.as_deref(), entry.resource_id.as_str())
            && accepts(self.action.as_ref(), &entry.action)
            && accepts(self.decision.as_ref(), &entry.decision)
            && self.since.map_or(true, |since| entry.timestamp >= since)
            && self.until.map_or(true, |until| entry.timestamp <= until)
    }
}

/// Window into a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: usize,
    pub offset: usize,
}

impl Pagination {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    pub fn first_page(limit: usize) -> Self {
        Self::new(limit, 0)
    }

    pub fn next_page(&self) -> Self {
        Self::new(self.limit, self.offset + self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::first_page(10)
    }
}

/// One page of matching entries
#[derive(Debug, Clone)]
pub struct AuditQuery {
    pub entries: Vec<AuditLogEntry>,
    /// Matching entries across all pages
    pub total: usize,
    pub pagination: Pagination,
}

impl AuditQuery {
    /// Filter `entries` in order and cut out the requested page
    pub fn execute(
        entries: &[AuditLogEntry],
        filter: &QueryFilter,
        pagination: &Pagination,
    ) -> Self {
        let mut total = 0;
        let mut page = Vec::new();
        for entry in entries.iter().filter(|entry| filter.matches(entry)) {
            if total >= pagination.offset && page.len() < pagination.limit {
                page.push(entry.clone());
            }
            total += 1;
        }

        Self {
            entries: page,
            total,
            pagination: *pagination,
        }
    }

    pub fn total_pages(&self) -> usize {
        match self.pagination.limit {
            0 => 0,
            limit => self.total.div_ceil(limit),
        }
    }

    pub fn has_next_page(&self) -> bool {
        self.pagination.offset + self.pagination.limit < self.total
    }
}
