//! In-memory decision log

use std::collections::VecDeque;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::models::{AuditDecision, AuditLogEntry};

/// Log of gate decisions. Clones share the same entries.
///
/// The gate records one entry per call, so an unbounded logger grows for as
/// long as it is attached. Use [`AuditLogger::bounded`] to keep only the most
/// recent entries, or drain it with [`AuditLogger::clear`].
#[derive(Debug, Clone, Default)]
pub struct AuditLogger {
    entries: Arc<RwLock<VecDeque<AuditLogEntry>>>,
    capacity: Option<usize>,
}

impl AuditLogger {
    /// Unbounded logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger keeping at most `capacity` entries; the oldest are dropped first
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            capacity: Some(capacity),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn reader(&self) -> Result<RwLockReadGuard<'_, VecDeque<AuditLogEntry>>, String> {
        self.entries
            .read()
            .map_err(|e| format!("Audit log lock poisoned: {}", e))
    }

    fn writer(&self) -> Result<RwLockWriteGuard<'_, VecDeque<AuditLogEntry>>, String> {
        self.entries
            .write()
            .map_err(|e| format!("Audit log lock poisoned: {}", e))
    }

    pub fn record(&self, entry: AuditLogEntry) -> Result<(), String> {
        let mut entries = self.writer()?;
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return Ok(());
            }
            while entries.len() >= capacity {
                entries.pop_front();
            }
        }
        entries.push_back(entry);
        Ok(())
    }

    /// Copy of every entry, oldest first
    pub fn entries(&self) -> Result<Vec<AuditLogEntry>, String> {
        Ok(self.reader()?.iter().cloned().collect())
    }

    pub fn entries_with_decision(
        &self,
        decision: AuditDecision,
    ) -> Result<Vec<AuditLogEntry>, String> {
        Ok(self
            .reader()?
            .iter()
            .filter(|entry| entry.decision == decision)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> Result<usize, String> {
        Ok(self.reader()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, String> {
        Ok(self.reader()?.is_empty())
    }

    pub fn clear(&self) -> Result<(), String> {
        self.writer()?.clear();
        Ok(())
    }

    /// Poison the lock by panicking while holding it
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let entries = Arc::clone(&self.entries);
        let _ = std::thread::spawn(move || {
            let _guard = entries.write();
            panic!("poisoning audit log");
        })
        .join();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::models::AuditResult;
    use crate::client::Caller;
    use crate::permission::Action;
    use crate::resource::ResourceType;

    fn entry(resource_id: &str, decision: AuditDecision) -> AuditLogEntry {
        let caller = Caller {
            id: "c1".to_string(),
            client_type: "user".to_string(),
        };
        let result = match decision {
            AuditDecision::Granted => AuditResult::Success,
            AuditDecision::Denied => AuditResult::Blocked,
            AuditDecision::Ambiguous => AuditResult::Aborted,
        };
        AuditLogEntry::new(
            &caller,
            &ResourceType::new("document"),
            resource_id,
            Action::Read,
            decision,
            result,
        )
    }

    #[test]
    fn test_new_logger_is_empty() {
        let logger = AuditLogger::new();
        assert!(logger.is_empty().unwrap());
        assert_eq!(logger.len().unwrap(), 0);
    }

    #[test]
    fn test_record_keeps_order() {
        let logger = AuditLogger::new();
        logger.record(entry("doc-1", AuditDecision::Granted)).unwrap();
        logger.record(entry("doc-2", AuditDecision::Denied)).unwrap();

        let ids: Vec<_> = logger
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.resource_id)
            .collect();
        assert_eq!(ids, vec!["doc-1", "doc-2"]);
    }

    #[test]
    fn test_entries_with_decision() {
        let logger = AuditLogger::new();
        for (id, decision) in [
            ("doc-1", AuditDecision::Granted),
            ("doc-2", AuditDecision::Denied),
            ("doc-3", AuditDecision::Denied),
        ] {
            logger.record(entry(id, decision)).unwrap();
        }

        let denied = logger.entries_with_decision(AuditDecision::Denied).unwrap();
        assert_eq!(denied.len(), 2);
        assert_eq!(denied[0].resource_id, "doc-2");
        assert!(logger
            .entries_with_decision(AuditDecision::Ambiguous)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_clear() {
        let logger = AuditLogger::new();
        logger.record(entry("doc-1", AuditDecision::Granted)).unwrap();
        logger.clear().unwrap();
        assert!(logger.is_empty().unwrap());
    }

    #[test]
    fn test_bounded_drops_oldest() {
        let logger = AuditLogger::bounded(2);
        assert_eq!(logger.capacity(), Some(2));
        for id in ["doc-1", "doc-2", "doc-3"] {
            logger.record(entry(id, AuditDecision::Granted)).unwrap();
        }

        let ids: Vec<_> = logger
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.resource_id)
            .collect();
        assert_eq!(ids, vec!["doc-2", "doc-3"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let logger = AuditLogger::bounded(0);
        logger.record(entry("doc-1", AuditDecision::Denied)).unwrap();
        assert!(logger.is_empty().unwrap());
    }

    #[test]
    fn test_poisoned_lock_reports_error() {
        let logger = AuditLogger::new();
        logger.poison();

        let err = logger.record(entry("doc-1", AuditDecision::Granted)).unwrap_err();
        assert!(err.contains("poisoned"));
        assert!(logger.len().is_err());
    }

    #[test]
    fn test_clones_share_entries() {
        let first = AuditLogger::new();
        let second = first.clone();

        first.record(entry("doc-1", AuditDecision::Granted)).unwrap();
        second.record(entry("doc-2", AuditDecision::Denied)).unwrap();

        assert_eq!(first.len().unwrap(), 2);
        assert_eq!(second.len().unwrap(), 2);
    }
}
