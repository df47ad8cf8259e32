//! Integration tests for resolution, mutation and the action gate together

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use warden_permissions::{
    register_resource_type, Action, ActionGate, ActionResult, AuditDecision, AuditLogger, Caller,
    Client, ClientRecord, Error, GrantConfig, GrantSource, GrantTarget, HookResult, ManualClock,
    Permission, PermissionMutator, PermissionResolver, Resource, ResourceHooks, ResourcePattern,
    ResourceType, SharedClient,
};

register_resource_type!("file", "Stored file");
register_resource_type!("log", "Log segment");

struct StoredFile {
    id: String,
    contents: String,
}

impl StoredFile {
    fn new(id: &str, contents: &str) -> Self {
        Self {
            id: id.to_string(),
            contents: contents.to_string(),
        }
    }
}

impl Resource for StoredFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::new("file")
    }
}

struct LogSegment(String);

impl Resource for LogSegment {
    fn id(&self) -> &str {
        &self.0
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::new("log")
    }
}

struct FileHooks;

#[async_trait]
impl ResourceHooks<StoredFile> for FileHooks {
    type Value = String;
    type Args = ();

    async fn create(&self, caller: &Caller, file: &StoredFile, _: ()) -> HookResult<String> {
        Ok(format!("{} created {}", caller.id, file.id))
    }

    async fn read(&self, _caller: &Caller, file: &StoredFile, _: ()) -> HookResult<String> {
        Ok(file.contents.clone())
    }

    async fn update(&self, _caller: &Caller, file: &StoredFile, _: ()) -> HookResult<String> {
        Err(format!("{} is read-only storage", file.id))
    }

    async fn delete(&self, caller: &Caller, file: &StoredFile, _: ()) -> HookResult<String> {
        Ok(format!("{} deleted {}", caller.id, file.id))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mutator() -> PermissionMutator {
    PermissionMutator::discovered()
}

#[tokio::test]
async fn test_exact_id_grant_read_allowed_create_denied() {
    init_tracing();
    let mut c1 = ClientRecord::new("c1", "user");
    mutator().set_for_id(&mut c1, "file42", Permission::new(false, true, false, false));

    let gate = ActionGate::new(Arc::new(FileHooks));
    let file = StoredFile::new("file42", "hello");

    let read = gate.read(&c1, &file, ()).await.unwrap();
    assert_eq!(read, ActionResult::Completed("hello".to_string()));

    let create = gate.create(&c1, &file, ()).await.unwrap();
    assert!(create.is_denied());
    let message = create.message().unwrap();
    assert!(message.contains("c1"));
    assert!(message.contains("file42"));
    assert!(message.contains("create"));
    assert_eq!(
        message,
        "user 'c1' may not create file 'file42': action not granted"
    );
}

#[test]
fn test_overlapping_log_patterns_are_ambiguous() {
    init_tracing();
    let m = mutator();
    let mut c2 = ClientRecord::new("c2", "user");
    m.set_for_pattern(
        &mut c2,
        ResourcePattern::new(r"^logs/.*").unwrap(),
        Permission::new(true, true, false, false),
    );
    m.set_for_pattern(
        &mut c2,
        ResourcePattern::new(r"^logs/2024.*").unwrap(),
        Permission::new(false, false, false, false),
    );

    let segment = LogSegment("logs/2024-01".to_string());
    let err = PermissionResolver::resolve(&c2, &segment).unwrap_err();
    assert!(matches!(err, Error::AmbiguousPermission { .. }));
    assert_eq!(
        err.to_string(),
        "Ambiguous permissions for log 'logs/2024-01': patterns [^logs/.*, ^logs/2024.*] all match"
    );
    assert!(PermissionResolver::has_conflict(&c2, "logs/2024-01"));

    // an older segment only matches the broad pattern
    let older = LogSegment("logs/2023-12".to_string());
    let resolved = PermissionResolver::resolve_detailed(&c2, &older).unwrap().unwrap();
    assert_eq!(resolved.source, GrantSource::Pattern(r"^logs/.*".to_string()));
    assert!(resolved.permission.create());
}

#[test]
fn test_set_then_resolve_returns_same_permission() {
    let m = mutator();
    let mut client = ClientRecord::new("c3", "service");
    let expiry = Utc.with_ymd_and_hms(2031, 4, 5, 6, 7, 8).unwrap();
    let p = Permission::with_expiry(true, false, true, false, expiry);

    let previous = m
        .set_permission(&mut client, GrantTarget::id("r1"), p)
        .unwrap();
    assert_eq!(previous, None);

    let resolved = PermissionResolver::resolve(&client, &StoredFile::new("r1", "")).unwrap();
    assert_eq!(resolved, Some(p));
}

#[test]
fn test_discovered_registry_validates_type_tier() {
    let m = mutator();
    let mut client = ClientRecord::new("c4", "user");

    assert!(m.registry().contains(&ResourceType::new("file")));
    assert!(m.set_for_type(&mut client, "log", Permission::read_only()).is_ok());

    let err = m
        .set_for_type(&mut client, "spreadsheet", Permission::full())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidResourceType(ref name) if name == "spreadsheet"));
    assert_eq!(client.grants().len(), 1);
}

#[test]
fn test_set_expiry_applies_to_every_tier() {
    let m = mutator();
    let mut client = ClientRecord::new("c5", "user");
    m.set_for_id(&mut client, "file1", Permission::new(false, true, false, false));
    m.set_for_pattern(
        &mut client,
        ResourcePattern::new("^tmp-").unwrap(),
        Permission::new(true, true, true, true),
    );
    m.set_for_type(&mut client, "log", Permission::new(false, true, false, true))
        .unwrap();

    let expiry = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(m.set_expiry(&mut client, expiry), 3);

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    for id in ["file1", "tmp-9"] {
        let resource = StoredFile::new(id, "");
        let permission = PermissionResolver::resolve(&client, &resource).unwrap().unwrap();
        assert_eq!(permission.expiry(), expiry);
        assert!(permission.read());
        let allowed =
            PermissionResolver::has_permission(&client, &resource, Action::Read, now).unwrap();
        assert!(!allowed);
    }
    let log = PermissionResolver::resolve(&client, &LogSegment("logs/x".to_string()))
        .unwrap()
        .unwrap();
    assert_eq!(log.expiry(), expiry);
    assert!(log.delete());
}

#[tokio::test]
async fn test_grant_document_drives_gate() {
    init_tracing();
    let document = GrantConfig::from_toml_str(
        r#"
        [by_id."file1"]
        read = true
        delete = true

        [[by_pattern]]
        pattern = '^drafts/'
        create = true
        read = true
        update = true

        [by_type.file]
        read = true
        expiry = "2024-06-01T00:00:00Z"
        "#,
    )
    .unwrap();

    let mut client = ClientRecord::new("editor-1", "user");
    document.apply(&mut client, &mutator()).unwrap();
    assert_eq!(client.grants().len(), 3);

    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()));
    let logger = Arc::new(AuditLogger::new());
    let gate = ActionGate::new(Arc::new(FileHooks))
        .with_clock(clock.clone())
        .with_audit_logger(logger.clone());

    let deleted = gate
        .delete(&client, &StoredFile::new("file1", ""), ())
        .await
        .unwrap();
    assert_eq!(deleted.into_payload().as_deref(), Some("editor-1 deleted file1"));

    // update is granted, so the hook's own failure comes back untouched
    let updated = gate
        .update(&client, &StoredFile::new("drafts/a", ""), ())
        .await
        .unwrap();
    assert_eq!(
        updated,
        ActionResult::Failed("drafts/a is read-only storage".to_string())
    );

    let other = StoredFile::new("reports/q1", "numbers");
    assert!(gate.read(&client, &other, ()).await.unwrap().is_ok());

    clock.advance(Duration::days(60));
    let expired = gate.read(&client, &other, ()).await.unwrap();
    assert_eq!(
        expired.message(),
        Some(concat!(
            "user 'editor-1' may not read file 'reports/q1': ",
            "permission expired at 2024-06-01T00:00:00+00:00"
        ))
    );

    assert_eq!(logger.len().unwrap(), 4);
    assert_eq!(
        logger
            .entries_with_decision(AuditDecision::Denied)
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_shared_client_snapshot_across_hook() {
    let shared = SharedClient::new(ClientRecord::new("c6", "user"));
    shared.update(|client| {
        mutator().set_for_id(client, "file7", Permission::read_only());
    });

    let gate = ActionGate::new(Arc::new(FileHooks));
    let snapshot = shared.snapshot();
    let result = gate
        .read(&snapshot, &StoredFile::new("file7", "seven"), ())
        .await
        .unwrap();
    assert_eq!(result.into_payload().as_deref(), Some("seven"));

    // writers are not blocked by a snapshot in flight
    shared.update(|client| {
        mutator().set_expiry(client, Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
    });
    let denied = gate
        .read(&shared.snapshot(), &StoredFile::new("file7", "seven"), ())
        .await
        .unwrap();
    assert!(denied.is_denied());
}
