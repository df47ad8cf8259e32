//! Action gate: authorization in front of resource operations
//!
//! Each of the four verbs resolves the client's effective permission, checks
//! the verb's flag and the expiry, and only then calls the matching hook of
//! the resource's [`ResourceHooks`]. Hook results are passed through as-is.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::audit::{AuditDecision, AuditLogEntry, AuditLogger, AuditResult};
use crate::client::{Caller, Client};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::permission::{Action, PermissionResolver};
use crate::resource::{Resource, ResourceType};
use crate::settings::{AmbiguityPolicy, GateSettings};

/// Result reported by a hook; `Err` carries the hook's failure message
pub type HookResult<T> = std::result::Result<T, String>;

/// Operations backing a resource variant.
///
/// The gate calls exactly one of these per invocation, and only after the
/// caller has been authorized for that verb.
#[async_trait]
pub trait ResourceHooks<R: Resource>: Send + Sync {
    /// Payload returned by `read`
    type Value: Send;
    /// Pass-through arguments
    type Args: Send;

    async fn create(&self, caller: &Caller, resource: &R, args: Self::Args) -> HookResult<String>;

    async fn read(
        &self,
        caller: &Caller,
        resource: &R,
        args: Self::Args,
    ) -> HookResult<Self::Value>;

    async fn update(&self, caller: &Caller, resource: &R, args: Self::Args) -> HookResult<String>;

    async fn delete(&self, caller: &Caller, resource: &R, args: Self::Args) -> HookResult<String>;
}

/// Why a call was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No tier matched the resource
    NoPermission,
    /// A permission matched but its flag for the verb is off
    ActionNotGranted,
    /// A permission matched but has expired
    Expired(DateTime<Utc>),
    /// Several patterns matched and the gate is set to deny
    Ambiguous,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::NoPermission => write!(f, "no matching permission"),
            DenialReason::ActionNotGranted => write!(f, "action not granted"),
            DenialReason::Expired(expiry) => {
                write!(f, "permission expired at {}", expiry.to_rfc3339())
            }
            DenialReason::Ambiguous => write!(f, "ambiguous permissions"),
        }
    }
}

/// A denied call, with a deterministic message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    pub message: String,
}

impl Denial {
    /// Build the message naming client, resource and verb
    pub fn new(
        caller: &Caller,
        resource_type: &ResourceType,
        resource_id: &str,
        action: Action,
        reason: DenialReason,
    ) -> Self {
        let message = format!(
            "{} '{}' may not {} {} '{}': {}",
            caller.client_type, caller.id, action, resource_type, resource_id, reason
        );
        Self { reason, message }
    }
}

impl std::fmt::Display for Denial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of the authorization step alone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Granted(Caller),
    Denied(Denial),
}

/// Outcome of a gated call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult<T> {
    /// Hook ran and succeeded: the read payload, or the hook's status message
    Completed(T),
    /// Hook was not run
    Denied(Denial),
    /// Hook ran and reported failure
    Failed(String),
}

impl<T> ActionResult<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Completed(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, ActionResult::Denied(_))
    }

    /// Denial or hook failure message
    pub fn message(&self) -> Option<&str> {
        match self {
            ActionResult::Completed(_) => None,
            ActionResult::Denied(denial) => Some(&denial.message),
            ActionResult::Failed(message) => Some(message),
        }
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            ActionResult::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            ActionResult::Completed(value) => Some(value),
            _ => None,
        }
    }

    /// Flatten into `(ok, payload or message)`
    pub fn into_result(self) -> std::result::Result<T, String> {
        match self {
            ActionResult::Completed(value) => Ok(value),
            ActionResult::Denied(denial) => Err(denial.message),
            ActionResult::Failed(message) => Err(message),
        }
    }
}

/// Gate wrapping one resource variant's hooks
pub struct ActionGate<R, H> {
    hooks: Arc<H>,
    clock: Arc<dyn Clock>,
    audit_logger: Option<Arc<AuditLogger>>,
    settings: GateSettings,
    _resource: PhantomData<fn(&R)>,
}

impl<R, H> ActionGate<R, H>
where
    R: Resource,
    H: ResourceHooks<R>,
{
    /// Create a gate using the system clock and default settings
    pub fn new(hooks: Arc<H>) -> Self {
        Self {
            hooks,
            clock: Arc::new(SystemClock),
            audit_logger: None,
            settings: GateSettings::default(),
            _resource: PhantomData,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit_logger(mut self, audit_logger: Arc<AuditLogger>) -> Self {
        self.audit_logger = Some(audit_logger);
        self
    }

    pub fn with_settings(mut self, settings: GateSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &GateSettings {
        &self.settings
    }

    pub fn hooks(&self) -> Arc<H> {
        Arc::clone(&self.hooks)
    }

    /// Check whether `client` may perform `action` on `resource`, without running a hook
    ///
    /// # Returns
    /// `Granted` or `Denied`; fails with `AmbiguousPermission` under
    /// [`AmbiguityPolicy::Fail`].
    pub fn authorize<C>(&self, action: Action, client: &C, resource: &R) -> Result<Authorization>
    where
        C: Client + ?Sized,
    {
        let caller = Caller::of(client);
        let resource_type = resource.resource_type();
        let now = self.clock.now();

        let reason = match PermissionResolver::resolve(client, resource) {
            Ok(None) => DenialReason::NoPermission,
            Ok(Some(permission)) if !permission.allows(action) => DenialReason::ActionNotGranted,
            Ok(Some(permission)) if permission.is_expired_at(now) => {
                DenialReason::Expired(permission.expiry())
            }
            Ok(Some(_)) => {
                debug!(
                    client_id = %caller.id,
                    resource_type = %resource_type,
                    resource_id = %resource.id(),
                    action = %action,
                    "Permission granted"
                );
                return Ok(Authorization::Granted(caller));
            }
            Err(err @ Error::AmbiguousPermission { .. }) => {
                self.audit(
                    AuditLogEntry::new(
                        &caller,
                        &resource_type,
                        resource.id(),
                        action,
                        AuditDecision::Ambiguous,
                        match self.settings.ambiguity {
                            AmbiguityPolicy::Fail => AuditResult::Aborted,
                            AmbiguityPolicy::Deny => AuditResult::Blocked,
                        },
                    )
                    .with_context(err.to_string()),
                )?;
                match self.settings.ambiguity {
                    AmbiguityPolicy::Fail => return Err(err),
                    AmbiguityPolicy::Deny => {
                        let denial = Denial::new(
                            &caller,
                            &resource_type,
                            resource.id(),
                            action,
                            DenialReason::Ambiguous,
                        );
                        info!(denial = %denial, "Permission denied");
                        return Ok(Authorization::Denied(denial));
                    }
                }
            }
            Err(err) => return Err(err),
        };

        let denial = Denial::new(&caller, &resource_type, resource.id(), action, reason);
        info!(denial = %denial, "Permission denied");
        self.audit(
            AuditLogEntry::new(
                &caller,
                &resource_type,
                resource.id(),
                action,
                AuditDecision::Denied,
                AuditResult::Blocked,
            )
            .with_context(reason.to_string()),
        )?;
        Ok(Authorization::Denied(denial))
    }

    /// Gated create
    pub async fn create<C>(
        &self,
        client: &C,
        resource: &R,
        args: H::Args,
    ) -> Result<ActionResult<String>>
    where
        C: Client + ?Sized,
    {
        let hooks = &self.hooks;
        self.gated(Action::Create, client, resource, |caller| async move {
            hooks.create(&caller, resource, args).await
        })
        .await
    }

    /// Gated read; carries the hook's payload on success
    pub async fn read<C>(
        &self,
        client: &C,
        resource: &R,
        args: H::Args,
    ) -> Result<ActionResult<H::Value>>
    where
        C: Client + ?Sized,
    {
        let hooks = &self.hooks;
        self.gated(Action::Read, client, resource, |caller| async move {
            hooks.read(&caller, resource, args).await
        })
        .await
    }

    /// Gated update
    pub async fn update<C>(
        &self,
        client: &C,
        resource: &R,
        args: H::Args,
    ) -> Result<ActionResult<String>>
    where
        C: Client + ?Sized,
    {
        let hooks = &self.hooks;
        self.gated(Action::Update, client, resource, |caller| async move {
            hooks.update(&caller, resource, args).await
        })
        .await
    }

    /// Gated delete
    pub async fn delete<C>(
        &self,
        client: &C,
        resource: &R,
        args: H::Args,
    ) -> Result<ActionResult<String>>
    where
        C: Client + ?Sized,
    {
        let hooks = &self.hooks;
        self.gated(Action::Delete, client, resource, |caller| async move {
            hooks.delete(&caller, resource, args).await
        })
        .await
    }

    /// Authorize, then run `call` and pass its result through
    async fn gated<C, T, F, Fut>(
        &self,
        action: Action,
        client: &C,
        resource: &R,
        call: F,
    ) -> Result<ActionResult<T>>
    where
        C: Client + ?Sized,
        F: FnOnce(Caller) -> Fut,
        Fut: Future<Output = HookResult<T>>,
    {
        let caller = match self.authorize(action, client, resource)? {
            Authorization::Granted(caller) => caller,
            Authorization::Denied(denial) => return Ok(ActionResult::Denied(denial)),
        };

        let resource_type = resource.resource_type();
        let resource_id = resource.id().to_string();
        let audit_caller = caller.clone();

        match call(caller).await {
            Ok(value) => {
                self.audit_outcome(AuditLogEntry::new(
                    &audit_caller,
                    &resource_type,
                    &resource_id,
                    action,
                    AuditDecision::Granted,
                    AuditResult::Success,
                ));
                Ok(ActionResult::Completed(value))
            }
            Err(message) => {
                warn!(
                    client_id = %audit_caller.id,
                    resource_type = %resource_type,
                    resource_id = %resource_id,
                    action = %action,
                    error = %message,
                    "Resource hook failed"
                );
                self.audit_outcome(
                    AuditLogEntry::new(
                        &audit_caller,
                        &resource_type,
                        &resource_id,
                        action,
                        AuditDecision::Granted,
                        AuditResult::Failed,
                    )
                    .with_context(message.clone()),
                );
                Ok(ActionResult::Failed(message))
            }
        }
    }

    /// Record what a hook did; the hook's result stands even if this fails
    fn audit_outcome(&self, entry: AuditLogEntry) {
        let (client_id, resource_id, action) =
            (entry.client_id.clone(), entry.resource_id.clone(), entry.action);
        if let Err(err) = self.audit(entry) {
            warn!(
                client_id = %client_id,
                resource_id = %resource_id,
                action = %action,
                error = %err,
                "Failed to record audit entry"
            );
        }
    }

    fn audit(&self, entry: AuditLogEntry) -> Result<()> {
        if !self.settings.audit {
            return Ok(());
        }
        if let Some(logger) = &self.audit_logger {
            logger
                .record(entry.at(self.clock.now()))
                .map_err(Error::Internal)?;
        }
        Ok(())
    }
}
