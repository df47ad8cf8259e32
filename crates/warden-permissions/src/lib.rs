//! Permission resolution and action gating for resource operations
//!
//! A client holds grants in three tiers: exact resource id, resource id
//! pattern, and resource type. Resolution picks exactly one tier, highest
//! first; two matching patterns are an error, never a silent choice. The
//! [`ActionGate`] checks the resolved permission before calling a resource's
//! create/read/update/delete hooks.

pub mod audit;
pub mod client;
pub mod clock;
pub mod error;
pub mod gate;
pub mod pattern;
pub mod permission;
pub mod registry;
pub mod resource;
pub mod settings;

#[doc(hidden)]
pub use inventory;

pub use audit::{AuditDecision, AuditLogEntry, AuditLogger, AuditQuery, AuditResult};
pub use client::{Caller, Client, ClientRecord, Grants, SharedClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use gate::{
    ActionGate, ActionResult, Authorization, Denial, DenialReason, HookResult, ResourceHooks,
};
pub use pattern::ResourcePattern;
pub use permission::{
    Action, ClientConfig, GrantConfig, GrantSource, GrantTarget, Permission, PermissionMutator,
    PermissionResolver, ResolvedPermission,
};
pub use registry::{ResourceKind, ResourceTypeRegistry};
pub use resource::{Resource, ResourceType};
pub use settings::{AmbiguityPolicy, GateSettings};
