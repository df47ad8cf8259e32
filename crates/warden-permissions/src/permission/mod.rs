//! Permission values, resolution and mutation

pub mod config;
pub mod models;
pub mod mutator;
pub mod resolver;

pub use config::{ClientConfig, GrantConfig, PatternGrant, PermissionSpec};
pub use models::{far_future, Action, Permission, DEFAULT_LIFETIME_YEARS};
pub use mutator::{GrantTarget, PermissionMutator};
pub use resolver::{GrantSource, PermissionResolver, ResolvedPermission};
