//! Writing grants into a client's permission tiers

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::{
    client::Client,
    error::Result,
    pattern::ResourcePattern,
    permission::models::Permission,
    registry::ResourceTypeRegistry,
    resource::ResourceType,
};

/// Which tier a grant is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantTarget {
    /// Exact resource id
    Id(String),
    /// Resource id pattern
    Pattern(ResourcePattern),
    /// Resource type tag; must be registered
    Type(ResourceType),
}

impl GrantTarget {
    pub fn id(resource_id: impl Into<String>) -> Self {
        GrantTarget::Id(resource_id.into())
    }

    /// Compile a pattern target
    pub fn pattern(source: &str) -> Result<Self> {
        Ok(GrantTarget::Pattern(ResourcePattern::new(source)?))
    }

    pub fn resource_type(resource_type: impl Into<ResourceType>) -> Self {
        GrantTarget::Type(resource_type.into())
    }

    fn tier(&self) -> &'static str {
        match self {
            GrantTarget::Id(_) => "id",
            GrantTarget::Pattern(_) => "pattern",
            GrantTarget::Type(_) => "type",
        }
    }
}

impl std::fmt::Display for GrantTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantTarget::Id(id) => write!(f, "id {}", id),
            GrantTarget::Pattern(pattern) => write!(f, "pattern {}", pattern),
            GrantTarget::Type(resource_type) => write!(f, "type {}", resource_type),
        }
    }
}

/// Sets and rewrites grants on clients.
///
/// Holds the registry used to validate type-tier tags. Pattern conflicts are
/// not checked here; they surface when an ambiguous id is resolved.
#[derive(Debug, Clone, Default)]
pub struct PermissionMutator {
    registry: ResourceTypeRegistry,
}

impl PermissionMutator {
    pub fn new(registry: ResourceTypeRegistry) -> Self {
        Self { registry }
    }

    /// Mutator validating against every kind declared via `register_resource_type!`
    pub fn discovered() -> Self {
        Self::new(ResourceTypeRegistry::discovered())
    }

    pub fn registry(&self) -> &ResourceTypeRegistry {
        &self.registry
    }

    /// Insert or overwrite a grant
    ///
    /// # Returns
    /// The permission previously stored for the same target, if any. Fails
    /// with `InvalidResourceType` for unregistered type tags.
    pub fn set_permission<C: Client + ?Sized>(
        &self,
        client: &mut C,
        target: GrantTarget,
        permission: Permission,
    ) -> Result<Option<Permission>> {
        if let GrantTarget::Type(resource_type) = &target {
            self.registry.validate(resource_type)?;
        }
        Ok(Self::write(client, target, permission))
    }

    /// Exact-id tier
    pub fn set_for_id<C: Client + ?Sized>(
        &self,
        client: &mut C,
        resource_id: impl Into<String>,
        permission: Permission,
    ) -> Option<Permission> {
        Self::write(client, GrantTarget::Id(resource_id.into()), permission)
    }

    /// Pattern tier
    pub fn set_for_pattern<C: Client + ?Sized>(
        &self,
        client: &mut C,
        pattern: ResourcePattern,
        permission: Permission,
    ) -> Option<Permission> {
        Self::write(client, GrantTarget::Pattern(pattern), permission)
    }

    /// Type tier
    pub fn set_for_type<C: Client + ?Sized>(
        &self,
        client: &mut C,
        resource_type: impl Into<ResourceType>,
        permission: Permission,
    ) -> Result<Option<Permission>> {
        self.set_permission(client, GrantTarget::Type(resource_type.into()), permission)
    }

    /// Store an already validated grant
    fn write<C: Client + ?Sized>(
        client: &mut C,
        target: GrantTarget,
        permission: Permission,
    ) -> Option<Permission> {
        debug!(
            client_id = %client.id(),
            tier = target.tier(),
            target = %target,
            "Setting permission"
        );
        let grants = client.grants_mut();
        match target {
            GrantTarget::Id(resource_id) => grants.insert_id(resource_id, permission),
            GrantTarget::Pattern(pattern) => grants.insert_pattern(pattern, permission),
            GrantTarget::Type(resource_type) => grants.insert_type(resource_type, permission),
        }
    }

    /// Replace every grant in all three tiers with one carrying `expiry`.
    ///
    /// Flags are preserved and no entries are added or removed.
    pub fn set_expiry<C: Client + ?Sized>(&self, client: &mut C, expiry: DateTime<Utc>) -> usize {
        let count = client.grants_mut().reissue_all(expiry);
        info!(
            client_id = %client.id(),
            entries = count,
            expiry = %expiry.to_rfc3339(),
            "Rewrote permission expiry"
        );
        count
    }
}
