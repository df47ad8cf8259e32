//! Effective-permission resolution across the three tiers

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::{
    client::{Client, Grants},
    error::{Error, Result},
    permission::models::{Action, Permission},
    resource::{Resource, ResourceType},
};

/// Tier that produced an effective permission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantSource {
    /// Exact resource id
    Id,
    /// Pattern tier, with the matching pattern's source text
    Pattern(String),
    /// Resource type
    Type,
}

impl std::fmt::Display for GrantSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GrantSource::Id => write!(f, "id"),
            GrantSource::Pattern(pattern) => write!(f, "pattern {}", pattern),
            GrantSource::Type => write!(f, "type"),
        }
    }
}

/// Effective permission together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPermission {
    pub permission: Permission,
    pub source: GrantSource,
}

/// Resolves the single effective permission of a client on a resource
pub struct PermissionResolver;

impl PermissionResolver {
    /// Resolve the effective permission
    ///
    /// # Returns
    /// `Ok(None)` when no tier matches (deny). Fails with
    /// `AmbiguousPermission` when two or more patterns match the resource id.
    pub fn resolve<C, R>(client: &C, resource: &R) -> Result<Option<Permission>>
    where
        C: Client + ?Sized,
        R: Resource + ?Sized,
    {
        Ok(Self::resolve_detailed(client, resource)?.map(|resolved| resolved.permission))
    }

    /// Resolve the effective permission and report the tier it came from
    pub fn resolve_detailed<C, R>(client: &C, resource: &R) -> Result<Option<ResolvedPermission>>
    where
        C: Client + ?Sized,
        R: Resource + ?Sized,
    {
        let resolved =
            Self::resolve_in(client.grants(), resource.id(), &resource.resource_type())?;

        match &resolved {
            Some(r) => debug!(
                client_id = %client.id(),
                resource_id = %resource.id(),
                tier = %r.source,
                "Resolved effective permission"
            ),
            None => debug!(
                client_id = %client.id(),
                resource_id = %resource.id(),
                "No permission tier matched"
            ),
        }

        Ok(resolved)
    }

    /// Walk the tiers of a grants table for an id and type tag.
    ///
    /// The first tier producing a result wins; tiers are never merged.
    pub fn resolve_in(
        grants: &Grants,
        resource_id: &str,
        resource_type: &ResourceType,
    ) -> Result<Option<ResolvedPermission>> {
        if let Some(permission) = grants.for_id(resource_id) {
            return Ok(Some(ResolvedPermission {
                permission: *permission,
                source: GrantSource::Id,
            }));
        }

        let matches = grants.matching_patterns(resource_id);
        match matches.as_slice() {
            [] => {}
            [(pattern, permission)] => {
                return Ok(Some(ResolvedPermission {
                    permission: **permission,
                    source: GrantSource::Pattern(pattern.as_str().to_string()),
                }));
            }
            _ => {
                let patterns: Vec<String> =
                    matches.iter().map(|(p, _)| p.as_str().to_string()).collect();
                warn!(
                    resource_id = %resource_id,
                    resource_type = %resource_type,
                    matches = patterns.len(),
                    "Multiple permission patterns match resource"
                );
                return Err(Error::AmbiguousPermission {
                    resource_type: resource_type.to_string(),
                    resource_id: resource_id.to_string(),
                    patterns,
                });
            }
        }

        Ok(grants.for_type(resource_type).map(|permission| ResolvedPermission {
            permission: *permission,
            source: GrantSource::Type,
        }))
    }

    /// Check a single verb, including expiry
    pub fn has_permission<C, R>(
        client: &C,
        resource: &R,
        action: Action,
        now: DateTime<Utc>,
    ) -> Result<bool>
    where
        C: Client + ?Sized,
        R: Resource + ?Sized,
    {
        Ok(Self::resolve(client, resource)?
            .map(|permission| permission.grants(action, now))
            .unwrap_or(false))
    }

    /// Whether the client's pattern tier is ambiguous for this id
    pub fn has_conflict<C: Client + ?Sized>(client: &C, resource_id: &str) -> bool {
        client.grants().has_conflict(resource_id)
    }
}
