//! Clients and their three permission tiers

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::pattern::ResourcePattern;
use crate::permission::Permission;
use crate::resource::ResourceType;

/// The three permission maps a client holds.
///
/// Precedence, highest first: exact resource id, id pattern, resource type.
/// Writes go through [`crate::permission::PermissionMutator`], which validates
/// type tags before they reach this table.
#[derive(Debug, Clone, Default)]
pub struct Grants {
    by_id: HashMap<String, Permission>,
    by_pattern: Vec<(ResourcePattern, Permission)>,
    by_type: HashMap<ResourceType, Permission>,
}

impl Grants {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_id(&self, resource_id: &str) -> Option<&Permission> {
        self.by_id.get(resource_id)
    }

    pub fn for_pattern(&self, pattern: &ResourcePattern) -> Option<&Permission> {
        self.by_pattern
            .iter()
            .find(|(existing, _)| existing == pattern)
            .map(|(_, permission)| permission)
    }

    pub fn for_type(&self, resource_type: &ResourceType) -> Option<&Permission> {
        self.by_type.get(resource_type)
    }

    /// Pattern entries matching a resource id, in insertion order
    pub fn matching_patterns(&self, resource_id: &str) -> Vec<(&ResourcePattern, &Permission)> {
        self.by_pattern
            .iter()
            .filter(|(pattern, _)| pattern.is_match(resource_id))
            .map(|(pattern, permission)| (pattern, permission))
            .collect()
    }

    /// True when more than one pattern matches the id.
    ///
    /// Resolution of such an id fails with `AmbiguousPermission`; call this
    /// first to avoid that path.
    pub fn has_conflict(&self, resource_id: &str) -> bool {
        self.by_pattern
            .iter()
            .filter(|(pattern, _)| pattern.is_match(resource_id))
            .nth(1)
            .is_some()
    }

    pub fn id_entries(&self) -> impl Iterator<Item = (&str, &Permission)> {
        self.by_id.iter().map(|(id, p)| (id.as_str(), p))
    }

    pub fn pattern_entries(&self) -> impl Iterator<Item = (&ResourcePattern, &Permission)> {
        self.by_pattern.iter().map(|(pattern, p)| (pattern, p))
    }

    pub fn type_entries(&self) -> impl Iterator<Item = (&ResourceType, &Permission)> {
        self.by_type.iter()
    }

    /// Total entries across all tiers
    pub fn len(&self) -> usize {
        self.by_id.len() + self.by_pattern.len() + self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn insert_id(
        &mut self,
        resource_id: String,
        permission: Permission,
    ) -> Option<Permission> {
        self.by_id.insert(resource_id, permission)
    }

    pub(crate) fn insert_pattern(
        &mut self,
        pattern: ResourcePattern,
        permission: Permission,
    ) -> Option<Permission> {
        match self.by_pattern.iter_mut().find(|(existing, _)| *existing == pattern) {
            Some((_, slot)) => Some(std::mem::replace(slot, permission)),
            None => {
                self.by_pattern.push((pattern, permission));
                None
            }
        }
    }

    pub(crate) fn insert_type(
        &mut self,
        resource_type: ResourceType,
        permission: Permission,
    ) -> Option<Permission> {
        self.by_type.insert(resource_type, permission)
    }

    /// Replace every stored permission with one carrying the new expiry
    pub(crate) fn reissue_all(&mut self, expiry: DateTime<Utc>) -> usize {
        let mut count = 0;
        for permission in self.by_id.values_mut() {
            *permission = permission.reissue(expiry);
            count += 1;
        }
        for (_, permission) in self.by_pattern.iter_mut() {
            *permission = permission.reissue(expiry);
            count += 1;
        }
        for permission in self.by_type.values_mut() {
            *permission = permission.reissue(expiry);
            count += 1;
        }
        count
    }
}

/// An identity holding permission grants.
///
/// Concrete client variants embed a [`Grants`] table and expose it here.
pub trait Client {
    /// Client identifier
    fn id(&self) -> &str;

    /// Variant name used in denial messages (e.g., "user", "service")
    fn client_type(&self) -> &str;

    fn grants(&self) -> &Grants;

    fn grants_mut(&mut self) -> &mut Grants;
}

/// General-purpose client variant
#[derive(Debug, Clone)]
pub struct ClientRecord {
    id: String,
    client_type: String,
    grants: Grants,
}

impl ClientRecord {
    /// Create a client with no grants
    pub fn new(id: impl Into<String>, client_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_type: client_type.into(),
            grants: Grants::new(),
        }
    }
}

impl Client for ClientRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn client_type(&self) -> &str {
        &self.client_type
    }

    fn grants(&self) -> &Grants {
        &self.grants
    }

    fn grants_mut(&mut self) -> &mut Grants {
        &mut self.grants
    }
}

/// Owned identity of the client on whose behalf a hook runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: String,
    pub client_type: String,
}

impl Caller {
    pub fn of<C: Client + ?Sized>(client: &C) -> Self {
        Self {
            id: client.id().to_string(),
            client_type: client.client_type().to_string(),
        }
    }
}

/// A client behind one lock: many readers, one writer at a time
#[derive(Debug)]
pub struct SharedClient<C> {
    inner: Arc<RwLock<C>>,
}

impl<C> Clone for SharedClient<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Client> SharedClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            inner: Arc::new(RwLock::new(client)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, C> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, C> {
        self.inner.write()
    }

    /// Run a mutation under the write lock
    pub fn update<T>(&self, f: impl FnOnce(&mut C) -> T) -> T {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Clone the client under the read lock.
    ///
    /// Gate calls await hooks; pass a snapshot so no guard is held meanwhile.
    pub fn snapshot(&self) -> C
    where
        C: Clone,
    {
        self.inner.read().clone()
    }
}
