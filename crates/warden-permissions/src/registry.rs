//! Registry of valid resource type tags
//!
//! Resource variants declare themselves with [`register_resource_type!`],
//! which submits a [`ResourceKind`] through `inventory`. At startup,
//! [`ResourceTypeRegistry::discovered`] collects every submitted kind, so the
//! type tier can reject tags that no variant declares.
//!
//! ```rust,ignore
//! warden_permissions::register_resource_type!("document", "Shared documents");
//!
//! let registry = ResourceTypeRegistry::discovered();
//! assert!(registry.contains(&ResourceType::new("document")));
//! ```

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::resource::ResourceType;

/// A resource variant declared via `inventory`
#[derive(Debug)]
pub struct ResourceKind {
    /// Type tag (e.g., "document", "log")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
}

impl ResourceKind {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            description: "",
        }
    }

    pub const fn with_description(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }

    pub fn resource_type(&self) -> ResourceType {
        ResourceType::new(self.name)
    }
}

inventory::collect!(ResourceKind);

/// Declare a resource type tag so that [`ResourceTypeRegistry::discovered`] sees it
#[macro_export]
macro_rules! register_resource_type {
    ($name:expr) => {
        $crate::inventory::submit! {
            $crate::registry::ResourceKind::new($name)
        }
    };
    ($name:expr, $description:expr) => {
        $crate::inventory::submit! {
            $crate::registry::ResourceKind::with_description($name, $description)
        }
    };
}

/// Names of every kind submitted through `inventory`, sorted
pub fn list_discovered_kinds() -> Vec<&'static str> {
    let mut names: Vec<_> = inventory::iter::<ResourceKind>
        .into_iter()
        .map(|kind| kind.name)
        .collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// Set of resource type tags accepted by the type tier
#[derive(Debug, Clone, Default)]
pub struct ResourceTypeRegistry {
    types: BTreeSet<ResourceType>,
}

impl ResourceTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from explicit tags
    pub fn with_types<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a registry from every kind submitted with `register_resource_type!`
    pub fn discovered() -> Self {
        let registry = Self::with_types(
            inventory::iter::<ResourceKind>
                .into_iter()
                .map(ResourceKind::resource_type),
        );
        debug!(count = registry.len(), "Discovered resource types");
        registry
    }

    /// Add a tag; returns false if it was already present
    pub fn register(&mut self, resource_type: impl Into<ResourceType>) -> bool {
        self.types.insert(resource_type.into())
    }

    pub fn contains(&self, resource_type: &ResourceType) -> bool {
        self.types.contains(resource_type)
    }

    /// Fail with `InvalidResourceType` for unknown tags
    pub fn validate(&self, resource_type: &ResourceType) -> Result<()> {
        if self.contains(resource_type) {
            Ok(())
        } else {
            Err(Error::InvalidResourceType(resource_type.to_string()))
        }
    }

    /// Registered tags, sorted
    pub fn types(&self) -> impl Iterator<Item = &ResourceType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
