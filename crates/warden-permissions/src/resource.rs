//! Resource abstraction evaluated by the engine

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Tag naming a resource variant; the key of the type tier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(Cow<'static, str>);

impl ResourceType {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ResourceType {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceType {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Anything permissions can be granted on.
///
/// Ids are unique within a resource type only. The engine never mutates a
/// resource; it reads `id` and `resource_type` and hands the resource to the
/// execution hooks.
pub trait Resource: Send + Sync {
    /// Stable textual identifier
    fn id(&self) -> &str;

    /// Variant tag
    fn resource_type(&self) -> ResourceType;
}

impl<R: Resource + ?Sized> Resource for &R {
    fn id(&self) -> &str {
        (**self).id()
    }

    fn resource_type(&self) -> ResourceType {
        (**self).resource_type()
    }
}
