//! Declarative grant documents
//!
//! A grant document seeds a client's tiers from TOML or JSON:
//!
//! ```toml
//! [by_id."file42"]
//! read = true
//!
//! [[by_pattern]]
//! pattern = '^logs/.*'
//! create = true
//! read = true
//! expiry = "2030-01-01T00:00:00Z"
//!
//! [by_type.document]
//! read = true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    client::{Client, ClientRecord},
    error::{Error, Result},
    pattern::ResourcePattern,
    permission::{models::Permission, mutator::PermissionMutator},
    resource::ResourceType,
};

/// Flags and optional expiry of one grant; missing flags are `false`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionSpec {
    pub create: bool,
    pub read: bool,
    pub update: bool,
    pub delete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl PermissionSpec {
    /// Build the permission; a missing expiry means far future
    pub fn to_permission(&self) -> Permission {
        match self.expiry {
            Some(expiry) => {
                Permission::with_expiry(self.create, self.read, self.update, self.delete, expiry)
            }
            None => Permission::new(self.create, self.read, self.update, self.delete),
        }
    }
}

impl From<&Permission> for PermissionSpec {
    fn from(permission: &Permission) -> Self {
        Self {
            create: permission.create(),
            read: permission.read(),
            update: permission.update(),
            delete: permission.delete(),
            expiry: Some(permission.expiry()),
        }
    }
}

/// One pattern-tier entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternGrant {
    pub pattern: String,
    #[serde(flatten)]
    pub permission: PermissionSpec,
}

/// Grants for all three tiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantConfig {
    pub by_id: BTreeMap<String, PermissionSpec>,
    pub by_pattern: Vec<PatternGrant>,
    pub by_type: BTreeMap<String, PermissionSpec>,
}

impl GrantConfig {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load from a `.toml` or `.json` file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            _ => Err(Error::ConfigError(format!(
                "Unsupported grant file format: {}",
                path.display()
            ))),
        }
    }

    /// Capture a client's current grants
    pub fn from_client<C: Client + ?Sized>(client: &C) -> Self {
        let grants = client.grants();
        Self {
            by_id: grants
                .id_entries()
                .map(|(id, p)| (id.to_string(), PermissionSpec::from(p)))
                .collect(),
            by_pattern: grants
                .pattern_entries()
                .map(|(pattern, p)| PatternGrant {
                    pattern: pattern.as_str().to_string(),
                    permission: PermissionSpec::from(p),
                })
                .collect(),
            by_type: grants
                .type_entries()
                .map(|(t, p)| (t.to_string(), PermissionSpec::from(p)))
                .collect(),
        }
    }

    /// Number of grants across all tiers
    pub fn len(&self) -> usize {
        self.by_id.len() + self.by_pattern.len() + self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write every grant into the client.
    ///
    /// All patterns and type tags are checked before anything is written, so
    /// a failing document leaves the client untouched.
    pub fn apply<C: Client + ?Sized>(
        &self,
        client: &mut C,
        mutator: &PermissionMutator,
    ) -> Result<()> {
        let patterns = self
            .by_pattern
            .iter()
            .map(|grant| {
                let pattern = ResourcePattern::new(&grant.pattern)?;
                Ok((pattern, grant.permission.to_permission()))
            })
            .collect::<Result<Vec<_>>>()?;

        for name in self.by_type.keys() {
            mutator.registry().validate(&ResourceType::from(name.clone()))?;
        }

        for (resource_id, grant) in &self.by_id {
            mutator.set_for_id(client, resource_id.clone(), grant.to_permission());
        }
        for (pattern, permission) in patterns {
            mutator.set_for_pattern(client, pattern, permission);
        }
        for (name, grant) in &self.by_type {
            mutator.set_for_type(client, name.clone(), grant.to_permission())?;
        }
        Ok(())
    }
}

/// A client identity plus its grant document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub id: String,
    pub client_type: String,
    #[serde(default)]
    pub grants: GrantConfig,
}

impl ClientConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build a client and apply its grants
    pub fn build(&self, mutator: &PermissionMutator) -> Result<ClientRecord> {
        let mut client = ClientRecord::new(self.id.clone(), self.client_type.clone());
        self.grants.apply(&mut client, mutator)?;
        Ok(client)
    }
}
