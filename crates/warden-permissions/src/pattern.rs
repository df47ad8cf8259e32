//! Regex patterns over resource identifiers

use std::hash::{Hash, Hasher};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Compiled pattern used as a key in the pattern tier.
///
/// Identity is the source text: two patterns written the same way are the
/// same key, so setting one overwrites the other. Matching is unanchored;
/// use `^`/`$` to pin a pattern to the whole identifier.
#[derive(Clone)]
pub struct ResourcePattern {
    regex: Regex,
}

impl ResourcePattern {
    /// Compile a pattern
    pub fn new(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::InvalidPattern {
                pattern: String::new(),
                reason: "Pattern cannot be empty".to_string(),
            });
        }

        let regex = Regex::new(source).map_err(|e| Error::InvalidPattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { regex })
    }

    /// Source text the pattern was compiled from
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Check whether a resource id matches
    pub fn is_match(&self, resource_id: &str) -> bool {
        self.regex.is_match(resource_id)
    }
}

impl PartialEq for ResourcePattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ResourcePattern {}

impl Hash for ResourcePattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl std::fmt::Debug for ResourcePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ResourcePattern").field(&self.as_str()).finish()
    }
}

impl std::fmt::Display for ResourcePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourcePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for ResourcePattern {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl Serialize for ResourcePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourcePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(serde::de::Error::custom)
    }
}
