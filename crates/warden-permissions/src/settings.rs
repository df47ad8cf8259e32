//! Runtime settings for the action gate
//!
//! Settings come from an optional TOML file, then environment variables
//! prefixed with `WARDEN_` (e.g., `WARDEN_AMBIGUITY=deny`, `WARDEN_AUDIT=false`).

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "WARDEN";

/// How the gate reacts when several patterns match a resource id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguityPolicy {
    /// Abort the call with `AmbiguousPermission`
    #[default]
    Fail,
    /// Report a denial instead
    Deny,
}

impl std::fmt::Display for AmbiguityPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AmbiguityPolicy::Fail => write!(f, "fail"),
            AmbiguityPolicy::Deny => write!(f, "deny"),
        }
    }
}

/// Action gate settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub ambiguity: AmbiguityPolicy,
    /// Record decisions to the attached audit logger
    pub audit: bool,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            ambiguity: AmbiguityPolicy::Fail,
            audit: true,
        }
    }
}

impl GateSettings {
    /// Load from an optional TOML file plus `WARDEN_*` environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse settings from a TOML document, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GateSettings::default();
        assert_eq!(settings.ambiguity, AmbiguityPolicy::Fail);
        assert!(settings.audit);
    }

    #[test]
    fn test_ambiguity_policy_display() {
        assert_eq!(AmbiguityPolicy::Fail.to_string(), "fail");
        assert_eq!(AmbiguityPolicy::Deny.to_string(), "deny");
    }

    #[test]
    fn test_from_toml_str() {
        let settings =
            GateSettings::from_toml_str("ambiguity = \"deny\"\naudit = false\n").unwrap();

        assert_eq!(settings.ambiguity, AmbiguityPolicy::Deny);
        assert!(!settings.audit);
    }

    #[test]
    fn test_from_toml_str_fills_missing_fields() {
        let settings = GateSettings::from_toml_str("audit = false\n").unwrap();

        assert_eq!(settings.ambiguity, AmbiguityPolicy::Fail);
        assert!(!settings.audit);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_policy() {
        assert!(GateSettings::from_toml_str("ambiguity = \"shrug\"\n").is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(&path, "ambiguity = \"deny\"\n").unwrap();

        let settings = GateSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.ambiguity, AmbiguityPolicy::Deny);
    }

    #[test]
    #[serial_test::serial]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let settings = GateSettings::load(Some(&path)).unwrap();
        assert_eq!(settings.ambiguity, AmbiguityPolicy::Fail);
    }

    #[test]
    #[serial_test::serial]
    fn test_load_environment_overrides() {
        std::env::set_var("WARDEN_AMBIGUITY", "deny");
        std::env::set_var("WARDEN_AUDIT", "false");

        let settings = GateSettings::load(None);
        std::env::remove_var("WARDEN_AMBIGUITY");
        std::env::remove_var("WARDEN_AUDIT");

        let settings = settings.unwrap();
        assert_eq!(settings.ambiguity, AmbiguityPolicy::Deny);
        assert!(!settings.audit);
    }

    #[test]
    #[serial_test::serial]
    fn test_environment_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("warden.toml");
        std::fs::write(&path, "ambiguity = \"deny\"\naudit = true\n").unwrap();
        std::env::set_var("WARDEN_AUDIT", "false");

        let settings = GateSettings::load(Some(&path));
        std::env::remove_var("WARDEN_AUDIT");

        let settings = settings.unwrap();
        assert_eq!(settings.ambiguity, AmbiguityPolicy::Deny);
        assert!(!settings.audit);
    }
}
