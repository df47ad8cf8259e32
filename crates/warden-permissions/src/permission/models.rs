//! Permission data models

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Years added to "now" when a permission is created without an explicit expiry
pub const DEFAULT_LIFETIME_YEARS: u32 = 1000;

/// One of the four gated verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    /// All verbs, in declaration order
    pub const ALL: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];

    /// Lowercase verb name
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "read" => Ok(Action::Read),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            other => Err(Error::ConfigError(format!("Unknown action: {}", other))),
        }
    }
}

/// Expiry used when none is given: `now` plus [`DEFAULT_LIFETIME_YEARS`]
pub fn far_future(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_add_months(Months::new(DEFAULT_LIFETIME_YEARS * 12))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// An immutable create/read/update/delete grant with an expiry.
///
/// There is no "never expires" sentinel. A grant without an explicit expiry
/// carries a timestamp [`DEFAULT_LIFETIME_YEARS`] in the future. Changing the
/// flags or the expiry always produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    create: bool,
    read: bool,
    update: bool,
    delete: bool,
    expiry: DateTime<Utc>,
}

impl Permission {
    /// Create a permission that expires far in the future
    pub fn new(create: bool, read: bool, update: bool, delete: bool) -> Self {
        Self::with_expiry(create, read, update, delete, far_future(Utc::now()))
    }

    /// Create a permission with an explicit expiry
    pub fn with_expiry(
        create: bool,
        read: bool,
        update: bool,
        delete: bool,
        expiry: DateTime<Utc>,
    ) -> Self {
        Self {
            create,
            read,
            update,
            delete,
            expiry,
        }
    }

    /// Permission granting every verb
    pub fn full() -> Self {
        Self::new(true, true, true, true)
    }

    /// Permission granting only `read`
    pub fn read_only() -> Self {
        Self::new(false, true, false, false)
    }

    /// Same flags, new expiry
    pub fn reissue(&self, expiry: DateTime<Utc>) -> Self {
        Self { expiry, ..*self }
    }

    /// Same expiry, new flags
    pub fn with_flags(&self, create: bool, read: bool, update: bool, delete: bool) -> Self {
        Self::with_expiry(create, read, update, delete, self.expiry)
    }

    pub fn create(&self) -> bool {
        self.create
    }

    pub fn read(&self) -> bool {
        self.read
    }

    pub fn update(&self) -> bool {
        self.update
    }

    pub fn delete(&self) -> bool {
        self.delete
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    /// Check the flag for a verb, ignoring expiry
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.create,
            Action::Read => self.read,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }

    /// A permission expiring exactly at `now` is still valid
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry < now
    }

    /// Flag set and not expired
    pub fn grants(&self, action: Action, now: DateTime<Utc>) -> bool {
        self.allows(action) && !self.is_expired_at(now)
    }
}
