use std::fmt;

use serde::{Deserialize, Serialize};

/// Unit status as reported to the host runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum UnitStatus {
    /// Nothing has been reported yet.
    #[default]
    Unknown,
    /// Operator intervention needed (a relation is missing).
    Blocked(String),
    /// Waiting on something that will resolve by itself.
    Waiting(String),
    Active,
}

impl UnitStatus {
    pub fn blocked(message: impl Into<String>) -> Self {
        UnitStatus::Blocked(message.into())
    }

    pub fn waiting(message: impl Into<String>) -> Self {
        UnitStatus::Waiting(message.into())
    }

    /// Lowercase status name as used by `status-set`.
    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Unknown => "unknown",
            UnitStatus::Blocked(_) => "blocked",
            UnitStatus::Waiting(_) => "waiting",
            UnitStatus::Active => "active",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Blocked(m) | UnitStatus::Waiting(m) => m,
            UnitStatus::Unknown | UnitStatus::Active => "",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, UnitStatus::Active)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}: {}", self.name(), self.message())
        }
    }
}
