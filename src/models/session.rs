use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged-in user session.
///
/// `token` authenticates requests; `sesskey` is the shorter integrity key
/// embedded in action links so that state-changing pages can reject forged
/// requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub userid: i64,
    pub sesskey: String,
    pub created_at: DateTime<Utc>,
}

/// Capabilities an ogte activity checks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create and edit one's own entries.
    AddEntries,
    /// Manage the entries of every user.
    ManageEntries,
    /// Manage the activity itself, including its lists.
    Manage,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddEntries => "mod/ogte:addentries",
            Self::ManageEntries => "mod/ogte:manageentries",
            Self::Manage => "mod/ogte:manage",
        }
    }
}
