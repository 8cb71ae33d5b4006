use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's entry in an ogte activity.
///
/// The position of an entry within the user's set is not stored; it is
/// derived each time the entries are displayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entry {
    pub id: i64,
    /// The activity this entry belongs to.
    pub ogte: i64,
    pub userid: i64,
    pub listid: i64,
    pub levelid: i64,
    pub text: String,
    pub timecreated: DateTime<Utc>,
    pub timemodified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryInput {
    pub ogte: i64,
    pub userid: i64,
    pub listid: i64,
    pub levelid: i64,
    #[serde(default)]
    pub text: String,
}
