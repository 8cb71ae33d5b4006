use serde::{Deserialize, Serialize};

/// A named list belonging to one course module.
///
/// Lists are created and changed only through the list form; `props` is an
/// opaque blob that specialised list types may use for their own settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct List {
    pub id: i64,
    pub courseid: i64,
    pub moduleid: i64,
    pub name: String,
    pub description: String,
    pub status: ListStatus,
    pub props: String,
}

/// Whether a list has been filled in yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    #[default]
    Empty,
    Ready,
}

impl ListStatus {
    pub const ALL: [ListStatus; 2] = [ListStatus::Empty, ListStatus::Ready];

    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Empty => 0,
            Self::Ready => 1,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Empty),
            1 => Some(Self::Ready),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ready => "ready",
        }
    }
}

/// Validated list data coming out of the list form.
///
/// An `id` of 0 means the list does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ListFormData {
    pub id: i64,
    pub courseid: i64,
    pub moduleid: i64,
    pub name: String,
    pub description: String,
    pub status: ListStatus,
    pub props: String,
}

impl From<List> for ListFormData {
    fn from(list: List) -> Self {
        Self {
            id: list.id,
            courseid: list.courseid,
            moduleid: list.moduleid,
            name: list.name,
            description: list.description,
            status: list.status,
            props: list.props,
        }
    }
}

/// A labelled level inside a list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Level {
    pub id: i64,
    pub listid: i64,
    pub label: String,
    /// Name of the owning list, carried for display.
    pub listname: String,
}

impl Level {
    /// The "listname - label" string shown next to an entry.
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.listname, self.label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLevelInput {
    pub label: String,
}
