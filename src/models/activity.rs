use serde::{Deserialize, Serialize};

/// One ogte activity instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    pub id: i64,
    pub course: i64,
    pub name: String,
    pub intro: Option<String>,
    pub mode: ActivityMode,
    /// An earlier ogte activity whose entries this one follows on from.
    pub preventry: Option<i64>,
}

/// How the activity presents itself on the view page.
///
/// - `Standard`: users browse and manage their entries
/// - `Download`: the page only offers a download of prepared material
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityMode {
    #[default]
    Standard,
    Download,
}

impl ActivityMode {
    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Standard => 0,
            Self::Download => 1,
        }
    }

    /// Any flag other than 1 is treated as the standard listing mode.
    pub fn from_i64(flag: i64) -> Self {
        match flag {
            1 => Self::Download,
            _ => Self::Standard,
        }
    }
}

/// Input for creating an activity instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityInput {
    pub course: i64,
    pub name: String,
    pub intro: Option<String>,
    #[serde(default)]
    pub mode: ActivityMode,
    pub preventry: Option<i64>,
}
