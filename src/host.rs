//! Seams between the ogte pages and the services they run on.
//!
//! The view controller never talks to SQLite directly. It receives the record
//! store, the capability checker and the event sink as trait objects for the
//! duration of one request, which keeps it testable with in-memory doubles.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::*;

/// Read access to the records a page needs.
pub trait RecordStore {
    fn get_course_module(&self, cmid: i64) -> Result<Option<CourseModule>>;
    fn get_course(&self, id: i64) -> Result<Option<Course>>;
    fn get_course_section(&self, id: i64) -> Result<Option<CourseSection>>;
    fn get_activity(&self, id: i64) -> Result<Option<Activity>>;

    /// Levels of one list, each carrying the list's name.
    fn get_levels_for_list(&self, listid: i64) -> Result<Vec<Level>>;

    /// Every entry `userid` has in activity `ogte`, in store order.
    fn get_user_entries(&self, userid: i64, ogte: i64) -> Result<Vec<Entry>>;
}

/// Capability checks in the context of a course module.
pub trait AccessControl {
    fn has_capability(&self, userid: i64, capability: Capability, cmid: i64) -> Result<bool>;
}

/// Completion and audit tracking.
pub trait EventSink {
    /// Record that `userid` has viewed the module. Repeated calls are harmless.
    fn set_module_viewed(&self, cmid: i64, userid: i64) -> Result<()>;

    fn trigger(&self, event: &CourseModuleViewed) -> Result<()>;
}

/// A copy of a record as it was when an event fired.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordSnapshot {
    pub table: String,
    pub record: serde_json::Value,
}

/// Audit event fired when an activity's view page is shown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseModuleViewed {
    /// Id of the activity instance.
    pub objectid: i64,
    /// Course module id of the context the event happened in.
    pub contextinstanceid: i64,
    pub userid: i64,
    pub snapshots: Vec<RecordSnapshot>,
}

impl CourseModuleViewed {
    pub const NAME: &'static str = "\\mod_ogte\\event\\course_module_viewed";

    pub fn new(objectid: i64, contextinstanceid: i64, userid: i64) -> Self {
        Self {
            objectid,
            contextinstanceid,
            userid,
            snapshots: Vec::new(),
        }
    }

    pub fn add_record_snapshot<T: Serialize>(&mut self, table: &str, record: &T) -> Result<()> {
        self.snapshots.push(RecordSnapshot {
            table: table.to_string(),
            record: serde_json::to_value(record)?,
        });
        Ok(())
    }

    pub fn snapshot(&self, table: &str) -> Option<&serde_json::Value> {
        self.snapshots
            .iter()
            .find(|s| s.table == table)
            .map(|s| &s.record)
    }
}
