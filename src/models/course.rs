use serde::{Deserialize, Serialize};

/// A course: the outermost container activities are placed in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub fullname: String,
    pub shortname: String,
}

/// A section (topic/week) of a course.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseSection {
    pub id: i64,
    pub course: i64,
    pub section: i64,
    pub name: Option<String>,
}

/// The placement of an activity instance inside a course.
///
/// The course module id is what users navigate with, and its context is the
/// one capabilities are evaluated against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourseModule {
    pub id: i64,
    pub course: i64,
    /// Id of the [`Activity`](super::Activity) record this module shows.
    pub instance: i64,
    /// Id of the [`CourseSection`] the module sits in.
    pub section: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseInput {
    pub fullname: String,
    pub shortname: String,
}

/// Input for placing an activity into a course section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourseModuleInput {
    pub course: i64,
    pub instance: i64,
    pub section: i64,
}
