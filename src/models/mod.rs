//! Domain models for ogte.
//!
//! # Core Concepts
//!
//! ## Host context
//!
//! - [`Course`], [`CourseModule`], [`CourseSection`]: the course structure an
//!   activity lives in. A course module is the context capabilities are checked in.
//! - [`Session`]: a logged-in user together with their session key.
//!
//! ## Activity data
//!
//! - [`Activity`]: one ogte instance, configured with a [`ActivityMode`].
//! - [`List`]: a named word list owned by a course module, edited through the list form.
//! - [`Level`]: a labelled level inside a list, used to describe entries.
//! - [`Entry`]: a user's piece of work in an activity, tagged with a list and level.

mod activity;
mod course;
mod entry;
mod list;
mod session;

pub use activity::*;
pub use course::*;
pub use entry::*;
pub use list::*;
pub use session::*;
