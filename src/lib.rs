//! ogte: list definition forms and per-user entry views for course activities.

pub mod api;
pub mod client;
pub mod config;
pub mod db;
pub mod form;
pub mod host;
pub mod models;
pub mod strings;
pub mod url;
pub mod view;
