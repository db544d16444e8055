//! Course grade aggregation, GPA mapping and due-date classification for
//! the StudyFlow academic planner.
//!
//! The [`grades`] and [`due`] modules are pure functions over the entities in
//! [`models`]; [`records`] normalizes exported backend data into those
//! entities and [`report`] renders the dashboard summary.

pub mod config;
pub mod due;
pub mod error;
pub mod grades;
pub mod logging;
pub mod models;
pub mod records;
pub mod report;

pub use error::GradeError;
