//! Utility modules shared by the store and its collaborators.
//!
//! - [`datetime`] - Whole-day arithmetic, timestamp parsing and due-date formatting

pub mod datetime;
