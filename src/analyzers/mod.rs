//! Driver form, track ratings and race predictions.
//!
//! The submodules other than [`analyzer`] are pure functions over provider
//! rows; [`analyzer::Analyzer`] fetches the rows and wires them together.

pub mod analyzer;
pub mod form;
pub mod performance;
pub mod prediction;
pub mod schedule;
pub mod track_rating;
pub mod types;
pub mod utility;
