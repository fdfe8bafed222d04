//! SVG charts rendered from analyzer output.
//!
//! Every builder returns `None` for empty input so pages can omit the chart.

pub mod analysis;
pub mod race;
pub mod svg;
pub mod track;

pub use analysis::{lap_pace_chart, position_changes_chart};
pub use race::{lap_time_chart, pit_stop_chart};
pub use track::track_performance_chart;
