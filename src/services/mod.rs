//! Provider-facing abstractions consumed by the analyzers.

pub mod data_source;

pub use data_source::{
    Event, LapTiming, MotorsportDataSource, NOT_CLASSIFIED_POSITION, PitStop, RaceResultRow,
    SessionKind,
};
