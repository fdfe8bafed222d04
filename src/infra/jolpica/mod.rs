//! Client for the Jolpica F1 API, an Ergast-compatible provider.

mod client;

pub use client::{JolpicaClient, PAGE_LIMIT};
