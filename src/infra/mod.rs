//! Concrete provider clients.

pub mod jolpica;
