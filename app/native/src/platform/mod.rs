//! Platform helpers.

pub mod path;
