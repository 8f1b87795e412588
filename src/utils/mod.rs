//! Small path and naming helpers shared across the crate.

pub mod name;
pub mod path;
