//! Query modules, one per table family.

pub mod backup;
pub mod statistics;
