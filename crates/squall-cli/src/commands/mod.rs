//! Command implementations.

pub mod preset;
pub mod render;
