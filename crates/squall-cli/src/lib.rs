//! Library surface of the squall CLI.
//!
//! The command implementations live here so they stay testable; `main.rs`
//! only parses arguments and dispatches.

pub mod commands;
