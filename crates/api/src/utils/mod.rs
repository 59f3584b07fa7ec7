//! Command plumbing: logging and timing helpers

pub mod command_helpers;
pub mod logging;
