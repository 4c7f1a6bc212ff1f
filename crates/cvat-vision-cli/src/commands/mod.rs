//! Subcommand implementations.

pub mod contours;
pub mod equalize;
pub mod server;
pub mod track;
