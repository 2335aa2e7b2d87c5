//! Subcommand implementations.

pub mod audit;
pub mod config;
pub mod decide;
pub mod fingerprint;
pub mod version;
