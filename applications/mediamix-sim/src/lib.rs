/// Mediamix simulator - a headless page driven by a command-line controller
pub mod commands;
pub mod config;
pub mod error;
pub mod host;
pub mod session;
