//! Reflow Grid Host
//!
//! Builds a board of named grids from configuration and drives it with
//! line-delimited JSON commands.

pub mod config;
pub mod controller;
pub mod session;

pub use config::Config;
pub use session::Session;
