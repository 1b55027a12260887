//! CLI command implementations.

pub mod application;
pub mod config;
pub mod health;
pub mod roster;
