//! Configuration management for the Shelly scanner

pub mod app_config;

pub use app_config::*;
