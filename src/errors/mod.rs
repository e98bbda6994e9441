//! Error handling for the scanner engine

pub mod types;

pub use types::*;
