//! Data models and types used throughout the scanner

pub mod device;
pub mod responses;
pub mod scan;

// Re-export commonly used types
pub use device::*;
pub use responses::*;
pub use scan::*;
