//! Core data structures for tcconf.
//!
//! This module contains the foundational types used throughout tcconf:
//! - Platform classification
//! - Build mode parsing
//! - The decoded toolchain input
//! - The error type shared by every resolution step

pub mod build_type;
pub mod errors;
pub mod params;
pub mod platform;

pub use build_type::BuildType;
pub use errors::{ConfResult, ConfigureError};
pub use params::ToolchainInput;
pub use platform::{Os, Platform};
