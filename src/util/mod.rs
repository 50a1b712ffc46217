//! Shared utilities

pub mod config;
pub mod diagnostic;
pub mod hash;
pub mod process;

pub use config::Presets;
pub use diagnostic::Diagnostic;
pub use process::{Runner, SystemRunner};
