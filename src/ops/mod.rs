//! High-level operations.
//!
//! This module contains the implementation of tcconf commands.

pub mod configure;

pub use configure::{configure, Configuration, ConfigureOptions};
