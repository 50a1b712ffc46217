//! tcconf - deterministic C/C++ toolchain resolution
//!
//! This crate resolves a host/target platform pair and raw toolchain
//! parameters into the flat variable set consumed by a build-graph
//! evaluator: compiler identity, flags, linker commands and auxiliary tools.

pub mod builder;
pub mod core;
pub mod emit;
pub mod ops;
pub mod util;

/// Test utilities and mocks for tcconf unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted process runner and toolchain
/// input fixtures.
#[cfg(test)]
pub mod test_support;

pub use self::core::{BuildType, ConfigureError, Platform, ToolchainInput};
pub use ops::{configure, Configuration, ConfigureOptions};
