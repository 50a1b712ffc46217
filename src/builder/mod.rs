//! Configuration builder.
//!
//! This module turns a build context and a resolved toolchain into the
//! variables consumed by the build-graph evaluator.

pub mod context;
pub mod extras;
pub mod system;
pub mod toolchain;

pub use context::BuildContext;
pub use system::System;
pub use toolchain::{select_strategies, Family, ToolchainOptions};
