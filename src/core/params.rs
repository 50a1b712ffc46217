//! Decoded toolchain parameters.
//!
//! This is the already-parsed input structure handed to the resolver:
//!
//! ```json
//! {
//!   "platform": {
//!     "host":   {"os": "LINUX", "arch": "x86_64", "toolchain": "gcc49"},
//!     "target": {"os": "LINUX", "arch": "x86_64", "toolchain": "gcc49"}
//!   },
//!   "params": {"type": "gnu", "c_compiler": "...", "cxx_compiler": "...", "gcc_version": "4.9.2"},
//!   "env": {"PATH": ["/opt/gcc/bin"]}
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::core::errors::{ConfResult, ConfigureError};

/// The complete input of one resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainInput {
    /// Host and target platforms
    pub platform: PlatformPair,
    /// Raw toolchain parameters
    pub params: ToolchainParams,
    /// Environment the toolchain tools must run with
    #[serde(default)]
    pub env: BTreeMap<String, Value>,
    /// Toolchain name
    #[serde(default)]
    pub name: Option<String>,
}

impl ToolchainInput {
    /// Decode the input structure from JSON text.
    pub fn from_json(text: &str) -> ConfResult<Self> {
        serde_json::from_str(text).map_err(|e| ConfigureError::MalformedParams {
            message: e.to_string(),
        })
    }
}

/// Host and target platform descriptions.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformPair {
    pub host: PlatformSpec,
    pub target: PlatformSpec,
}

/// A raw platform description.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformSpec {
    /// Raw OS name (any case, any alias)
    pub os: String,
    /// Raw architecture name
    pub arch: String,
    /// Toolchain name
    pub toolchain: String,
    /// Display name, preferred over `toolchain`
    #[serde(default)]
    pub visible_name: Option<String>,
}

/// A parameter that is either a single value or a map keyed by OS name.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PerOs {
    ByOs(BTreeMap<String, Value>),
    Flat(Value),
}

/// Raw toolchain parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainParams {
    /// Compiler family, or `system_cxx` to auto-detect
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub c_compiler: Option<String>,
    #[serde(default)]
    pub cxx_compiler: Option<String>,
    #[serde(default)]
    pub ar: Option<String>,
    #[serde(default)]
    pub ar_plugin: Option<String>,
    /// Debug-symbol extraction tool, keyed by target OS
    #[serde(default)]
    pub dwarf_tool: Option<BTreeMap<String, Value>>,
    /// System libraries, flat or keyed by target OS
    #[serde(default)]
    pub sys_lib: Option<PerOs>,
    /// Platform library projects, keyed by target OS
    #[serde(default)]
    pub platform: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub arch_opt: Option<Value>,
    #[serde(default)]
    pub target_opt: Option<Value>,
    #[serde(default)]
    pub werror_mode: Option<String>,
    #[serde(default)]
    pub gcc_version: Option<String>,
    #[serde(default)]
    pub match_root: Option<String>,
    #[serde(default)]
    pub sdk_root: Option<String>,
    #[serde(default)]
    pub masm_compiler: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub lib: Option<String>,
    /// Keys whose mere presence toggles behaviour (`ide_msvs`, `wine`, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ToolchainParams {
    /// Whether a presence-only flag such as `ide_msvs` is set.
    pub fn has_flag(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    /// Get a required string parameter.
    pub fn require<'a>(
        &self,
        value: &'a Option<String>,
        name: &'static str,
    ) -> ConfResult<&'a str> {
        value
            .as_deref()
            .ok_or(ConfigureError::MissingParam { name })
    }
}
