//! Toolchain resolution for C/C++ compilers.
//!
//! A resolution runs in three steps:
//! 1. [`detect`] probes a custom compiler when auto-detection is requested
//! 2. [`options`] merges detected or packaged parameters into a canonical
//!    [`ToolchainOptions`] record
//! 3. [`select_strategies`] picks the toolchain, compiler and linker
//!    strategies for the compiler family; each writes its variables once

use std::fmt;

use crate::builder::context::BuildContext;
use crate::core::errors::{ConfResult, ConfigureError};
use crate::emit::Emitter;

pub mod detect;
pub mod gcc;
pub mod ld;
pub mod msvc;
pub mod options;

pub use detect::{detect, probe_macros, DetectedCompiler};
pub use gcc::{GnuCompiler, GnuFlags, GnuFlavor, GnuToolchain};
pub use ld::{print_linker_selector, LinkSettings, Ld};
pub use msvc::{MsvcCompiler, MsvcLinker, MsvcToolchain};
pub use options::{
    EnvValue, FamilyOptions, GnuOptions, MsvcOptions, MsvcProvisioning, Sourced, ToolchainOptions,
};

/// A compiler family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// GCC
    Gnu,
    /// Clang/LLVM
    Clang,
    /// Microsoft Visual C++
    Msvc,
}

impl Family {
    /// Parse a declared family name.
    pub fn parse(name: &str) -> ConfResult<Family> {
        match name {
            "gnu" => Ok(Family::Gnu),
            "clang" => Ok(Family::Clang),
            "msvc" => Ok(Family::Msvc),
            other => Err(ConfigureError::UnsupportedFamily {
                family: other.to_string(),
            }),
        }
    }

    /// Get the family name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Gnu => "gnu",
            Family::Clang => "clang",
            Family::Msvc => "msvc",
        }
    }

    /// Marker variable set to `yes` for this family (`GCC`, `CLANG`, `MSVC`).
    pub fn compiler_variable(&self) -> &'static str {
        match self {
            Family::Gnu => "GCC",
            Family::Clang => "CLANG",
            Family::Msvc => "MSVC",
        }
    }

    pub fn is_clang(&self) -> bool {
        *self == Family::Clang
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiler version tuple.
///
/// Ordering is lexicographic: a shorter prefix compares less, so
/// `4.9` < `4.9.0`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CompilerVersion(Vec<u32>);

impl CompilerVersion {
    /// Parse a dotted version such as `4.9.2`.
    pub fn parse(version: &str) -> ConfResult<Self> {
        version
            .split('.')
            .map(|part| part.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(CompilerVersion)
            .map_err(|_| ConfigureError::InvalidVersion {
                version: version.to_string(),
            })
    }

    /// Create a version from its components.
    pub fn from_parts(parts: Vec<u32>) -> Self {
        CompilerVersion(parts)
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }

    /// Whether this version is at least `min`, compared lexicographically.
    pub fn at_least(&self, min: &[u32]) -> bool {
        min <= self.0.as_slice()
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Writes the toolchain-wide variables (environment, platform flags, SDK).
pub trait ToolchainStrategy {
    fn print_toolchain(&self, em: &mut Emitter) -> ConfResult<()>;
}

/// Writes compiler identity, flags and per-source compile macros.
pub trait CompilerStrategy {
    fn print_compiler(&self, em: &mut Emitter) -> ConfResult<()>;
}

/// Writes archiver, linker flags and link command templates.
pub trait LinkerStrategy {
    fn print_linker(&self, em: &mut Emitter) -> ConfResult<()>;
}

/// The three strategies for one resolved toolchain.
pub struct Strategies<'a> {
    pub toolchain: Box<dyn ToolchainStrategy + 'a>,
    pub compiler: Box<dyn CompilerStrategy + 'a>,
    pub linker: Box<dyn LinkerStrategy + 'a>,
}

/// Select the strategies for the resolved compiler family.
pub fn select_strategies<'a>(
    tc: &'a ToolchainOptions,
    ctx: &'a BuildContext,
) -> ConfResult<Strategies<'a>> {
    match &tc.family_options {
        FamilyOptions::Gnu(gnu) => {
            let flavor = if tc.family.is_clang() {
                GnuFlavor::Clang
            } else {
                GnuFlavor::Gcc
            };
            Ok(Strategies {
                toolchain: Box::new(GnuToolchain::new(tc, gnu, ctx)),
                compiler: Box::new(GnuCompiler::new(tc, gnu, ctx, flavor)),
                linker: Box::new(Ld::new(tc, gnu, ctx)),
            })
        }
        FamilyOptions::Msvc(msvc) => Ok(Strategies {
            toolchain: Box::new(MsvcToolchain::new(tc)),
            compiler: Box::new(MsvcCompiler::new(tc, msvc, ctx)),
            linker: Box::new(MsvcLinker::new(tc, msvc, ctx)?),
        }),
    }
}
