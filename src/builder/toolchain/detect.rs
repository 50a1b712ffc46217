//! Custom compiler detection.
//!
//! The compiler family and version are read from predefined preprocessor
//! macros: a probe source lists each macro as `____YA_VAR_<NAME>=<NAME>`,
//! the compiler preprocesses it, and the substituted values are parsed back.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::core::errors::{ConfResult, ConfigureError};
use crate::util::process::{ProcessBuilder, Runner};

use super::{CompilerVersion, Family};

/// Prefix that marks probe lines in preprocessor output.
pub const VAR_PREFIX: &str = "____YA_VAR_";

const CLANG_VARS: [&str; 3] = ["__clang_major__", "__clang_minor__", "__clang_patchlevel__"];
const APPLE_VAR: &str = "__apple_build_version__";
const GCC_VARS: [&str; 3] = ["__GNUC__", "__GNUC_MINOR__", "__GNUC_PATCHLEVEL__"];
const MSVC_VARS: [&str; 1] = ["_MSC_VER"];

/// Macro name to substituted value.
pub type MacroTable = BTreeMap<String, String>;

/// Result of probing a custom compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedCompiler {
    pub family: Family,
    pub version: CompilerVersion,
    /// Resolved C compiler path
    pub c_compiler: String,
    /// Resolved C++ compiler path, falling back to the C compiler
    pub cxx_compiler: String,
}

/// Render the probe source for the given macro names.
pub fn probe_source(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("{}{}={}\n", VAR_PREFIX, name, name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse preprocessor output into a macro table.
///
/// Lines whose value still equals the macro name were not substituted and
/// are dropped.
pub fn parse_macro_output(stdout: &str) -> MacroTable {
    let mut vars = MacroTable::new();

    for line in stdout.split('\n') {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(name) = key.strip_prefix(VAR_PREFIX) else {
            continue;
        };
        if value == name {
            continue;
        }
        vars.insert(name.to_string(), value.to_string());
    }

    vars
}

/// Preprocess a probe source with `compiler` and return the macro table.
///
/// The return code is ignored since some preprocessors exit non-zero on
/// success. `None` means the compiler could not be run at all.
pub fn probe_macros(runner: &dyn Runner, compiler: &Path, names: &[&str]) -> Option<MacroTable> {
    let source = probe_source(names);

    let mut file = match tempfile::Builder::new()
        .prefix("tcconf-probe")
        .suffix(".cpp")
        .tempfile()
    {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("Preprocessing failed: {}", e);
            return None;
        }
    };

    if let Err(e) = file.write_all(source.as_bytes()).and_then(|_| file.flush()) {
        tracing::debug!("Preprocessing failed: {}", e);
        return None;
    }

    let cmd = ProcessBuilder::new(compiler).arg("-E").arg(file.path());
    match runner.run(&cmd) {
        Ok(output) => Some(parse_macro_output(&output.stdout)),
        Err(e) => {
            tracing::debug!("Preprocessing failed: {:#}", e);
            None
        }
    }
}

fn version_of(vars: &MacroTable, names: &[&str]) -> Option<CompilerVersion> {
    names
        .iter()
        .map(|name| vars.get(*name)?.trim().parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()
        .map(CompilerVersion::from_parts)
}

/// Pick the family from a macro table: Clang, then GCC, then MSVC.
pub fn classify(vars: &MacroTable) -> Option<(Family, CompilerVersion)> {
    if vars.contains_key(APPLE_VAR) {
        tracing::debug!("Apple build of the compiler");
    }

    if let Some(version) = version_of(vars, &CLANG_VARS) {
        tracing::debug!("Detected Clang version {}", version);
        return Some((Family::Clang, version));
    }
    if let Some(version) = version_of(vars, &GCC_VARS) {
        tracing::debug!("Detected GCC version {}", version);
        return Some((Family::Gnu, version));
    }
    if let Some(version) = version_of(vars, &MSVC_VARS) {
        tracing::debug!("Detected MSVC version {}", version);
        return Some((Family::Msvc, version));
    }

    None
}

/// Detect a custom compiler.
///
/// `c = c_compiler or $CC`, `cxx = cxx_compiler or $CXX or c`, and `c`
/// falls back to `cxx`.
pub fn detect(
    runner: &dyn Runner,
    c_compiler: Option<&str>,
    cxx_compiler: Option<&str>,
    env: &BTreeMap<String, String>,
) -> ConfResult<DetectedCompiler> {
    let from_env = |name: &str| env.get(name).map(String::as_str).filter(|v| !v.is_empty());

    let c = c_compiler.filter(|v| !v.is_empty()).or_else(|| from_env("CC"));
    let cxx = cxx_compiler
        .filter(|v| !v.is_empty())
        .or_else(|| from_env("CXX"))
        .or(c);
    let c = c.or(cxx).ok_or(ConfigureError::CompilerNotSpecified)?;

    let c_path = runner.find(c);

    let names: Vec<&str> = CLANG_VARS
        .iter()
        .chain(std::iter::once(&APPLE_VAR))
        .chain(GCC_VARS.iter())
        .chain(MSVC_VARS.iter())
        .copied()
        .collect();

    let vars = c_path
        .as_deref()
        .and_then(|path| probe_macros(runner, path, &names))
        .filter(|vars| !vars.is_empty())
        .ok_or_else(|| ConfigureError::CompilerUndetectable {
            compiler: c.to_string(),
        })?;

    let (family, version) = classify(&vars).ok_or_else(|| ConfigureError::UnknownCompilerType {
        compiler: c.to_string(),
    })?;

    // probe_macros only succeeds with a resolved path
    let c_path = c_path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| c.to_string());
    let cxx_path = cxx
        .and_then(|cxx| runner.find(cxx))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| c_path.clone());

    tracing::debug!("c_compiler={}", c_path);
    tracing::debug!("cxx_compiler={}", cxx_path);

    Ok(DetectedCompiler {
        family,
        version,
        c_compiler: c_path,
        cxx_compiler: cxx_path,
    })
}
