//! Build context - platforms, build mode, presets and environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::build_type::{BuildType, Profiler};
use crate::core::params::ToolchainInput;
use crate::core::platform::Platform;
use crate::util::config::Presets;

/// Everything the resolution reads besides the toolchain parameters.
///
/// Presets and the host environment are captured here once; nothing after
/// construction reads process-global state.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Source tree root
    pub source_root: PathBuf,

    /// Host platform
    pub host: Platform,

    /// Target platform
    pub target: Platform,

    /// Active build mode
    pub build_type: BuildType,

    /// `-D` overrides and preset files
    pub presets: Presets,

    /// Snapshot of the host process environment
    pub env: BTreeMap<String, String>,

    /// Local tools must not be used
    pub ignore_local_files: bool,

    /// Position independent code is enabled
    pub pic: bool,
}

impl BuildContext {
    /// Create a build context.
    ///
    /// Local files are ignored unless this is a local distributed build, and
    /// always for IDE project generation.
    pub fn new(
        source_root: impl AsRef<Path>,
        input: &ToolchainInput,
        build_type: BuildType,
        presets: Presets,
        env: BTreeMap<String, String>,
        local_distbuild: bool,
    ) -> Self {
        let host = Platform::from_spec(&input.platform.host);
        let target = Platform::from_spec(&input.platform.target);

        tracing::debug!("Toolchain host {}", host);
        tracing::debug!("Toolchain target {}", target);

        let ignore_local_files = !local_distbuild || build_type.is_ide();
        let pic = !presets.is_positive("FORCE_NO_PIC");

        BuildContext {
            source_root: source_root.as_ref().to_path_buf(),
            host,
            target,
            build_type,
            presets,
            env,
            ignore_local_files,
            pic,
        }
    }

    /// Get a preset value.
    pub fn preset(&self, key: &str) -> Option<&str> {
        self.presets.get(key)
    }

    /// Get a preset, treating an empty value as unset.
    pub fn preset_non_empty(&self, key: &str) -> Option<&str> {
        self.presets.get(key).filter(|v| !v.is_empty())
    }

    pub fn is_positive(&self, key: &str) -> bool {
        self.presets.is_positive(key)
    }

    pub fn is_negative(&self, key: &str) -> bool {
        self.presets.is_negative(key)
    }

    /// Get a non-empty host environment variable.
    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn is_release(&self) -> bool {
        self.build_type.is_release()
    }

    pub fn is_debug(&self) -> bool {
        self.build_type.is_debug()
    }

    pub fn is_coverage(&self) -> bool {
        self.build_type.is_coverage()
    }

    pub fn is_valgrind(&self) -> bool {
        self.build_type.is_valgrind()
    }

    pub fn is_ide(&self) -> bool {
        self.build_type.is_ide()
    }

    pub fn strips_assertions(&self) -> bool {
        self.build_type.strips_assertions()
    }

    pub fn profiler(&self) -> Option<Profiler> {
        self.build_type.profiler()
    }

    /// Active sanitizer, if any.
    pub fn sanitizer(&self) -> Option<&str> {
        self.preset_non_empty("SANITIZER_TYPE")
    }

    pub fn is_sanitized(&self) -> bool {
        self.sanitizer().is_some()
    }

    /// Whether this is a distributed build.
    pub fn is_distbuild(&self) -> bool {
        self.build_type.distbuild
    }

    /// Path separator used when composing host paths.
    pub fn host_separator(&self) -> char {
        if self.host.is_windows() {
            '\\'
        } else {
            '/'
        }
    }

    /// Join path components with the host separator.
    pub fn host_join(&self, parts: &[&str]) -> String {
        let sep = self.host_separator();
        let mut joined = String::new();
        for part in parts.iter().filter(|p| !p.is_empty()) {
            if !joined.is_empty() && !joined.ends_with(|c: char| c == '/' || c == '\\') {
                joined.push(sep);
            }
            joined.push_str(part);
        }
        joined
    }

    /// Collapse repeated separators and drop trailing ones.
    ///
    /// On a Windows host both `/` and `\` count as separators and are
    /// rewritten to `\`. A drive root such as `C:\` keeps its separator.
    pub fn normalize_host_path(&self, path: &str) -> String {
        let sep = self.host_separator();
        let windows = self.host.is_windows();
        let is_sep = |c: char| c == sep || (windows && c == '/');

        let mut normalized = String::with_capacity(path.len());
        for c in path.chars() {
            if !is_sep(c) {
                normalized.push(c);
            } else if !normalized.ends_with(sep) {
                normalized.push(sep);
            }
        }

        while normalized.len() > 1
            && normalized.ends_with(sep)
            && !normalized[..normalized.len() - 1].ends_with(':')
        {
            normalized.pop();
        }
        normalized
    }
}
