//! Build type classification.

use std::fmt;

use crate::core::errors::{ConfResult, ConfigureError};

/// Prefix that marks a distributed build.
const DIST_PREFIX: &str = "dist-";

/// Profiler flavour implied by the build type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profiler {
    Generic,
    GProf,
}

/// The closed set of build modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildMode {
    Debug,
    Release,
    RelWithDebInfo,
    Coverage,
    Profile,
    GProf,
    Valgrind,
    ValgrindRelease,
    /// IDE project generation; nothing is built.
    NoBuild,
    /// `<flavour>-release`
    ReleaseVariant(String),
    /// `<flavour>-debug`
    DebugVariant(String),
}

/// A parsed build type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildType {
    /// Lowercased mode name, without the `dist-` prefix
    pub name: String,
    /// Classified mode
    pub mode: BuildMode,
    /// Whether the `dist-` prefix was present
    pub distbuild: bool,
}

impl BuildType {
    /// Parse a raw build type such as `release` or `dist-valgrind-release`.
    pub fn parse(raw: &str) -> ConfResult<Self> {
        let lowered = raw.to_lowercase();
        let (name, distbuild) = match lowered.strip_prefix(DIST_PREFIX) {
            Some(rest) => (rest.to_string(), true),
            None => (lowered, false),
        };

        let mode = match name.as_str() {
            "debug" => BuildMode::Debug,
            "release" => BuildMode::Release,
            "relwithdebinfo" => BuildMode::RelWithDebInfo,
            "coverage" => BuildMode::Coverage,
            "profile" => BuildMode::Profile,
            "gprof" => BuildMode::GProf,
            "valgrind" => BuildMode::Valgrind,
            "valgrind-release" => BuildMode::ValgrindRelease,
            "nobuild" => BuildMode::NoBuild,
            other => match (other.strip_suffix("-release"), other.strip_suffix("-debug")) {
                (Some(flavour), _) if !flavour.is_empty() => {
                    BuildMode::ReleaseVariant(flavour.to_string())
                }
                (_, Some(flavour)) if !flavour.is_empty() => {
                    BuildMode::DebugVariant(flavour.to_string())
                }
                _ => {
                    return Err(ConfigureError::UnknownBuildType {
                        build_type: raw.to_string(),
                    })
                }
            },
        };

        Ok(BuildType {
            name,
            mode,
            distbuild,
        })
    }

    pub fn is_release(&self) -> bool {
        matches!(
            self.mode,
            BuildMode::Release
                | BuildMode::RelWithDebInfo
                | BuildMode::Profile
                | BuildMode::GProf
                | BuildMode::ValgrindRelease
                | BuildMode::ReleaseVariant(_)
        )
    }

    pub fn is_debug(&self) -> bool {
        matches!(self.mode, BuildMode::Debug | BuildMode::DebugVariant(_))
    }

    pub fn is_coverage(&self) -> bool {
        self.mode == BuildMode::Coverage
    }

    pub fn is_valgrind(&self) -> bool {
        matches!(self.mode, BuildMode::Valgrind | BuildMode::ValgrindRelease)
    }

    pub fn is_ide(&self) -> bool {
        self.mode == BuildMode::NoBuild
    }

    /// Whether debugging assertions are compiled out (`-DNDEBUG`).
    pub fn strips_assertions(&self) -> bool {
        matches!(
            self.mode,
            BuildMode::Release | BuildMode::ValgrindRelease | BuildMode::Profile | BuildMode::GProf
        )
    }

    pub fn profiler(&self) -> Option<Profiler> {
        match self.mode {
            BuildMode::Profile => Some(Profiler::Generic),
            BuildMode::GProf => Some(Profiler::GProf),
            _ => None,
        }
    }

    /// `BUILD_TYPE` value.
    pub fn upper(&self) -> String {
        self.name.to_uppercase()
    }

    /// `BT_*` marker variable name.
    pub fn marker(&self) -> String {
        format!("BT_{}", self.upper().replace('-', "_"))
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.distbuild {
            f.write_str(DIST_PREFIX)?;
        }
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_modes() {
        let release = BuildType::parse("Release").unwrap();
        assert_eq!(release.mode, BuildMode::Release);
        assert!(release.is_release() && release.strips_assertions() && !release.is_debug());

        let debug = BuildType::parse("debug").unwrap();
        assert!(debug.is_debug() && !debug.is_release() && !debug.strips_assertions());

        let nobuild = BuildType::parse("nobuild").unwrap();
        assert!(nobuild.is_ide());
    }

    #[test]
    fn test_dist_prefix_is_stripped() {
        let bt = BuildType::parse("dist-valgrind-release").unwrap();
        assert!(bt.distbuild);
        assert_eq!(bt.name, "valgrind-release");
        assert_eq!(bt.mode, BuildMode::ValgrindRelease);
        assert!(bt.is_valgrind() && bt.is_release() && bt.strips_assertions());
        assert_eq!(bt.to_string(), "dist-valgrind-release");
    }

    #[test]
    fn test_suffixed_variants() {
        let bt = BuildType::parse("fast-release").unwrap();
        assert_eq!(bt.mode, BuildMode::ReleaseVariant("fast".to_string()));
        assert!(bt.is_release());
        assert!(!bt.strips_assertions());

        let bt = BuildType::parse("asan-debug").unwrap();
        assert!(bt.is_debug());
    }

    #[test]
    fn test_profilers() {
        assert_eq!(
            BuildType::parse("profile").unwrap().profiler(),
            Some(Profiler::Generic)
        );
        assert_eq!(
            BuildType::parse("gprof").unwrap().profiler(),
            Some(Profiler::GProf)
        );
        assert_eq!(BuildType::parse("release").unwrap().profiler(), None);
    }

    #[test]
    fn test_relwithdebinfo_keeps_assertions() {
        let bt = BuildType::parse("relwithdebinfo").unwrap();
        assert!(bt.is_release());
        assert!(!bt.strips_assertions());
    }

    #[test]
    fn test_marker_name() {
        let bt = BuildType::parse("valgrind-release").unwrap();
        assert_eq!(bt.upper(), "VALGRIND-RELEASE");
        assert_eq!(bt.marker(), "BT_VALGRIND_RELEASE");
    }

    #[test]
    fn test_unknown_build_type() {
        assert!(matches!(
            BuildType::parse("fastest"),
            Err(ConfigureError::UnknownBuildType { .. })
        ));
        assert!(BuildType::parse("-release").is_err());
    }
}
