//! Host and target platform model.
//!
//! A [`Platform`] is the canonical form of an `(os, arch, name)` triple.
//! Everything else (bit width, CPU family, symbolic variable names) is
//! derived on demand and never stored.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::params::PlatformSpec;

/// Canonical operating system tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
    FreeBsd,
    Ios,
    Android,
    Cygwin,
    /// Unrecognised OS, kept as its lowercased input.
    Other(String),
}

impl Os {
    /// Normalize a raw OS name.
    ///
    /// Exact aliases are checked first, then the `cygwin` prefix, and
    /// anything else is passed through lowercased. Never fails.
    pub fn parse(raw: &str) -> Os {
        let os = raw.to_lowercase();

        match os.as_str() {
            "linux" => Os::Linux,
            "darwin" | "macos" => Os::MacOs,
            "windows" | "win" | "win32" | "win64" => Os::Windows,
            "freebsd" => Os::FreeBsd,
            "ios" => Os::Ios,
            "android" => Os::Android,
            _ if os.starts_with("cygwin") => Os::Cygwin,
            _ => Os::Other(os),
        }
    }

    /// Get the canonical OS name.
    pub fn as_str(&self) -> &str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
            Os::FreeBsd => "freebsd",
            Os::Ios => "ios",
            Os::Android => "android",
            Os::Cygwin => "cygwin",
            Os::Other(name) => name,
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    /// Visible toolchain name
    pub name: String,
    /// Canonical OS
    pub os: Os,
    /// Lowercased architecture
    pub arch: String,
}

impl Platform {
    /// Classify a raw `(os, arch, name)` triple.
    pub fn classify(raw_os: &str, raw_arch: &str, name: impl Into<String>) -> Self {
        Platform {
            name: name.into(),
            os: Os::parse(raw_os),
            arch: raw_arch.to_lowercase(),
        }
    }

    /// Classify a platform from the decoded input structure.
    pub fn from_spec(spec: &PlatformSpec) -> Self {
        let name = spec
            .visible_name
            .clone()
            .unwrap_or_else(|| spec.toolchain.clone());
        Platform::classify(&spec.os, &spec.arch, name)
    }

    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    pub fn is_macos(&self) -> bool {
        self.os == Os::MacOs
    }

    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    pub fn is_freebsd(&self) -> bool {
        self.os == Os::FreeBsd
    }

    pub fn is_ios(&self) -> bool {
        self.os == Os::Ios
    }

    pub fn is_android(&self) -> bool {
        self.os == Os::Android
    }

    pub fn is_cygwin(&self) -> bool {
        self.os == Os::Cygwin
    }

    pub fn is_posix(&self) -> bool {
        matches!(
            self.os,
            Os::Linux | Os::MacOs | Os::FreeBsd | Os::Ios | Os::Android | Os::Cygwin
        )
    }

    pub fn is_32_bit(&self) -> bool {
        matches!(self.arch.as_str(), "i386" | "i686" | "x86" | "arm")
    }

    pub fn is_64_bit(&self) -> bool {
        self.arch == "x86_64"
    }

    pub fn is_intel(&self) -> bool {
        matches!(self.arch.as_str(), "i386" | "i686" | "x86" | "x86_64")
    }

    pub fn is_x86_64(&self) -> bool {
        self.arch == "x86_64"
    }

    pub fn is_arm(&self) -> bool {
        self.arch == "arm"
    }

    pub fn is_aarch64(&self) -> bool {
        self.arch == "aarch64"
    }

    /// OS symbolic names, e.g. `LINUX`, `OS_LINUX`.
    pub fn os_variables(&self) -> Vec<String> {
        let upper = self.os.as_str().to_uppercase();
        let mut vars = vec![upper.clone(), format!("OS_{}", upper)];
        if self.is_macos() {
            vars.push("DARWIN".to_string());
            vars.push("OS_DARWIN".to_string());
        }
        vars
    }

    /// Architecture symbolic names.
    ///
    /// Every matching rule contributes; the order is bit width, Intel, ARM,
    /// PowerPC.
    pub fn arch_variables(&self) -> Vec<&'static str> {
        let arch = self.arch.as_str();
        let mut vars = Vec::new();

        if self.is_32_bit() {
            vars.push("ARCH_TYPE_32");
        }
        if self.is_64_bit() {
            vars.push("ARCH_TYPE_64");
        }

        if matches!(arch, "i386" | "i686") {
            vars.push("ARCH_I386");
        }
        if arch == "i686" {
            vars.push("ARCH_I686");
        }
        if matches!(arch, "x86_64" | "amd64") {
            vars.push("ARCH_X86_64");
        }

        if arch.starts_with("arm") {
            vars.push("ARCH_ARM");
        }
        if arch.starts_with("arm7") {
            vars.push("ARCH_ARM7");
        }
        if arch.starts_with("arm64") || arch.starts_with("armv8") {
            vars.push("ARCH_ARM64");
        }
        // aarch64 does not set ARCH_ARM
        if arch == "aarch64" {
            vars.push("ARCH_AARCH64");
        }

        if arch == "ppc64le" {
            vars.push("ARCH_PPC64LE");
        }

        vars
    }

    /// Backward compatible platform name (`DARWIN` for macOS).
    pub fn os_compat(&self) -> String {
        if self.is_macos() {
            "DARWIN".to_string()
        } else {
            self.os.as_str().to_uppercase()
        }
    }

    /// Look up a value in a map keyed by raw OS names.
    ///
    /// Keys are canonicalized before comparison; the first match in key
    /// order wins.
    pub fn find_in_map<'a, V>(&self, map: &'a BTreeMap<String, V>) -> Option<&'a V> {
        map.iter()
            .find(|(key, _)| Os::parse(key) == self.os)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.name, self.os, self.arch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_aliases_collapse() {
        assert_eq!(Os::parse("LINUX"), Os::Linux);
        assert_eq!(Os::parse("Darwin"), Os::MacOs);
        assert_eq!(Os::parse("macOS"), Os::MacOs);
        assert_eq!(Os::parse("win"), Os::Windows);
        assert_eq!(Os::parse("win32"), Os::Windows);
        assert_eq!(Os::parse("Win64"), Os::Windows);
        assert_eq!(Os::parse("cygwin-1.7"), Os::Cygwin);
        assert_eq!(Os::parse("FreeBSD"), Os::FreeBsd);
        assert_eq!(Os::parse("IOS"), Os::Ios);
        assert_eq!(Os::parse("Android"), Os::Android);
        assert_eq!(Os::parse("Haiku"), Os::Other("haiku".to_string()));
    }

    #[test]
    fn test_os_canonicalization_is_idempotent() {
        for raw in [
            "LINUX", "Darwin", "macOS", "win32", "win64", "cygwin-1.7", "freebsd", "ios",
            "android", "Windows", "SunOS",
        ] {
            let once = Os::parse(raw);
            assert_eq!(Os::parse(once.as_str()), once, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_arch_classes() {
        let x64 = Platform::classify("linux", "X86_64", "gcc");
        assert_eq!(x64.arch, "x86_64");
        assert!(x64.is_64_bit() && x64.is_intel() && !x64.is_32_bit());

        let arm = Platform::classify("linux", "arm", "gcc");
        assert!(arm.is_32_bit() && !arm.is_intel() && arm.is_arm());

        let aarch64 = Platform::classify("linux", "aarch64", "gcc");
        assert!(!aarch64.is_32_bit() && !aarch64.is_64_bit() && aarch64.is_aarch64());
    }

    #[test]
    fn test_arch_variables_order() {
        let i686 = Platform::classify("linux", "i686", "gcc");
        assert_eq!(
            i686.arch_variables(),
            vec!["ARCH_TYPE_32", "ARCH_I386", "ARCH_I686"]
        );

        let x64 = Platform::classify("linux", "x86_64", "gcc");
        assert_eq!(x64.arch_variables(), vec!["ARCH_TYPE_64", "ARCH_X86_64"]);

        let arm = Platform::classify("linux", "arm", "gcc");
        assert_eq!(arm.arch_variables(), vec!["ARCH_TYPE_32", "ARCH_ARM"]);

        let armv8 = Platform::classify("linux", "armv8a", "gcc");
        assert_eq!(armv8.arch_variables(), vec!["ARCH_ARM", "ARCH_ARM64"]);

        let aarch64 = Platform::classify("linux", "aarch64", "gcc");
        assert_eq!(aarch64.arch_variables(), vec!["ARCH_AARCH64"]);

        let ppc = Platform::classify("linux", "ppc64le", "gcc");
        assert_eq!(ppc.arch_variables(), vec!["ARCH_PPC64LE"]);
    }

    #[test]
    fn test_os_variables() {
        let linux = Platform::classify("Linux", "x86_64", "gcc");
        assert_eq!(linux.os_variables(), vec!["LINUX", "OS_LINUX"]);
        assert_eq!(linux.os_compat(), "LINUX");

        let mac = Platform::classify("darwin", "x86_64", "clang");
        assert_eq!(
            mac.os_variables(),
            vec!["MACOS", "OS_MACOS", "DARWIN", "OS_DARWIN"]
        );
        assert_eq!(mac.os_compat(), "DARWIN");
    }

    #[test]
    fn test_find_in_map_canonicalizes_keys() {
        let mut map = BTreeMap::new();
        map.insert("Darwin".to_string(), "dsymutil");
        map.insert("LINUX".to_string(), "objcopy");

        let mac = Platform::classify("macos", "x86_64", "clang");
        assert_eq!(mac.find_in_map(&map), Some(&"dsymutil"));

        let linux = Platform::classify("linux", "x86_64", "clang");
        assert_eq!(linux.find_in_map(&map), Some(&"objcopy"));

        let win = Platform::classify("win", "x86_64", "msvc");
        assert_eq!(win.find_in_map(&map), None);
    }

    #[test]
    fn test_display() {
        let p = Platform::classify("Darwin", "X86_64", "clang40");
        assert_eq!(p.to_string(), "clang40-macos-x86_64");
    }
}
