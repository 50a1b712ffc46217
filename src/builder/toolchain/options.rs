//! Canonical toolchain options.
//!
//! Merges either a detected custom compiler or packaged toolchain parameters
//! into one read-only record per invocation.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::builder::context::BuildContext;
use crate::core::errors::{ConfResult, ConfigureError};
use crate::core::params::{PerOs, ToolchainInput, ToolchainParams};
use crate::emit::json_tokens;
use crate::util::process::Runner;

use super::detect::{detect, DetectedCompiler};
use super::{CompilerVersion, Family};

/// `params.type` value that requests auto-detection.
const SYSTEM_CXX: &str = "system_cxx";

/// Toolchain name used when the input carries none.
const DEFAULT_NAME: &str = "theyknow";

/// Where the compiler came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sourced {
    /// Custom compiler found by probing
    Detected,
    /// Compiler described by packaged toolchain parameters
    Packaged,
}

/// A toolchain environment value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Single(String),
    List(Vec<String>),
}

impl EnvValue {
    fn from_json(name: &str, value: &Value) -> ConfResult<Self> {
        let invalid = || ConfigureError::InvalidEnvValue {
            name: name.to_string(),
        };

        match value {
            Value::String(s) => Ok(EnvValue::Single(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
                .collect::<ConfResult<Vec<_>>>()
                .map(EnvValue::List),
            _ => Err(invalid()),
        }
    }

    /// Values joined with `sep`.
    pub fn join(&self, sep: &str) -> String {
        match self {
            EnvValue::Single(s) => s.clone(),
            EnvValue::List(items) => items.join(sep),
        }
    }
}

/// GNU-like (GCC, Clang) extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GnuOptions {
    /// Archiver
    pub ar: String,
    /// Archiver plugin
    pub ar_plugin: Option<String>,
    /// Debug-symbol extraction tool
    pub dwarf_tool: Option<Vec<String>>,
    /// System libraries for the target
    pub sys_lib: Vec<String>,
    /// Platform library projects for the target
    pub platform_projects: Vec<String>,
    /// Selected OS SDK, none for non-Linux targets
    pub os_sdk: Option<String>,
    /// The host system is used as the SDK
    pub os_sdk_local: bool,
}

/// How an MSVC installation is provided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsvcProvisioning {
    /// Project generation for the Visual Studio IDE
    Ide,
    /// Installation set up by `vcvars64.bat`
    Local,
    /// Packaged SDK
    Packaged,
}

/// Windows kit locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitPaths {
    pub includes: String,
    pub libs: String,
}

/// MSVC extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsvcOptions {
    pub provisioning: MsvcProvisioning,
    pub vc_root: String,
    /// Windows kit, absent in IDE mode
    pub kit: Option<KitPaths>,
    pub masm_compiler: Option<String>,
    pub link: Option<String>,
    pub lib: Option<String>,
    pub under_wine: bool,
    pub system_msvc: bool,
}

impl MsvcOptions {
    pub fn is_ide(&self) -> bool {
        self.provisioning == MsvcProvisioning::Ide
    }
}

/// Family-specific extras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FamilyOptions {
    Gnu(GnuOptions),
    Msvc(MsvcOptions),
}

/// The canonical toolchain record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainOptions {
    pub family: Family,
    pub sourced: Sourced,
    pub c_compiler: String,
    pub cxx_compiler: String,
    pub version: CompilerVersion,
    /// Version as emitted in `<FAMILY>_VER`
    pub version_string: String,
    /// `$(<match root>)`
    pub name_marker: String,
    pub arch_opt: Vec<String>,
    pub target_opt: Vec<String>,
    pub werror_mode: String,
    pub env: BTreeMap<String, EnvValue>,
    pub family_options: FamilyOptions,
}

impl ToolchainOptions {
    /// Resolve the toolchain options for this invocation.
    pub fn resolve(
        input: &ToolchainInput,
        ctx: &BuildContext,
        runner: &dyn Runner,
    ) -> ConfResult<Self> {
        let params = &input.params;

        let detected = if params.kind == SYSTEM_CXX {
            Some(detect(
                runner,
                params.c_compiler.as_deref(),
                params.cxx_compiler.as_deref(),
                &ctx.env,
            )?)
        } else {
            None
        };

        let (family, sourced, c_compiler, cxx_compiler, version, version_string) = match &detected
        {
            Some(d) => (
                d.family,
                Sourced::Detected,
                d.c_compiler.clone(),
                d.cxx_compiler.clone(),
                d.version.clone(),
                d.version.to_string(),
            ),
            None => {
                let family = Family::parse(&params.kind)?;
                let c = params.require(&params.c_compiler, "c_compiler")?.to_string();
                let cxx = params.require(&params.cxx_compiler, "cxx_compiler")?.to_string();
                let raw = params.gcc_version.clone().unwrap_or_else(|| "0".to_string());
                let version = CompilerVersion::parse(&raw)?;
                (family, Sourced::Packaged, c, cxx, version, raw)
            }
        };

        let name = input.name.as_deref().unwrap_or(DEFAULT_NAME);
        let name_marker = format!(
            "$({})",
            params
                .match_root
                .clone()
                .unwrap_or_else(|| name.to_uppercase())
        );

        let werror_mode = ctx
            .preset_non_empty("WERROR_MODE")
            .or_else(|| ctx.env_var("WERROR_MODE"))
            .or_else(|| params.werror_mode.as_deref().filter(|v| !v.is_empty()))
            .unwrap_or("compiler_specific")
            .to_string();

        let env = input
            .env
            .iter()
            .map(|(k, v)| Ok((k.clone(), EnvValue::from_json(k, v)?)))
            .collect::<ConfResult<BTreeMap<_, _>>>()?;

        let mut tc = ToolchainOptions {
            family,
            sourced,
            c_compiler,
            cxx_compiler,
            version,
            version_string,
            name_marker,
            arch_opt: optional_tokens(params.arch_opt.as_ref())?,
            target_opt: optional_tokens(params.target_opt.as_ref())?,
            werror_mode,
            env,
            family_options: FamilyOptions::Gnu(GnuOptions::empty()),
        };

        tc.family_options = if family == Family::Msvc {
            FamilyOptions::Msvc(resolve_msvc(&mut tc, params, ctx, runner, detected.as_ref())?)
        } else {
            FamilyOptions::Gnu(resolve_gnu(&tc, params, ctx)?)
        };

        tracing::debug!("c_compiler={}", tc.c_compiler);
        tracing::debug!("cxx_compiler={}", tc.cxx_compiler);
        tracing::info!(
            "Using {} {} ({:?})",
            tc.family,
            tc.version_string,
            tc.sourced
        );

        Ok(tc)
    }

    /// Whether the compiler version is at least `min`.
    pub fn version_at_least(&self, min: &[u32]) -> bool {
        self.version.at_least(min)
    }

    pub fn is_clang(&self) -> bool {
        self.family.is_clang()
    }

    pub fn is_packaged(&self) -> bool {
        self.sourced == Sourced::Packaged
    }

    /// GNU extras, if this is a GNU-like toolchain.
    pub fn gnu(&self) -> Option<&GnuOptions> {
        match &self.family_options {
            FamilyOptions::Gnu(gnu) => Some(gnu),
            FamilyOptions::Msvc(_) => None,
        }
    }

    /// MSVC extras, if this is an MSVC toolchain.
    pub fn msvc(&self) -> Option<&MsvcOptions> {
        match &self.family_options {
            FamilyOptions::Msvc(msvc) => Some(msvc),
            FamilyOptions::Gnu(_) => None,
        }
    }

    /// Whether the host system is used as the OS SDK.
    pub fn os_sdk_local(&self) -> bool {
        self.gnu().map_or(false, |gnu| gnu.os_sdk_local)
    }

    /// Render the toolchain environment as `${env:"NAME=v1\<sep>v2"}` items.
    pub fn reformat_env(&self, values_sep: char) -> String {
        let sep = format!("\\{}", values_sep);
        self.env
            .iter()
            .map(|(name, value)| format!("${{env:\"{}={}\"}}", name, value.join(&sep)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn optional_tokens(value: Option<&Value>) -> ConfResult<Vec<String>> {
    value.map(json_tokens).transpose().map(Option::unwrap_or_default)
}

impl GnuOptions {
    fn empty() -> Self {
        GnuOptions {
            ar: String::new(),
            ar_plugin: None,
            dwarf_tool: None,
            sys_lib: Vec::new(),
            platform_projects: Vec::new(),
            os_sdk: None,
            os_sdk_local: false,
        }
    }
}

fn resolve_gnu(
    tc: &ToolchainOptions,
    params: &ToolchainParams,
    ctx: &BuildContext,
) -> ConfResult<GnuOptions> {
    let ar = params
        .ar
        .clone()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "ar".to_string());

    let dwarf_tool = match params
        .dwarf_tool
        .as_ref()
        .and_then(|map| ctx.target.find_in_map(map))
        .filter(|v| !v.is_null())
    {
        Some(value) => Some(json_tokens(value)?),
        None if ctx.host.is_macos() => Some(vec!["dsymutil -f".to_string()]),
        None => None,
    };

    let sys_lib = match &params.sys_lib {
        Some(PerOs::ByOs(map)) => optional_tokens(ctx.target.find_in_map(map))?,
        Some(PerOs::Flat(value)) => json_tokens(value)?,
        None => Vec::new(),
    };

    let platform_projects = optional_tokens(
        params
            .platform
            .as_ref()
            .and_then(|map| ctx.target.find_in_map(map)),
    )?;

    let os_sdk = match ctx.preset_non_empty("OS_SDK") {
        Some(preset) => Some(preset.to_string()),
        None => default_os_sdk(tc, ctx).map(str::to_string),
    };
    let os_sdk_local = os_sdk.as_deref() == Some("local");

    tracing::debug!("OS SDK: {}", os_sdk.as_deref().unwrap_or("none"));

    Ok(GnuOptions {
        ar,
        ar_plugin: params.ar_plugin.clone(),
        dwarf_tool,
        sys_lib,
        platform_projects,
        os_sdk,
        os_sdk_local,
    })
}

/// Default OS SDK for Linux targets.
///
/// Compilers older than 4.0 building x86_64 on a Linux host use the local
/// system; AArch64 needs at least `ubuntu-16`.
pub fn default_os_sdk(tc: &ToolchainOptions, ctx: &BuildContext) -> Option<&'static str> {
    if !ctx.target.is_linux() {
        return None;
    }

    if ctx.target.is_x86_64() {
        if ctx.host.is_linux() && !tc.version_at_least(&[4, 0]) {
            return Some("local");
        }
    } else if ctx.target.is_aarch64() {
        return Some("ubuntu-16");
    }

    Some("ubuntu-12")
}

fn resolve_msvc(
    tc: &mut ToolchainOptions,
    params: &ToolchainParams,
    ctx: &BuildContext,
    runner: &dyn Runner,
    detected: Option<&DetectedCompiler>,
) -> ConfResult<MsvcOptions> {
    let under_wine = params.has_flag("wine");
    let system_msvc = params.has_flag("system_msvc");

    let options = if params.has_flag("ide_msvs") {
        let bindir = "$(VC_ExecutablePath_x64_x64)\\";
        tc.c_compiler = format!("{}cl.exe", bindir);
        tc.cxx_compiler = tc.c_compiler.clone();

        MsvcOptions {
            provisioning: MsvcProvisioning::Ide,
            vc_root: "$(VCInstallDir)".to_string(),
            kit: None,
            masm_compiler: Some(format!("{}ml64.exe", bindir)),
            link: Some(format!("{}link.exe", bindir)),
            lib: Some(format!("{}lib.exe", bindir)),
            under_wine,
            system_msvc,
        }
    } else if detected.is_some() {
        let find = |name: &str| runner.find(name).map(|p| p.display().to_string());

        let (sdk_dir, sdk_version, vc_install_dir) = match (
            ctx.env.get("WindowsSdkDir"),
            ctx.env.get("WindowsSDKVersion"),
            ctx.env.get("VCINSTALLDIR"),
        ) {
            (Some(dir), Some(version), Some(vc)) => (dir.as_str(), version.as_str(), vc.as_str()),
            _ => return Err(ConfigureError::MissingMsvcEnvironment),
        };

        // vcvars leaves a trailing separator on every directory
        let kit_dir =
            |kind: &str| ctx.normalize_host_path(&ctx.host_join(&[sdk_dir, kind, sdk_version]));

        MsvcOptions {
            provisioning: MsvcProvisioning::Local,
            vc_root: ctx.normalize_host_path(vc_install_dir),
            kit: Some(KitPaths {
                includes: kit_dir("Include"),
                libs: kit_dir("Lib"),
            }),
            masm_compiler: find("ml64.exe"),
            link: find("link.exe"),
            lib: find("lib.exe"),
            under_wine,
            system_msvc,
        }
    } else {
        let sdk_root = params.require(&params.sdk_root, "sdk_root")?;

        MsvcOptions {
            provisioning: MsvcProvisioning::Packaged,
            vc_root: ctx.host_join(&[sdk_root, "VC"]),
            kit: Some(KitPaths {
                includes: ctx.host_join(&[sdk_root, "include"]),
                libs: ctx.host_join(&[sdk_root, "lib"]),
            }),
            masm_compiler: Some(params.require(&params.masm_compiler, "masm_compiler")?.to_string()),
            link: Some(params.require(&params.link, "link")?.to_string()),
            lib: Some(params.require(&params.lib, "lib")?.to_string()),
            under_wine,
            system_msvc,
        }
    };

    tracing::debug!("MSVC provisioning: {:?}", options.provisioning);

    Ok(options)
}
