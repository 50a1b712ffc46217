//! Auxiliary tool variables: Ragel, Perl, Yasm, Python and CUDA.
//!
//! Each helper detects what it needs and writes a handful of variables.
//! Missing optional tools degrade to sentinel values instead of failing.

use std::collections::BTreeMap;
use std::path::PathBuf;

use regex::Regex;

use crate::builder::context::BuildContext;
use crate::builder::toolchain::{Family, ToolchainOptions};
use crate::core::errors::{ConfResult, ConfigureError};
use crate::core::platform::Platform;
use crate::emit::{Emitter, VariableSet};
use crate::util::process::{ProcessBuilder, Runner};

/// Sentinel for an incomplete Perl installation.
pub const PERL_NOT_FOUND: &str = "PERL-NOT-FOUND";

/// Sentinel for an incomplete Python installation.
pub const PYTHON_NOT_FOUND: &str = "PYTHON-NOT-FOUND";

const PERL_CONFIG_KEYS: [&str; 3] = ["version", "privlibexp", "archlibexp"];

/// Write every auxiliary variable in its fixed order.
pub fn print_other_settings(
    tc: &ToolchainOptions,
    ctx: &BuildContext,
    runner: &dyn Runner,
    em: &mut Emitter,
) -> ConfResult<()> {
    let host = &ctx.host;

    em.set("USE_LOCAL_TOOLS", if ctx.ignore_local_files { "no" } else { "yes" });

    Ragel::for_toolchain(tc, ctx).print_variables(em);

    let mut perl = Perl::default();
    perl.configure_local(ctx, runner);
    perl.print_variables("LOCAL_", em);

    Yasm::configure(&ctx.target).print_variables(em);

    let posix_host = host.is_linux() || host.is_freebsd() || host.is_macos() || host.is_cygwin();
    if posix_host && ctx.is_negative("USE_ARCADIA_PYTHON") {
        let mut python = Python::default();
        python.configure_posix(tc, ctx, runner)?;
        python.print_variables(ctx, em);
    }

    Cuda::new(tc, ctx).print_variables(em);

    em.set_empty("SVN_DEPENDS");

    Ok(())
}

/// Ragel code generation flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ragel {
    pub rlgen_flags: Vec<&'static str>,
    pub ragel_flags: Vec<&'static str>,
    pub ragel6_flags: Vec<&'static str>,
}

impl Ragel {
    /// Optimized output only for GNU-like release builds without a sanitizer.
    pub fn for_toolchain(tc: &ToolchainOptions, ctx: &BuildContext) -> Self {
        let optimized = match tc.family {
            Family::Msvc => false,
            Family::Gnu | Family::Clang => ctx.is_release() && !ctx.is_sanitized(),
        };

        let mut ragel = Ragel::default();
        if optimized {
            ragel.rlgen_flags.push("-G2");
            ragel.ragel6_flags.push("-CG2");
        } else {
            ragel.rlgen_flags.push("-T0");
            ragel.ragel6_flags.push("-CT0");
        }
        ragel
    }

    pub fn print_variables(&self, em: &mut Emitter) {
        em.set("RLGEN_FLAGS", &self.rlgen_flags);
        em.set("RAGEL_FLAGS", &self.ragel_flags);
        em.set("RAGEL6_FLAGS", &self.ragel6_flags);
    }
}

/// A locally installed Perl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Perl {
    pub perl: Option<String>,
    pub version: Option<String>,
    pub privlib: Option<String>,
    pub archlib: Option<String>,
}

impl Perl {
    /// Locate Perl (`PERL` preset or `PATH`) and read its configuration.
    pub fn configure_local(&mut self, ctx: &BuildContext, runner: &dyn Runner) {
        self.perl = ctx
            .preset_non_empty("PERL")
            .map(str::to_string)
            .or_else(|| runner.find("perl").map(|p| p.display().to_string()));

        let Some(perl) = &self.perl else {
            tracing::debug!("perl not found");
            return;
        };

        let cmd = ProcessBuilder::new(perl)
            .args(PERL_CONFIG_KEYS.iter().map(|key| format!("-V:{}", key)));
        let config = match runner.run(&cmd) {
            Ok(output) => output.stdout_if_success().unwrap_or_default(),
            Err(e) => {
                tracing::debug!("failed to query perl: {:#}", e);
                String::new()
            }
        };

        let mut values = parse_perl_config(&config);
        self.version = values.remove("version");
        self.privlib = values.remove("privlibexp");
        self.archlib = values.remove("archlibexp");
    }

    /// Emit the Perl variables; any missing value resets all of them.
    pub fn print_variables(&self, prefix: &str, em: &mut Emitter) {
        let mut vars = VariableSet::new();
        vars.set_opt(format!("{}PERL", prefix), self.perl.as_ref());
        vars.set_opt(format!("{}PERL_VERSION", prefix), self.version.as_ref());
        vars.set_opt(format!("{}PERL_PRIVLIB", prefix), self.privlib.as_ref());
        vars.set_opt(format!("{}PERL_ARCHLIB", prefix), self.archlib.as_ref());

        vars.reset_if_any_absent(PERL_NOT_FOUND);
        vars.dump(em);
    }
}

/// Parse `key='value';` lines printed by `perl -V:key`.
pub fn parse_perl_config(text: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    let Ok(re) = Regex::new(r"(?m)^(\w+)='(.*)';$") else {
        return values;
    };

    for caps in re.captures_iter(text) {
        values.insert(caps[1].to_string(), caps[2].to_string());
    }
    values
}

/// A system Python found through `python-config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Python {
    pub python: Option<String>,
    pub flags: Option<String>,
    pub ldflags: Option<String>,
    pub libraries: Option<String>,
    pub includes: Option<String>,
}

impl Python {
    /// Query `python-config --cflags --ldflags --includes`.
    ///
    /// Fails when a non-pinned system Python would be used with a non-local
    /// OS SDK.
    pub fn configure_posix(
        &mut self,
        tc: &ToolchainOptions,
        ctx: &BuildContext,
        runner: &dyn Runner,
    ) -> ConfResult<()> {
        let locate = |preset: &str, program: &str| -> Option<String> {
            ctx.preset_non_empty(preset)
                .map(str::to_string)
                .or_else(|| runner.find(program).map(|p: PathBuf| p.display().to_string()))
        };

        let (Some(python), Some(python_config)) =
            (locate("PYTHON_BIN", "python"), locate("PYTHON_CONFIG", "python-config"))
        else {
            tracing::debug!("python or python-config not found");
            return Ok(());
        };

        let cmd = ProcessBuilder::new(&python_config).args(["--cflags", "--ldflags", "--includes"]);
        let config = match runner.run(&cmd) {
            Ok(output) => output.stdout_if_success().unwrap_or_default(),
            Err(e) => {
                tracing::debug!("failed to query python-config: {:#}", e);
                String::new()
            }
        };

        // one option per line, in the requested order
        let lines: Vec<&str> = config.split('\n').collect();
        if lines.len() < 3 {
            return Ok(());
        }

        self.python = Some(python);
        self.flags = Some(lines[0].to_string());
        self.ldflags = Some(lines[1].to_string());
        self.includes = Some(lines[2].to_string());
        // libraries stay inside ldflags
        self.libraries = Some(String::new());

        if ctx.preset("USE_ARCADIA_PYTHON") == Some("no")
            && ctx.preset_non_empty("USE_SYSTEM_PYTHON").is_none()
            && !tc.os_sdk_local()
        {
            return Err(ConfigureError::SystemPythonRequiresLocalSdk);
        }

        Ok(())
    }

    /// Emit the Python variables; presets override and any missing value
    /// resets all of them.
    pub fn print_variables(&self, ctx: &BuildContext, em: &mut Emitter) {
        let mut vars = VariableSet::new();
        vars.set_opt("PYTHON_BIN", self.python.as_ref());
        vars.set_opt("PYTHON_FLAGS", self.flags.as_ref());
        vars.set_opt("PYTHON_LDFLAGS", self.ldflags.as_ref());
        vars.set_opt("PYTHON_LIBRARIES", self.libraries.as_ref());
        vars.set_opt("PYTHON_INCLUDE", self.includes.as_ref());

        vars.override_with(|name| ctx.preset(name).map(str::to_string));
        vars.reset_if_any_absent(PYTHON_NOT_FOUND);
        vars.dump(em);
    }
}

/// CUDA availability and `nvcc` settings.
pub struct Cuda<'a> {
    tc: &'a ToolchainOptions,
    ctx: &'a BuildContext,
}

impl<'a> Cuda<'a> {
    pub fn new(tc: &'a ToolchainOptions, ctx: &'a BuildContext) -> Self {
        Cuda { tc, ctx }
    }

    /// Whether CUDA is available for this host/target pair.
    pub fn have_cuda(&self) -> bool {
        if self.ctx.preset("CUDA_ROOT").is_some() {
            return true;
        }
        if self.ctx.is_negative("USE_ARCADIA_CUDA") {
            return false;
        }

        let host = &self.ctx.host;
        let target = &self.ctx.target;

        if host.is_linux() && host.is_x86_64() && target.is_linux() {
            return target.is_x86_64() || target.is_aarch64();
        }
        if host.is_macos() && host.is_x86_64() && target.is_macos() {
            return target.is_x86_64();
        }

        false
    }

    /// Host compiler directory handed to `nvcc`.
    pub fn cuda_compiler(&self) -> Option<String> {
        if let Some(user) = self.ctx.preset("CUDA_COMPILER") {
            return Some(user.to_string());
        }

        let target = &self.ctx.target;
        let compiler = if target.is_linux() {
            if target.is_x86_64() {
                Some("$(CUDA)/compiler/gcc/bin/g++-4.9")
            } else if target.is_aarch64() {
                Some("$(CUDA)/compiler/gcc/bin/aarch64-linux-g++")
            } else {
                None
            }
        } else if target.is_macos() && target.is_x86_64() {
            Some("$(CUDA_XCODE)/usr/bin")
        } else {
            None
        };
        compiler.map(str::to_string)
    }

    pub fn print_variables(&self, em: &mut Emitter) {
        let ctx = self.ctx;
        let have_cuda = ctx.is_positive("HAVE_CUDA") || self.have_cuda();

        if ctx.preset("HAVE_CUDA").is_none() {
            em.set("HAVE_CUDA", have_cuda);
        }

        let use_arcadia_cuda = ctx.preset("CUDA_ROOT").is_none();
        em.set("_USE_ARCADIA_CUDA", use_arcadia_cuda);

        let mut nvcc_flags = Vec::new();

        if use_arcadia_cuda {
            em.set("CUDA_ROOT", "$(CUDA)");

            if let Some(compiler) = self.cuda_compiler() {
                nvcc_flags.push(format!("--compiler-bindir={}", compiler));
            }

            let target = &ctx.target;
            if target.is_linux() && target.is_x86_64() && self.tc.is_clang() {
                let os_sdk_root = if self.tc.version_at_least(&[4, 0]) {
                    "{OS_SDK_ROOT}"
                } else {
                    ""
                };
                nvcc_flags.push(format!("-I${}/usr/include/x86_64-linux-gnu", os_sdk_root));
            }
        }

        let nvcc = if ctx.host.is_windows() {
            "$CUDA_ROOT\\bin\\nvcc.exe"
        } else {
            "$CUDA_ROOT/bin/nvcc"
        };
        em.set("NVCC_UNQUOTED", nvcc);
        em.set("NVCC", "${quo:NVCC_UNQUOTED}");

        if ctx.preset("CUDA_NVCC_FLAGS").is_none() {
            em.set_empty("CUDA_NVCC_FLAGS");
        }

        nvcc_flags.push("$CUDA_NVCC_FLAGS".to_string());
        em.set("NVCC_FLAGS", &nvcc_flags);
    }
}

/// Yasm object format and platform defines for the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Yasm {
    pub fmt: &'static str,
    pub platform: Vec<&'static str>,
    pub flags: Vec<&'static str>,
}

impl Yasm {
    pub fn configure(target: &Platform) -> Self {
        let (platform, fmt) = if target.is_ios() || target.is_macos() {
            (vec!["DARWIN", "UNIX"], "macho")
        } else if (target.is_windows() && target.is_64_bit()) || target.is_cygwin() {
            (vec!["WIN64"], "win")
        } else if target.is_windows() && target.is_32_bit() {
            (vec!["WIN32"], "win")
        } else {
            (vec!["UNIX"], "elf")
        };

        let flags = if fmt == "elf" {
            vec!["-g", "dwarf2"]
        } else {
            Vec::new()
        };

        Yasm {
            fmt,
            platform,
            flags,
        }
    }

    pub fn print_variables(&self, em: &mut Emitter) {
        let d_platform = self
            .platform
            .iter()
            .map(|p| format!("-D {}", p))
            .collect::<Vec<_>>()
            .join(" ");
        let output = format!(
            "${{output;noext:SRC.{}}}",
            if self.fmt == "win" { "obj" } else { "o" }
        );

        em.raw(&format!(
            "macro _SRC_yasm_impl(SRC, PREINCLUDES[], SRCFLAGS...) {{\n    \
             .CMD=${{tool:\"contrib/tools/yasm\"}} -f {}$HARDWARE_ARCH {} -D ${{pre=_;suf=_:HARDWARE_TYPE}} -D_YASM_ $ASM_PREFIX_VALUE {} ${{YASM_FLAGS}} ${{pre=-I :INCLUDE}} -o {} ${{pre=-P :PREINCLUDES}} ${{input:SRC}} ${{kv;hide:\"p AS\"}} ${{kv;hide:\"pc light-green\"}} ${{input;hide:PREINCLUDES}}\n\
             \n\
             }}\n",
            self.fmt,
            d_platform,
            self.flags.join(" "),
            output
        ));
    }
}
