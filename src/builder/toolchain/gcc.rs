//! GCC/Clang toolchain and compiler strategies.

use crate::builder::context::BuildContext;
use crate::core::build_type::Profiler;
use crate::core::errors::ConfResult;
use crate::emit::{tokens, Emitter};

use super::options::{GnuOptions, ToolchainOptions};
use super::{CompilerStrategy, ToolchainStrategy};

/// Which GNU-like compiler is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GnuFlavor {
    Gcc,
    Clang,
}

impl GnuFlavor {
    /// `GCC` or `CLANG`.
    pub fn compiler_variable(&self) -> &'static str {
        match self {
            GnuFlavor::Gcc => "GCC",
            GnuFlavor::Clang => "CLANG",
        }
    }
}

/// Toolchain-wide variables for GNU-like compilers.
pub struct GnuToolchain<'a> {
    tc: &'a ToolchainOptions,
    gnu: &'a GnuOptions,
    ctx: &'a BuildContext,
    c_flags_platform: Vec<String>,
}

impl<'a> GnuToolchain<'a> {
    pub fn new(tc: &'a ToolchainOptions, gnu: &'a GnuOptions, ctx: &'a BuildContext) -> Self {
        let mut c_flags_platform = tc.target_opt.clone();
        if ctx.target.is_macos() {
            c_flags_platform.push("-mmacosx-version-min=10.9".to_string());
        } else if ctx.target.is_ios() {
            c_flags_platform.push("-mios-version-min=7.0".to_string());
        }

        GnuToolchain {
            tc,
            gnu,
            ctx,
            c_flags_platform,
        }
    }
}

impl ToolchainStrategy for GnuToolchain<'_> {
    fn print_toolchain(&self, em: &mut Emitter) -> ConfResult<()> {
        em.set("TOOLCHAIN_ENV", self.tc.reformat_env(':'));
        em.set("C_FLAGS_PLATFORM", &self.c_flags_platform);

        if self.ctx.preset("OS_SDK").is_none() {
            em.set("OS_SDK", &self.gnu.os_sdk);
            em.set("PERL_OS_SDK", "ubuntu-12");
        } else {
            em.set("PERL_OS_SDK", &self.gnu.os_sdk);
        }

        let os_sdk_root = (!self.gnu.os_sdk_local).then_some("$(OS_SDK_ROOT)");
        em.set("OS_SDK_ROOT", os_sdk_root);

        Ok(())
    }
}

/// Flag lists composed for a GNU-like compiler before emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GnuFlags {
    pub c_defines: Vec<String>,
    pub c_flags: Vec<String>,
    pub c_only_flags: Vec<String>,
    pub cxx_flags: Vec<String>,
    pub sfdl_flags: Vec<String>,
    /// Object suffix infix, `.pic` unless PIC is forced off
    pub cross_suffix: &'static str,
    pub optimize: Option<&'static str>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl GnuFlags {
    /// Compose the flag lists for the target, build type and compiler version.
    pub fn compose(tc: &ToolchainOptions, ctx: &BuildContext, flavor: GnuFlavor) -> Self {
        let target = &ctx.target;

        let mut c_defines = owned(&[
            "-D_FILE_OFFSET_BITS=64",
            "-D_LARGEFILE_SOURCE",
            "-D__STDC_CONSTANT_MACROS",
            "-D__STDC_FORMAT_MACROS",
            "-DGNU",
        ]);
        if target.is_linux() || target.is_cygwin() {
            c_defines.push("-D_GNU_SOURCE".to_string());
        }

        let mut c_flags = tc.arch_opt.clone();
        c_flags.push("-pipe".to_string());

        let mut sfdl_flags = owned(&["-E", "-C", "-x", "c++"]);

        if target.is_intel() {
            if target.is_32_bit() {
                c_flags.push("-m32".to_string());
            }
            if target.is_64_bit() {
                c_flags.push("-m64".to_string());
            }
        }

        // SSE breaks inline assembly in some iOS i386 builds
        let enable_sse = target.is_intel() && !target.is_ios();
        if enable_sse {
            if ctx.is_positive("NOSSE") {
                c_defines.push("-no-sse".to_string());
            } else {
                for (opt, define) in [
                    ("-msse", "-DSSE_ENABLED=1"),
                    ("-msse2", "-DSSE2_ENABLED=1"),
                    ("-msse3", "-DSSE3_ENABLED=1"),
                ] {
                    c_flags.push(opt.to_string());
                    c_defines.push(define.to_string());
                }
            }
        }

        let cross_suffix = if ctx.is_positive("FORCE_NO_PIC") {
            ""
        } else {
            ".pic"
        };

        let mut flags = GnuFlags {
            c_defines,
            c_flags,
            c_only_flags: Vec::new(),
            cxx_flags: Vec::new(),
            sfdl_flags: Vec::new(),
            cross_suffix,
            optimize: None,
        };
        flags.configure_build_type(ctx);

        match flavor {
            GnuFlavor::Gcc => {
                if tc.version_at_least(&[4, 9]) {
                    flags.c_flags.push("-fno-delete-null-pointer-checks".to_string());
                    flags.c_flags.push("-fabi-version=8".to_string());
                }
            }
            GnuFlavor::Clang => {
                sfdl_flags.push("-Qunused-arguments".to_string());

                if tc.version_at_least(&[3, 6]) {
                    flags.c_flags.push("-Wno-inconsistent-missing-override".to_string());
                }
                if tc.version_at_least(&[5, 0]) {
                    flags.c_flags.push("-Wno-c++17-extensions".to_string());
                    flags.c_flags.push("-Wno-exceptions".to_string());
                }
            }
        }
        flags.sfdl_flags = sfdl_flags;

        flags
    }

    fn configure_build_type(&mut self, ctx: &BuildContext) {
        if ctx.is_valgrind() {
            self.c_defines.push("-DWITH_VALGRIND=1".to_string());
        }

        if ctx.is_debug() {
            self.c_flags.push("$FSTACK".to_string());
        }

        if ctx.is_release() {
            self.c_flags.push("$OPTIMIZE".to_string());
            self.optimize = Some("-O2");
        }

        if ctx.strips_assertions() {
            self.c_defines.push("-DNDEBUG".to_string());
        } else {
            self.c_defines.push("-UNDEBUG".to_string());
        }

        if ctx.is_coverage() {
            self.c_flags.push("-fprofile-arcs".to_string());
            self.c_flags.push("-ftest-coverage".to_string());
        }

        match ctx.profiler() {
            Some(Profiler::Generic) => {
                self.c_flags.push("-fno-omit-frame-pointer".to_string());
            }
            Some(Profiler::GProf) => {
                self.c_flags.push("-fno-omit-frame-pointer".to_string());
                self.c_flags.push("-pg".to_string());
            }
            None => {}
        }
    }
}

/// Compiler variables for GCC and Clang.
pub struct GnuCompiler<'a> {
    tc: &'a ToolchainOptions,
    gnu: &'a GnuOptions,
    ctx: &'a BuildContext,
    flavor: GnuFlavor,
    flags: GnuFlags,
}

impl<'a> GnuCompiler<'a> {
    pub fn new(
        tc: &'a ToolchainOptions,
        gnu: &'a GnuOptions,
        ctx: &'a BuildContext,
        flavor: GnuFlavor,
    ) -> Self {
        GnuCompiler {
            tc,
            gnu,
            ctx,
            flavor,
            flags: GnuFlags::compose(tc, ctx, flavor),
        }
    }

    pub fn flags(&self) -> &GnuFlags {
        &self.flags
    }

    fn print_compile_macros(&self, em: &mut Emitter) {
        let style = r#"${hide;kv:"p CC"} ${hide;kv:"pc green"}"#;
        let cxx_args = [
            "$GCCFILTER",
            "$YNDEXER_ARGS",
            "$CXX_COMPILER",
            "$C_FLAGS_PLATFORM",
            "$GCC_COMPILE_FLAGS",
            "$CXXFLAGS",
            "$EXTRA_OUTPUT",
            "$SRCFLAGS",
            "$TOOLCHAIN_ENV",
            "$YNDEXER_OUTPUT",
            style,
        ];
        let c_args = [
            "$GCCFILTER",
            "$YNDEXER_ARGS",
            "$C_COMPILER",
            "$C_FLAGS_PLATFORM",
            "$GCC_COMPILE_FLAGS",
            "$CFLAGS",
            "$CONLYFLAGS",
            "$EXTRA_OUTPUT",
            "$SRCFLAGS",
            "$TOOLCHAIN_ENV",
            "$YNDEXER_OUTPUT",
            style,
        ];

        em.raw(&format!(
            "macro _SRC_cpp(SRC, SRCFLAGS...) {{\n .CMD={}\n}}",
            cxx_args.join(" ")
        ));
        em.raw(&format!(
            "macro _SRC_c(SRC, SRCFLAGS...) {{\n .CMD={}\n}}",
            c_args.join(" ")
        ));
        em.raw("macro _SRC_m(SRC, SRCFLAGS...) {\n .CMD=$SRC_c($SRC $SRCFLAGS)\n}");
        em.raw("macro _SRC_masm(SRC, SRCFLAGS...) {\n}");
    }
}

impl CompilerStrategy for GnuCompiler<'_> {
    fn print_compiler(&self, em: &mut Emitter) -> ConfResult<()> {
        let flags = &self.flags;
        let variable = self.flavor.compiler_variable();
        let sfx = flags.cross_suffix;

        em.set(variable, "yes");
        em.set(&format!("{}_VER", variable), &self.tc.version_string);

        em.set("C_COMPILER_UNQUOTED", &self.tc.c_compiler);
        em.set("C_COMPILER", "${quo:C_COMPILER_UNQUOTED}");
        em.set("OPTIMIZE", flags.optimize);
        em.set("WERROR_MODE", &self.tc.werror_mode);
        em.set("FSTACK", "-fstack-protector");
        em.append(
            "C_DEFINES",
            tokens![flags.c_defines, "-D_THREAD_SAFE", "-D_PTHREADS", "-D_REENTRANT"],
        );
        em.set_empty("DUMP_DEPS");
        em.set("GCC_PREPROCESSOR_OPTS", ["$DUMP_DEPS", "$C_DEFINES"]);
        em.append("C_WARNING_OPTS", ["-Wall", "-W", "-Wno-parentheses"]);
        em.append("CXX_WARNING_OPTS", "-Woverloaded-virtual");
        em.append("USER_CFLAGS_GLOBAL", "");
        em.append("USER_CFLAGS_GLOBAL", "");

        em.big(
            r#"
            when ($PIC && $PIC == "yes") {
                PICFLAGS=-fPIC
            }
            otherwise {
                PICFLAGS=
            }"#,
        );

        em.append(
            "CFLAGS",
            tokens![
                flags.c_flags,
                "$DEBUG_INFO_FLAGS",
                "$GCC_PREPROCESSOR_OPTS",
                "$C_WARNING_OPTS",
                "$PICFLAGS",
                "$USER_CFLAGS",
                "$USER_CFLAGS_GLOBAL",
                "-DFAKEID=$FAKEID",
                "-DARCADIA_ROOT=${ARCADIA_ROOT}",
                "-DARCADIA_BUILD_ROOT=${ARCADIA_BUILD_ROOT}",
            ],
        );
        em.append(
            "CXXFLAGS",
            tokens!["$CXX_WARNING_OPTS", "-std=c++14", "$CFLAGS", flags.cxx_flags, "$USER_CXXFLAGS"],
        );
        em.append("CONLYFLAGS", tokens![flags.c_only_flags, "$USER_CONLYFLAGS"]);
        em.set("CXX_COMPILER_UNQUOTED", &self.tc.cxx_compiler);
        em.set("CXX_COMPILER", "${quo:CXX_COMPILER_UNQUOTED}");
        em.set("NOGCCSTACKCHECK", "yes");
        em.set(
            "USE_GCCFILTER",
            self.ctx.preset_non_empty("USE_GCCFILTER").unwrap_or("yes"),
        );
        em.set(
            "USE_GCCFILTER_COLOR",
            self.ctx.preset_non_empty("USE_GCCFILTER_COLOR").unwrap_or("yes"),
        );
        em.set("SFDL_FLAG", tokens![flags.sfdl_flags, "-o", "$SFDL_TMP_OUT"]);
        em.set("WERROR_FLAG", ["-Werror", "-Wno-error=deprecated-declarations"]);

        let arc_profile = self.ctx.preset_non_empty("USE_ARC_PROFILE").is_some()
            || self.ctx.env_var("USE_ARC_PROFILE").is_some();
        em.set("USE_ARC_PROFILE", arc_profile);
        em.set("DEBUG_INFO_FLAGS", "-g");

        if !self.gnu.platform_projects.is_empty() {
            em.set("COMPILER_PLATFORM", &self.gnu.platform_projects);
        }

        em.big(
            r#"
            when ($NO_COMPILER_WARNINGS == "yes") {
                CFLAGS+= -w
            }
            when ($NO_OPTIMIZE == "yes") {
                OPTIMIZE=-O0
            }
            when ($SAVE_TEMPS ==  "yes") {
                CXXFLAGS += -save-temps
            }
            when ($NOGCCSTACKCHECK != "yes") {
                FSTACK+= -fstack-check
            }
            when ($NO_WSHADOW == "yes") {
                CFLAGS += -Wno-shadow
            }
            macro MSVC_FLAGS(Flags...) {
                # TODO: FIXME
                ENABLE(UNUSED_MACRO)
            }"#,
        );

        em.append("C_WARNING_OPTS", "-Wno-deprecated");
        em.append("CXX_WARNING_OPTS", "-Wno-invalid-offsetof");
        em.append("CXX_WARNING_OPTS", "-Wno-attributes");

        if self.flavor == GnuFlavor::Clang && self.tc.version_at_least(&[3, 9]) {
            em.append("CXX_WARNING_OPTS", "-Wno-undefined-var-template");
        }

        if self.ctx.target.arch == "i386" {
            em.append("CFLAGS", "-march=pentiumpro");
            em.append("CFLAGS", "-mtune=pentiumpro");
        }

        em.append("C_DEFINES", "-D__LONG_LONG_SUPPORTED");

        em.set(
            "GCC_COMPILE_FLAGS",
            [
                format!("$EXTRA_C_FLAGS -c -o ${{output:SRC{}.o}}", sfx),
                "${input:SRC} ${pre=-I:INCLUDE}".to_string(),
            ],
        );
        em.set_empty("EXTRA_C_FLAGS");
        em.set(
            "EXTRA_COVERAGE_OUTPUT",
            format!("${{output;noauto;hide:SRC{}.gcno}}", sfx),
        );
        // must stay the last output
        em.set(
            "YNDEXER_OUTPUT_FILE",
            format!("${{output;noauto:SRC{}.ydx.pb2}}", sfx),
        );

        if self.ctx.is_positive("DUMP_COMPILER_DEPS") {
            em.set("DUMP_DEPS", ["-MD", "${output;hide;noauto:SRC.o.d}"]);
        } else if self.ctx.is_positive("DUMP_COMPILER_DEPS_FAST") {
            em.set("DUMP_DEPS", ["-E", "-M", "-MF", "${output;noauto:SRC.o.d}"]);
        }

        if self.ctx.is_coverage() {
            em.set("EXTRA_OUTPUT", format!("${{output;noauto;hide:SRC{}.gcno}}", sfx));
        } else {
            em.set_empty("EXTRA_OUTPUT");
        }
        em.append("EXTRA_OUTPUT", ());

        self.print_compile_macros(em);

        if self.flavor == GnuFlavor::Clang && self.tc.version_at_least(&[5, 0]) {
            em.set("FSANITIZE_FUZZER_SUPPORTED", "yes");
            em.set("LIBFUZZER_PATH", "contrib/libs/libfuzzer-5.0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::build_type::BuildType;
    use crate::core::params::ToolchainInput;
    use crate::test_support::{fixtures, MockRunner};
    use crate::util::config::Presets;

    fn resolve(input: &ToolchainInput, build_type: &str, presets: &[&str]) -> (ToolchainOptions, BuildContext) {
        let ctx = BuildContext::new(
            "/src",
            input,
            BuildType::parse(build_type).unwrap(),
            Presets::from_args(presets),
            Default::default(),
            false,
        );
        let tc = ToolchainOptions::resolve(input, &ctx, &MockRunner::new()).unwrap();
        (tc, ctx)
    }

    fn compiler_output(input: &ToolchainInput, build_type: &str, presets: &[&str]) -> String {
        let (tc, ctx) = resolve(input, build_type, presets);
        let gnu = tc.gnu().unwrap();
        let flavor = if tc.is_clang() { GnuFlavor::Clang } else { GnuFlavor::Gcc };
        let mut em = Emitter::new();
        GnuCompiler::new(&tc, gnu, &ctx, flavor)
            .print_compiler(&mut em)
            .unwrap();
        em.into_string()
    }

    fn has_line(output: &str, line: &str) -> bool {
        output.lines().any(|l| l == line)
    }

    fn sse_counts(flags: &GnuFlags) -> (usize, usize, usize) {
        let sse_flags = flags.c_flags.iter().filter(|f| f.starts_with("-msse")).count();
        let sse_defines = flags
            .c_defines
            .iter()
            .filter(|d| d.starts_with("-DSSE") && d.ends_with("_ENABLED=1"))
            .count();
        let no_sse = flags.c_defines.iter().filter(|d| *d == "-no-sse").count();
        (sse_flags, sse_defines, no_sse)
    }

    #[test]
    fn test_gcc_release_flags() {
        let (tc, ctx) = resolve(&fixtures::linux_gnu_input("4.9.2"), "release", &[]);
        let flags = GnuFlags::compose(&tc, &ctx, GnuFlavor::Gcc);

        assert_eq!(
            flags.c_flags,
            vec![
                "-pipe",
                "-m64",
                "-msse",
                "-msse2",
                "-msse3",
                "$OPTIMIZE",
                "-fno-delete-null-pointer-checks",
                "-fabi-version=8"
            ]
        );
        assert!(flags.c_defines.contains(&"-D_GNU_SOURCE".to_string()));
        assert!(flags.c_defines.contains(&"-DSSE3_ENABLED=1".to_string()));
        assert_eq!(sse_counts(&flags), (3, 3, 0));
        assert_eq!(flags.c_defines.last().map(String::as_str), Some("-DNDEBUG"));
        assert_eq!(flags.optimize, Some("-O2"));
        assert_eq!(flags.cross_suffix, ".pic");
    }

    #[test]
    fn test_gcc_below_4_9_has_no_abi_flags() {
        let (tc, ctx) = resolve(&fixtures::linux_gnu_input("4.8.5"), "debug", &[]);
        let flags = GnuFlags::compose(&tc, &ctx, GnuFlavor::Gcc);
        assert!(!flags.c_flags.contains(&"-fabi-version=8".to_string()));
        assert!(flags.c_flags.contains(&"$FSTACK".to_string()));
        assert_eq!(flags.c_defines.last().map(String::as_str), Some("-UNDEBUG"));
        assert_eq!(flags.optimize, None);
    }

    #[test]
    fn test_nosse_and_no_pic() {
        let (tc, ctx) = resolve(
            &fixtures::linux_gnu_input("4.9.2"),
            "release",
            &["NOSSE=yes", "FORCE_NO_PIC=yes"],
        );
        let flags = GnuFlags::compose(&tc, &ctx, GnuFlavor::Gcc);
        assert_eq!(sse_counts(&flags), (0, 0, 1));
        assert_eq!(flags.cross_suffix, "");
    }

    #[test]
    fn test_profilers_and_coverage() {
        let (tc, ctx) = resolve(&fixtures::linux_gnu_input("4.9.2"), "gprof", &[]);
        let flags = GnuFlags::compose(&tc, &ctx, GnuFlavor::Gcc);
        assert!(flags.c_flags.contains(&"-fno-omit-frame-pointer".to_string()));
        assert!(flags.c_flags.contains(&"-pg".to_string()));

        let (tc, ctx) = resolve(&fixtures::linux_gnu_input("4.9.2"), "coverage", &[]);
        let flags = GnuFlags::compose(&tc, &ctx, GnuFlavor::Gcc);
        assert!(flags.c_flags.contains(&"-ftest-coverage".to_string()));
        assert!(!flags.c_flags.contains(&"-pg".to_string()));
    }

    #[test]
    fn test_clang_version_gates() {
        let (tc, ctx) = resolve(&fixtures::linux_clang_input("5.0"), "release", &[]);
        let flags = GnuFlags::compose(&tc, &ctx, GnuFlavor::Clang);
        assert_eq!(flags.sfdl_flags.last().map(String::as_str), Some("-Qunused-arguments"));
        assert!(flags.c_flags.contains(&"-Wno-inconsistent-missing-override".to_string()));
        assert!(flags.c_flags.contains(&"-Wno-exceptions".to_string()));

        let (tc, ctx) = resolve(&fixtures::linux_clang_input("3.5"), "release", &[]);
        let flags = GnuFlags::compose(&tc, &ctx, GnuFlavor::Clang);
        assert!(!flags.c_flags.contains(&"-Wno-inconsistent-missing-override".to_string()));
    }

    #[test]
    fn test_gcc_compiler_output() {
        let out = compiler_output(&fixtures::linux_gnu_input("4.9.2"), "release", &[]);

        assert!(out.starts_with("GCC=yes\nGCC_VER=4.9.2\nC_COMPILER_UNQUOTED=/usr/bin/gcc\n"));
        assert!(has_line(&out, "OPTIMIZE=-O2"));
        assert!(has_line(&out, "WERROR_MODE=compiler_specific"));
        assert!(has_line(&out, "USER_CFLAGS_GLOBAL+="));
        assert!(has_line(&out, "CXXFLAGS+=$CXX_WARNING_OPTS -std=c++14 $CFLAGS $USER_CXXFLAGS"));
        assert!(has_line(&out, "CONLYFLAGS+=$USER_CONLYFLAGS"));
        assert!(has_line(&out, "SFDL_FLAG=-E -C -x c++ -o $SFDL_TMP_OUT"));
        assert!(has_line(&out, "USE_ARC_PROFILE=no"));
        assert!(has_line(
            &out,
            "GCC_COMPILE_FLAGS=$EXTRA_C_FLAGS -c -o ${output:SRC.pic.o} ${input:SRC} ${pre=-I:INCLUDE}"
        ));
        assert!(has_line(&out, "EXTRA_OUTPUT="));
        assert!(has_line(&out, "EXTRA_OUTPUT+="));
        assert!(out.contains("\nwhen ($PIC && $PIC == \"yes\") {\n    PICFLAGS=-fPIC\n}\n"));
        assert!(out.contains("when ($SAVE_TEMPS ==  \"yes\") {"));
        assert!(out.ends_with("macro _SRC_masm(SRC, SRCFLAGS...) {\n}\n"));
        assert!(!out.contains("CLANG"));
        assert!(!out.contains("DUMP_DEPS=-MD"));
    }

    #[test]
    fn test_clang_compiler_output() {
        let out = compiler_output(&fixtures::linux_clang_input("5.0"), "debug", &["DUMP_COMPILER_DEPS=yes"]);

        assert!(out.starts_with("CLANG=yes\nCLANG_VER=5.0\n"));
        assert!(has_line(&out, "OPTIMIZE="));
        assert!(has_line(&out, "CXX_WARNING_OPTS+=-Wno-undefined-var-template"));
        assert!(has_line(&out, "DUMP_DEPS=-MD ${output;hide;noauto:SRC.o.d}"));
        assert!(has_line(
            &out,
            "SFDL_FLAG=-E -C -x c++ -Qunused-arguments -o $SFDL_TMP_OUT"
        ));
        assert!(out.ends_with(
            "FSANITIZE_FUZZER_SUPPORTED=yes\nLIBFUZZER_PATH=contrib/libs/libfuzzer-5.0\n"
        ));
    }

    #[test]
    fn test_i386_tuning_and_coverage_output() {
        let mut input = fixtures::linux_gnu_input("4.9.2");
        input.platform.target.arch = "i386".to_string();
        let out = compiler_output(&input, "coverage", &[]);

        assert!(has_line(&out, "CFLAGS+=-march=pentiumpro"));
        assert!(has_line(&out, "EXTRA_OUTPUT=${output;noauto;hide:SRC.pic.gcno}"));
        assert!(out.contains("-m32"));
    }

    #[test]
    fn test_toolchain_os_sdk() {
        let (tc, ctx) = resolve(&fixtures::linux_gnu_input("4.9.2"), "release", &[]);
        let mut em = Emitter::new();
        GnuToolchain::new(&tc, tc.gnu().unwrap(), &ctx)
            .print_toolchain(&mut em)
            .unwrap();
        assert_eq!(
            em.as_str(),
            "TOOLCHAIN_ENV=\nC_FLAGS_PLATFORM=\nOS_SDK=ubuntu-12\nPERL_OS_SDK=ubuntu-12\nOS_SDK_ROOT=$(OS_SDK_ROOT)\n"
        );

        let (tc, ctx) = resolve(&fixtures::linux_gnu_input("3.4"), "release", &["OS_SDK=local"]);
        let mut em = Emitter::new();
        GnuToolchain::new(&tc, tc.gnu().unwrap(), &ctx)
            .print_toolchain(&mut em)
            .unwrap();
        assert_eq!(
            em.as_str(),
            "TOOLCHAIN_ENV=\nC_FLAGS_PLATFORM=\nPERL_OS_SDK=local\nOS_SDK_ROOT=\n"
        );
    }

    #[test]
    fn test_macos_platform_flags() {
        let (tc, ctx) = resolve(&fixtures::macos_clang_input("5.0"), "release", &[]);
        let mut em = Emitter::new();
        GnuToolchain::new(&tc, tc.gnu().unwrap(), &ctx)
            .print_toolchain(&mut em)
            .unwrap();
        assert!(has_line(em.as_str(), "C_FLAGS_PLATFORM=-mmacosx-version-min=10.9"));
        assert!(has_line(em.as_str(), "OS_SDK="));
    }
}
