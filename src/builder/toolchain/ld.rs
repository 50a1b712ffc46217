//! GNU-style linker strategy.

use crate::builder::context::BuildContext;
use crate::core::build_type::Profiler;
use crate::core::errors::ConfResult;
use crate::emit::{tokens, Emitter};

use super::options::{GnuOptions, ToolchainOptions};
use super::LinkerStrategy;

const LD_ENV_STYLE: &str = r#"${cwd:ARCADIA_BUILD_ROOT} $TOOLCHAIN_ENV ${kv;hide:"p LD"} ${kv;hide:"pc light-blue"} ${kv;hide:"show_out"}"#;

/// Write the `USE_LINKER*` macros shared by every linker.
///
/// Packaged Clang 3.9+ on a Linux host can pick bfd, gold or lld; every
/// other toolchain gets a no-op `USE_LINKER`.
pub fn print_linker_selector(tc: &ToolchainOptions, ctx: &BuildContext, em: &mut Emitter) {
    if tc.is_clang() && tc.version_at_least(&[3, 9]) && ctx.host.is_linux() && tc.is_packaged() {
        let default_linker = if ctx.is_positive("USE_LTO") {
            "gold"
        } else {
            "lld"
        };

        em.big(&format!(
            r#"
            macro USE_LINKER() {{
                DEFAULT(_LINKER_ID {})

                when ($NOPLATFORM != "yes") {{
                    when ($_LINKER_ID == "bfd") {{
                        PEERDIR+=contrib/libs/platform/tools/linkers/bfd
                    }}
                    when ($_LINKER_ID == "gold") {{
                        PEERDIR+=contrib/libs/platform/tools/linkers/gold
                    }}
                    when ($_LINKER_ID == "lld") {{
                        PEERDIR+=contrib/libs/platform/tools/linkers/lld
                    }}
                }}
            }}"#,
            default_linker
        ));
    } else {
        em.big(
            r#"
            macro USE_LINKER() {
                ENABLE(UNUSED_MACRO)
            }"#,
        );
    }

    em.big(
        r#"
        macro USE_LINKER_BFD() {
            SET(_LINKER_ID bfd)
        }
        macro USE_LINKER_GOLD() {
            SET(_LINKER_ID gold)
        }
        macro USE_LINKER_LLD() {
            SET(_LINKER_ID lld)
        }"#,
    );
}

/// Linker settings derived from the target and build type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
    pub ar: String,
    pub ld_flags: Vec<String>,
    pub link_pie_executables: bool,
    pub thread_library: Option<&'static str>,
    pub rdynamic: Option<&'static str>,
    pub start_group: Option<&'static str>,
    pub end_group: Option<&'static str>,
    pub ld_strip_flag: Option<&'static str>,
    pub use_stdlib: Option<&'static str>,
    pub soname_option: Option<&'static str>,
    pub dwarf_command: Option<&'static str>,
    pub libresolv: Option<&'static str>,
}

impl LinkSettings {
    pub fn compose(gnu: &GnuOptions, tc: &ToolchainOptions, ctx: &BuildContext) -> Self {
        let target = &ctx.target;

        let mut ar = ctx
            .preset_non_empty("AR")
            .map(str::to_string)
            .unwrap_or_else(|| gnu.ar.clone());

        let mut ld_flags: Vec<String> = ctx
            .preset_non_empty("LDFLAGS")
            .map(str::to_string)
            .into_iter()
            .collect();

        if target.is_linux() {
            ld_flags.extend(["-ldl", "-lrt", "-Wl,--no-as-needed"].map(String::from));
        }
        if target.is_android() {
            ld_flags.extend(["-ldl", "-lsupc++", "-Wl,--no-as-needed"].map(String::from));
        }
        if target.is_macos() && !tc.is_clang() {
            ld_flags.push("-Wl,-no_compact_unwind".to_string());
        }

        let thread_library = if target.is_linux() || target.is_macos() {
            Some("-lpthread")
        } else if target.is_freebsd() {
            Some("-lthr")
        } else {
            None
        };

        let mut settings = LinkSettings {
            ar: String::new(),
            ld_flags: Vec::new(),
            link_pie_executables: target.is_android(),
            thread_library,
            rdynamic: None,
            start_group: None,
            end_group: None,
            ld_strip_flag: None,
            use_stdlib: None,
            soname_option: None,
            dwarf_command: None,
            libresolv: (target.is_linux() || target.is_macos() || target.is_android())
                .then_some("-lresolv"),
        };

        if target.is_linux() || target.is_android() || target.is_freebsd() {
            settings.rdynamic = Some("-rdynamic");
            settings.use_stdlib = Some("-nodefaultlibs");
        }

        if target.is_linux() || target.is_android() || target.is_freebsd() || target.is_cygwin() {
            settings.start_group = Some("-Wl,--start-group");
            settings.end_group = Some("-Wl,--end-group");
            settings.ld_strip_flag = Some("-s");
            settings.soname_option = Some("-soname");
        }

        if target.is_macos() || target.is_ios() {
            settings.use_stdlib = Some("-nodefaultlibs");
            settings.soname_option = Some("-install_name");
            if ctx.preset_non_empty("NO_DEBUGINFO").is_none() {
                settings.dwarf_command = Some(
                    "$DWARF_TOOL $TARGET -o ${output;pre=$REALPRJNAME.dSYM/Contents/Resources/DWARF/:REALPRJNAME}",
                );
            }
        }

        if ctx.profiler() == Some(Profiler::GProf) {
            ld_flags.push("-pg".to_string());
        }

        if ctx.is_coverage() {
            ld_flags.push("-fprofile-arcs".to_string());
            ld_flags.push("-ftest-coverage".to_string());
        }

        if ctx.is_coverage()
            || ctx.is_positive("GCOV_COVERAGE")
            || ctx.is_positive("CLANG_COVERAGE")
            || ctx.is_sanitized()
        {
            settings.use_stdlib = None;
        }

        // llvm-ar archives are not always aligned the way ld64 requires
        if target.is_macos() && !ar.contains("libtool") {
            ar = "libtool".to_string();
        }

        settings.ar = ar;
        settings.ld_flags = ld_flags;
        settings
    }

    pub fn ar_type(&self) -> &'static str {
        if self.ar.contains("libtool") {
            "LIBTOOL"
        } else {
            "AR"
        }
    }

    /// `-shared` with the soname option when the target has one.
    pub fn shared_flag(&self) -> String {
        match self.soname_option {
            Some(option) => format!("-shared -Wl,{},$SONAME", option),
            None => "-shared".to_string(),
        }
    }
}

/// Linker variables for GCC and Clang.
pub struct Ld<'a> {
    tc: &'a ToolchainOptions,
    gnu: &'a GnuOptions,
    ctx: &'a BuildContext,
    settings: LinkSettings,
}

impl<'a> Ld<'a> {
    pub fn new(tc: &'a ToolchainOptions, gnu: &'a GnuOptions, ctx: &'a BuildContext) -> Self {
        Ld {
            tc,
            gnu,
            ctx,
            settings: LinkSettings::compose(gnu, tc, ctx),
        }
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }
}

impl LinkerStrategy for Ld<'_> {
    fn print_linker(&self, em: &mut Emitter) -> ConfResult<()> {
        let s = &self.settings;

        print_linker_selector(self.tc, self.ctx, em);

        em.set("AR_TOOL", &s.ar);
        em.set("AR_TYPE", s.ar_type());

        em.append("LDFLAGS", &s.ld_flags);
        em.append("LDFLAGS_GLOBAL", "");

        em.set("LD_STRIP_FLAG", s.ld_strip_flag);
        em.set_empty("STRIP_FLAG");

        em.set_empty("C_LIBRARY_PATH");
        em.set_empty("C_SYSTEM_LIBRARIES_INTERCEPT");
        em.set(
            "C_SYSTEM_LIBRARIES",
            tokens![s.use_stdlib, s.thread_library, self.gnu.sys_lib, "-lc"],
        );

        em.set("DWARF_TOOL", &self.gnu.dwarf_tool);

        em.set_empty("OBJADDE");

        em.big(
            r#"
            EXPORTS_VALUE=
            when ($EXPORTS_FILE) {
                EXPORTS_VALUE=-Wl,--version-script=${input:EXPORTS_FILE}
            }"#,
        );

        let exe_flags = tokens![
            "$C_FLAGS_PLATFORM",
            "${rootrel:SRCS_GLOBAL}",
            s.start_group,
            "${rootrel:PEERS}",
            s.end_group,
            "$EXPORTS_VALUE $LDFLAGS $LDFLAGS_GLOBAL $OBJADDE $OBJADDE_LIB",
            "$C_LIBRARY_PATH $C_SYSTEM_LIBRARIES_INTERCEPT $C_SYSTEM_LIBRARIES $STRIP_FLAG",
        ];

        let pie_flag = s.link_pie_executables.then_some("-pie");
        let arch_flag = format!("--arch={}", self.ctx.target.os_compat());

        em.set(
            "GENERATE_MF",
            [
                "$YMAKE_PYTHON",
                r#"${input:"build/scripts/generate_mf.py"}"#,
                "--build-root $ARCADIA_BUILD_ROOT --module-name $REALPRJNAME -o ${output;rootrel;pre=$MODULE_PREFIX;suf=$MODULE_SUFFIX.mf:REALPRJNAME}",
                "-t $MODULE_TYPE $NO_GPL_FLAG -Ya,lics $LICENSE_NAMES -Ya,peers ${rootrel:PEERS}",
                r#"${kv;hide:"p MF"} ${kv;hide:"pc light-green"}"#,
            ],
        );

        em.set(
            "REAL_LINK_EXE",
            tokens![
                r#"$YMAKE_PYTHON ${input:"build/scripts/link_exe.py"}"#,
                "$GCCFILTER",
                "$CXX_COMPILER $AUTO_INPUT -o $TARGET",
                s.rdynamic,
                pie_flag,
                exe_flags,
                LD_ENV_STYLE,
            ],
        );

        em.set_empty("LINK_DYN_LIB_FLAGS");
        em.set(
            "REAL_LINK_DYN_LIB",
            tokens![
                r#"$YMAKE_PYTHON ${input:"build/scripts/link_dyn_lib.py"} --target $TARGET"#,
                arch_flag,
                "$LINK_DYN_LIB_FLAGS",
                "$CXX_COMPILER $AUTO_INPUT -o $TARGET",
                s.shared_flag(),
                exe_flags,
                LD_ENV_STYLE,
            ],
        );

        match s.dwarf_command {
            Some(command) => em.set("DWARF_COMMAND", [command, LD_ENV_STYLE]),
            None => em.set_empty("DWARF_COMMAND"),
        }
        em.set("LINK_EXE", "$GENERATE_MF && $REAL_LINK_EXE && $DWARF_COMMAND");
        em.set("LINK_DYN_LIB", "$GENERATE_MF && $REAL_LINK_DYN_LIB && $DWARF_COMMAND");
        em.set(
            "SWIG_DLL_JAR_CMD",
            "$GENERATE_MF && $REAL_SWIG_DLL_JAR_CMD && $DWARF_COMMAND",
        );

        let archiver = format!(
            r#"$YMAKE_PYTHON ${{input:"build/scripts/link_lib.py"}} ${{quo:AR_TOOL}} $AR_TYPE $ARCADIA_BUILD_ROOT {}"#,
            self.gnu.ar_plugin.as_deref().unwrap_or("None")
        );

        em.set(
            "LINK_LIB",
            tokens![
                "$GENERATE_MF &&",
                archiver,
                r#"$TARGET $AUTO_INPUT ${kv;hide:"p AR"}"#,
                r#"$TOOLCHAIN_ENV ${kv;hide:"pc light-red"} ${kv;hide:"show_out"}"#,
            ],
        );

        em.set(
            "LINK_FAT_OBJECT",
            tokens![
                "$GENERATE_MF &&",
                r#"$YMAKE_PYTHON ${input:"build/scripts/link_fat_obj.py"} --obj=$TARGET --lib=${output:REALPRJNAME.a}"#,
                arch_flag,
                "-Ya,input $AUTO_INPUT -Ya,global_srcs $SRCS_GLOBAL -Ya,peers $PEERS",
                "-Ya,linker $CXX_COMPILER $C_FLAGS_PLATFORM -Ya,archiver",
                archiver,
                r#"$TOOLCHAIN_ENV ${kv;hide:"p LD"} ${kv;hide:"pc light-blue"} ${kv;hide:"show_out"}"#,
            ],
        );

        em.set("LIBRT", "-lrt");
        em.set("MD5LIB", "-lcrypt");
        em.set("LIBRESOLV", s.libresolv);
        em.set("PROFFLAG", "-pg");

        Ok(())
    }
}
