//! Microsoft Visual C++ toolchain, compiler and linker strategies.

use crate::builder::context::BuildContext;
use crate::core::errors::{ConfResult, ConfigureError};
use crate::emit::{tokens, Emitter};

use super::ld::print_linker_selector;
use super::options::{MsvcOptions, ToolchainOptions};
use super::{CompilerStrategy, LinkerStrategy, ToolchainStrategy};

const WINNT_WINDOWS7: &str = "0x0601";
const WINNT_WINDOWS8: &str = "0x0602";

/// `'expression' : signed/unsigned mismatch` and friends, raised to level 1.
const WARNS_ENABLED: [u32; 4] = [4018, 4265, 4296, 4431];

/// `'function' undefined; assuming extern returning int`
const WARNS_AS_ERROR: [u32; 1] = [4013];

const WARNS_DISABLED: [u32; 18] = [
    4127, 4200, 4201, 4351, 4355, 4503, 4510, 4511, 4512, 4554, 4610, 4706, 4800, 4996, 4714,
    4197, 4245, 4324,
];

const DEFINES: [&str; 12] = [
    "WIN32",
    "_WIN32",
    "_WINDOWS",
    "_CRT_SECURE_NO_WARNINGS",
    "_CRT_NONSTDC_NO_WARNINGS",
    "_USE_MATH_DEFINES",
    "__STDC_CONSTANT_MACROS",
    "__STDC_FORMAT_MACROS",
    "_USING_V110_SDK71_",
    "SSE_ENABLED=1",
    "SSE2_ENABLED=1",
    "SSE3_ENABLED=1",
];

const STDLIBS: [&str; 11] = [
    "kernel32.lib",
    "user32.lib",
    "gdi32.lib",
    "winspool.lib",
    "shell32.lib",
    "ole32.lib",
    "oleaut32.lib",
    "uuid.lib",
    "comdlg32.lib",
    "advapi32.lib",
    "crypt32.lib",
];

const INLINE_BLOCK: &str = r#"MSVC_INLINE_OPTIMIZED=yes
when ($MSVC_INLINE_OPTIMIZED == "yes") {
    MSVC_INLINE_FLAG=/Zc:inline
}
when ($MSVC_INLINE_OPTIMIZED == "no") {
    MSVC_INLINE_FLAG=/Zc:inline-
}
"#;

const FIX_OUTPUT_SCRIPT: &str = r#"${input:"build/scripts/fix_msvc_output.py"}"#;

fn gen_defines<S: AsRef<str>>(defines: &[S]) -> Vec<String> {
    defines
        .iter()
        .map(|d| format!("/D{}", d.as_ref()))
        .collect()
}

/// Toolchain-wide variables for MSVC.
pub struct MsvcToolchain<'a> {
    tc: &'a ToolchainOptions,
}

impl<'a> MsvcToolchain<'a> {
    pub fn new(tc: &'a ToolchainOptions) -> Self {
        MsvcToolchain { tc }
    }
}

impl ToolchainStrategy for MsvcToolchain<'_> {
    fn print_toolchain(&self, em: &mut Emitter) -> ConfResult<()> {
        em.set("TOOLCHAIN_ENV", self.tc.reformat_env(';'));
        // placeholder for rules that read C_FLAGS_PLATFORM on every platform
        em.set_empty("C_FLAGS_PLATFORM");
        Ok(())
    }
}

/// Compiler variables for `cl.exe`.
pub struct MsvcCompiler<'a> {
    tc: &'a ToolchainOptions,
    msvc: &'a MsvcOptions,
    ctx: &'a BuildContext,
}

impl<'a> MsvcCompiler<'a> {
    pub fn new(tc: &'a ToolchainOptions, msvc: &'a MsvcOptions, ctx: &'a BuildContext) -> Self {
        MsvcCompiler { tc, msvc, ctx }
    }

    fn masm_io(&self) -> &'static str {
        if self.ctx.target.is_arm() {
            "-o ${output:SRC.obj} ${input;msvs_source:SRC}"
        } else {
            "/nologo /c /Fo${output:SRC.obj} ${input;msvs_source:SRC}"
        }
    }

    fn print_compile_macros(&self, em: &mut Emitter) {
        em.raw(&format!(
            r#"macro MSVC_FLAGS(Flags...) {{
    CFLAGS($Flags)
}}

macro _SRC_cpp(SRC, SRCFLAGS...) {{
    .CMD=${{cwd:ARCADIA_BUILD_ROOT}} ${{TOOLCHAIN_ENV}} ${{CL_WRAPPER}} ${{CXX_COMPILER}} /c /Fo${{output:SRC.obj}} ${{input;msvs_source:SRC}} ${{pre=/I :INCLUDE}} ${{CXXFLAGS}} ${{SRCFLAGS}} ${{hide;kv:"soe"}} ${{hide;kv:"p CC"}} ${{hide;kv:"pc yellow"}}
}}

macro _SRC_c(SRC, SRCFLAGS...) {{
    .CMD=${{cwd:ARCADIA_BUILD_ROOT}} ${{TOOLCHAIN_ENV}} ${{CL_WRAPPER}} ${{C_COMPILER}} /c /Fo${{output:SRC.obj}} ${{input;msvs_source:SRC}} ${{pre=/I :INCLUDE}} ${{CFLAGS}} ${{CONLYFLAGS}} ${{SRCFLAGS}} ${{hide;kv:"soe"}} ${{hide;kv:"p CC"}} ${{hide;kv:"pc yellow"}}
}}

macro _SRC_m(SRC, SRCFLAGS...) {{
}}

macro _SRC_masm(SRC, SRCFLAGS...) {{
    .CMD=${{cwd:ARCADIA_BUILD_ROOT}} ${{TOOLCHAIN_ENV}} ${{ML_WRAPPER}} ${{MASM_COMPILER}} ${{MASMFLAGS}} ${{SRCFLAGS}} {} ${{kv;hide:"p AS"}} ${{kv;hide:"pc yellow"}}
}}
"#,
            self.masm_io()
        ));
    }
}

impl CompilerStrategy for MsvcCompiler<'_> {
    fn print_compiler(&self, em: &mut Emitter) -> ConfResult<()> {
        let tc = self.tc;
        let msvc = self.msvc;
        let ctx = self.ctx;

        em.set("MSVC", "yes");
        em.set("MSVC_VER", &tc.version_string);

        em.raw(INLINE_BLOCK);

        let mut defines: Vec<String> = DEFINES.iter().map(|d| d.to_string()).collect();
        let mut win32_winnt = WINNT_WINDOWS7;
        let mut winapi_unicode = false;

        let mut flags: Vec<String> = [
            "/nologo",
            "/Zm500",
            "/GR",
            "/bigobj",
            "/FC",
            "/EHsc",
            "/errorReport:prompt",
            "$MSVC_INLINE_FLAG",
            "/DFAKEID=$FAKEID",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect();
        flags.extend(WARNS_AS_ERROR.iter().map(|code| format!("/we{}", code)));
        flags.extend(WARNS_ENABLED.iter().map(|code| format!("/w1{}", code)));
        flags.extend(WARNS_DISABLED.iter().map(|code| format!("/wd{}", code)));
        flags.extend(tc.arch_opt.iter().cloned());

        let mut flags_debug = tokens!["/Ob0", "/Od", gen_defines(&["_DEBUG"])];
        let mut flags_release = tokens!["/Ox", "/Ob2", "/Oi", gen_defines(&["NDEBUG"])];

        let mut flags_cxx = Vec::new();
        let flags_c_only: Vec<String> = Vec::new();

        if ctx.is_positive("USE_UWP") {
            flags_cxx.push("/ZW".to_string());
            flags_cxx.push(format!("/AI{}/lib/store/references", msvc.vc_root));
            if let Some(kit) = &msvc.kit {
                flags.push(format!("/I{}/winrt", kit.includes));
            }
            win32_winnt = WINNT_WINDOWS8;
            defines.push("WINAPI_FAMILY=WINAPI_FAMILY_APP".to_string());
            winapi_unicode = true;
        }

        em.set("WIN32_WINNT", win32_winnt);
        defines.push("_WIN32_WINNT=$WIN32_WINNT".to_string());

        if winapi_unicode {
            defines.push("UNICODE".to_string());
            defines.push("_UNICODE".to_string());
        } else {
            defines.push("_MBCS".to_string());
        }

        if ctx.is_positive("DLL_RUNTIME") {
            flags_debug.push("/MDd".to_string());
            flags_release.push("/MD".to_string());
        } else {
            flags_debug.push("/MTd".to_string());
            flags_release.push("/MT".to_string());
        }

        let debug_info_flags = if msvc.is_ide() {
            flags.push("/FD".to_string());
            flags.push("/MP".to_string());
            "/Zi /FS"
        } else {
            if let Some(kit) = &msvc.kit {
                for name in ["shared", "ucrt", "um", "winrt"] {
                    flags.push(format!("/I\"{}\\{}\"", kit.includes, name));
                }
            }
            flags.push(format!("/I\"{}\\include\"", msvc.vc_root));
            "/Z7"
        };

        em.set("CXX_COMPILER", &tc.cxx_compiler);
        em.set("C_COMPILER", &tc.c_compiler);
        em.set("MASM_COMPILER", &msvc.masm_compiler);
        em.append("C_DEFINES", gen_defines(&defines));
        em.set("CFLAGS_DEBUG", &flags_debug);
        em.set("CFLAGS_RELEASE", &flags_release);
        em.set("MASMFLAGS", "");
        em.set("DEBUG_INFO_FLAGS", debug_info_flags);

        if ctx.is_release() {
            em.set("CFLAGS_PER_TYPE", "$CFLAGS_RELEASE");
        }
        if ctx.is_debug() {
            em.set("CFLAGS_PER_TYPE", "$CFLAGS_DEBUG");
        }
        if ctx.is_ide() {
            em.set("CFLAGS_PER_TYPE", "@[debug|$CFLAGS_DEBUG]@[release|$CFLAGS_RELEASE]");
        }

        em.append(
            "CFLAGS",
            tokens![
                flags,
                "$CFLAGS_PER_TYPE",
                "$DEBUG_INFO_FLAGS",
                "$C_DEFINES",
                "$USER_CFLAGS",
                "$USER_CFLAGS_GLOBAL",
            ],
        );
        em.append("CXXFLAGS", tokens!["$CFLAGS", flags_cxx, "$USER_CXXFLAGS"]);
        em.append("CONLYFLAGS", tokens![flags_c_only, "$USER_CONLYFLAGS"]);

        em.raw(
            r#"when ($NO_OPTIMIZE == "yes") {
    OPTIMIZE = /Od
}
when ($NO_COMPILER_WARNINGS == "yes") {
    CFLAGS += /w
}
when ($NO_WSHADOW == "yes") {
    CFLAGS += /wd4456 /wd4457
}
"#,
        );

        em.set("SFDL_FLAG", ["/E", "/C", "/P", "/Fi$SFDL_TMP_OUT"]);
        em.set("WERROR_FLAG", "/WX");
        em.set("WERROR_MODE", &tc.werror_mode);

        if msvc.under_wine {
            em.set_empty("CL_WRAPPER");
            em.set_empty("ML_WRAPPER");
        } else {
            em.set("CL_WRAPPER", ["${YMAKE_PYTHON}", FIX_OUTPUT_SCRIPT, "cl"]);
            em.set("ML_WRAPPER", ["${YMAKE_PYTHON}", FIX_OUTPUT_SCRIPT, "ml"]);
        }

        self.print_compile_macros(em);

        Ok(())
    }
}

/// `/MACHINE` value with the VC and Windows kit library subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsvcArch {
    pub machine: &'static str,
    pub vc_lib_arch: Option<&'static str>,
    pub kit_lib_arch: &'static str,
}

impl MsvcArch {
    pub fn for_target(ctx: &BuildContext) -> ConfResult<Self> {
        let target = &ctx.target;
        let arch = |machine, vc_lib_arch, kit_lib_arch| MsvcArch {
            machine,
            vc_lib_arch,
            kit_lib_arch,
        };

        if target.is_intel() {
            if target.is_32_bit() {
                return Ok(arch("X86", None, "x86"));
            }
            if target.is_64_bit() {
                return Ok(arch("X64", Some("amd64"), "x64"));
            }
        } else if target.is_arm() && target.is_32_bit() {
            return Ok(arch("ARM", Some("arm"), "arm"));
        }

        Err(ConfigureError::UnknownMsvcTarget {
            platform: target.to_string(),
        })
    }
}

/// Linker variables for `link.exe` and `lib.exe`.
pub struct MsvcLinker<'a> {
    tc: &'a ToolchainOptions,
    msvc: &'a MsvcOptions,
    ctx: &'a BuildContext,
    arch: MsvcArch,
}

impl<'a> MsvcLinker<'a> {
    /// Fails for targets `link.exe` has no machine type for.
    pub fn new(
        tc: &'a ToolchainOptions,
        msvc: &'a MsvcOptions,
        ctx: &'a BuildContext,
    ) -> ConfResult<Self> {
        Ok(MsvcLinker {
            tc,
            msvc,
            ctx,
            arch: MsvcArch::for_target(ctx)?,
        })
    }

    /// Library search paths, Windows kit first.
    pub fn libpaths(&self) -> Vec<String> {
        let msvc = self.msvc;
        let mut paths = Vec::new();

        if let Some(kit) = &msvc.kit {
            for name in ["um", "ucrt"] {
                paths.push(self.ctx.host_join(&[&kit.libs, name, self.arch.kit_lib_arch]));
            }
        }
        paths.push(self.ctx.host_join(&[
            &msvc.vc_root,
            "lib",
            self.arch.vc_lib_arch.unwrap_or(""),
        ]));
        if self.ctx.is_positive("USE_UWP") {
            paths.push(self.ctx.host_join(&[&msvc.vc_root, "lib", "store", "references"]));
        }

        paths
    }
}

impl LinkerStrategy for MsvcLinker<'_> {
    fn print_linker(&self, em: &mut Emitter) -> ConfResult<()> {
        let msvc = self.msvc;
        let ctx = self.ctx;

        print_linker_selector(self.tc, ctx, em);

        let flag_machine = format!("/MACHINE:{}", self.arch.machine);
        let flags_ignore = vec!["/IGNORE:4221".to_string()];

        let mut flags_common: Vec<String> = [
            "/NOLOGO",
            "/ERRORREPORT:PROMPT",
            "/SUBSYSTEM:CONSOLE",
            "/TLBID:1",
            "$MSVC_DYNAMICBASE",
            "/NXCOMPAT",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect();
        flags_common.extend(flags_ignore.iter().cloned());
        flags_common.push(flag_machine.clone());

        let mut flags_debug_only = Vec::new();
        let mut flags_release_only = Vec::new();

        flags_common.push(if msvc.is_ide() { "/INCREMENTAL" } else { "/INCREMENTAL:NO" }.to_string());

        // wine cannot produce PDBs
        if !msvc.under_wine {
            if msvc.is_ide() {
                flags_debug_only.push("/DEBUG:FASTLINK");
                flags_release_only.push("/DEBUG");
            } else {
                // FASTLINK PDBs need the object files to persist
                flags_common.push("/DEBUG".to_string());
            }
        }

        if !msvc.is_ide() {
            flags_common.extend(self.libpaths().iter().map(|p| format!("/LIBPATH:\"{}\"", p)));
        }

        let link_flags_debug = tokens![flags_common, flags_debug_only];
        let link_flags_release = tokens![flags_common, flags_release_only];
        let link_flags_lib = tokens![flags_ignore, flag_machine];

        em.set("LINK_LIB_CMD", &msvc.lib);
        em.set("LINK_EXE_CMD", &msvc.link);
        em.set("LINK_LIB_FLAGS", &link_flags_lib);
        em.set("LINK_EXE_FLAGS_RELEASE", &link_flags_release);
        em.set("LINK_EXE_FLAGS_DEBUG", &link_flags_debug);
        em.set("LINK_STDLIBS", STDLIBS);
        em.set("LDFLAGS_GLOBAL", "");
        em.set("LDFLAGS", "");
        em.set("OBJADDE", "");

        if ctx.is_release() {
            em.set("LINK_EXE_FLAGS_PER_TYPE", "$LINK_EXE_FLAGS_RELEASE");
        }
        if ctx.is_debug() {
            em.set("LINK_EXE_FLAGS_PER_TYPE", "$LINK_EXE_FLAGS_DEBUG");
        }
        if ctx.is_ide() && msvc.is_ide() {
            em.set(
                "LINK_EXE_FLAGS_PER_TYPE",
                "@[debug|$LINK_EXE_FLAGS_DEBUG]@[release|$LINK_EXE_FLAGS_RELEASE]",
            );
        }

        em.set("LINK_EXE_FLAGS", "$LINK_EXE_FLAGS_PER_TYPE");

        if msvc.under_wine {
            em.set_empty("LINK_EXTRA_OUTPUT");
            em.set_empty("LIB_WRAPPER");
            em.set_empty("LINK_WRAPPER");
        } else {
            em.set("LINK_EXTRA_OUTPUT", "/PDB:${output;noext;rootrel:REALPRJNAME.pdb}");
            em.set("LIB_WRAPPER", ["${YMAKE_PYTHON}", FIX_OUTPUT_SCRIPT, "lib"]);
            em.set("LINK_WRAPPER", ["${YMAKE_PYTHON}", FIX_OUTPUT_SCRIPT, "link"]);
        }

        em.set(
            "LINK_WRAPPER_DYNLIB",
            [
                "${YMAKE_PYTHON}",
                r#"${input:"build/scripts/link_dyn_lib.py"}"#,
                "--arch",
                "WINDOWS",
                "--target",
                "$TARGET",
            ],
        );
        em.set_empty("EXPORTS_VALUE");

        em.set(
            "GENERATE_MF",
            [
                r#"$YMAKE_PYTHON ${input:"build/scripts/generate_mf.py"}"#,
                "--build-root $ARCADIA_BUILD_ROOT --module-name $REALPRJNAME -o ${output;rootrel;pre=$MODULE_PREFIX;suf=$MODULE_SUFFIX.mf:REALPRJNAME}",
                "-t $MODULE_TYPE $NO_GPL_FLAG -Ya,lics $LICENSE_NAMES -Ya,peers ${rootrel:PEERS}",
                r#"${kv;hide:"p MF"} ${kv;hide:"pc light-green"}"#,
            ],
        );

        em.raw(
            "when ($EXPORTS_FILE) {\n    \
                EXPORTS_VALUE=/DEF:${input:EXPORTS_FILE}\n\
             }\n\
             \n\
             LINK_LIB=${GENERATE_MF} && ${TOOLCHAIN_ENV} ${cwd:ARCADIA_BUILD_ROOT} ${LIB_WRAPPER} ${LINK_LIB_CMD} /OUT:${qe;rootrel:TARGET} \
             ${qe;rootrel:AUTO_INPUT} $LINK_LIB_FLAGS ${hide;kv:\"soe\"} ${hide;kv:\"p AR\"} ${hide;kv:\"pc light-red\"}\n\
             \n\
             LINK_EXE=${GENERATE_MF} && ${TOOLCHAIN_ENV} ${cwd:ARCADIA_BUILD_ROOT} ${LINK_WRAPPER} ${LINK_EXE_CMD} /OUT:${qe;rootrel:TARGET} \
             ${LINK_EXTRA_OUTPUT} ${qe;rootrel:SRCS_GLOBAL} ${qe;rootrel:AUTO_INPUT} $LINK_EXE_FLAGS $LINK_STDLIBS $LDFLAGS $LDFLAGS_GLOBAL $OBJADDE \
             ${qe;rootrel:PEERS} ${hide;kv:\"soe\"} ${hide;kv:\"p LD\"} ${hide;kv:\"pc blue\"}\n\
             \n\
             LINK_DYN_LIB=${GENERATE_MF} && ${TOOLCHAIN_ENV} ${cwd:ARCADIA_BUILD_ROOT} ${LINK_WRAPPER} ${LINK_WRAPPER_DYNLIB} ${LINK_EXE_CMD} \
             /DLL /OUT:${qe;rootrel:TARGET} ${LINK_EXTRA_OUTPUT} ${EXPORTS_VALUE} \
             ${qe;rootrel:SRCS_GLOBAL} ${qe;rootrel:AUTO_INPUT} ${qe;rootrel:PEERS} \
             $LINK_EXE_FLAGS $LINK_STDLIBS $LDFLAGS $LDFLAGS_GLOBAL $OBJADDE ${hide;kv:\"soe\"} ${hide;kv:\"p LD\"} ${hide;kv:\"pc blue\"}\n\
             \n\
             LINK_FAT_OBJECT=${GENERATE_MF} && $YMAKE_PYTHON ${input:\"build/scripts/touch.py\"} $TARGET ${kv;hide:\"p LD\"} ${kv;hide:\"pc light-blue\"} ${kv;hide:\"show_out\"}\n",
        );

        Ok(())
    }
}
