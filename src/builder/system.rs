//! Build header and host/target system constants.

use crate::builder::context::BuildContext;
use crate::core::platform::Platform;
use crate::emit::Emitter;

const JAVA_HOME: &str = "/usr/lib/jvm/default-java";

const MPROF_LINUX_BLOCK: &str = r#"
when (($USEMPROF == "yes") || ($USE_MPROF == "yes")) {
    C_SYSTEM_LIBRARIES_INTERCEPT+=-ldmalloc
}
"#;

const MPROF_FREEBSD_BLOCK: &str = r#"
when (($USEMPROF == "yes") || ($USE_MPROF == "yes")) {
    C_LIBRARY_PATH+=-L/usr/local/lib
    C_SYSTEM_LIBRARIES_INTERCEPT+=-lc_mp
}
when (($USEMPROF == "yes") || ($USE_MPROF == "yes")) {
    C_DEFINES+= -DUSE_MPROF
}
"#;

const USE_PYTHON_BLOCK: &str = r#"
when ($USE_PYTHON) {
    C_DEFINES+= -DUSE_PYTHON
}"#;

const MKL_LINUX_BLOCK: &str = r#"
  when ($ARCH_X86_64 && !$SANITIZER_TYPE) {
      HAVE_MKL=yes
  }
"#;

/// Write `BUILD_TYPE`, the `BT_*` marker and the ymake Python launcher.
pub fn print_build_settings(ctx: &BuildContext, em: &mut Emitter) {
    em.set("BUILD_TYPE", ctx.build_type.upper());
    em.set(&ctx.build_type.marker(), "yes");

    let ymake_python = if ctx.is_distbuild() {
        em.set("DISTBUILD", "yes");

        if ctx.is_positive("NO_YMAKE") {
            "$(PYTHON)/python".to_string()
        } else {
            format!(
                "{} --python",
                ctx.preset_non_empty("MY_YMAKE_BIN").unwrap_or("$(YMAKE)/ymake")
            )
        }
    } else {
        "$YMAKE_BIN --python".to_string()
    };

    em.set("YMAKE_PYTHON", &ymake_python);
    em.set(
        "YMAKE_UNPICKLER",
        [ymake_python.as_str(), "$ARCADIA_ROOT/build/plugins/_unpickler.py"],
    );
}

/// OS and architecture constants for one platform.
pub struct System<'a> {
    platform: &'a Platform,
    ctx: &'a BuildContext,
}

impl<'a> System<'a> {
    pub fn new(platform: &'a Platform, ctx: &'a BuildContext) -> Self {
        System { platform, ctx }
    }

    /// `HOST_PLATFORM` and the `HOST_*` variables.
    pub fn print_host_settings(&self, em: &mut Emitter) {
        em.set("HOST_PLATFORM", self.platform.os_compat());
        if !self.platform.is_windows() {
            em.set("WRITE_COMMAND", ["/bin/echo", "-e"]);
            em.raw(USE_PYTHON_BLOCK);
        }

        for variable in self.platform.os_variables() {
            em.set(&format!("HOST_{}", variable), "yes");
        }
        for variable in self.platform.arch_variables() {
            em.set(&format!("HOST_{}", variable), "yes");
        }
    }

    /// `TARGET_PLATFORM`, hardware and OS constants, and target shortcuts.
    pub fn print_target_settings(&self, em: &mut Emitter) {
        let platform = self.platform;

        em.set("TARGET_PLATFORM", platform.os_compat());
        em.set("HARDWARE_ARCH", if platform.is_32_bit() { "32" } else { "64" });
        em.set("HARDWARE_TYPE", &platform.arch);

        for variable in platform.arch_variables() {
            em.set(variable, "yes");
        }
        for variable in platform.os_variables() {
            em.set(&variable, "yes");
        }

        if platform.is_posix() {
            self.print_nix_target_const(em);
            if platform.is_linux() {
                em.raw(MPROF_LINUX_BLOCK);
            } else if platform.is_freebsd() {
                em.set("FREEBSD_VER", "9");
                em.set("FREEBSD_VER_MINOR", "0");
                em.raw(MPROF_FREEBSD_BLOCK);
            }
        } else if platform.is_windows() {
            // WIN64 is left to the OS and arch variables
            em.set("WINDOWS", "yes");
            em.set("WIN32", "yes");
        }

        self.print_target_shortcuts(em);
    }

    fn print_nix_target_const(&self, em: &mut Emitter) {
        em.set(
            "JAVA_INCLUDE",
            format!(
                "-I{0}/include -I{0}/include/{1}",
                JAVA_HOME,
                self.platform.os_compat()
            ),
        );
        em.set("UNIX", "yes");
        em.set_empty("REALPRJNAME");
        em.set_empty("SONAME");
    }

    fn print_target_shortcuts(&self, em: &mut Emitter) {
        if self.ctx.preset("HAVE_MKL").is_none() {
            em.raw("HAVE_MKL=no");
            if self.platform.is_linux() {
                em.raw(MKL_LINUX_BLOCK);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::build_type::BuildType;
    use crate::core::params::ToolchainInput;
    use crate::test_support::fixtures;
    use crate::util::config::Presets;

    fn context(input: &ToolchainInput, build_type: &str, presets: &[&str]) -> BuildContext {
        BuildContext::new(
            "/src",
            input,
            BuildType::parse(build_type).unwrap(),
            Presets::from_args(presets),
            Default::default(),
            false,
        )
    }

    #[test]
    fn test_local_build_header() {
        let ctx = context(&fixtures::linux_gnu_input("4.9.2"), "relwithdebinfo", &[]);
        let mut em = Emitter::new();
        print_build_settings(&ctx, &mut em);
        assert_eq!(
            em.as_str(),
            "BUILD_TYPE=RELWITHDEBINFO\nBT_RELWITHDEBINFO=yes\nYMAKE_PYTHON=$YMAKE_BIN --python\n\
             YMAKE_UNPICKLER=$YMAKE_BIN --python $ARCADIA_ROOT/build/plugins/_unpickler.py\n"
        );
    }

    #[test]
    fn test_distbuild_header() {
        let input = fixtures::linux_gnu_input("4.9.2");

        let ctx = context(&input, "dist-valgrind-release", &[]);
        let mut em = Emitter::new();
        print_build_settings(&ctx, &mut em);
        assert!(em.as_str().starts_with(
            "BUILD_TYPE=VALGRIND-RELEASE\nBT_VALGRIND_RELEASE=yes\nDISTBUILD=yes\nYMAKE_PYTHON=$(YMAKE)/ymake --python\n"
        ));

        let ctx = context(&input, "dist-release", &["MY_YMAKE_BIN=/opt/ymake"]);
        let mut em = Emitter::new();
        print_build_settings(&ctx, &mut em);
        assert!(em.as_str().contains("YMAKE_PYTHON=/opt/ymake --python\n"));

        let ctx = context(&input, "dist-release", &["NO_YMAKE=yes", "MY_YMAKE_BIN=/opt/ymake"]);
        let mut em = Emitter::new();
        print_build_settings(&ctx, &mut em);
        assert!(em.as_str().contains("YMAKE_PYTHON=$(PYTHON)/python\n"));
    }

    #[test]
    fn test_linux_host_settings() {
        let ctx = context(&fixtures::linux_gnu_input("4.9.2"), "release", &[]);
        let mut em = Emitter::new();
        System::new(&ctx.host, &ctx).print_host_settings(&mut em);
        assert_eq!(
            em.as_str(),
            "HOST_PLATFORM=LINUX\nWRITE_COMMAND=/bin/echo -e\n\nwhen ($USE_PYTHON) {\n    C_DEFINES+= -DUSE_PYTHON\n}\n\
             HOST_LINUX=yes\nHOST_OS_LINUX=yes\nHOST_ARCH_TYPE_64=yes\nHOST_ARCH_X86_64=yes\n"
        );
    }

    #[test]
    fn test_linux_target_settings() {
        let ctx = context(&fixtures::linux_gnu_input("4.9.2"), "release", &[]);
        let mut em = Emitter::new();
        System::new(&ctx.target, &ctx).print_target_settings(&mut em);
        let out = em.into_string();

        assert!(out.starts_with(
            "TARGET_PLATFORM=LINUX\nHARDWARE_ARCH=64\nHARDWARE_TYPE=x86_64\nARCH_TYPE_64=yes\nARCH_X86_64=yes\nLINUX=yes\nOS_LINUX=yes\n"
        ));
        assert!(out.contains(
            "JAVA_INCLUDE=-I/usr/lib/jvm/default-java/include -I/usr/lib/jvm/default-java/include/LINUX\nUNIX=yes\nREALPRJNAME=\nSONAME=\n"
        ));
        assert!(out.contains("C_SYSTEM_LIBRARIES_INTERCEPT+=-ldmalloc\n}\n\n"));
        assert!(out.ends_with(
            "HAVE_MKL=no\n\n  when ($ARCH_X86_64 && !$SANITIZER_TYPE) {\n      HAVE_MKL=yes\n  }\n\n"
        ));
    }

    #[test]
    fn test_have_mkl_preset_suppresses_shortcuts() {
        let ctx = context(&fixtures::linux_gnu_input("4.9.2"), "release", &["HAVE_MKL=yes"]);
        let mut em = Emitter::new();
        System::new(&ctx.target, &ctx).print_target_settings(&mut em);
        assert!(!em.as_str().contains("HAVE_MKL"));
    }

    #[test]
    fn test_freebsd_and_windows_targets() {
        let mut input = fixtures::linux_gnu_input("4.9.2");
        input.platform.target.os = "FreeBSD".to_string();
        let ctx = context(&input, "release", &[]);
        let mut em = Emitter::new();
        System::new(&ctx.target, &ctx).print_target_settings(&mut em);
        assert!(em.as_str().contains("FREEBSD_VER=9\nFREEBSD_VER_MINOR=0\n"));
        assert!(em.as_str().contains("-lc_mp"));
        assert!(em.as_str().ends_with("HAVE_MKL=no\n"));

        let ctx = context(&fixtures::windows_msvc_input(), "release", &[]);
        let mut em = Emitter::new();
        System::new(&ctx.target, &ctx).print_target_settings(&mut em);
        assert!(em.as_str().contains("WINDOWS=yes\nWIN32=yes\n"));
        assert!(!em.as_str().contains("WIN64"));
        assert!(!em.as_str().contains("UNIX"));

        let mut em = Emitter::new();
        System::new(&ctx.target, &ctx).print_host_settings(&mut em);
        assert!(!em.as_str().contains("WRITE_COMMAND"));
    }
}
