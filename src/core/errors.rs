//! Configuration error types and diagnostics.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Result alias for toolchain resolution.
pub type ConfResult<T> = Result<T, ConfigureError>;

/// A fatal error raised while resolving the toolchain configuration.
///
/// Every variant aborts the whole invocation: nothing is written to the
/// output stream once one of these is returned.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ConfigureError {
    #[error("toolchain parameter `{name}` is required but missing")]
    #[diagnostic(code(tcconf::params::missing))]
    MissingParam { name: &'static str },

    #[error("malformed toolchain parameters: {message}")]
    #[diagnostic(code(tcconf::params::malformed))]
    MalformedParams { message: String },

    #[error("unsupported compiler family `{family}`")]
    #[diagnostic(
        code(tcconf::toolchain::family),
        help("use one of `gnu`, `clang`, `msvc`, or `system_cxx` for auto-detection")
    )]
    UnsupportedFamily { family: String },

    #[error("unknown build type `{build_type}`")]
    #[diagnostic(code(tcconf::build_type))]
    UnknownBuildType { build_type: String },

    #[error("custom compiler was requested but not specified")]
    #[diagnostic(
        code(tcconf::detect::unspecified),
        help("set `c_compiler` in the toolchain parameters or the CC environment variable")
    )]
    CompilerNotSpecified,

    #[error("could not determine custom compiler version: {compiler}")]
    #[diagnostic(code(tcconf::detect::undetectable))]
    CompilerUndetectable { compiler: String },

    #[error("could not determine custom compiler type: {compiler}")]
    #[diagnostic(code(tcconf::detect::unknown_type))]
    UnknownCompilerType { compiler: String },

    #[error("invalid compiler version `{version}`")]
    #[diagnostic(code(tcconf::toolchain::version))]
    InvalidVersion { version: String },

    #[error(
        "no %WindowsSdkDir%, %WindowsSDKVersion% or %VCINSTALLDIR% present. \
         Please, run vcvars64.bat to setup preferred environment."
    )]
    #[diagnostic(code(tcconf::msvc::environment))]
    MissingMsvcEnvironment,

    #[error("unknown target platform {platform}")]
    #[diagnostic(code(tcconf::msvc::machine))]
    UnknownMsvcTarget { platform: String },

    #[error("unexpected value {value} ({kind})")]
    #[diagnostic(code(tcconf::emit::value))]
    UnsupportedValue { kind: &'static str, value: String },

    #[error("unexpected value for environment variable `{name}`")]
    #[diagnostic(code(tcconf::params::env))]
    InvalidEnvValue { name: String },

    #[error("system non fixed python can be used only with OS_SDK=local")]
    #[diagnostic(code(tcconf::python::sdk))]
    SystemPythonRequiresLocalSdk,
}

impl ConfigureError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());

        match self {
            ConfigureError::MissingParam { .. } | ConfigureError::MalformedParams { .. } => {
                diag.with_suggestion(suggestions::CHECK_PARAMS)
            }
            ConfigureError::UnsupportedFamily { family } => diag
                .with_context(format!("`type` was set to `{}`", family))
                .with_suggestion(suggestions::SUPPORTED_FAMILIES),
            ConfigureError::UnknownBuildType { .. } => {
                diag.with_suggestion(suggestions::BUILD_TYPES)
            }
            ConfigureError::CompilerNotSpecified => diag
                .with_suggestion(suggestions::SET_CC)
                .with_suggestion(suggestions::CHECK_PARAMS),
            ConfigureError::CompilerUndetectable { compiler }
            | ConfigureError::UnknownCompilerType { compiler } => diag
                .with_context(format!("probed `{} -E` for predefined macros", compiler))
                .with_suggestion(suggestions::SET_CC),
            ConfigureError::MissingMsvcEnvironment => {
                diag.with_suggestion(suggestions::RUN_VCVARS)
            }
            ConfigureError::SystemPythonRequiresLocalSdk => {
                diag.with_suggestion(suggestions::LOCAL_SDK)
            }
            ConfigureError::InvalidVersion { .. }
            | ConfigureError::UnknownMsvcTarget { .. }
            | ConfigureError::UnsupportedValue { .. }
            | ConfigureError::InvalidEnvValue { .. } => diag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_msvc_environment_message_mentions_vcvars() {
        let err = ConfigureError::MissingMsvcEnvironment;
        assert!(err.to_string().contains("vcvars64.bat"));

        let output = err.to_diagnostic().format(false);
        assert!(output.starts_with("error: "));
        assert!(output.contains("help: consider:"));
    }

    #[test]
    fn test_unsupported_family_diagnostic() {
        let err = ConfigureError::UnsupportedFamily {
            family: "icc".to_string(),
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("unsupported compiler family `icc`"));
        assert!(output.contains("`type` was set to `icc`"));
    }
}
