//! Toolchain inputs for common test scenarios.

use serde_json::{json, Value};

use crate::core::params::ToolchainInput;

use super::{MockProcessOutput, MockRunner};

fn platform(os: &str, arch: &str, toolchain: &str) -> Value {
    json!({"os": os, "arch": arch, "toolchain": toolchain})
}

fn input(value: Value) -> ToolchainInput {
    ToolchainInput::from_json(&value.to_string()).expect("fixture must decode")
}

/// Packaged GCC on Linux x86_64.
pub fn linux_gnu_input(version: &str) -> ToolchainInput {
    input(json!({
        "platform": {
            "host": platform("LINUX", "x86_64", "gcc"),
            "target": platform("LINUX", "x86_64", "gcc"),
        },
        "params": {
            "type": "gnu",
            "c_compiler": "/usr/bin/gcc",
            "cxx_compiler": "/usr/bin/g++",
            "gcc_version": version,
        },
        "env": {},
    }))
}

/// Packaged Clang on Linux x86_64.
pub fn linux_clang_input(version: &str) -> ToolchainInput {
    input(json!({
        "platform": {
            "host": platform("LINUX", "x86_64", "clang"),
            "target": platform("LINUX", "x86_64", "clang"),
        },
        "params": {
            "type": "clang",
            "c_compiler": "/usr/bin/clang",
            "cxx_compiler": "/usr/bin/clang++",
            "gcc_version": version,
        },
        "env": {},
    }))
}

/// Packaged Clang on macOS x86_64.
pub fn macos_clang_input(version: &str) -> ToolchainInput {
    input(json!({
        "platform": {
            "host": platform("DARWIN", "x86_64", "clang"),
            "target": platform("DARWIN", "x86_64", "clang"),
        },
        "params": {
            "type": "clang",
            "c_compiler": "/usr/bin/clang",
            "cxx_compiler": "/usr/bin/clang++",
            "gcc_version": version,
        },
        "env": {},
    }))
}

/// Packaged MSVC for a Windows x86_64 target, run under Wine from Linux.
pub fn windows_msvc_input() -> ToolchainInput {
    input(json!({
        "platform": {
            "host": platform("LINUX", "x86_64", "msvc"),
            "target": platform("WIN", "x86_64", "msvc"),
        },
        "params": {
            "type": "msvc",
            "c_compiler": "/msvc/bin/cl.exe",
            "cxx_compiler": "/msvc/bin/cl.exe",
            "gcc_version": "19.0",
            "sdk_root": "/msvc",
            "masm_compiler": "/msvc/bin/ml64.exe",
            "link": "/msvc/bin/link.exe",
            "lib": "/msvc/bin/lib.exe",
            "wine": true,
        },
        "env": {},
    }))
}

/// `vcvars64.bat` environment; every directory ends with a separator.
pub const VCVARS_ENV: [(&str, &str); 3] = [
    ("WindowsSdkDir", r"C:\Kits\10\"),
    ("WindowsSDKVersion", r"10.0.14393.0\"),
    ("VCINSTALLDIR", r"C:\VS14\VC\"),
];

/// `cl.exe` from `PATH` on a Windows host, left to detection.
pub fn windows_system_cxx_input() -> ToolchainInput {
    input(json!({
        "platform": {
            "host": platform("WIN", "x86_64", "msvc"),
            "target": platform("WIN", "x86_64", "msvc"),
        },
        "params": {
            "type": "system_cxx",
            "c_compiler": "cl.exe",
        },
        "env": {},
    }))
}

/// A runner where `cl.exe` reports `_MSC_VER=1900` and the MSVC tools are
/// in `PATH`.
pub fn local_msvc_runner() -> MockRunner {
    let bindir = r"C:\VS14\VC\bin\amd64";
    let mut runner = MockRunner::new();
    for tool in ["cl.exe", "ml64.exe", "link.exe", "lib.exe"] {
        runner.with_program(tool, format!(r"{}\{}", bindir, tool));
    }
    runner.expect_prefix(
        &format!(r"{}\cl.exe -E ", bindir),
        MockProcessOutput::success("____YA_VAR__MSC_VER=1900\n"),
    );
    runner
}
