//! Implementation of `tcconf`: resolve a toolchain and render its variables.
//!
//! The whole configuration is rendered into memory first; callers write it
//! out only when [`configure`] succeeds.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::builder::extras::print_other_settings;
use crate::builder::system::{print_build_settings, System};
use crate::builder::toolchain::{select_strategies, ToolchainOptions};
use crate::builder::BuildContext;
use crate::core::build_type::BuildType;
use crate::core::errors::ConfResult;
use crate::core::params::ToolchainInput;
use crate::emit::Emitter;
use crate::util::config::Presets;
use crate::util::hash;
use crate::util::process::Runner;

const PRESETS_COMMENT: &str = "# Variables set from command line by -D options";

/// Options for one configuration run.
#[derive(Debug, Clone, Default)]
pub struct ConfigureOptions {
    /// Source tree root, emitted as `ARCADIA_ROOT`
    pub source_root: PathBuf,

    /// Raw build mode, e.g. `release` or `dist-debug`
    pub build_type: String,

    /// Merged preset overrides
    pub presets: Presets,

    /// Snapshot of the host environment
    pub env: BTreeMap<String, String>,

    /// Local tools may be used in a distributed build
    pub local_distbuild: bool,

    /// Script recorded as the configuration's own dependency
    pub script_path: Option<String>,
}

/// A rendered configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    /// The variable stream
    pub text: String,

    /// SHA-256 of `text`
    pub fingerprint: String,
}

/// Resolve the toolchain and render the complete configuration.
pub fn configure(
    input: &ToolchainInput,
    opts: &ConfigureOptions,
    runner: &dyn Runner,
) -> ConfResult<Configuration> {
    let build_type = BuildType::parse(&opts.build_type)?;

    let mut presets = opts.presets.clone();
    presets.userify();

    let ctx = BuildContext::new(
        &opts.source_root,
        input,
        build_type,
        presets,
        opts.env.clone(),
        opts.local_distbuild,
    );

    let tc = ToolchainOptions::resolve(input, &ctx, runner)?;

    let mut em = Emitter::new();
    print_presets(&ctx.presets, &mut em);

    em.set("ARCADIA_ROOT", ctx.source_root.display().to_string());
    print_build_settings(&ctx, &mut em);

    System::new(&ctx.host, &ctx).print_host_settings(&mut em);
    System::new(&ctx.target, &ctx).print_target_settings(&mut em);

    if ctx.pic {
        em.set("PIC", "yes");
    }

    em.set("COMPILER_ID", tc.family.as_str().to_uppercase());

    if ctx.is_valgrind() {
        em.set("WITH_VALGRIND", "yes");
    }

    let strategies = select_strategies(&tc, &ctx)?;
    strategies.toolchain.print_toolchain(&mut em)?;
    strategies.compiler.print_compiler(&mut em)?;
    strategies.linker.print_linker(&mut em)?;

    print_other_settings(&tc, &ctx, runner, &mut em)?;

    if let Some(script) = &opts.script_path {
        em.set("CONF_SCRIPT_DEPENDS", script);
    }

    let text = em.into_string();
    let fingerprint = hash::sha256_str(&text);
    tracing::info!(
        "Configured {} {} ({})",
        ctx.build_type.name,
        tc.family,
        hash::short(&fingerprint)
    );

    Ok(Configuration { text, fingerprint })
}

fn print_presets(presets: &Presets, em: &mut Emitter) {
    if presets.is_empty() {
        return;
    }

    em.raw(PRESETS_COMMENT);
    for (key, value) in presets.iter() {
        em.raw(&format!("{}={}", key, value));
    }
}
