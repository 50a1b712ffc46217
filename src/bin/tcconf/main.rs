//! tcconf CLI - deterministic C/C++ toolchain resolution

use std::io::{IsTerminal, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use tcconf::core::{ConfigureError, ToolchainInput};
use tcconf::ops::{configure, ConfigureOptions};
use tcconf::util::config::{global_presets_path, load_presets, project_presets_path};
use tcconf::util::diagnostic;
use tcconf::util::{Presets, SystemRunner};

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<ConfigureError>() {
            Some(err) => diagnostic::emit(&err.to_diagnostic(), std::io::stderr().is_terminal()),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging; stdout carries the configuration
    let filter = if cli.verbose {
        EnvFilter::new("tcconf=debug")
    } else {
        EnvFilter::new("tcconf=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let params = std::fs::read_to_string(&cli.toolchain_params).with_context(|| {
        format!(
            "failed to read toolchain parameters: {}",
            cli.toolchain_params.display()
        )
    })?;
    let input = ToolchainInput::from_json(&params)?;

    // Global, project, explicit file, then -D
    let global = global_presets_path();
    let presets = load_presets(
        global.as_deref(),
        &project_presets_path(&cli.source_root),
        cli.presets_file.as_deref(),
        Presets::from_args(&cli.presets),
    )?;

    let opts = ConfigureOptions {
        source_root: cli.source_root,
        build_type: cli.build_type,
        presets,
        env: std::env::vars().collect(),
        local_distbuild: cli.local_distbuild,
        script_path: cli.conf_script,
    };

    let config = configure(&input, &opts, &SystemRunner)?;

    let mut stdout = std::io::stdout().lock();
    if cli.fingerprint {
        writeln!(stdout, "{}", config.fingerprint)?;
    } else {
        stdout.write_all(config.text.as_bytes())?;
    }
    stdout.flush()?;

    Ok(())
}
