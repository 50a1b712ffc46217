//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// tcconf - resolve a C/C++ toolchain into build-graph variables
#[derive(Parser)]
#[command(name = "tcconf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root of the source tree
    pub source_root: PathBuf,

    /// Build type, e.g. release, debug or dist-relwithdebinfo
    pub build_type: String,

    /// JSON file with the platform pair and toolchain parameters
    #[arg(long, value_name = "FILE")]
    pub toolchain_params: PathBuf,

    /// Override a configuration value (KEY=VALUE, or KEY for an empty value)
    #[arg(short = 'D', long = "preset", value_name = "KEY[=VALUE]")]
    pub presets: Vec<String>,

    /// Allow local tools in a distributed build
    #[arg(short, long)]
    pub local_distbuild: bool,

    /// Additional presets file, applied before -D overrides
    #[arg(long, value_name = "FILE")]
    pub presets_file: Option<PathBuf>,

    /// Script recorded as CONF_SCRIPT_DEPENDS
    #[arg(long, value_name = "PATH")]
    pub conf_script: Option<String>,

    /// Print only the SHA-256 fingerprint of the configuration
    #[arg(long)]
    pub fingerprint: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
