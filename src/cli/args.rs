use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wasm-debug")]
#[command(about = "Source-level debugging core for WebAssembly modules", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Logging verbosity
    #[arg(long, global = true, value_enum, default_value_t = Verbosity::Warn)]
    pub verbosity: Verbosity,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect module structure without executing
    Inspect(InspectArgs),
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Path to the WASM module
    #[arg(short, long)]
    pub module: PathBuf,

    /// Resolve and print the binary-offset to source table
    #[arg(long)]
    pub source_map: bool,

    /// Workspace root used to anchor source paths
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verbosity {
    Quiet,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn to_log_level(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        }
    }
}
