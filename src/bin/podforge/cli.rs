//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Podforge - builds CocoaPods dependencies for Kotlin Multiplatform libraries
#[derive(Parser)]
#[command(name = "podforge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format for build events
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Path to the xcodebuild executable
    #[arg(long, global = true, env = "PODFORGE_XCODEBUILD")]
    pub xcodebuild: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

/// Flags every project-loading command shares.
#[derive(Debug, Clone)]
pub struct GlobalOpts {
    pub verbose: bool,
    pub quiet: bool,
    pub color: bool,
    pub message_format: MessageFormat,
    pub xcodebuild: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile pods and generate definition files and target settings
    Build(BuildArgs),

    /// Link and sync the framework of one target
    Sync(SyncArgs),

    /// List enabled targets and source sets
    Targets(TargetsArgs),

    /// Print the generated definition file of a pod
    Def(DefArgs),

    /// Check the build environment
    Doctor(DoctorArgs),

    /// Remove pod build artifacts
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Specific targets to build (e.g. iosArm64)
    #[arg(long)]
    pub target: Vec<String>,

    /// Also link and sync the framework of this target
    #[arg(long, value_name = "TARGET")]
    pub sync: Option<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Keep building independent steps after a failure
    #[arg(long)]
    pub keep_going: bool,

    /// Emit build plan as JSON (no build)
    #[arg(long)]
    pub plan: bool,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Target whose framework is synced
    pub target: String,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct TargetsArgs {
    /// Print the target set as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DefArgs {
    /// Module name of the pod
    pub module: String,

    /// Target to render for (defaults to the first enabled target)
    #[arg(long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct DoctorArgs {}

#[derive(Args)]
pub struct CleanArgs {
    /// Remove the whole build directory, not only pod artifacts
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
