//! CLI argument definitions using clap derive
//!
//! Positional arguments follow the buildpack executable contract:
//! `detect <platform> <plan>` and `build <layers> <platform> <plan>`.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Starknet Foundry buildpack
///
/// Installs sncast and snforge into a cached build and launch layer.
#[derive(Parser, Debug)]
#[command(name = "starknet-foundry-buildpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Buildpack root containing buildpack.toml
    #[arg(long, global = true, env = "CNB_BUILDPACK_DIR")]
    pub buildpack_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect phase: always participates and writes a build plan
    Detect(DetectArgs),

    /// Build phase: install Starknet Foundry into a layer
    Build(BuildArgs),
}

/// Arguments for the detect command
#[derive(Parser, Debug)]
pub struct DetectArgs {
    /// Platform directory
    pub platform_dir: PathBuf,

    /// Build plan file to write
    pub plan_path: PathBuf,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Layers directory
    pub layers_dir: PathBuf,

    /// Platform directory
    pub platform_dir: PathBuf,

    /// Buildpack plan file
    pub plan_path: PathBuf,

    /// Stack the build runs on
    #[arg(long, env = "CNB_STACK_ID")]
    pub stack_id: Option<String>,
}
