//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Catalog member/project pages into a manifest and make them path-independent
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Root directory holding the member directories (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (default: portal.toml)
    #[arg(short = 'C', long, default_value = "portal.toml")]
    pub config: PathBuf,

    /// Manifest output path, relative to root
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Extra top-level directory to exclude from member discovery (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Also print notes (unresolved or out-of-project asset references)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Rewrite root-absolute references and regenerate the manifest
    Build {
        /// Skip the rewriting passes and only regenerate the manifest
        #[arg(long)]
        no_rewrite: bool,

        /// Compute everything but write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the persisted manifest against the tree
    Check,
}
