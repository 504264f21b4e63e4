//! # brepdoc CLI Module
//!
//! This module implements the CLI interface for brepdoc.
//!
//! ## Available Commands
//!
//! - `kinds` - List defect kinds with their registry metadata
//! - `mesh` - Check a mesh snapshot (JSON) and print the report
//! - `topology` - Check a B-Rep topology snapshot (JSON) and print the report
//! - `options` - Show the effective option values

mod commands;

use crate::config::Config;
use brepdoc_core::BrepdocError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// brepdoc - B-Rep and mesh defect doctor
///
/// Finds defects in boundary-representation solids and polygon meshes,
/// ranks them and derives a repair plan.
#[derive(Parser, Debug)]
#[command(name = "brepdoc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file (falls back to BREPDOC_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List defect kinds, highest priority first
    Kinds {
        /// Only kinds of this element group (brep, face, loop, trim, edge, vertex, mesh)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Check a mesh snapshot
    Mesh {
        /// Path to the mesh JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Check a B-Rep topology snapshot
    Topology {
        /// Path to the topology JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the effective option values
    Options,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), BrepdocError> {
    let config = Config::load(cli.config.as_deref())?;
    let json_mode = cli.json;

    match cli.command {
        Some(Commands::Kinds { group }) => cmd_kinds(&config, json_mode, group.as_deref()),
        Some(Commands::Mesh { file }) => cmd_mesh(&config, json_mode, &file),
        Some(Commands::Topology { file }) => cmd_topology(&config, json_mode, &file),
        Some(Commands::Options) => cmd_options(&config, json_mode),
        None => {
            // No subcommand - list kinds by default
            cmd_kinds(&config, json_mode, None)
        }
    }
}
