//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Full name of the attendee
    #[arg(short, long)]
    pub name: String,

    /// Identification number
    #[arg(short, long)]
    pub id_number: String,

    /// JSON file with signature strokes (`[[{"x":..,"y":..}, ..], ..]`)
    #[arg(short, long, value_name = "FILE", conflicts_with = "signature_png")]
    pub strokes: Option<PathBuf>,

    /// PNG file to use as the signature
    #[arg(short = 'p', long, value_name = "FILE")]
    pub signature_png: Option<PathBuf>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Directory to write the attendance sheet to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
