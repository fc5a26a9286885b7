//! Command-line argument definitions for the busmap CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Every operation is its own subcommand; configuration file
//! selection and logging verbosity apply to all of them.

use clap::{Parser, Subcommand};

/// Command-line arguments for the busmap tag tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations on a program export
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the bus numbers in use into the bus number table
    Numbers(TableArgs),

    /// Renumber buses with the replacements filled into the bus number table
    Renumber(RewriteArgs),

    /// Count bus tags and the tuples they occur in into the census table
    Census(TableArgs),

    /// Give every duplicated bus tag after its first use a free bus number
    Dedup {
        #[command(flatten)]
        rewrite: RewriteArgs,

        /// First number of the range new bus numbers are taken from
        #[arg(long)]
        start: Option<u32>,

        /// Last number of the range new bus numbers are taken from
        #[arg(long)]
        end: Option<u32>,
    },

    /// Replace the tags of single-use census rows that have `Replace Tags` set
    ReplaceTags(RewriteArgs),

    /// Count candidate labels, or number the instances of one of them
    Label {
        #[command(flatten)]
        rewrite: RewriteArgs,

        /// Label whose instances are numbered; without it the candidates are
        /// only listed
        #[arg(long)]
        label: Option<String>,
    },
}

/// Input document and table location
#[derive(clap::Args, Debug)]
pub struct TableArgs {
    /// Path to the input program export
    pub input: String,

    /// Directory holding the table snapshots
    #[arg(short, long, default_value = ".")]
    pub tables_dir: String,
}

/// Input document, table location and output document
#[derive(clap::Args, Debug)]
pub struct RewriteArgs {
    #[command(flatten)]
    pub tables: TableArgs,

    /// Path to the output file; the input is overwritten when left out
    #[arg(short, long)]
    pub output: Option<String>,
}

impl RewriteArgs {
    /// The path the rewritten document goes to.
    pub fn output_path(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.tables.input)
    }
}
