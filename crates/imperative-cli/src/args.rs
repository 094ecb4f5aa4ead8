//! Command-line argument definitions for `imperc`.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input file, the mode of operation,
//! the configuration file and the logging verbosity.

use clap::Parser;

/// Command-line arguments for the imperative language compiler front end
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the source file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Only run the lexer and print every token
    #[arg(long)]
    pub lex_only: bool,

    /// Print the token list and the syntax tree
    #[arg(short, long)]
    pub debug: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
