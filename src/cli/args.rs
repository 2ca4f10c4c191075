//! Defines the command-line arguments and subcommands for the Parcera CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::normalize::FlattenPolicy;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "parcera",
    version,
    about = "Read Clojure source and print its parse tree as hiccup data."
)]
pub struct ParceraArgs {
    #[command(subcommand)]
    pub command: ArgsCommand,

    /// YAML file with reader settings; flags below override it.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// How nested rule matches are laid out.
    #[arg(long, global = true, value_enum)]
    pub flatten: Option<FlattenPolicy>,

    /// Splice this parser rule into its parent (repeatable).
    #[arg(long = "splice", global = true, value_name = "RULE")]
    pub splice: Vec<String>,

    /// Increase log output (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Print the hiccup encoding of Clojure sources as JSON.
    Hiccup {
        /// Files or directories; stdin is read when none are given.
        paths: Vec<PathBuf>,
        /// Read this source text instead of files.
        #[arg(long, conflicts_with = "paths")]
        expr: Option<String>,
        /// Print JSON on a single line.
        #[arg(long)]
        compact: bool,
    },
    /// Print the token stream, one token per line.
    Tokens {
        /// The file to tokenize; stdin is read when omitted.
        path: Option<PathBuf>,
        /// Tokenize this source text instead of a file.
        #[arg(long, conflicts_with = "path")]
        expr: Option<String>,
    },
    /// List the grammar's rule-name table.
    Rules,
}
