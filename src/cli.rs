//! The Parcera Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::{
    io::Read,
    path::{Path, PathBuf},
    process,
};

use clap::Parser;
use log::LevelFilter;

use crate::{
    config::ReaderConfig, discovery::discover_sources, print_error, ClojureReader, ParceraError,
};

pub mod args;
pub mod output;

use args::{ArgsCommand, ParceraArgs};

const STDIN_NAME: &str = "<stdin>";
const EXPR_NAME: &str = "<expr>";

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = ParceraArgs::parse();
    init_logging(args.verbose);

    if let Err(e) = dispatch(args) {
        print_error(e);
        process::exit(1);
    }
}

fn dispatch(args: ParceraArgs) -> Result<(), ParceraError> {
    let config = build_config(&args)?;

    match args.command {
        ArgsCommand::Hiccup {
            paths,
            expr,
            compact,
        } => {
            let config = ReaderConfig {
                pretty: config.pretty && !compact,
                ..config
            };
            let reader = ClojureReader::with_config(config)?;
            let sources = collect_sources(&paths, expr)?;
            let mut documents = Vec::with_capacity(sources.len());
            for (name, source) in sources {
                documents.push((name.clone(), reader.read_named(&name, &source)?));
            }
            println!(
                "{}",
                output::render_documents(&documents, reader.config().pretty)?
            );
        }

        ArgsCommand::Tokens { path, expr } => {
            let reader = ClojureReader::with_config(config)?;
            let paths: Vec<PathBuf> = path.into_iter().collect();
            for (name, source) in collect_sources(&paths, expr)? {
                let tokens = reader.tokens_named(&name, &source)?;
                print!("{}", output::render_tokens(&tokens, reader.rule_names()));
            }
        }

        ArgsCommand::Rules => {
            let reader = ClojureReader::with_config(config)?;
            print!("{}", output::render_rules(reader.rule_names()));
        }
    }

    Ok(())
}

// ============================================================================
// CONFIGURATION AND LOGGING
// ============================================================================

/// Config file first, then command-line overrides.
fn build_config(args: &ParceraArgs) -> Result<ReaderConfig, ParceraError> {
    let mut config = match &args.config {
        Some(path) => ReaderConfig::load(path)?,
        None => ReaderConfig::default(),
    };
    if let Some(policy) = args.flatten {
        config.flatten = policy;
    }
    config.splice.extend(args.splice.iter().cloned());
    log::debug!("reader configuration: {:?}", config);
    Ok(config)
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    // a logger may already be installed when embedded
    let _ = builder.try_init();
}

// ============================================================================
// INPUT
// ============================================================================

/// Named sources: the expression, else the discovered files, else stdin.
fn collect_sources(
    paths: &[PathBuf],
    expr: Option<String>,
) -> Result<Vec<(String, String)>, ParceraError> {
    if let Some(expr) = expr {
        return Ok(vec![(EXPR_NAME.to_string(), expr)]);
    }
    if paths.is_empty() {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .map_err(|e| ParceraError::io(STDIN_NAME, e))?;
        return Ok(vec![(STDIN_NAME.to_string(), source)]);
    }
    discover_sources(paths)?
        .into_iter()
        .map(|path| {
            let source = read_file(&path)?;
            Ok((path.display().to_string(), source))
        })
        .collect()
}

fn read_file(path: &Path) -> Result<String, ParceraError> {
    log::info!("reading {}", path.display());
    std::fs::read_to_string(path).map_err(|e| ParceraError::io(path.display(), e))
}
