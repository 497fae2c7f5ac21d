// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The pmatic authors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pmatic - reproducible pipeline runner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pmatic_engine::Engine;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pmatic",
    version,
    about = "Pipe-o-matic - run pipelines against a context directory, reversibly"
)]
struct Cli {
    /// Log engine activity to stderr (RUST_LOG overrides)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline against a context directory
    Run {
        /// Pipeline name, resolved to $PMATIC_BASE/pipelines/<name>.yaml
        pipeline: String,
        /// Context directory the pipeline reads and writes
        context: PathBuf,
        /// Pipeline parameter overrides (can be repeated: --param key=value)
        #[arg(long = "param", value_parser = parse_key_value)]
        param: Vec<(String, String)>,
    },
    /// Restore a context directory to its newest pre-run state
    Revert {
        /// Context directory to restore
        context: PathBuf,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid parameter format '{}': must be key=value", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", format_error(&e));
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let pmatic_base = std::env::var("PMATIC_BASE").context("PMATIC_BASE is not set")?;

    match cli.command {
        Commands::Run {
            pipeline,
            context,
            param,
        } => {
            let overrides: HashMap<String, String> = param.into_iter().collect();
            let engine = Engine::new(&pmatic_base, &context)?;
            engine.run(&pipeline, overrides)?;
        }
        Commands::Revert { context } => {
            let engine = Engine::new(&pmatic_base, &context)?;
            engine.revert()?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains the source error text, we
/// skip the "Caused by" chain to avoid noisy duplicate output (common
/// when thiserror variants use `#[error("... {0}")]` with `#[from]`).
/// Otherwise we render the full chain so context isn't lost.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();

    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));

    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
