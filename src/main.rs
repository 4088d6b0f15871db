// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod cli;
mod jq;
mod kubernetes;
mod normalize;
mod output;
mod pipeline;
mod run;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::prelude::*;

/// Initialize logging to stderr, gated by an env filter.
///
/// Stdout is reserved for jq output and stderr carries the diagnostic
/// channel, so logging stays quiet unless requested via -v or RUST_LOG.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        "kubectl_jq=debug"
    } else {
        "kubectl_jq=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (aws-lc-rs)
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = cli::Args::parse();
    init_logging(args.verbose);

    // Resolving options compiles the jq program, so a syntax error aborts
    // here, before anything is fetched from the cluster.
    let options = run::RunOptions::from_args(args)?;
    run::run(options).await
}
