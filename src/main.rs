mod app;
mod cli;
mod config;
mod controller;
mod domain;
mod feed;
mod storage;
mod theme;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use app::{APP_NAME, FeedApp};
use clap::Parser;
use eframe::NativeOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{cli::CliArgs, config::Config, feed::HttpEventSource};

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = Config::from_cli_and_file(args)?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let source =
        HttpEventSource::new(&config.server).context("Failed to build the HTTP client")?;
    info!(endpoint = source.endpoint(), "starting {APP_NAME}");
    let source = Arc::new(source);

    let options = NativeOptions::default();
    eframe::run_native(
        APP_NAME,
        options,
        Box::new(move |cc| Ok(Box::new(FeedApp::new(cc, &config, source)))),
    )
    .map_err(|err| anyhow!("{APP_NAME} window failed: {err}"))
}
