// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

mod app;
mod config;
mod error;
mod logic;
mod models;
mod mvu;
mod ui;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::logic::api::HttpBackend;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fedipost=info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().context("Invalid configuration")?;
    let api_base = config.api_base()?;
    tracing::info!(api = %api_base, timeout_secs = config.timeout_secs, "starting FediPost");

    let backend = HttpBackend::new(&api_base, config.request_timeout())?;
    app::run(&config, Arc::new(backend)).map_err(|err| anyhow::anyhow!("UI failed: {err}"))
}
