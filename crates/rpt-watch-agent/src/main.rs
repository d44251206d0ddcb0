// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use anyhow::{anyhow, Context};
use std::{env, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use rpt_watch::{
    http_utils::build_client, sink::WebhookSink, source::NitradoLogSource, Monitor,
    MonitorConfig,
};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("RPT_WATCH_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    if let Err(e) = init_logging(&log_level) {
        eprintln!("Unable to set up logging: {e:#}");
        return;
    }

    if let Err(e) = run().await {
        error!("RPT watch agent stopped: {e:#}");
    }
}

fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).context("could not parse log level in configuration")?,
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    debug!("Logging subsystem enabled");
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = MonitorConfig::from_env().context("Error loading configuration")?;

    let client = build_client(config.https_proxy.as_deref(), config.request_timeout)
        .map_err(|e| anyhow!("Unable to build HTTP client: {e}"))?;
    let source = Arc::new(NitradoLogSource::new(client.clone(), config.api_url.clone()));
    let sink = Arc::new(WebhookSink::new(client, config.request_timeout));

    let monitor = Monitor::new(config.targets.clone(), source, sink, config.poll_interval);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt, stopping");
            shutdown.cancel();
        }
    });

    info!(
        "Watching {} game servers every {}s",
        config.targets.len(),
        config.poll_interval.as_secs()
    );
    monitor.run(cancel).await;
    Ok(())
}
