//! Local offline proxy for the book.
//!
//! Usage: `folio [CONFIG]`, where `CONFIG` defaults to `folio.yml`. A missing
//! config file means built-in defaults.
use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use folio::{
    HttpNetwork, LocalHost, OfflineRouter, cache::FsCacheStorage,
    config::FolioConfig, observability::init_tracing, server::bind_and_serve,
};
use tracing::{error, info};

const DEFAULT_CONFIG: &str = "folio.yml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = if path.exists() {
        FolioConfig::from_file(&path)
            .with_context(|| format!("failed to load {}", path.display()))?
    } else {
        FolioConfig::default()
    };

    init_tracing(&config.logging)?;
    if !path.exists() {
        info!(path = %path.display(), "config not found, using defaults");
    }

    let storage = FsCacheStorage::new(&config.server.cache_dir)
        .context("failed to open cache directory")?;
    let network = HttpNetwork::from_settings(&config.http)?;
    let router = OfflineRouter::from_config(
        &config,
        Arc::new(storage),
        Arc::new(network),
        Arc::new(LocalHost::new()),
    )?;
    info!(
        version = router.cache_version(),
        origin = %router.classifier().origin(),
        "router ready"
    );

    // A failed install leaves the previous version in charge, so activation
    // is skipped and requests are still served from whatever is cached.
    match router.handle_install().await {
        Ok(()) => router.handle_activate().await?,
        Err(err) => error!(error = %err, "install failed, not activating"),
    }

    bind_and_serve(config.server.listen, Arc::new(router))
        .await
        .map_err(|err| anyhow::anyhow!("proxy stopped: {err}"))
}
