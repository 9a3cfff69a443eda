use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use collection::{collector::TrackingModule, sampler::Sampler};
use config::TrackerConfig;
use storage::snapshot_storage::JsonSnapshotStorage;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    store::{SharedStore, TimeSeriesStore},
    utils::clock::{Clock, DefaultClock},
    window_api::{
        DomainExtractor, GenericDomainExtractor, GenericWindowManager, WindowManager,
    },
};

pub mod args;
pub mod collection;
pub mod config;
pub mod shutdown;
pub mod storage;

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf, config: TrackerConfig) -> Result<()> {
    let dir = std::path::absolute(dir)?;
    std::env::set_current_dir("/")?;
    info!(?dir, ?config, "Starting daemon");

    let manager = GenericWindowManager::new()?;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let store = load_store(dir, clock.clone()).await;

    let shutdown_token = CancellationToken::new();
    let tracker = create_tracker(
        store,
        manager,
        GenericDomainExtractor::new(),
        &shutdown_token,
        clock,
        config,
    );

    let (_, tracking_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = tracker.run().await;
            // Lets the signal listener finish when tracking ends on its own.
            shutdown_token.cancel();
            result
        },
    );

    if let Err(tracking_result) = tracking_result {
        error!("Tracking module got an error {:?}", tracking_result);
    }

    Ok(())
}

/// Opens the usage file kept in `dir`.
pub async fn load_store(dir: PathBuf, clock: Arc<dyn Clock>) -> SharedStore {
    TimeSeriesStore::load(Arc::new(JsonSnapshotStorage::in_dir(dir)), clock)
        .await
        .into_shared()
}

fn create_tracker(
    store: SharedStore,
    manager: impl WindowManager + 'static,
    extractor: impl DomainExtractor + 'static,
    shutdown_token: &CancellationToken,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
) -> TrackingModule {
    let sample_interval = config.sample_interval;
    let autosave_interval = config.autosave_interval;
    let sampler = Sampler::new(
        Box::new(manager),
        Box::new(extractor),
        store.clone(),
        clock.clone(),
        config,
    );
    TrackingModule::new(
        sampler,
        store,
        shutdown_token.clone(),
        sample_interval,
        autosave_interval,
        clock,
    )
}
