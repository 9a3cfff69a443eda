use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{store::SharedStore, utils::clock::Clock};

use super::sampler::Sampler;

/// Drives the [Sampler] on a fixed schedule and saves the store periodically.
pub struct TrackingModule {
    sampler: Sampler,
    store: SharedStore,
    shutdown: CancellationToken,
    sample_interval: Duration,
    autosave_interval: Duration,
    time_provider: Arc<dyn Clock>,
}

impl TrackingModule {
    pub fn new(
        sampler: Sampler,
        store: SharedStore,
        shutdown: CancellationToken,
        sample_interval: Duration,
        autosave_interval: Duration,
        time_provider: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sampler,
            store,
            shutdown,
            sample_interval,
            autosave_interval,
            time_provider,
        }
    }

    async fn autosave(&self) {
        debug!("Autosaving usage");
        let _ = self
            .store
            .lock()
            .await
            .persist()
            .await
            .inspect_err(|e| error!("Autosave failed {e:?}"));
    }

    /// Executes the tracking event loop until the shutdown token is cancelled. Pending time is
    /// flushed and saved before returning.
    pub async fn run(mut self) -> Result<()> {
        self.sampler.start().await;
        let mut collection_point = self.time_provider.instant();
        let mut autosave_point = collection_point + self.autosave_interval;
        loop {
            collection_point += self.sample_interval;

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                _ = self.time_provider.sleep_until(collection_point) => ()
            }

            self.sampler.tick().await;

            if self.time_provider.instant() >= autosave_point {
                autosave_point += self.autosave_interval;
                self.autosave().await;
            }
        }
        self.sampler.stop().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::{
            collection::sampler::Sampler, config::TrackerConfig,
            storage::snapshot_storage::MockSnapshotStorage,
        },
        store::{entity::Category, TimeSeriesStore},
        utils::{clock::test_clock::TokioClock, logging::TEST_LOGGING},
        window_api::{ActiveWindowData, MockDomainExtractor, MockWindowManager},
    };

    use super::TrackingModule;

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(), NaiveTime::MIN);

    #[tokio::test(start_paused = true)]
    async fn test_autosaves_and_saves_on_shutdown() -> Result<()> {
        *TEST_LOGGING;
        let clock = Arc::new(TokioClock::at(TEST_START_DATE));

        let mut storage = MockSnapshotStorage::new();
        // Two autosaves and the final save.
        storage.expect_write().times(3).returning(|_| Ok(()));
        let store = TimeSeriesStore::new(Arc::new(storage), clock.clone()).into_shared();

        let mut window_manager = MockWindowManager::new();
        window_manager
            .expect_get_active_window_data()
            .returning(|| Ok(Some(ActiveWindowData::from_path("/usr/bin/nvim", 7))));
        window_manager.expect_get_idle_time().returning(|| Ok(0));

        let config = TrackerConfig {
            autosave_interval: Duration::from_secs(2),
            ..Default::default()
        };
        let sampler = Sampler::new(
            Box::new(window_manager),
            Box::new(MockDomainExtractor::new()),
            store.clone(),
            clock.clone(),
            config.clone(),
        );
        let shutdown = CancellationToken::new();
        let module = TrackingModule::new(
            sampler,
            store.clone(),
            shutdown.clone(),
            config.sample_interval,
            config.autosave_interval,
            clock,
        );

        let (_, result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(5500)).await;
                shutdown.cancel();
            },
            module.run(),
        );
        result?;

        let store = store.lock().await;
        let nvim = store.get(Category::Application, "nvim").unwrap();
        // The half second before shutdown is too short to be kept.
        assert_eq!(nvim.total_time, chrono::Duration::seconds(5));
        assert_eq!(nvim.session_count, 1);
        Ok(())
    }
}
