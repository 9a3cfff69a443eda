use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument};

use crate::{
    daemon::config::TrackerConfig,
    store::{
        entity::{Category, EntityMetadata},
        SharedStore, StoreEvent, TimeSeriesStore,
    },
    utils::clock::Clock,
    window_api::{domain::is_browser, ActiveWindowData, DomainExtractor, WindowManager},
};

use super::afk::AfkEvaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    Stopped,
    Tracking,
}

/// What the website lane saw during a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DomainSample {
    /// The focused application isn't a browser.
    NotBrowser,
    /// A browser is focused but its page couldn't be read.
    Unresolved,
    Domain(String),
}

struct Sample {
    window: ActiveWindowData,
    domain: DomainSample,
}

impl Sample {
    fn app_metadata(&self) -> EntityMetadata {
        EntityMetadata::Application {
            process_path: self.window.process_path.to_string(),
        }
    }
}

fn website_metadata(domain: &str) -> EntityMetadata {
    EntityMetadata::Website {
        favicon_url: Some(format!("https://{domain}/favicon.ico")),
    }
}

/// Attribution state of one category. At most one entity of a lane accrues time at any moment.
struct Lane {
    category: Category,
    active: Option<String>,
    session_start: DateTime<Utc>,
    /// The active entity was found by [Sampler::start] and its session isn't counted yet.
    pending_activation: bool,
}

impl Lane {
    fn new(category: Category, now: DateTime<Utc>) -> Self {
        Self {
            category,
            active: None,
            session_start: now,
            pending_activation: false,
        }
    }

    fn reset(&mut self, now: DateTime<Utc>) {
        self.active = None;
        self.session_start = now;
        self.pending_activation = false;
    }

    /// Makes `key` active without counting a session.
    fn begin(
        &mut self,
        store: &mut TimeSeriesStore,
        key: &str,
        metadata: EntityMetadata,
        now: DateTime<Utc>,
    ) {
        store.ensure_entity(self.category, key, metadata);
        store.touch(self.category, key);
        self.active = Some(key.to_string());
        self.session_start = now;
        self.pending_activation = true;
    }

    fn observe(
        &mut self,
        store: &mut TimeSeriesStore,
        key: &str,
        metadata: EntityMetadata,
        now: DateTime<Utc>,
    ) {
        if self.active.as_deref() == Some(key) {
            store.record_elapsed(self.category, key, now - self.session_start);
            if self.pending_activation {
                store.record_activation(self.category, key);
                self.pending_activation = false;
            }
        } else {
            if let Some(previous) = self.active.take() {
                store.record_elapsed(self.category, &previous, now - self.session_start);
            }
            debug!(category = %self.category, key, "Switched");
            store.ensure_entity(self.category, key, metadata);
            store.record_activation(self.category, key);
            self.active = Some(key.to_string());
            self.pending_activation = false;
        }
        self.session_start = now;
        store.touch(self.category, key);
    }

    /// Drops the interval since the last sample.
    fn skip(&mut self, now: DateTime<Utc>) {
        self.session_start = now;
    }

    /// Attributes pending time and leaves the lane without an active entity.
    fn deactivate(&mut self, store: &mut TimeSeriesStore, now: DateTime<Utc>) {
        if let Some(previous) = self.active.take() {
            debug!(category = %self.category, key = %previous, "Deactivated");
            store.record_elapsed(self.category, &previous, now - self.session_start);
        }
        self.reset(now);
    }

    /// Like [Lane::deactivate], but pending time shorter than `minimum` is dropped.
    fn finish(
        &mut self,
        store: &mut TimeSeriesStore,
        now: DateTime<Utc>,
        minimum: std::time::Duration,
    ) {
        if let Some(previous) = self.active.take() {
            let elapsed = now - self.session_start;
            if elapsed.to_std().is_ok_and(|v| v >= minimum) {
                store.record_elapsed(self.category, &previous, elapsed);
            } else {
                debug!(category = %self.category, key = %previous, %elapsed, "Dropped short interval");
            }
        }
        self.reset(now);
    }
}

/// Polls the focused window and attributes time to applications and websites.
pub struct Sampler {
    window_manager: Box<dyn WindowManager>,
    domain_extractor: Box<dyn DomainExtractor>,
    afk_evaluator: AfkEvaluator,
    store: SharedStore,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
    state: SamplerState,
    apps: Lane,
    websites: Lane,
}

impl Sampler {
    pub fn new(
        window_manager: Box<dyn WindowManager>,
        domain_extractor: Box<dyn DomainExtractor>,
        store: SharedStore,
        clock: Arc<dyn Clock>,
        config: TrackerConfig,
    ) -> Self {
        let now = clock.time();
        Self {
            window_manager,
            domain_extractor,
            afk_evaluator: AfkEvaluator::new(config.afk_threshold),
            store,
            clock,
            config,
            state: SamplerState::Stopped,
            apps: Lane::new(Category::Application, now),
            websites: Lane::new(Category::Website, now),
        }
    }

    pub fn state(&self) -> SamplerState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == SamplerState::Tracking
    }

    /// Starts tracking. The focused entity becomes active right away, its session is counted by
    /// the first tick that still sees it.
    #[instrument(skip(self))]
    pub async fn start(&mut self) {
        if self.is_tracking() {
            debug!("Already tracking");
            return;
        }
        let now = self.clock.time();
        self.apps.reset(now);
        self.websites.reset(now);
        self.state = SamplerState::Tracking;
        info!("Tracking started");

        let Some(sample) = self.sample() else {
            return;
        };
        let store = self.store.clone();
        let mut store = store.lock().await;
        self.apps.begin(
            &mut store,
            &sample.window.process_name,
            sample.app_metadata(),
            now,
        );
        if let DomainSample::Domain(domain) = &sample.domain {
            self.websites
                .begin(&mut store, domain, website_metadata(domain), now);
        }
        store.rebuild_hierarchy();
        store.notify(StoreEvent::Updated);
    }

    /// Takes one sample and attributes the time since the previous one.
    pub async fn tick(&mut self) {
        if !self.is_tracking() {
            return;
        }
        let now = self.clock.time();
        // Idle is read before the window, a locked screen resolves none.
        if self.user_is_afk() {
            debug!("User is away, interval dropped");
            self.apps.skip(now);
            self.websites.skip(now);
            return;
        }
        let Some(sample) = self.sample() else {
            return;
        };

        let store = self.store.clone();
        let mut store = store.lock().await;
        self.apps.observe(
            &mut store,
            &sample.window.process_name,
            sample.app_metadata(),
            now,
        );
        match &sample.domain {
            DomainSample::Domain(domain) => {
                self.websites
                    .observe(&mut store, domain, website_metadata(domain), now)
            }
            DomainSample::NotBrowser => self.websites.deactivate(&mut store, now),
            DomainSample::Unresolved => (),
        }
        store.rebuild_hierarchy();
        store.notify(StoreEvent::Updated);
    }

    /// Flushes pending time and persists the store. Failing to persist is logged, the sampler
    /// stops regardless.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) {
        if !self.is_tracking() {
            debug!("Not tracking");
            return;
        }
        let now = self.clock.time();
        let store = self.store.clone();
        let mut store = store.lock().await;
        self.apps
            .finish(&mut store, now, self.config.min_stop_flush);
        self.websites
            .finish(&mut store, now, self.config.min_stop_flush);
        store.rebuild_hierarchy();
        store.notify(StoreEvent::Updated);
        let _ = store
            .persist()
            .await
            .inspect_err(|e| error!("Failed to persist usage on stop {e:?}"));
        self.state = SamplerState::Stopped;
        info!("Tracking stopped");
    }

    /// Reads the focused window and, for browsers, the shown domain. `None` when no window could
    /// be resolved.
    fn sample(&mut self) -> Option<Sample> {
        let window = match self.window_manager.get_active_window_data() {
            Ok(Some(window)) => window,
            Ok(None) => {
                debug!("No focused window");
                return None;
            }
            Err(e) => {
                error!("Failed to read the focused window {e:?}");
                return None;
            }
        };
        let domain = if !is_browser(&window.process_name, &self.config.browsers) {
            DomainSample::NotBrowser
        } else {
            match self.domain_extractor.get_current_domain(&window.process_name) {
                Ok(Some(domain)) => DomainSample::Domain(domain),
                Ok(None) => DomainSample::Unresolved,
                Err(e) => {
                    error!("Failed to read the browser domain {e:?}");
                    DomainSample::Unresolved
                }
            }
        };
        Some(Sample { window, domain })
    }

    fn user_is_afk(&mut self) -> bool {
        match self.window_manager.get_idle_time() {
            Ok(idle_ms) => self.afk_evaluator.is_afk(idle_ms),
            Err(e) => {
                error!("Failed to read idle time {e:?}");
                false
            }
        }
    }
}
