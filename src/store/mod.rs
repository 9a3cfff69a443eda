//! Canonical usage data. [TimeSeriesStore] owns the application and website maps together with
//! the derived [Hierarchy], and is the only thing that mutates them.

pub mod entity;
pub mod hierarchy;

use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;
use chrono::Duration;
use entity::{Category, EntityMetadata, TrackedEntity};
use hierarchy::Hierarchy;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::{
    daemon::storage::{entities::SnapshotEntity, snapshot_storage::SnapshotStorage},
    utils::{clock::Clock, time::truncate_to_millis},
};

/// Store shared between the sampler and readers. Reads are taken under the same lock as writes so
/// a half rebuilt hierarchy is never observed.
pub type SharedStore = Arc<Mutex<TimeSeriesStore>>;

/// Notification sent to subscribers after the data changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// A tick attributed time or sessions.
    Updated,
    /// One entity or everything was removed.
    Reset,
}

const EVENT_CAPACITY: usize = 16;

pub struct TimeSeriesStore {
    apps: BTreeMap<String, TrackedEntity>,
    websites: BTreeMap<String, TrackedEntity>,
    hierarchy: Hierarchy,
    storage: Arc<dyn SnapshotStorage>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<StoreEvent>,
}

impl TimeSeriesStore {
    /// Creates an empty store. Nothing is read from `storage`, see [TimeSeriesStore::load].
    pub fn new(storage: Arc<dyn SnapshotStorage>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            apps: BTreeMap::new(),
            websites: BTreeMap::new(),
            hierarchy: Hierarchy::default(),
            storage,
            clock,
            events,
        }
    }

    /// Creates a store filled with whatever `storage` holds. Failing to read results in an empty
    /// store, the file is left as it is until the next successful [TimeSeriesStore::persist].
    pub async fn load(storage: Arc<dyn SnapshotStorage>, clock: Arc<dyn Clock>) -> Self {
        let mut store = Self::new(storage, clock);
        match store.storage.read().await {
            Ok(Some(snapshot)) => {
                store.restore(&snapshot);
                info!(
                    apps = store.apps.len(),
                    websites = store.websites.len(),
                    "Loaded stored usage"
                );
            }
            Ok(None) => info!("No stored usage, starting empty"),
            Err(e) => error!("Failed to load stored usage, starting empty {e:?}"),
        }
        store
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// Rebuilds the entity maps by summing every per-day record of the snapshot. Days are visited
    /// by date so the metadata of the latest day wins.
    fn restore(&mut self, snapshot: &SnapshotEntity) {
        self.apps.clear();
        self.websites.clear();
        let mut days = snapshot.days().collect::<Vec<_>>();
        days.sort_by_key(|(date, _)| **date);
        for (date, day) in days {
            for (map, records, category) in [
                (&mut self.apps, &day.apps, Category::Application),
                (&mut self.websites, &day.websites, Category::Website),
            ] {
                for (key, record) in records {
                    let metadata = match category {
                        Category::Application => record.application_metadata(),
                        Category::Website => record.website_metadata(),
                    };
                    let entity = map.entry(key.clone()).or_insert_with(|| {
                        TrackedEntity::new(key.clone(), metadata.clone(), record.first_seen)
                    });
                    entity.add_time(*date, record.total_time);
                    if record.session_count > 0 {
                        entity.session_count += record.session_count as u64;
                        *entity.daily_sessions.entry(*date).or_default() += record.session_count;
                    }
                    entity.first_seen = entity.first_seen.min(record.first_seen);
                    entity.last_seen = entity.last_seen.max(record.last_seen);
                    entity.last_active_time = entity.last_active_time.max(record.last_active_time);
                    entity.metadata = metadata;
                }
            }
        }
        self.hierarchy = Hierarchy::build(self.apps.values(), self.websites.values());
    }

    fn map(&self, category: Category) -> &BTreeMap<String, TrackedEntity> {
        match category {
            Category::Application => &self.apps,
            Category::Website => &self.websites,
        }
    }

    fn map_mut(&mut self, category: Category) -> &mut BTreeMap<String, TrackedEntity> {
        match category {
            Category::Application => &mut self.apps,
            Category::Website => &mut self.websites,
        }
    }

    /// Returns the entity for `key`, creating it when it's seen for the first time.
    pub fn ensure_entity(
        &mut self,
        category: Category,
        key: &str,
        metadata: EntityMetadata,
    ) -> &TrackedEntity {
        let now = self.clock.time();
        self.map_mut(category)
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(%category, key, "New entity");
                TrackedEntity::new(key, metadata, now)
            })
    }

    /// Adds time to today's bucket of an entity. Negative durations count as zero.
    pub fn record_elapsed(&mut self, category: Category, key: &str, duration: Duration) {
        let duration = truncate_to_millis(duration.max(Duration::zero()));
        let today = self.clock.today();
        match self.map_mut(category).get_mut(key) {
            Some(entity) => entity.add_time(today, duration),
            None => warn!(%category, key, "Recording time for an unknown entity"),
        }
    }

    /// Counts one activation of an entity today.
    pub fn record_activation(&mut self, category: Category, key: &str) {
        let today = self.clock.today();
        match self.map_mut(category).get_mut(key) {
            Some(entity) => entity.add_session(today),
            None => warn!(%category, key, "Recording activation for an unknown entity"),
        }
    }

    /// Marks an entity as seen right now.
    pub fn touch(&mut self, category: Category, key: &str) {
        let now = self.clock.time();
        if let Some(entity) = self.map_mut(category).get_mut(key) {
            entity.touch(now);
        }
    }

    /// Rebuilds today's bucket of the hierarchy. Older buckets aren't revisited, only today can
    /// still change.
    pub fn rebuild_hierarchy(&mut self) {
        let today = self.clock.today();
        self.hierarchy
            .rebuild_day(today, self.apps.values(), self.websites.values());
    }

    /// Tells subscribers that data changed.
    pub fn notify(&self, event: StoreEvent) {
        // Having no subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> SnapshotEntity {
        SnapshotEntity::from(&self.hierarchy)
    }

    /// Writes the hierarchy into storage.
    pub async fn persist(&self) -> Result<()> {
        self.storage.write(&self.snapshot()).await?;
        debug!("Usage persisted");
        Ok(())
    }

    /// Removes everything and persists the empty state.
    pub async fn reset_all(&mut self) -> Result<()> {
        info!("Resetting all usage");
        self.apps.clear();
        self.websites.clear();
        self.hierarchy = Hierarchy::default();
        self.notify(StoreEvent::Reset);
        self.persist().await
    }

    /// Removes a single entity from the maps and from every day of the hierarchy. Returns whether
    /// it existed.
    pub async fn reset_entity(&mut self, category: Category, key: &str) -> Result<bool> {
        if self.map_mut(category).remove(key).is_none() {
            return Ok(false);
        }
        info!(%category, key, "Resetting entity");
        self.hierarchy = Hierarchy::build(self.apps.values(), self.websites.values());
        self.notify(StoreEvent::Reset);
        self.persist().await?;
        Ok(true)
    }

    pub fn apps(&self) -> impl Iterator<Item = &TrackedEntity> + Clone {
        self.apps.values()
    }

    pub fn websites(&self) -> impl Iterator<Item = &TrackedEntity> + Clone {
        self.websites.values()
    }

    pub fn entities(&self, category: Category) -> impl Iterator<Item = &TrackedEntity> + Clone {
        self.map(category).values()
    }

    pub fn get(&self, category: Category, key: &str) -> Option<&TrackedEntity> {
        self.map(category).get(key)
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
