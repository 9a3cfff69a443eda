use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// What kind of thing an entity key names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Keyed by process name.
    Application,
    /// Keyed by normalized domain.
    Website,
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Application => write!(f, "application"),
            Category::Website => write!(f, "website"),
        }
    }
}

/// Informational data attached to an entity. Never used for attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityMetadata {
    Application { process_path: String },
    Website { favicon_url: Option<String> },
}

impl EntityMetadata {
    pub fn category(&self) -> Category {
        match self {
            EntityMetadata::Application { .. } => Category::Application,
            EntityMetadata::Website { .. } => Category::Website,
        }
    }

    /// Empty metadata for the given category.
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Application => EntityMetadata::Application {
                process_path: String::new(),
            },
            Category::Website => EntityMetadata::Website { favicon_url: None },
        }
    }
}

/// Accumulated usage of a single application or website.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity {
    pub key: String,
    pub metadata: EntityMetadata,
    pub total_time: Duration,
    pub daily_times: BTreeMap<NaiveDate, Duration>,
    pub daily_sessions: BTreeMap<NaiveDate, u32>,
    pub session_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_active_time: DateTime<Utc>,
}

impl TrackedEntity {
    pub fn new(key: impl Into<String>, metadata: EntityMetadata, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            metadata,
            total_time: Duration::zero(),
            daily_times: BTreeMap::new(),
            daily_sessions: BTreeMap::new(),
            session_count: 0,
            first_seen: now,
            last_seen: now,
            last_active_time: now,
        }
    }

    pub fn category(&self) -> Category {
        self.metadata.category()
    }

    /// Adds time to the total and to `date`. Negative values are ignored.
    pub(crate) fn add_time(&mut self, date: NaiveDate, duration: Duration) {
        if duration <= Duration::zero() {
            return;
        }
        self.total_time += duration;
        *self.daily_times.entry(date).or_insert_with(Duration::zero) += duration;
    }

    pub(crate) fn add_session(&mut self, date: NaiveDate) {
        self.session_count += 1;
        *self.daily_sessions.entry(date).or_default() += 1;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_seen = now;
        self.last_active_time = now;
    }

    pub fn time_for_date(&self, date: NaiveDate) -> Duration {
        self.daily_times
            .get(&date)
            .copied()
            .unwrap_or_else(Duration::zero)
    }

    pub fn sessions_for_date(&self, date: NaiveDate) -> u32 {
        self.daily_sessions.get(&date).copied().unwrap_or(0)
    }

    /// Time accumulated between `from` and `to`, both inclusive.
    pub fn time_between(&self, from: NaiveDate, to: NaiveDate) -> Duration {
        if from > to {
            return Duration::zero();
        }
        self.daily_times
            .range(from..=to)
            .fold(Duration::zero(), |sum, (_, time)| sum + *time)
    }

    /// Sessions started between `from` and `to`, both inclusive.
    pub fn sessions_between(&self, from: NaiveDate, to: NaiveDate) -> u64 {
        if from > to {
            return 0;
        }
        self.daily_sessions
            .range(from..=to)
            .map(|(_, count)| *count as u64)
            .sum()
    }

    /// Whether any day between `from` and `to` has time attributed.
    pub fn active_between(&self, from: NaiveDate, to: NaiveDate) -> bool {
        from <= to
            && self
                .daily_times
                .range(from..=to)
                .any(|(_, time)| *time > Duration::zero())
    }
}
