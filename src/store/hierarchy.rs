//! Read model that groups per-day usage into years, months and ISO weeks.
//!
//! Day buckets are built from the entity maps of [super::TimeSeriesStore]. Every parent level
//! sums time and sessions of its children and keeps the largest child value for the number of
//! distinct applications and websites, because distinct counts can't be added across days.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use super::entity::{EntityMetadata, TrackedEntity};

/// Aggregates carried by every level of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub total_time: Duration,
    pub session_count: u64,
    pub app_count: usize,
    pub website_count: usize,
}

impl Default for Totals {
    fn default() -> Self {
        Self {
            total_time: Duration::zero(),
            session_count: 0,
            app_count: 0,
            website_count: 0,
        }
    }
}

impl Totals {
    fn absorb(&mut self, child: &Totals) {
        self.total_time += child.total_time;
        self.session_count += child.session_count;
        self.app_count = self.app_count.max(child.app_count);
        self.website_count = self.website_count.max(child.website_count);
    }

    fn of<'a>(children: impl Iterator<Item = &'a Totals>) -> Self {
        let mut totals = Totals::default();
        for child in children {
            totals.absorb(child);
        }
        totals
    }
}

/// What a single entity did on a single day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyEntityRecord {
    pub total_time: Duration,
    pub session_count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_active_time: DateTime<Utc>,
    pub metadata: EntityMetadata,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayNode {
    pub totals: Totals,
    pub apps: BTreeMap<String, DailyEntityRecord>,
    pub websites: BTreeMap<String, DailyEntityRecord>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekNode {
    pub totals: Totals,
    pub days: BTreeMap<NaiveDate, DayNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthNode {
    pub totals: Totals,
    pub weeks: BTreeMap<u32, WeekNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearNode {
    pub totals: Totals,
    pub months: BTreeMap<u32, MonthNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    pub years: BTreeMap<i32, YearNode>,
}

/// Position of a day inside the hierarchy. A day stays inside its calendar year and month even
/// when its ISO week belongs to a neighbouring year.
fn coordinates(date: NaiveDate) -> (i32, u32, u32) {
    (date.year(), date.month(), date.iso_week().week())
}

fn daily_record(entity: &TrackedEntity, date: NaiveDate) -> Option<DailyEntityRecord> {
    let total_time = entity.time_for_date(date);
    let session_count = entity.sessions_for_date(date);
    if total_time <= Duration::zero() && session_count == 0 {
        return None;
    }
    Some(DailyEntityRecord {
        total_time,
        session_count,
        first_seen: entity.first_seen,
        last_seen: entity.last_seen,
        last_active_time: entity.last_active_time,
        metadata: entity.metadata.clone(),
    })
}

impl DayNode {
    fn build<'a>(
        date: NaiveDate,
        apps: impl Iterator<Item = &'a TrackedEntity>,
        websites: impl Iterator<Item = &'a TrackedEntity>,
    ) -> Self {
        let apps = apps
            .filter_map(|entity| daily_record(entity, date).map(|v| (entity.key.clone(), v)))
            .collect::<BTreeMap<_, _>>();
        let websites = websites
            .filter_map(|entity| daily_record(entity, date).map(|v| (entity.key.clone(), v)))
            .collect::<BTreeMap<_, _>>();
        let mut day = DayNode {
            totals: Totals::default(),
            apps,
            websites,
        };
        day.recompute();
        day
    }

    /// Day totals come only from the application records, websites are a breakdown of browser
    /// time and would otherwise be counted twice.
    pub fn recompute(&mut self) {
        self.totals = Totals {
            total_time: self
                .apps
                .values()
                .fold(Duration::zero(), |sum, v| sum + v.total_time),
            session_count: self.apps.values().map(|v| v.session_count as u64).sum(),
            app_count: self
                .apps
                .values()
                .filter(|v| v.total_time > Duration::zero())
                .count(),
            website_count: self
                .websites
                .values()
                .filter(|v| v.total_time > Duration::zero())
                .count(),
        };
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty() && self.websites.is_empty()
    }
}

impl Hierarchy {
    /// Builds every day any entity has data for.
    pub fn build<'a>(
        apps: impl Iterator<Item = &'a TrackedEntity> + Clone,
        websites: impl Iterator<Item = &'a TrackedEntity> + Clone,
    ) -> Self {
        let mut days = apps
            .clone()
            .chain(websites.clone())
            .flat_map(|entity| {
                entity
                    .daily_times
                    .keys()
                    .chain(entity.daily_sessions.keys())
                    .copied()
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        days.sort_unstable();
        days.dedup();

        let mut hierarchy = Hierarchy::default();
        for date in days {
            let day = DayNode::build(date, apps.clone(), websites.clone());
            hierarchy.insert_day(date, day);
        }
        hierarchy.aggregate();
        hierarchy
    }

    /// Replaces the bucket of `date` with fresh data and re-aggregates the parents. Other days
    /// are left as they are.
    pub fn rebuild_day<'a>(
        &mut self,
        date: NaiveDate,
        apps: impl Iterator<Item = &'a TrackedEntity>,
        websites: impl Iterator<Item = &'a TrackedEntity>,
    ) {
        let day = DayNode::build(date, apps, websites);
        if day.is_empty() {
            self.remove_day(date);
        } else {
            self.insert_day(date, day);
        }
        self.aggregate();
    }

    fn insert_day(&mut self, date: NaiveDate, day: DayNode) {
        let (year, month, week) = coordinates(date);
        self.years
            .entry(year)
            .or_default()
            .months
            .entry(month)
            .or_default()
            .weeks
            .entry(week)
            .or_default()
            .days
            .insert(date, day);
    }

    fn remove_day(&mut self, date: NaiveDate) {
        let (year, month, week) = coordinates(date);
        let Some(year_node) = self.years.get_mut(&year) else {
            return;
        };
        if let Some(month_node) = year_node.months.get_mut(&month) {
            if let Some(week_node) = month_node.weeks.get_mut(&week) {
                week_node.days.remove(&date);
                if week_node.days.is_empty() {
                    month_node.weeks.remove(&week);
                }
            }
            if month_node.weeks.is_empty() {
                year_node.months.remove(&month);
            }
        }
        if year_node.months.is_empty() {
            self.years.remove(&year);
        }
    }

    /// Recomputes week, month and year totals from the day buckets.
    pub fn aggregate(&mut self) {
        for year in self.years.values_mut() {
            for month in year.months.values_mut() {
                for week in month.weeks.values_mut() {
                    week.totals = Totals::of(week.days.values().map(|v| &v.totals));
                }
                month.totals = Totals::of(month.weeks.values().map(|v| &v.totals));
            }
            year.totals = Totals::of(year.months.values().map(|v| &v.totals));
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayNode> {
        let (year, month, week) = coordinates(date);
        self.years
            .get(&year)?
            .months
            .get(&month)?
            .weeks
            .get(&week)?
            .days
            .get(&date)
    }

    /// Every day bucket. Days are ordered within a week, weeks by their ISO number.
    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &DayNode)> {
        self.years
            .values()
            .flat_map(|year| year.months.values())
            .flat_map(|month| month.weeks.values())
            .flat_map(|week| week.days.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}
