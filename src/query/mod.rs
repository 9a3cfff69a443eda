//! Period based aggregation over tracked entities. Everything here is a pure function of the
//! entities and the date treated as today.

use std::fmt::Display;

use chrono::{Datelike, Days, Duration, NaiveDate};
use clap::ValueEnum;

use crate::{
    store::{
        entity::{Category, TrackedEntity},
        TimeSeriesStore,
    },
    utils::time::{days_between, month_bounds, week_start},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Period {
    Today,
    Yesterday,
    /// Sunday to Saturday of the current week.
    ThisWeek,
    LastWeek,
    ThisMonth,
    AllTime,
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Today => write!(f, "today"),
            Period::Yesterday => write!(f, "yesterday"),
            Period::ThisWeek => write!(f, "this week"),
            Period::LastWeek => write!(f, "last week"),
            Period::ThisMonth => write!(f, "this month"),
            Period::AllTime => write!(f, "all time"),
        }
    }
}

impl Period {
    /// Inclusive range of days covered by the period. `None` means no bound.
    pub fn range(&self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        match self {
            Period::Today => Some((today, today)),
            Period::Yesterday => {
                let yesterday = today.pred_opt()?;
                Some((yesterday, yesterday))
            }
            Period::ThisWeek => {
                let start = week_start(today);
                Some((start, start.checked_add_days(Days::new(6))?))
            }
            Period::LastWeek => {
                let start = week_start(today).checked_sub_days(Days::new(7))?;
                Some((start, start.checked_add_days(Days::new(6))?))
            }
            Period::ThisMonth => month_bounds(today.year(), today.month()),
            Period::AllTime => None,
        }
    }
}

/// Sum of the week starting on `start`. Missing days count as zero.
pub fn week_total(entity: &TrackedEntity, start: NaiveDate) -> Duration {
    let end = start + Days::new(6);
    days_between(start, end).fold(Duration::zero(), |sum, day| {
        sum + entity.time_for_date(day)
    })
}

pub fn month_total(entity: &TrackedEntity, year: i32, month: u32) -> Duration {
    let Some((start, end)) = month_bounds(year, month) else {
        return Duration::zero();
    };
    days_between(start, end).fold(Duration::zero(), |sum, day| {
        sum + entity.time_for_date(day)
    })
}

/// Time an entity accumulated during the period.
pub fn entity_time(entity: &TrackedEntity, period: Period, today: NaiveDate) -> Duration {
    match period {
        Period::Today | Period::Yesterday => period
            .range(today)
            .map(|(day, _)| entity.time_for_date(day))
            .unwrap_or_else(Duration::zero),
        Period::ThisWeek | Period::LastWeek => period
            .range(today)
            .map(|(start, _)| week_total(entity, start))
            .unwrap_or_else(Duration::zero),
        Period::ThisMonth => month_total(entity, today.year(), today.month()),
        Period::AllTime => entity.total_time,
    }
}

fn entity_sessions(entity: &TrackedEntity, period: Period, today: NaiveDate) -> u64 {
    match period.range(today) {
        Some((from, to)) => entity.sessions_between(from, to),
        None => entity.session_count,
    }
}

fn entity_active(entity: &TrackedEntity, period: Period, today: NaiveDate) -> bool {
    match period.range(today) {
        Some((from, to)) => entity.active_between(from, to),
        None => entity.daily_times.values().any(|v| *v > Duration::zero()),
    }
}

pub fn total_time<'a>(
    entities: impl IntoIterator<Item = &'a TrackedEntity>,
    period: Period,
    today: NaiveDate,
) -> Duration {
    entities
        .into_iter()
        .fold(Duration::zero(), |sum, entity| {
            sum + entity_time(entity, period, today)
        })
}

/// Number of times focus moved into any of the entities during the period.
pub fn total_switches<'a>(
    entities: impl IntoIterator<Item = &'a TrackedEntity>,
    period: Period,
    today: NaiveDate,
) -> u64 {
    entities
        .into_iter()
        .map(|entity| entity_sessions(entity, period, today))
        .sum()
}

/// Entities with time on at least one day of the period.
pub fn distinct_entity_count<'a>(
    entities: impl IntoIterator<Item = &'a TrackedEntity>,
    period: Period,
    today: NaiveDate,
) -> usize {
    entities
        .into_iter()
        .filter(|entity| entity_active(entity, period, today))
        .count()
}

/// Entities with their time during the period, longest first. Entities without time are left
/// out.
pub fn ranked<'a>(
    entities: impl IntoIterator<Item = &'a TrackedEntity>,
    period: Period,
    today: NaiveDate,
) -> Vec<(&'a TrackedEntity, Duration)> {
    let mut usages = entities
        .into_iter()
        .map(|entity| (entity, entity_time(entity, period, today)))
        .filter(|(_, time)| *time > Duration::zero())
        .collect::<Vec<_>>();
    usages.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.key.cmp(&b.0.key)));
    usages
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategorySummary {
    pub total_time: Duration,
    pub switches: u64,
    pub distinct: usize,
}

impl CategorySummary {
    pub fn compute<'a>(
        entities: impl IntoIterator<Item = &'a TrackedEntity> + Clone,
        period: Period,
        today: NaiveDate,
    ) -> Self {
        Self {
            total_time: total_time(entities.clone(), period, today),
            switches: total_switches(entities.clone(), period, today),
            distinct: distinct_entity_count(entities, period, today),
        }
    }
}

/// All aggregates of a period for applications and websites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodSummary {
    pub period: Period,
    pub today: NaiveDate,
    pub apps: CategorySummary,
    pub websites: CategorySummary,
}

impl PeriodSummary {
    pub fn compute(store: &TimeSeriesStore, period: Period) -> Self {
        let today = store.clock().today();
        Self {
            period,
            today,
            apps: CategorySummary::compute(store.entities(Category::Application), period, today),
            websites: CategorySummary::compute(store.entities(Category::Website), period, today),
        }
    }

    pub fn of(&self, category: Category) -> &CategorySummary {
        match category {
            Category::Application => &self.apps,
            Category::Website => &self.websites,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

    use crate::store::entity::{EntityMetadata, TrackedEntity};

    use super::*;

    // A Thursday.
    const TODAY: NaiveDate = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entity(key: &str, days: &[(NaiveDate, i64, u32)]) -> TrackedEntity {
        let created = NaiveDateTime::new(date(2026, 9, 1), NaiveTime::MIN);
        let mut entity = TrackedEntity::new(
            key,
            EntityMetadata::Application {
                process_path: String::new(),
            },
            Utc.from_utc_datetime(&created),
        );
        for (day, minutes, sessions) in days {
            entity.add_time(*day, Duration::minutes(*minutes));
            for _ in 0..*sessions {
                entity.add_session(*day);
            }
        }
        entity
    }

    #[test]
    fn test_period_ranges() {
        assert_eq!(Period::Today.range(TODAY), Some((TODAY, TODAY)));
        assert_eq!(
            Period::Yesterday.range(TODAY),
            Some((date(2026, 10, 14), date(2026, 10, 14)))
        );
        assert_eq!(
            Period::ThisWeek.range(TODAY),
            Some((date(2026, 10, 11), date(2026, 10, 17)))
        );
        assert_eq!(
            Period::LastWeek.range(TODAY),
            Some((date(2026, 10, 4), date(2026, 10, 10)))
        );
        assert_eq!(
            Period::ThisMonth.range(TODAY),
            Some((date(2026, 10, 1), date(2026, 10, 31)))
        );
        assert_eq!(Period::AllTime.range(TODAY), None);
    }

    #[test]
    fn test_this_week_sums_days_so_far() {
        let monday = date(2026, 10, 12);
        let wednesday = date(2026, 10, 14);
        let entities = [entity("a", &[(monday, 10, 1), (wednesday, 20, 1)])];
        assert_eq!(
            total_time(&entities, Period::ThisWeek, TODAY),
            Duration::minutes(30)
        );
        assert_eq!(total_time(&entities, Period::Today, TODAY), Duration::zero());
        assert_eq!(
            total_time(&entities, Period::Yesterday, TODAY),
            Duration::minutes(20)
        );
    }

    #[test]
    fn test_week_boundaries() {
        let saturday_before = date(2026, 10, 10);
        let sunday = date(2026, 10, 11);
        let entities = [entity("a", &[(saturday_before, 5, 2), (sunday, 7, 1)])];
        assert_eq!(
            total_time(&entities, Period::ThisWeek, TODAY),
            Duration::minutes(7)
        );
        assert_eq!(
            total_time(&entities, Period::LastWeek, TODAY),
            Duration::minutes(5)
        );
        assert_eq!(total_switches(&entities, Period::LastWeek, TODAY), 2);
        assert_eq!(total_switches(&entities, Period::ThisWeek, TODAY), 1);
    }

    #[test]
    fn test_month_and_all_time() {
        let entities = [
            entity("a", &[(date(2026, 9, 30), 60, 1), (date(2026, 10, 1), 15, 1)]),
            entity("b", &[(date(2026, 10, 15), 5, 3)]),
        ];
        assert_eq!(
            total_time(&entities, Period::ThisMonth, TODAY),
            Duration::minutes(20)
        );
        assert_eq!(
            total_time(&entities, Period::AllTime, TODAY),
            Duration::minutes(80)
        );
        assert_eq!(total_switches(&entities, Period::AllTime, TODAY), 5);
        assert_eq!(total_switches(&entities, Period::ThisMonth, TODAY), 4);
    }

    #[test]
    fn test_distinct_entity_count() {
        let entities = [
            entity("a", &[(date(2026, 10, 12), 10, 1)]),
            entity("b", &[(date(2026, 10, 13), 10, 1)]),
            // Activated but never accrued time.
            entity("c", &[(date(2026, 10, 13), 0, 1)]),
            entity("d", &[(date(2026, 9, 2), 10, 1)]),
        ];
        assert_eq!(distinct_entity_count(&entities, Period::ThisWeek, TODAY), 2);
        assert_eq!(distinct_entity_count(&entities, Period::Today, TODAY), 0);
        assert_eq!(distinct_entity_count(&entities, Period::AllTime, TODAY), 3);
    }

    #[test]
    fn test_ranked_orders_by_time() {
        let monday = date(2026, 10, 12);
        let entities = [
            entity("short", &[(monday, 1, 1)]),
            entity("long", &[(monday, 30, 1)]),
            entity("idle", &[]),
        ];
        let ranked = ranked(&entities, Period::ThisWeek, TODAY);
        let keys = ranked.iter().map(|(v, _)| v.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["long", "short"]);
        assert_eq!(ranked[0].1, Duration::minutes(30));
    }

    #[test]
    fn test_week_and_month_helpers() {
        let entity = entity(
            "a",
            &[(date(2026, 2, 1), 10, 0), (date(2026, 2, 28), 10, 0), (date(2026, 3, 1), 10, 0)],
        );
        assert_eq!(month_total(&entity, 2026, 2), Duration::minutes(20));
        assert_eq!(month_total(&entity, 2026, 13), Duration::zero());
        assert_eq!(week_total(&entity, date(2026, 2, 22)), Duration::minutes(10));
    }
}
