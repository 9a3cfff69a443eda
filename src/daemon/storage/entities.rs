//! Structs used for storing data on the disk. They mirror the hierarchy of
//! [Hierarchy](crate::store::hierarchy::Hierarchy) but are kept separate so that the file layout
//! doesn't change whenever the in-memory model does.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{
    entity::EntityMetadata,
    hierarchy::{DailyEntityRecord, DayNode, Hierarchy, MonthNode, Totals, WeekNode, YearNode},
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntity {
    #[serde(default)]
    pub years: BTreeMap<i32, YearEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearEntity {
    #[serde(with = "duration_ser")]
    pub total_time: Duration,
    pub session_count: u64,
    pub app_count: usize,
    pub website_count: usize,
    #[serde(default)]
    pub months: BTreeMap<u32, MonthEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthEntity {
    #[serde(with = "duration_ser")]
    pub total_time: Duration,
    pub session_count: u64,
    pub app_count: usize,
    pub website_count: usize,
    #[serde(default)]
    pub weeks: BTreeMap<u32, WeekEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekEntity {
    #[serde(with = "duration_ser")]
    pub total_time: Duration,
    pub session_count: u64,
    pub app_count: usize,
    pub website_count: usize,
    #[serde(default)]
    pub days: BTreeMap<NaiveDate, DayEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntity {
    #[serde(with = "duration_ser")]
    pub total_time: Duration,
    pub session_count: u64,
    pub app_count: usize,
    pub website_count: usize,
    #[serde(default)]
    pub apps: BTreeMap<String, UsageEntity>,
    #[serde(default)]
    pub websites: BTreeMap<String, UsageEntity>,
}

/// Usage of one application or website during one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEntity {
    #[serde(with = "duration_ser")]
    pub total_time: Duration,
    pub session_count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_active_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
}

impl SnapshotEntity {
    /// Every stored day. Days are ordered within a week, weeks by their ISO number, so December
    /// days of ISO week 1 come first within their month.
    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &DayEntity)> {
        self.years
            .values()
            .flat_map(|year| year.months.values())
            .flat_map(|month| month.weeks.values())
            .flat_map(|week| week.days.iter())
    }
}

impl UsageEntity {
    /// Metadata of a stored application record.
    pub fn application_metadata(&self) -> EntityMetadata {
        EntityMetadata::Application {
            process_path: self.process_path.clone().unwrap_or_default(),
        }
    }

    /// Metadata of a stored website record.
    pub fn website_metadata(&self) -> EntityMetadata {
        EntityMetadata::Website {
            favicon_url: self.favicon_url.clone(),
        }
    }
}

impl From<&DailyEntityRecord> for UsageEntity {
    fn from(record: &DailyEntityRecord) -> Self {
        let (process_path, favicon_url) = match &record.metadata {
            EntityMetadata::Application { process_path } => (Some(process_path.clone()), None),
            EntityMetadata::Website { favicon_url } => (None, favicon_url.clone()),
        };
        Self {
            total_time: record.total_time,
            session_count: record.session_count,
            first_seen: record.first_seen,
            last_seen: record.last_seen,
            last_active_time: record.last_active_time,
            process_path,
            favicon_url,
        }
    }
}

fn records(map: &BTreeMap<String, DailyEntityRecord>) -> BTreeMap<String, UsageEntity> {
    map.iter()
        .map(|(key, record)| (key.clone(), record.into()))
        .collect()
}

impl From<&DayNode> for DayEntity {
    fn from(day: &DayNode) -> Self {
        let Totals {
            total_time,
            session_count,
            app_count,
            website_count,
        } = day.totals;
        Self {
            total_time,
            session_count,
            app_count,
            website_count,
            apps: records(&day.apps),
            websites: records(&day.websites),
        }
    }
}

impl From<&WeekNode> for WeekEntity {
    fn from(week: &WeekNode) -> Self {
        Self {
            total_time: week.totals.total_time,
            session_count: week.totals.session_count,
            app_count: week.totals.app_count,
            website_count: week.totals.website_count,
            days: week.days.iter().map(|(k, v)| (*k, v.into())).collect(),
        }
    }
}

impl From<&MonthNode> for MonthEntity {
    fn from(month: &MonthNode) -> Self {
        Self {
            total_time: month.totals.total_time,
            session_count: month.totals.session_count,
            app_count: month.totals.app_count,
            website_count: month.totals.website_count,
            weeks: month.weeks.iter().map(|(k, v)| (*k, v.into())).collect(),
        }
    }
}

impl From<&YearNode> for YearEntity {
    fn from(year: &YearNode) -> Self {
        Self {
            total_time: year.totals.total_time,
            session_count: year.totals.session_count,
            app_count: year.totals.app_count,
            website_count: year.totals.website_count,
            months: year.months.iter().map(|(k, v)| (*k, v.into())).collect(),
        }
    }
}

impl From<&Hierarchy> for SnapshotEntity {
    fn from(hierarchy: &Hierarchy) -> Self {
        Self {
            years: hierarchy
                .years
                .iter()
                .map(|(k, v)| (*k, v.into()))
                .collect(),
        }
    }
}

/// Durations are written as `d.hh:mm:ss.fff`, for example `1.02:03:04.005`.
pub(crate) mod duration_ser {
    use anyhow::{anyhow, Result};
    use chrono::Duration;
    use serde::{self, de::Error, Deserialize, Deserializer, Serializer};

    pub fn format_span(duration: &Duration) -> String {
        let millis = duration.num_milliseconds();
        let sign = if millis < 0 { "-" } else { "" };
        let millis = millis.unsigned_abs();
        let days = millis / 86_400_000;
        let hours = millis / 3_600_000 % 24;
        let minutes = millis / 60_000 % 60;
        let seconds = millis / 1000 % 60;
        let fraction = millis % 1000;
        format!("{sign}{days}.{hours:02}:{minutes:02}:{seconds:02}.{fraction:03}")
    }

    pub fn parse_span(value: &str) -> Result<Duration> {
        let (negative, value) = match value.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let (days, clock) = value
            .split_once('.')
            .filter(|(days, _)| !days.contains(':'))
            .unwrap_or(("0", value));
        let (clock, fraction) = clock.rsplit_once('.').unwrap_or((clock, "0"));
        let mut parts = clock.split(':');
        let (Some(hours), Some(minutes), Some(seconds), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(anyhow!("Can't parse {value} into a time span"));
        };
        if fraction.len() > 3 {
            return Err(anyhow!("Time span {value} is more precise than milliseconds"));
        }
        let fraction = format!("{fraction:0<3}");

        let millis = [
            (days, 86_400_000),
            (hours, 3_600_000),
            (minutes, 60_000),
            (seconds, 1000),
            (fraction.as_str(), 1),
        ]
        .into_iter()
        .try_fold(0i64, |total, (part, unit)| -> Result<i64> {
            part.parse::<i64>()?
                .checked_mul(unit)
                .and_then(|part| total.checked_add(part))
                .ok_or_else(|| anyhow!("Time span {value} is too long"))
        })?;
        let duration = Duration::try_milliseconds(millis)
            .ok_or_else(|| anyhow!("Time span {value} is too long"))?;
        Ok(if negative { -duration } else { duration })
    }

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_span(duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_span(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::duration_ser::{format_span, parse_span};

    #[test]
    fn test_format_span() {
        assert_eq!(format_span(&Duration::zero()), "0.00:00:00.000");
        assert_eq!(
            format_span(
                &(Duration::days(1)
                    + Duration::hours(2)
                    + Duration::minutes(3)
                    + Duration::seconds(4)
                    + Duration::milliseconds(5))
            ),
            "1.02:03:04.005"
        );
        assert_eq!(format_span(&Duration::hours(49)), "2.01:00:00.000");
    }

    #[test]
    fn test_parse_span_accepts_short_forms() -> anyhow::Result<()> {
        assert_eq!(parse_span("00:00:30")?, Duration::seconds(30));
        assert_eq!(parse_span("01:00:00.5")?, Duration::milliseconds(3_600_500));
        assert_eq!(parse_span("3.00:00:00")?, Duration::days(3));
        assert_eq!(parse_span("-0.00:00:01.000")?, Duration::seconds(-1));
        Ok(())
    }

    #[test]
    fn test_parse_span_rejects_garbage() {
        assert!(parse_span("").is_err());
        assert!(parse_span("12:00").is_err());
        assert!(parse_span("a.00:00:00").is_err());
        assert!(parse_span("00:00:00.1234").is_err());
        assert!(parse_span("99999999999999.00:00:00.000").is_err());
        assert!(parse_span("0.9223372036854775807:00:00.000").is_err());
    }

    #[test]
    fn test_span_text_is_lossless_for_millis() -> anyhow::Result<()> {
        let value = Duration::milliseconds(987_654_321);
        assert_eq!(parse_span(&format_span(&value))?, value);
        Ok(())
    }
}
