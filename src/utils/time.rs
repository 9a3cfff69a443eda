use chrono::{Datelike, Days, Duration, NaiveDate};

/// This is the standard way of converting a date to a string in screentime.
pub fn date_to_record_name(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Sunday on or before `date`. Weeks in reports start on Sunday.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_sunday() as u64)
}

/// First and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(chrono::Months::new(1))?;
    Some((first, next.pred_opt()?))
}

/// Iterates days between `from` and `to`, both inclusive.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |day| *day <= to)
}

/// Drops everything below a millisecond. Stored durations are kept at this resolution so that
/// their text form is lossless.
pub fn truncate_to_millis(duration: Duration) -> Duration {
    Duration::milliseconds(duration.num_milliseconds())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start_is_sunday() {
        // 2026-10-15 is a Thursday
        assert_eq!(week_start(date(2026, 10, 15)), date(2026, 10, 11));
        assert_eq!(week_start(date(2026, 10, 11)), date(2026, 10, 11));
        assert_eq!(week_start(date(2026, 10, 17)), date(2026, 10, 11));
    }

    #[test]
    fn test_month_bounds_handles_leap_years() {
        assert_eq!(
            month_bounds(2024, 2),
            Some((date(2024, 2, 1), date(2024, 2, 29)))
        );
        assert_eq!(
            month_bounds(2026, 12),
            Some((date(2026, 12, 1), date(2026, 12, 31)))
        );
        assert_eq!(month_bounds(2026, 13), None);
    }

    #[test]
    fn test_days_between_inclusive() {
        let days = days_between(date(2026, 1, 30), date(2026, 2, 2)).collect::<Vec<_>>();
        assert_eq!(days.len(), 4);
        assert_eq!(days[0], date(2026, 1, 30));
        assert_eq!(days[3], date(2026, 2, 2));
        assert_eq!(days_between(date(2026, 2, 2), date(2026, 2, 1)).count(), 0);
    }

    #[test]
    fn test_truncate_to_millis() {
        let value = Duration::nanoseconds(1_234_567_891);
        assert_eq!(truncate_to_millis(value), Duration::milliseconds(1234));
    }
}
