use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. Tracking attributes
/// time using differences of [Clock::time] and buckets it by [Clock::today], so tests can swap in
/// a controllable implementation.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    /// Calendar day used for daily buckets. The user's local day by default.
    fn today(&self) -> NaiveDate {
        self.time().with_timezone(&Local).date_naive()
    }

    fn instant(&self) -> Instant;

    async fn sleep(&self, duration: Duration);

    async fn sleep_until(&self, instant: tokio::time::Instant);
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn sleep_until(&self, instant: tokio::time::Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

#[cfg(test)]
pub mod test_clock {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
    use tokio::time::Instant;

    use super::Clock;

    /// Clock that only moves when told to. Days are bucketed in UTC so tests don't depend on the
    /// machine's timezone.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        pub fn at(start: NaiveDateTime) -> Self {
            Self {
                now: Arc::new(Mutex::new(Utc.from_utc_datetime(&start))),
            }
        }

        pub fn advance(&self, by: chrono::Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }

        pub fn advance_millis(&self, millis: i64) {
            self.advance(chrono::Duration::milliseconds(millis));
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn time(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }

        fn today(&self) -> NaiveDate {
            self.time().date_naive()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    /// Clock following tokio's time, which can be paused and auto-advanced in tests.
    #[derive(Clone)]
    pub struct TokioClock {
        pub start_time: DateTime<Utc>,
        pub reference: Instant,
    }

    impl TokioClock {
        pub fn at(start: NaiveDateTime) -> Self {
            Self {
                start_time: Utc.from_utc_datetime(&start),
                reference: Instant::now(),
            }
        }
    }

    #[async_trait]
    impl Clock for TokioClock {
        fn time(&self) -> DateTime<Utc> {
            self.start_time + self.reference.elapsed()
        }

        fn today(&self) -> NaiveDate {
            self.time().date_naive()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }
}
