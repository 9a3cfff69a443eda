use anyhow::Result;

use crate::{
    store::{entity::Category, SharedStore},
    window_api::domain::normalize_domain,
};

#[derive(Debug, Clone, clap::Args)]
#[group(required = true, multiple = false)]
pub struct ResetTarget {
    #[arg(long, help = "Remove all tracked usage")]
    pub all: bool,
    #[arg(long, value_name = "NAME", help = "Remove usage of an application, e.g. firefox")]
    pub app: Option<String>,
    #[arg(long, value_name = "DOMAIN", help = "Remove usage of a website, e.g. github.com")]
    pub website: Option<String>,
}

impl ResetTarget {
    /// `None` means everything.
    fn entity(&self) -> Option<(Category, String)> {
        if let Some(app) = &self.app {
            Some((Category::Application, app.clone()))
        } else {
            self.website.as_ref().map(|website| {
                let key = normalize_domain(website).unwrap_or_else(|| website.clone());
                (Category::Website, key)
            })
        }
    }
}

/// Applies the reset and saves the result. Returns whether anything was removed.
pub async fn apply_reset(store: &SharedStore, target: &ResetTarget) -> Result<bool> {
    let mut store = store.lock().await;
    match target.entity() {
        Some((category, key)) => store.reset_entity(category, &key).await,
        None => {
            store.reset_all().await?;
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
    use tempfile::tempdir;

    use crate::{
        daemon::load_store,
        store::entity::{Category, EntityMetadata},
        utils::clock::test_clock::ManualClock,
    };

    use super::{apply_reset, ResetTarget};

    const TEST_START_DATE: NaiveDateTime =
        NaiveDateTime::new(NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(), NaiveTime::MIN);

    fn target(app: Option<&str>, website: Option<&str>) -> ResetTarget {
        ResetTarget {
            all: app.is_none() && website.is_none(),
            app: app.map(String::from),
            website: website.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_reset_entities_from_saved_usage() -> Result<()> {
        let dir = tempdir()?;
        let clock = Arc::new(ManualClock::at(TEST_START_DATE));
        {
            let store = load_store(dir.path().to_path_buf(), clock.clone()).await;
            let mut store = store.lock().await;
            for (category, key) in [
                (Category::Application, "code"),
                (Category::Application, "firefox"),
                (Category::Website, "github.com"),
            ] {
                store.ensure_entity(category, key, EntityMetadata::empty(category));
                store.record_elapsed(category, key, Duration::minutes(5));
            }
            store.rebuild_hierarchy();
            store.persist().await?;
        }

        let store = load_store(dir.path().to_path_buf(), clock.clone()).await;
        assert!(apply_reset(&store, &target(Some("code"), None)).await?);
        assert!(!apply_reset(&store, &target(Some("code"), None)).await?);
        // Accepts what a browser shows.
        assert!(apply_reset(&store, &target(None, Some("https://www.github.com/rust-lang"))).await?);

        let reloaded = load_store(dir.path().to_path_buf(), clock.clone()).await;
        let reloaded = reloaded.lock().await;
        let apps = reloaded.apps().map(|v| v.key.as_str()).collect::<Vec<_>>();
        assert_eq!(apps, vec!["firefox"]);
        assert_eq!(reloaded.websites().count(), 0);

        apply_reset(&store, &target(None, None)).await?;
        let reloaded = load_store(dir.path().to_path_buf(), clock).await;
        assert_eq!(reloaded.lock().await.apps().count(), 0);
        Ok(())
    }
}
