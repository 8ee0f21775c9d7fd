// src/pipeline/run.rs

//! One end-to-end pipeline run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::fetch::{SourceBatch, fetch_all, plan};
use super::merge::{Auxiliary, RunContext, build_snapshot};
use super::report::{CategoryReport, RunReport, SourceOutcome, SourceResult};
use crate::error::Result;
use crate::models::{Config, Item};
use crate::services::{AdapterSet, RelevanceFilter, normalize};
use crate::storage::SnapshotStore;

/// Per-category counters gathered before the merge.
#[derive(Debug, Default)]
struct Intake {
    items: Vec<Item>,
    fetched: usize,
    filtered: usize,
    rejected: usize,
}

/// Fetch, normalize, merge and persist one snapshot.
///
/// Source failures are logged and reported; only a failure to read or
/// write storage is returned as an error.
pub async fn run_pipeline(
    config: &Config,
    adapters: &AdapterSet,
    store: &dyn SnapshotStore,
    aux: Auxiliary,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    log::info!(
        "Gazette run starting: {} sources in {} categories via {}",
        config.source_count(),
        config.categories.len(),
        config.gateway.base_url
    );

    let previous = store.load_snapshot().await?;
    let ctx = RunContext::new(now, previous);

    let batches = fetch_all(
        adapters,
        plan(config),
        config.timeout(),
        config.fetch.max_concurrent,
    )
    .await;

    let mut report = RunReport {
        started_at: Some(now),
        ..RunReport::default()
    };
    let mut intake = collect(config, &ctx, batches, &mut report);

    let fresh: HashMap<String, Vec<Item>> = intake
        .iter_mut()
        .map(|(key, counts)| (key.clone(), std::mem::take(&mut counts.items)))
        .collect();
    let outcome = build_snapshot(&ctx, config, fresh, aux);

    for category in &config.categories {
        let merge = outcome
            .categories
            .get(&category.key)
            .cloned()
            .unwrap_or_default();
        let counts = intake.get(&category.key);
        report.categories.insert(
            category.key.clone(),
            CategoryReport {
                label: category.label.clone(),
                fetched: counts.map_or(0, |c| c.fetched),
                filtered: counts.map_or(0, |c| c.filtered),
                rejected: counts.map_or(0, |c| c.rejected),
                duplicates: merge.duplicates,
                added: merge.added,
                expired: merge.expired,
                truncated: merge.truncated,
                count: merge.count,
            },
        );
    }
    report.dropped_categories = outcome.dropped;

    store.save_snapshot(&outcome.snapshot).await?;

    log::info!(
        "Snapshot saved to {}: {} items, {} new",
        store.snapshot_location(),
        report.total_items(),
        report.total_added()
    );
    Ok(report)
}

/// Filter and normalize fetched entries per category, recording each
/// source's outcome.
fn collect(
    config: &Config,
    ctx: &RunContext,
    batches: Vec<SourceBatch>,
    report: &mut RunReport,
) -> HashMap<String, Intake> {
    let filter = RelevanceFilter::new(&config.relevance);
    let mut intake: HashMap<String, Intake> = HashMap::new();

    for batch in batches {
        let entry = intake.entry(batch.category.clone()).or_default();

        let entries = match batch.result {
            Ok(entries) => {
                report.sources.push(SourceOutcome {
                    source: batch.source.name.clone(),
                    category: batch.category.clone(),
                    result: SourceResult::Ok(entries.len()),
                });
                entries
            }
            Err(failure) => {
                report.sources.push(SourceOutcome {
                    source: batch.source.name.clone(),
                    category: batch.category.clone(),
                    result: SourceResult::Failed(failure),
                });
                continue;
            }
        };

        entry.fetched += entries.len();
        for raw in &entries {
            if batch.source.needs_filter && !filter.accepts(raw) {
                entry.filtered += 1;
                continue;
            }
            match normalize(raw, &batch.source, &batch.category, ctx.now, &config.normalize) {
                Ok(item) => entry.items.push(item),
                Err(reject) => {
                    log::debug!("[{}] dropped '{}': {}", batch.source.name, raw.title, reject);
                    entry.rejected += 1;
                }
            }
        }
    }
    intake
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    use super::*;
    use crate::error::SourceFailure;
    use crate::models::{CategoryBucket, CategoryConfig, ParserHint, Snapshot, SourceConfig};
    use crate::pipeline::dedup::identity;
    use crate::pipeline::fetch::testing::stalled;
    use crate::services::adapters::testing::{StaticGateway, rss, source};

    /// In-memory store.
    #[derive(Default)]
    struct MemoryStore {
        snapshot: Mutex<Option<Snapshot>>,
        fail_writes: bool,
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
            if self.fail_writes {
                return Err(crate::error::AppError::persistence("memory", "read-only"));
            }
            *self.snapshot.lock().unwrap() = Some(snapshot.clone());
            Ok(())
        }

        async fn save_report(&self, _report: &RunReport) -> Result<()> {
            Ok(())
        }

        fn snapshot_location(&self) -> String {
            "memory".to_string()
        }
    }

    const OFFICIAL: &str = "https://touhou-project.news/feed.rss";
    const RANKING: &str = "http://rsshub.test/bilibili/ranking/25/3/1";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn rfc2822(ts: DateTime<Utc>) -> String {
        ts.to_rfc2822()
    }

    fn official_source() -> SourceConfig {
        SourceConfig {
            name: "东方官方资讯站".to_string(),
            ..source(OFFICIAL, ParserHint::Syndication)
        }
    }

    fn config(sources: Vec<SourceConfig>) -> Config {
        let mut config = Config {
            categories: vec![CategoryConfig {
                key: "official".to_string(),
                label: "头版头条".to_string(),
                sources,
            }],
            ..Config::default()
        };
        config.gateway.base_url = "http://rsshub.test".to_string();
        config
    }

    fn entry(title: &str, link: &str, published: DateTime<Utc>) -> String {
        format!(
            "<item><title>{title}</title><link>{link}</link><pubDate>{}</pubDate></item>",
            rfc2822(published)
        )
    }

    #[tokio::test]
    async fn refetch_keeps_existing_and_adds_new() {
        let src = official_source();
        let a_link = "https://touhou-project.news/posts/a";
        let make = |id_link: &str, title: &str, hours: i64| Item {
            id: identity(&src, id_link, title),
            title: title.to_string(),
            link: id_link.to_string(),
            summary: String::new(),
            image: None,
            source: src.name.clone(),
            source_icon: String::new(),
            category: "official".to_string(),
            priority: 1,
            published: now() - Duration::hours(hours),
            fetched_at: now() - Duration::hours(hours),
        };
        let a = make(a_link, "a", 3);
        let b = make("https://touhou-project.news/posts/b", "b", 5);

        let mut previous = Snapshot::default();
        previous.categories.insert(
            "official".to_string(),
            CategoryBucket::new("头版头条", vec![a.clone(), b.clone()]),
        );
        let store = MemoryStore {
            snapshot: Mutex::new(Some(previous)),
            ..MemoryStore::default()
        };

        let body = rss(&format!(
            "{}{}",
            entry("a (edited)", &format!("{a_link}?utm_source=rss"), now()),
            entry("c", "https://touhou-project.news/posts/c", now() - Duration::hours(1)),
        ));
        let gateway = Arc::new(StaticGateway::default().with_body(OFFICIAL, &body));
        let adapters = AdapterSet::new(gateway);

        let report = run_pipeline(
            &config(vec![src.clone()]),
            &adapters,
            &store,
            Auxiliary::default(),
            now(),
        )
        .await
        .unwrap();

        let saved = store.snapshot.lock().unwrap().clone().unwrap();
        let bucket = &saved.categories["official"];
        assert_eq!(bucket.count, 3);
        assert!(bucket.items.contains(&a));
        assert!(bucket.items.contains(&b));
        assert!(bucket.items.iter().any(|i| i.title == "c"));
        assert!(!bucket.items.iter().any(|i| i.title == "a (edited)"));

        let official = &report.categories["official"];
        assert_eq!(official.fetched, 2);
        assert_eq!(official.duplicates, 1);
        assert_eq!(official.added.len(), 1);
    }

    #[tokio::test]
    async fn failing_source_does_not_fail_run() {
        let body = rss(&entry("Reimu news", "https://b.example/1", now()));
        let gateway = Arc::new(StaticGateway::default().with_body(OFFICIAL, &body));
        let adapters =
            AdapterSet::new(gateway).with_adapter(ParserHint::WikiChanges, stalled());

        let mut config = config(vec![
            source("https://stalled.example/feed", ParserHint::WikiChanges),
            official_source(),
        ]);
        config.fetch.timeout_secs = 1;
        let store = MemoryStore::default();

        let report = run_pipeline(&config, &adapters, &store, Auxiliary::default(), now())
            .await
            .unwrap();

        assert_eq!(report.failed_sources().count(), 1);
        assert_eq!(
            report.sources[0].result,
            SourceResult::Failed(SourceFailure::Timeout)
        );
        let saved = store.snapshot.lock().unwrap().clone().unwrap();
        assert_eq!(saved.categories["official"].count, 1);
        assert_eq!(saved.categories["official"].items[0].title, "Reimu news");
    }

    #[tokio::test]
    async fn report_reads_only_the_run_clock() {
        let body = rss(&entry("Reimu news", "https://b.example/1", now()));
        let gateway = Arc::new(StaticGateway::default().with_body(OFFICIAL, &body));
        let adapters = AdapterSet::new(gateway);
        let store = MemoryStore::default();

        let report = run_pipeline(
            &config(vec![official_source()]),
            &adapters,
            &store,
            Auxiliary::default(),
            now(),
        )
        .await
        .unwrap();

        assert_eq!(report.started_at, Some(now()));
        assert!(report.finished_at.is_none());
        let saved = store.snapshot.lock().unwrap().clone().unwrap();
        assert_eq!(saved.meta.updated_at, Some(now()));
    }

    #[tokio::test]
    async fn filtered_and_rejected_entries_are_counted() {
        let body = rss(&format!(
            "{}{}{}",
            entry("【东方MMD】魔理沙", "https://www.bilibili.com/video/BV1", now()),
            entry("猫咪合集", "https://www.bilibili.com/video/BV2", now()),
            entry("灵梦 but no link", "", now()),
        ));
        let gateway = Arc::new(StaticGateway::default().with_body(RANKING, &body));
        let ranking = SourceConfig {
            needs_filter: true,
            ..source("{gateway}/bilibili/ranking/25/3/1", ParserHint::Syndication)
        };
        let store = MemoryStore::default();

        let report = run_pipeline(
            &config(vec![ranking]),
            &AdapterSet::new(gateway),
            &store,
            Auxiliary::default(),
            now(),
        )
        .await
        .unwrap();

        let official = &report.categories["official"];
        assert_eq!(official.fetched, 3);
        assert_eq!(official.filtered, 1);
        assert_eq!(official.rejected, 1);
        assert_eq!(official.count, 1);
    }

    #[tokio::test]
    async fn second_identical_run_is_idempotent() {
        let body = rss(&format!(
            "{}{}",
            entry("one", "https://touhou-project.news/1", now() - Duration::hours(1)),
            entry("two", "https://touhou-project.news/2", now() - Duration::hours(2)),
        ));
        let gateway = Arc::new(StaticGateway::default().with_body(OFFICIAL, &body));
        let adapters = AdapterSet::new(gateway);
        let config = config(vec![official_source()]);
        let store = MemoryStore::default();

        run_pipeline(&config, &adapters, &store, Auxiliary::default(), now())
            .await
            .unwrap();
        let first = store.snapshot.lock().unwrap().clone().unwrap();

        let later = now() + Duration::minutes(5);
        let report = run_pipeline(&config, &adapters, &store, Auxiliary::default(), later)
            .await
            .unwrap();
        let second = store.snapshot.lock().unwrap().clone().unwrap();

        assert_eq!(first.categories, second.categories);
        assert_eq!(report.total_added(), 0);
        assert_eq!(report.categories["official"].duplicates, 2);
    }

    #[tokio::test]
    async fn auxiliary_blocks_are_persisted() {
        let gateway = Arc::new(StaticGateway::default());
        let store = MemoryStore::default();
        let aux = Auxiliary {
            weather: Some(json!({"condition": "快晴"})),
            ads: Some(json!([{"id": "ad_kappa"}])),
        };

        run_pipeline(
            &config(vec![official_source()]),
            &AdapterSet::new(gateway),
            &store,
            aux,
            now(),
        )
        .await
        .unwrap();

        let saved = store.snapshot.lock().unwrap().clone().unwrap();
        assert_eq!(saved.weather["condition"], "快晴");
        assert_eq!(saved.ads[0]["id"], "ad_kappa");
        assert_eq!(saved.categories["official"].count, 0);
    }

    #[tokio::test]
    async fn write_failure_is_an_error() {
        let store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };
        let result = run_pipeline(
            &config(vec![official_source()]),
            &AdapterSet::new(Arc::new(StaticGateway::default())),
            &store,
            Auxiliary::default(),
            now(),
        )
        .await;
        assert!(result.is_err());
    }
}
