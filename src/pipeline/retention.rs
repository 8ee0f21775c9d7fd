// src/pipeline/retention.rs

//! Age window and per-category cap.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};

use crate::models::{Item, RetentionConfig};

/// Outcome of enforcing retention on one category.
#[derive(Debug, Default)]
pub struct Enforced {
    /// Retained items in persisted order
    pub kept: Vec<Item>,
    /// Older than the retention window
    pub expired: Vec<Item>,
    /// Within the window but past the cap
    pub truncated: Vec<Item>,
}

/// Oldest publish time still retained at `now`.
pub fn cutoff(now: DateTime<Utc>, policy: RetentionConfig) -> DateTime<Utc> {
    Duration::try_days(policy.max_age_days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Bucket order: priority ascending, newest first, then id.
pub fn display_order(a: &Item, b: &Item) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| b.published.cmp(&a.published))
        .then_with(|| a.id.cmp(&b.id))
}

/// Drop expired items, order the rest and cut them to the cap.
///
/// An item published exactly at the cutoff is retained.
pub fn enforce(items: Vec<Item>, now: DateTime<Utc>, policy: RetentionConfig) -> Enforced {
    let cutoff = cutoff(now, policy);
    let (mut kept, expired): (Vec<Item>, Vec<Item>) =
        items.into_iter().partition(|item| item.published >= cutoff);

    kept.sort_by(display_order);
    let truncated = if kept.len() > policy.max_items_per_category {
        kept.split_off(policy.max_items_per_category)
    } else {
        Vec::new()
    };

    Enforced {
        kept,
        expired,
        truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::dedup::testing::item;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn boundary_is_inclusive() {
        let policy = RetentionConfig::default();
        let edge = cutoff(now(), policy);
        let items = vec![
            item("edge", 1, edge),
            item("older", 1, edge - Duration::microseconds(1)),
        ];

        let result = enforce(items, now(), policy);

        assert_eq!(result.kept.len(), 1);
        assert_eq!(result.kept[0].id, "edge");
        assert_eq!(result.expired.len(), 1);
        assert_eq!(result.expired[0].id, "older");
    }

    #[test]
    fn cap_keeps_lowest_priority_newest_regardless_of_input_order() {
        let policy = RetentionConfig {
            max_items_per_category: 50,
            max_age_days: 30,
        };
        // 30 items at priority 2, 30 at priority 1, one per hour, shuffled by
        // interleaving.
        let mut items = Vec::new();
        for i in 0..30 {
            let published = now() - Duration::hours(i);
            items.push(item(&format!("p2-{i:02}"), 2, published));
            items.push(item(&format!("p1-{i:02}"), 1, published));
        }
        items.reverse();

        let result = enforce(items, now(), policy);

        assert_eq!(result.kept.len(), 50);
        assert_eq!(result.truncated.len(), 10);
        assert!(result.kept[..30].iter().all(|i| i.priority == 1));
        assert_eq!(result.kept[0].id, "p1-00");
        assert_eq!(result.kept[30].id, "p2-00");
        assert_eq!(result.kept[49].id, "p2-19");
        assert!(result.truncated.iter().all(|i| i.priority == 2));
        assert!(result.kept.windows(2).all(|w| display_order(&w[0], &w[1]).is_lt()));
    }

    #[test]
    fn equal_keys_fall_back_to_id() {
        let items = vec![item("b", 1, now()), item("a", 1, now())];
        let result = enforce(items, now(), RetentionConfig::default());
        let ids: Vec<_> = result.kept.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
