//! Consumption summaries.
//!
//! Items created within a date range are grouped by name and summed per fixed
//! time bucket. For each item name the buckets run contiguously from its first
//! to its last non-empty bucket, with the gaps reported as zero.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use shoplist_core::Granularity;

use super::ServiceError;
use crate::db::Store;
use crate::models::{Identity, Item};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Most buckets a range may span at the requested granularity (a week of minutes).
pub const MAX_BUCKETS: i64 = 7 * 24 * 60;

/// One `(item name, bucket)` total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub item_name: String,
    pub bucket_start: DateTime<Utc>,
    pub quantity: u64,
}

/// Validated summary parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub granularity: Granularity,
}

impl SummaryQuery {
    /// Parse `YYYY-MM-DD` dates and an optional granularity name (default hour).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Invalid` for malformed dates, a start after the
    /// end, or a range wider than [`MAX_BUCKETS`] buckets, and
    /// `ServiceError::Granularity` for an unknown granularity.
    pub fn parse(start: &str, end: &str, granularity: Option<&str>) -> Result<Self, ServiceError> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if start > end {
            return Err(ServiceError::Invalid(
                "Start date must not be after end date!".to_owned(),
            ));
        }

        let granularity = match granularity {
            Some(name) => name.parse()?,
            None => Granularity::default(),
        };

        let query = Self {
            start,
            end,
            granularity,
        };
        let buckets = (query.upper_bound() - query.lower_bound()).num_seconds()
            / granularity.step().num_seconds();
        if buckets > MAX_BUCKETS {
            return Err(ServiceError::Invalid(format!(
                "Date range too large for {granularity} aggregation!"
            )));
        }

        Ok(query)
    }

    /// Exclusive lower bound: the start date at 00:00 UTC.
    #[must_use]
    pub fn lower_bound(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// Exclusive upper bound: the end date at 00:00 UTC.
    #[must_use]
    pub fn upper_bound(&self) -> DateTime<Utc> {
        self.end.and_time(NaiveTime::MIN).and_utc()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, ServiceError> {
    let invalid = || ServiceError::Invalid("Incorrect date format, should be YYYY-MM-DD".to_owned());

    // chrono accepts unpadded fields; the wire format does not
    let well_formed = value.len() == 10
        && value
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

/// Bucket and sum items.
///
/// Rows are ordered by item name, then bucket start.
#[must_use]
pub fn summarize(items: &[Item], granularity: Granularity) -> Vec<SummaryRow> {
    let mut totals: BTreeMap<&str, BTreeMap<DateTime<Utc>, u64>> = BTreeMap::new();
    for item in items {
        *totals
            .entry(item.name.as_str())
            .or_default()
            .entry(granularity.bucket_start(item.created_at))
            .or_default() += u64::from(item.quantity.get());
    }

    let step = granularity.step();
    let mut rows = Vec::new();
    for (name, buckets) in totals {
        let (Some((&first, _)), Some((&last, _))) =
            (buckets.first_key_value(), buckets.last_key_value())
        else {
            continue;
        };

        let mut bucket = first;
        while bucket <= last {
            rows.push(SummaryRow {
                item_name: name.to_owned(),
                bucket_start: bucket,
                quantity: buckets.get(&bucket).copied().unwrap_or(0),
            });
            bucket += step;
        }
    }
    rows
}

/// Analytics service.
pub struct AnalyticsService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> AnalyticsService<'a, S> {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Summarize the caller's items created strictly inside the query range.
    ///
    /// A caller without lists, or without items in range, gets an empty result.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn summary(
        &self,
        owner: &Identity,
        query: &SummaryQuery,
    ) -> Result<Vec<SummaryRow>, ServiceError> {
        let (start, end) = (query.lower_bound(), query.upper_bound());

        let mut items = Vec::new();
        for list in self.store.lists_for(owner.user_id).await? {
            items.extend(self.store.items_created_between(list.id, start, end).await?);
        }

        let rows = summarize(&items, query.granularity);
        tracing::debug!(
            user_id = %owner.user_id,
            items = items.len(),
            rows = rows.len(),
            granularity = %query.granularity,
            "Summary computed"
        );
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::TimeZone;
    use serde_json::json;
    use shoplist_core::{ItemId, ListId, Quantity};

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::items::{ItemInput, ItemService};
    use crate::services::lists::ListService;
    use crate::testing::seed_identity;

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, d, h, m, 0).unwrap()
    }

    fn item(name: &str, quantity: i64, created_at: DateTime<Utc>) -> Item {
        Item {
            id: ItemId::new(1),
            list_id: ListId::new(1),
            name: name.to_owned(),
            quantity: Quantity::new(quantity).unwrap(),
            created_at,
            updated_at: created_at,
        }
    }

    fn row(name: &str, bucket_start: DateTime<Utc>, quantity: u64) -> SummaryRow {
        SummaryRow {
            item_name: name.to_owned(),
            bucket_start,
            quantity,
        }
    }

    #[test]
    fn test_hourly_bucket_sums() {
        let items = [item("Milk", 2, at(1, 10, 5)), item("Milk", 3, at(1, 10, 40))];
        assert_eq!(
            summarize(&items, Granularity::Hour),
            vec![row("Milk", at(1, 10, 0), 5)]
        );
    }

    #[test]
    fn test_daily_bucket_sums() {
        let items = [item("Milk", 2, at(1, 10, 5)), item("Milk", 3, at(1, 10, 40))];
        assert_eq!(
            summarize(&items, Granularity::Day),
            vec![row("Milk", at(1, 0, 0), 5)]
        );
    }

    #[test]
    fn test_gaps_are_zero_filled_per_item() {
        let items = [
            item("Milk", 1, at(1, 9, 0)),
            item("Bread", 4, at(1, 12, 30)),
            item("Milk", 2, at(1, 11, 59)),
        ];
        assert_eq!(
            summarize(&items, Granularity::Hour),
            vec![
                row("Bread", at(1, 12, 0), 4),
                row("Milk", at(1, 9, 0), 1),
                row("Milk", at(1, 10, 0), 0),
                row("Milk", at(1, 11, 0), 2),
            ]
        );
    }

    #[test]
    fn test_summarize_nothing() {
        assert!(summarize(&[], Granularity::Minute).is_empty());
    }

    #[test]
    fn test_query_parse() {
        let query = SummaryQuery::parse("2021-03-01", "2021-03-02", None).unwrap();
        assert_eq!(query.granularity, Granularity::Hour);
        assert_eq!(query.lower_bound(), at(1, 0, 0));
        assert_eq!(query.upper_bound(), at(2, 0, 0));

        let query = SummaryQuery::parse("2021-03-01", "2021-03-01", Some("day")).unwrap();
        assert_eq!(query.granularity, Granularity::Day);
    }

    #[test]
    fn test_query_parse_rejects_bad_input() {
        for (start, end) in [
            ("2021-3-1", "2021-03-02"),
            ("01-03-2021", "2021-03-02"),
            ("2021-03-01", "2021-02-30"),
            ("2021-03-01T00:00", "2021-03-02"),
        ] {
            assert!(
                matches!(
                    SummaryQuery::parse(start, end, None),
                    Err(ServiceError::Invalid(_))
                ),
                "expected {start}..{end} to be rejected"
            );
        }
        assert!(matches!(
            SummaryQuery::parse("2021-03-02", "2021-03-01", None),
            Err(ServiceError::Invalid(_))
        ));
        assert!(matches!(
            SummaryQuery::parse("2021-03-01", "2021-03-02", Some("week")),
            Err(ServiceError::Granularity(_))
        ));
    }

    #[test]
    fn test_parse_caps_bucket_count() {
        assert!(SummaryQuery::parse("2021-03-01", "2021-03-08", Some("minute")).is_ok());
        let err = SummaryQuery::parse("2021-03-01", "2021-03-09", Some("minute")).unwrap_err();
        assert_eq!(err.to_string(), "Date range too large for minute aggregation!");

        assert!(SummaryQuery::parse("2021-01-01", "2021-12-31", Some("hour")).is_ok());
        assert!(matches!(
            SummaryQuery::parse("2021-01-01", "2022-03-01", Some("hour")),
            Err(ServiceError::Invalid(_))
        ));
        assert!(SummaryQuery::parse("2000-01-01", "2021-12-31", Some("day")).is_ok());
    }

    #[tokio::test]
    async fn test_summary_spans_all_lists_of_caller_only() {
        let now = Arc::new(Mutex::new(at(1, 10, 5)));
        let clock = Arc::clone(&now);
        let store = MemoryStore::with_clock(move || *clock.lock().unwrap());
        let alice = seed_identity(&store, "alice_1").await;
        let bob = seed_identity(&store, "bob_one").await;
        let lists = ListService::new(&store);
        let milk = |q: i64| ItemInput {
            name: "Milk".to_owned(),
            quantity: json!(q),
        };

        lists.create(&alice, "Groceries", &[milk(2)]).await.unwrap();
        lists.create(&bob, "Groceries", &[milk(50)]).await.unwrap();
        *now.lock().unwrap() = at(1, 10, 40);
        lists.create(&alice, "Weekend", &[]).await.unwrap();
        ItemService::new(&store)
            .add(&alice, "Weekend", &[milk(3)])
            .await
            .unwrap();

        let analytics = AnalyticsService::new(&store);
        let query = SummaryQuery::parse("2021-03-01", "2021-03-02", Some("hour")).unwrap();
        assert_eq!(
            analytics.summary(&alice, &query).await.unwrap(),
            vec![row("Milk", at(1, 10, 0), 5)]
        );

        let empty = SummaryQuery::parse("2021-03-02", "2021-03-03", None).unwrap();
        assert!(analytics.summary(&alice, &empty).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summary_without_lists_is_empty() {
        let store = MemoryStore::new();
        let alice = seed_identity(&store, "alice_1").await;
        let query = SummaryQuery::parse("2021-03-01", "2021-03-02", None).unwrap();

        assert!(AnalyticsService::new(&store)
            .summary(&alice, &query)
            .await
            .unwrap()
            .is_empty());
    }
}
