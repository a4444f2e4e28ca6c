//! End-to-end aggregator scenarios driven by in-process stub sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dealhub_core::{
    ManualClock, RawCandidate, RefreshQuery, SearchFilters, SearchRequest, SortField, SourceQuery,
    SourceReliability,
};
use dealhub_pipeline::{
    AggregateError, Aggregator, DiscountValidator, MemoryOfferStore, OfferSink, SourceAdapter,
    SourceError, UsageTracker,
};
use rust_decimal::Decimal;

enum Behaviour {
    Returns(Vec<RawCandidate>),
    NoResults,
    Blocked,
    Hangs,
}

struct StubSource {
    id: String,
    reliability: SourceReliability,
    behaviour: Behaviour,
    calls: AtomicUsize,
}

impl StubSource {
    fn new(id: &str, reliability: SourceReliability, behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            reliability,
            behaviour,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for StubSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn reliability(&self) -> SourceReliability {
        self.reliability
    }

    async fn query(&self, _query: &SourceQuery) -> Result<Vec<RawCandidate>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Returns(candidates) => Ok(candidates.clone()),
            Behaviour::NoResults => Err(SourceError::NoResultsFound {
                source_id: self.id.clone(),
            }),
            Behaviour::Blocked => Err(SourceError::BlockedByTarget {
                source_id: self.id.clone(),
                reason: "captcha".to_string(),
            }),
            Behaviour::Hangs => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

/// A candidate with every optional field filled in.
fn candidate(name: &str, url: &str, original: i64, sale: i64) -> RawCandidate {
    RawCandidate {
        name: name.to_string(),
        brand: Some("Nike".to_string()),
        category: Some("shoes".to_string()),
        original_price: Some(Decimal::new(original, 0)),
        sale_price: Some(Decimal::new(sale, 0)),
        currency: "EUR".to_string(),
        image_url: Some(format!("{url}/image.jpg")),
        product_url: Some(url.to_string()),
        source: String::new(),
        external_id: Some(format!("sku-{sale}")),
        reported_discount_pct: None,
        scraped_at: None,
    }
}

fn tracker() -> Arc<UsageTracker> {
    Arc::new(UsageTracker::default())
}

#[tokio::test]
async fn search_without_sources_is_fatal() {
    let aggregator = Aggregator::builder(tracker()).build();
    let err = aggregator
        .search(&SearchRequest::new("anything"))
        .await
        .unwrap_err();
    assert!(matches!(err, AggregateError::NoSourcesConfigured));
}

#[tokio::test]
async fn invalid_candidates_are_dropped_and_output_is_sorted_by_discount() {
    let source = StubSource::new(
        "api",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![
            candidate("Nike Pegasus", "https://shop.example.com/p/1", 100, 70),
            candidate("Nike Vomero", "https://shop.example.com/p/2", 100, 95),
            candidate("Nike Invincible", "https://shop.example.com/p/3", 100, 150),
            candidate("Nike Zoom", "https://shop.example.com/p/4", 100, 5),
            candidate("Nike Air Max", "https://shop.example.com/p/5", 200, 100),
        ]),
    );
    let aggregator = Aggregator::builder(tracker())
        .source(source.clone(), 100, None)
        .build();

    let response = aggregator.search(&SearchRequest::new("nike")).await.unwrap();

    let discounts: Vec<u8> = response
        .offers
        .iter()
        .map(|o| o.discount_percentage)
        .collect();
    assert_eq!(discounts, vec![50, 30]);
    assert_eq!(response.total_results, 2);
    assert_eq!(response.sources, vec!["api"]);
    for offer in &response.offers {
        assert!(offer.sale_price < offer.original_price);
        assert!((10..=90).contains(&offer.discount_percentage));
        assert!((70..=99).contains(&offer.confidence_score));
        assert_eq!(offer.source, "api");
        assert_eq!(offer.id.len(), 32);
    }
}

#[tokio::test]
async fn duplicates_across_sources_keep_the_most_trusted() {
    let url = "https://www.shop.example.com/p/pegasus?utm_source=mail";
    let scraper = StubSource::new(
        "scraper",
        SourceReliability::ScrapedHtml,
        Behaviour::Returns(vec![candidate("Nike Pegasus 41", url, 140, 98)]),
    );
    let api = StubSource::new(
        "api",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![candidate(
            "Nike Pegasus 41",
            "https://shop.example.com/p/pegasus/",
            140,
            98,
        )]),
    );
    // Complete candidates earn +8 on top of the base score: 77 -> 85, 83 -> 91.
    let aggregator = Aggregator::builder(tracker())
        .source(scraper, 100, Some(77))
        .source(api, 100, Some(83))
        .build();

    let response = aggregator.search(&SearchRequest::new("pegasus")).await.unwrap();

    assert_eq!(response.offers.len(), 1);
    assert_eq!(response.offers[0].confidence_score, 91);
    assert_eq!(response.offers[0].source, "api");
    assert_eq!(response.sources, vec!["scraper", "api"]);
}

#[tokio::test]
async fn exhausted_source_is_skipped_and_omitted() {
    let usage = tracker();
    let spent = StubSource::new(
        "spent",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![candidate("Nike A", "https://a.example.com/1", 100, 50)]),
    );
    let fresh = StubSource::new(
        "fresh",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![candidate("Nike B", "https://b.example.com/1", 100, 60)]),
    );
    let aggregator = Aggregator::builder(Arc::clone(&usage))
        .source(spent.clone(), 100, None)
        .source(fresh.clone(), 100, None)
        .build();

    for _ in 0..100 {
        usage.record_query("spent").unwrap();
    }

    let response = aggregator.search(&SearchRequest::new("nike")).await.unwrap();

    assert_eq!(spent.calls(), 0);
    assert_eq!(fresh.calls(), 1);
    assert_eq!(response.sources, vec!["fresh"]);
    assert_eq!(response.offers.len(), 1);

    let stats = usage.stats_for("spent").unwrap();
    assert_eq!(stats.requests_today, 100);
    assert_eq!(stats.requests_remaining, 0);
}

#[tokio::test]
async fn failing_and_timed_out_sources_do_not_fail_the_call() {
    let usage = tracker();
    let blocked = StubSource::new("blocked", SourceReliability::ScrapedHtml, Behaviour::Blocked);
    let slow = StubSource::new("slow", SourceReliability::ScrapedHtml, Behaviour::Hangs);
    let empty = StubSource::new("empty", SourceReliability::StructuredApi, Behaviour::NoResults);
    let good = StubSource::new(
        "good",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![candidate("Nike C", "https://c.example.com/1", 100, 70)]),
    );
    let aggregator = Aggregator::builder(Arc::clone(&usage))
        .source(blocked, 10, None)
        .source(slow, 10, None)
        .source(empty, 10, None)
        .source(good, 10, None)
        .query_timeout(Duration::from_millis(100))
        .build();

    let response = aggregator.search(&SearchRequest::new("nike")).await.unwrap();

    assert_eq!(response.sources, vec!["empty", "good"]);
    assert_eq!(response.offers.len(), 1);
    // Every attempt spends budget, successful or not.
    for id in ["blocked", "slow", "empty", "good"] {
        assert_eq!(usage.stats_for(id).unwrap().requests_today, 1, "{id}");
    }
}

#[tokio::test]
async fn no_successful_sources_yields_an_empty_response() {
    let aggregator = Aggregator::builder(tracker())
        .source(
            StubSource::new("blocked", SourceReliability::ScrapedHtml, Behaviour::Blocked),
            10,
            None,
        )
        .build();

    let response = aggregator.search(&SearchRequest::new("nike")).await.unwrap();
    assert!(response.offers.is_empty());
    assert!(response.sources.is_empty());
    assert_eq!(response.total_results, 0);
}

#[tokio::test]
async fn filters_apply_before_counting_and_limit_after() {
    let mut boot = candidate("Nike Boot", "https://d.example.com/boot", 200, 120);
    boot.category = Some("boots".to_string());
    let source = StubSource::new(
        "api",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![
            candidate("Nike One", "https://d.example.com/1", 100, 80),
            candidate("Nike Two", "https://d.example.com/2", 100, 60),
            candidate("Nike Three", "https://d.example.com/3", 100, 40),
            candidate("Nike Four", "https://d.example.com/4", 300, 250),
            boot,
        ]),
    );
    let aggregator = Aggregator::builder(tracker())
        .source(source, 10, None)
        .build();

    let request = SearchRequest {
        query: "nike".to_string(),
        filters: SearchFilters {
            category: Some("SHOES".to_string()),
            max_price: Some(Decimal::new(100, 0)),
            min_discount: Some(20),
            ..SearchFilters::default()
        },
        sort: SortField::Price,
        limit: Some(2),
    };
    let response = aggregator.search(&request).await.unwrap();

    assert_eq!(response.total_results, 3);
    let names: Vec<&str> = response.offers.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Nike Three", "Nike Two"]);
}

#[tokio::test]
async fn queried_brand_mismatch_lowers_confidence() {
    let mut bare = candidate("Generic Trainer", "https://e.example.com/1", 100, 60);
    bare.image_url = None;
    bare.external_id = None;
    let source = StubSource::new(
        "scraper",
        SourceReliability::ScrapedHtml,
        Behaviour::Returns(vec![bare]),
    );
    let aggregator = Aggregator::builder(tracker())
        .source(source, 10, None)
        .build();

    let mut request = SearchRequest::new("trainer");
    assert_eq!(aggregator.search(&request).await.unwrap().offers.len(), 1);

    // 78 + 2 - 12 = 68: quarantined.
    request.filters.brand = Some("Nike".to_string());
    assert!(aggregator.search(&request).await.unwrap().offers.is_empty());
}

#[tokio::test]
async fn reported_discount_never_overrides_the_prices() {
    let mut inflated = candidate("Nike Pegasus", "https://r.example.com/1", 100, 70);
    inflated.reported_discount_pct = Some(Decimal::from(85));
    let source = StubSource::new(
        "api",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![inflated]),
    );
    let aggregator = Aggregator::builder(tracker()).source(source, 10, None).build();

    let response = aggregator.search(&SearchRequest::new("nike")).await.unwrap();

    assert_eq!(response.offers.len(), 1);
    assert_eq!(response.offers[0].discount_percentage, 30);
}

#[tokio::test]
async fn date_sort_uses_each_listing_capture_time() {
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
    let clock = ManualClock::new(now);

    let mut older = candidate("Nike Old", "https://d.example.com/1", 100, 50);
    older.scraped_at = Some(now - chrono::Duration::hours(6));
    let mut newer = candidate("Nike New", "https://d.example.com/2", 100, 80);
    newer.scraped_at = Some(now - chrono::Duration::hours(1));
    let mut future = candidate("Nike Future", "https://d.example.com/3", 100, 70);
    future.scraped_at = Some(now + chrono::Duration::days(1));
    let undated = candidate("Nike Undated", "https://d.example.com/4", 100, 60);

    let source = StubSource::new(
        "scraper",
        SourceReliability::ScrapedHtml,
        Behaviour::Returns(vec![older, newer, future, undated]),
    );
    let aggregator = Aggregator::builder(tracker())
        .source(source, 10, None)
        .clock(Arc::new(clock))
        .build();

    let mut request = SearchRequest::new("nike");
    request.sort = SortField::Date;
    let response = aggregator.search(&request).await.unwrap();

    let names: Vec<&str> = response.offers.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Nike Future", "Nike Undated", "Nike New", "Nike Old"]);
    assert!(response.offers.iter().all(|o| o.scraped_at <= now));
}

#[tokio::test]
async fn final_list_is_handed_to_the_sink() {
    let store = Arc::new(MemoryOfferStore::default());
    let source = StubSource::new(
        "api",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![
            candidate("Nike One", "https://f.example.com/1", 100, 50),
            candidate("Nike Two", "https://f.example.com/2", 100, 60),
        ]),
    );
    let aggregator = Aggregator::builder(tracker())
        .source(source, 10, None)
        .validator(DiscountValidator::new(10, 90).unwrap())
        .sink(store.clone())
        .build();

    let mut request = SearchRequest::new("nike");
    request.limit = Some(1);
    aggregator.search(&request).await.unwrap();

    let stats = store.stats().await;
    assert_eq!(stats.stored_offers, 1);
    assert!(stats.last_handoff_at.is_some());
}

#[tokio::test]
async fn refresh_replays_every_query() {
    let store = Arc::new(MemoryOfferStore::default());
    let source = StubSource::new(
        "api",
        SourceReliability::StructuredApi,
        Behaviour::Returns(vec![candidate("Nike One", "https://g.example.com/1", 100, 50)]),
    );
    let aggregator = Aggregator::builder(tracker())
        .source(source.clone(), 10, None)
        .sink(store.clone())
        .build();

    let queries = vec![
        RefreshQuery {
            query: "nike".to_string(),
            brand: None,
            category: None,
        },
        RefreshQuery {
            query: "running".to_string(),
            brand: Some("Nike".to_string()),
            category: Some("shoes".to_string()),
        },
    ];
    let handed_off = aggregator.refresh(&queries).await;

    assert_eq!(source.calls(), 2);
    assert_eq!(handed_off, 2);
    assert_eq!(store.stats().await.stored_offers, 1);
}
