//! Expiration behavior under the paused tokio clock.
//!
//! These tests drive the mediator end-to-end, then advance time and sweep,
//! verifying the documented eviction properties:
//! - age-based removal after max_age elapses
//! - count-based trimming keeps the most-recently-touched entries
//! - a swept entry is re-fetched on the next request

use std::time::Duration;

use tokio::time::advance;

use imgtier::cache::sweep_once;
use imgtier::mediator::{Decision, InterceptedRequest};
use imgtier::profile::{CachePolicy, ProfileTable};
use imgtier::resolver::ServedFrom;
use imgtier::tier::NetworkTier;

use super::test_utils::{harness_with, TestHarness, TrackingFetcher};

fn short_lived(tier: NetworkTier, max_age_secs: u64, max_entries: usize) -> ProfileTable {
    ProfileTable::default().with_policy(
        tier,
        CachePolicy::new(Duration::from_secs(max_age_secs), max_entries),
    )
}

fn image_request(name: &str) -> InterceptedRequest {
    InterceptedRequest::new(format!("https://ik.imagekit.io/demo/{name}.jpg"))
        .with_connection_type("2g")
}

async fn tier_len(h: &TestHarness, tier: NetworkTier) -> usize {
    let handle = h.mediator.caches().open(tier).await.unwrap();
    handle.len().await
}

#[tokio::test(start_paused = true)]
async fn test_entry_is_gone_after_max_age_and_a_sweep() {
    let h = harness_with(TrackingFetcher::ok(), short_lived(NetworkTier::TwoG, 1, 500));

    h.mediator.intercept(&image_request("x")).await.unwrap();
    assert_eq!(tier_len(&h, NetworkTier::TwoG).await, 1);

    advance(Duration::from_secs(2)).await;
    sweep_once(h.mediator.caches().as_ref()).await;

    assert_eq!(tier_len(&h, NetworkTier::TwoG).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_keeps_the_two_most_recent_of_three() {
    let h = harness_with(
        TrackingFetcher::ok(),
        short_lived(NetworkTier::TwoG, 3600, 2),
    );

    h.mediator.intercept(&image_request("a")).await.unwrap();
    advance(Duration::from_millis(10)).await;
    h.mediator.intercept(&image_request("b")).await.unwrap();
    advance(Duration::from_millis(10)).await;
    h.mediator.intercept(&image_request("c")).await.unwrap();

    sweep_once(h.mediator.caches().as_ref()).await;

    let handle = h.mediator.caches().open(NetworkTier::TwoG).await.unwrap();
    assert!(!handle.contains("https://ik.imagekit.io/demo/a.jpg").await);
    assert!(handle.contains("https://ik.imagekit.io/demo/b.jpg").await);
    assert!(handle.contains("https://ik.imagekit.io/demo/c.jpg").await);
}

#[tokio::test(start_paused = true)]
async fn test_swept_entry_is_refetched_on_next_request() {
    let h = harness_with(TrackingFetcher::ok(), short_lived(NetworkTier::TwoG, 1, 500));
    let request = image_request("x");

    h.mediator.intercept(&request).await.unwrap();
    assert_eq!(h.fetcher.fetched_urls().len(), 1);

    // Before the sweep runs, staleness is invisible to the read path.
    advance(Duration::from_secs(2)).await;
    let decision = h.mediator.intercept(&request).await.unwrap();
    let Decision::Serve(resolved) = decision else {
        panic!("expected a served response");
    };
    assert_eq!(resolved.served_from, ServedFrom::Cache(NetworkTier::TwoG));
    assert_eq!(h.fetcher.fetched_urls().len(), 1);

    // After the sweep, the next request goes back to the network.
    sweep_once(h.mediator.caches().as_ref()).await;
    let decision = h.mediator.intercept(&request).await.unwrap();
    let Decision::Serve(resolved) = decision else {
        panic!("expected a served response");
    };
    assert_eq!(resolved.served_from, ServedFrom::Network);
    assert_eq!(h.fetcher.fetched_urls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_sweep_only_touches_the_expired_tier() {
    let h = harness_with(TrackingFetcher::ok(), short_lived(NetworkTier::TwoG, 1, 500));

    h.mediator.intercept(&image_request("x")).await.unwrap();
    h.mediator
        .intercept(
            &InterceptedRequest::new("https://ik.imagekit.io/demo/y.jpg")
                .with_connection_type("4g"),
        )
        .await
        .unwrap();

    advance(Duration::from_secs(2)).await;
    sweep_once(h.mediator.caches().as_ref()).await;

    // 2g entry aged out; the 4g entry (30-day default policy) survives.
    assert_eq!(tier_len(&h, NetworkTier::TwoG).await, 0);
    assert_eq!(tier_len(&h, NetworkTier::FourG).await, 1);
}
