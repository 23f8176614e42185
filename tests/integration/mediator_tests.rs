//! End-to-end mediation tests.
//!
//! These exercise the full filter -> rewrite -> stepdown path over
//! tracking boundaries, verifying:
//! - the walk order and where responses are cached
//! - the exact rewritten URL handed to the network
//! - that ineligible requests never touch a cache

use imgtier::mediator::{Decision, InterceptedRequest};
use imgtier::resolver::ServedFrom;
use imgtier::tier::NetworkTier;
use url::Url;

use super::test_utils::{harness, TestHarness};

const IMAGE_URL: &str = "https://ik.imagekit.io/demo/x.jpg";

fn transform_param(url: &str) -> Option<String> {
    let url = Url::parse(url).unwrap();
    url.query_pairs()
        .find(|(k, _)| k == "tr")
        .map(|(_, v)| v.into_owned())
}

async fn tier_contains(h: &TestHarness, tier: NetworkTier, key: &str) -> bool {
    let handle = h.mediator.caches().open(tier).await.unwrap();
    handle.contains(key).await
}

// =============================================================================
// Stepdown Walk
// =============================================================================

#[tokio::test]
async fn test_two_g_caller_probes_slow_2g_then_2g_before_fetching() {
    let h = harness();
    let request = InterceptedRequest::new(IMAGE_URL)
        .with_referrer("https://ik.imagekit.io/demo/sw-opt-1")
        .with_connection_type("2g");

    let decision = h.mediator.intercept(&request).await.unwrap();
    let Decision::Serve(resolved) = decision else {
        panic!("expected a served response");
    };

    assert_eq!(resolved.served_from, ServedFrom::Network);
    assert_eq!(
        h.store.lookup_log(),
        vec!["imgtier-slow-2g", "imgtier-2g"],
        "both lower caches are probed before any network fetch"
    );

    // The rewritten URL carries the 2g profile plus the no-cache marker.
    let fetched = h.fetcher.fetched_urls();
    assert_eq!(fetched.len(), 1);
    assert_eq!(
        transform_param(&fetched[0]).unwrap(),
        "q-50,ot-50,ots-40,otc-FF00A0,ox-10,oy-10"
    );
    let fetched_url = Url::parse(&fetched[0]).unwrap();
    assert!(fetched_url
        .query_pairs()
        .any(|(k, v)| k == "ik-sw-no-cache" && v == "true"));
}

#[tokio::test]
async fn test_response_is_cached_under_the_original_url() {
    let h = harness();
    let request = InterceptedRequest::new(IMAGE_URL).with_connection_type("2g");

    h.mediator.intercept(&request).await.unwrap();

    // Keyed by the original URL, stored at the tier that ended the walk.
    assert!(tier_contains(&h, NetworkTier::TwoG, IMAGE_URL).await);
    assert!(!tier_contains(&h, NetworkTier::SlowTwoG, IMAGE_URL).await);
    assert!(!tier_contains(&h, NetworkTier::ThreeG, IMAGE_URL).await);
}

#[tokio::test]
async fn test_lower_tier_hit_serves_a_higher_tier_caller() {
    let h = harness();

    // A slow-2g caller populates the slow-2g cache.
    let slow = InterceptedRequest::new(IMAGE_URL).with_connection_type("slow-2g");
    h.mediator.intercept(&slow).await.unwrap();
    assert_eq!(h.fetcher.fetched_urls().len(), 1);

    // A 4g caller then hits that lower-quality copy without fetching.
    let fast = InterceptedRequest::new(IMAGE_URL).with_connection_type("4g");
    let decision = h.mediator.intercept(&fast).await.unwrap();
    let Decision::Serve(resolved) = decision else {
        panic!("expected a served response");
    };

    assert_eq!(
        resolved.served_from,
        ServedFrom::Cache(NetworkTier::SlowTwoG)
    );
    assert_eq!(h.fetcher.fetched_urls().len(), 1, "no second fetch");
}

#[tokio::test]
async fn test_distinct_tiers_cache_independently() {
    let h = harness();

    // Warm the 2g tier, then evict nothing and ask as 2g again: cache hit.
    let request = InterceptedRequest::new(IMAGE_URL).with_connection_type("2g");
    h.mediator.intercept(&request).await.unwrap();
    let decision = h.mediator.intercept(&request).await.unwrap();
    let Decision::Serve(resolved) = decision else {
        panic!("expected a served response");
    };
    assert_eq!(resolved.served_from, ServedFrom::Cache(NetworkTier::TwoG));

    // A different image misses and fetches again.
    let other = InterceptedRequest::new("https://ik.imagekit.io/demo/y.jpg")
        .with_connection_type("2g");
    h.mediator.intercept(&other).await.unwrap();
    assert_eq!(h.fetcher.fetched_urls().len(), 2);
}

// =============================================================================
// Pass-Through Isolation
// =============================================================================

#[tokio::test]
async fn test_foreign_referrer_touches_no_cache_at_all() {
    let h = harness();
    let request = InterceptedRequest::new(IMAGE_URL)
        .with_referrer("https://example.com/blog")
        .with_connection_type("2g");

    let decision = h.mediator.intercept(&request).await.unwrap();

    assert!(matches!(decision, Decision::PassThrough));
    assert!(h.store.lookup_log().is_empty(), "no cache interaction");
    assert!(h.fetcher.fetched_urls().is_empty(), "no mediated fetch");
}

#[tokio::test]
async fn test_non_image_and_foreign_origin_pass_through() {
    let h = harness();

    for url in [
        "https://ik.imagekit.io/demo/styles.css",
        "https://cdn.example.com/photo.jpg",
    ] {
        let decision = h
            .mediator
            .intercept(&InterceptedRequest::new(url))
            .await
            .unwrap();
        assert!(matches!(decision, Decision::PassThrough), "{url}");
    }
    assert!(h.store.lookup_log().is_empty());
}

// =============================================================================
// Tier Substitution
// =============================================================================

#[tokio::test]
async fn test_implausible_4g_signal_is_mediated_as_default_tier() {
    let h = harness();
    let request = InterceptedRequest::new(IMAGE_URL)
        .with_connection_type("4g")
        .with_downlink(0.4);

    h.mediator.intercept(&request).await.unwrap();

    // Default tier is 3g: the fetched URL carries the 3g profile and the
    // response lands in the 3g cache.
    let fetched = h.fetcher.fetched_urls();
    assert_eq!(
        transform_param(&fetched[0]).unwrap(),
        "q-70,ot-70,ots-40,otc-FF00A0,ox-10,oy-10"
    );
    assert!(tier_contains(&h, NetworkTier::ThreeG, IMAGE_URL).await);
    assert!(!tier_contains(&h, NetworkTier::FourG, IMAGE_URL).await);
}

#[tokio::test]
async fn test_existing_quality_directive_is_replaced_not_duplicated() {
    let h = harness();
    let url = "https://ik.imagekit.io/demo/x.jpg?tr=w-300,q-70,h-200";
    let request = InterceptedRequest::new(url).with_connection_type("slow-2g");

    h.mediator.intercept(&request).await.unwrap();

    let fetched = h.fetcher.fetched_urls();
    assert_eq!(
        transform_param(&fetched[0]).unwrap(),
        "w-300,q-40,ot-40,ots-40,otc-FF00A0,ox-10,oy-10,h-200"
    );
}
