//! URL rewriting for the origin image service.
//!
//! The origin consumes a transform query parameter holding comma-separated
//! `key-value` directives. Rewriting merges a tier's [`QualityProfile`] into
//! that parameter and stamps a no-cache marker so the origin's own service
//! worker does not re-cache the tiered response.
//!
//! # Wire contract
//!
//! These names are consumed by external systems and must match exactly:
//!
//! - transform parameter: `tr`
//! - no-cache marker: `ik-sw-no-cache` (always `true`)
//! - quality directive shape: `q-<v>` where `<v>` is `auto_high`,
//!   `auto_low`, `auto`, or an integer
//!
//! # Merge rules
//!
//! The existing transform value is parsed into an ordered list of segments,
//! then exactly one of:
//!
//! - no transform parameter: set it to the serialized profile;
//! - a quality directive exists: the profile's segments are spliced in
//!   place of that single segment, every other segment kept in order;
//! - no quality directive: the profile's segments are appended.
//!
//! Rewriting is pure: the input URL is never mutated and unrelated query
//! parameters keep their order.

use url::Url;

use crate::profile::QualityProfile;

/// Query parameter holding transformation directives.
pub const TRANSFORM_PARAM: &str = "tr";

/// Query parameter telling the origin not to re-cache the response.
pub const NO_CACHE_PARAM: &str = "ik-sw-no-cache";

/// Value set on [`NO_CACHE_PARAM`].
pub const NO_CACHE_VALUE: &str = "true";

// =============================================================================
// Transform Segments
// =============================================================================

/// Whether a transform segment is a quality directive.
///
/// Matches `q-auto_high`, `q-auto_low`, `q-auto`, and `q-<integer>`.
/// Anything else (`qq-70`, `q-`, `q-fast`) is an ordinary segment.
fn is_quality_directive(segment: &str) -> bool {
    let Some(value) = segment.strip_prefix("q-") else {
        return false;
    };
    match value {
        "auto" | "auto_low" | "auto_high" => true,
        other => !other.is_empty() && other.bytes().all(|b| b.is_ascii_digit()),
    }
}

/// Split a transform value into its segments, dropping empties left behind
/// by stray commas.
fn parse_segments(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Merge the profile's segments into an existing transform value.
fn merge_transform(existing: &str, profile: &QualityProfile) -> String {
    let mut segments = parse_segments(existing);
    let incoming = parse_segments(&profile.serialize());

    match segments.iter().position(|s| is_quality_directive(s)) {
        Some(pos) => {
            // Replace the directive in place, keeping surrounding segments.
            segments.splice(pos..pos + 1, incoming);
        }
        None => segments.extend(incoming),
    }

    segments.join(",")
}

// =============================================================================
// Rewrite
// =============================================================================

/// Rewrite a request URL to carry the given quality profile.
///
/// Returns a new absolute URL; the input is not modified. The no-cache
/// marker is always (re)set as the final query parameter.
pub fn rewrite(url: &Url, profile: &QualityProfile) -> Url {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    match pairs.iter_mut().find(|(k, _)| k == TRANSFORM_PARAM) {
        Some((_, value)) => *value = merge_transform(value, profile),
        None => pairs.push((TRANSFORM_PARAM.to_string(), profile.serialize())),
    }

    pairs.retain(|(k, _)| k != NO_CACHE_PARAM);
    pairs.push((NO_CACHE_PARAM.to_string(), NO_CACHE_VALUE.to_string()));

    let mut rewritten = url.clone();
    rewritten
        .query_pairs_mut()
        .clear()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    rewritten
}

// =============================================================================
// Tests
// =============================================================================
