//! Canonical forms used to recognise the same listing across sources.

use dealhub_core::DedupKey;
use reqwest::Url;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

/// Width of a fingerprint price bucket, in currency units.
const PRICE_BUCKET_WIDTH: i64 = 5;

/// Query parameters that identify a click, not a product.
const TRACKING_PARAMS: &[&str] = &[
    "ref", "ref_", "tag", "gclid", "fbclid", "psc", "th", "srsltid",
];

/// Lowercase, collapse every non-alphanumeric run to one space, and trim.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        } else {
            pending_space = true;
        }
    }
    out
}

/// Reduce a product URL to `<host><path>[?<params>]`.
///
/// The scheme, a leading `www.`, the fragment, tracking parameters and a
/// trailing slash are all dropped; remaining parameters are sorted. Returns
/// `None` for URLs that do not parse or have no host.
#[must_use]
pub fn normalize_product_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    let path = url.path().trim_end_matches('/');

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| {
            let k = k.to_lowercase();
            !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    let mut normalized = format!("{host}{path}");
    if !params.is_empty() {
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        normalized.push('?');
        normalized.push_str(&query);
    }
    Some(normalized)
}

/// Bucket a sale price so near-identical prices fingerprint together.
#[must_use]
pub fn price_bucket(sale_price: Decimal) -> i64 {
    (sale_price / Decimal::from(PRICE_BUCKET_WIDTH))
        .floor()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Compute the dedup key for a listing.
///
/// Uses the normalized product URL when there is one; otherwise SHA-256 over
/// `brand || normalized name || price bucket`, hex-encoded.
#[must_use]
pub fn make_dedup_key(
    product_url: Option<&str>,
    brand: Option<&str>,
    normalized_name: &str,
    sale_price: Decimal,
) -> DedupKey {
    if let Some(url) = product_url.and_then(normalize_product_url) {
        return DedupKey(format!("url:{url}"));
    }

    let input = format!(
        "{}\x00{}\x00{}",
        brand.unwrap_or("").trim().to_lowercase(),
        normalized_name,
        price_bucket(sale_price),
    );
    DedupKey(format!("fp:{:x}", Sha256::digest(input.as_bytes())))
}

/// Stable offer id: the first 32 hex chars of SHA-256 over the dedup key.
#[must_use]
pub fn canonical_id(key: &DedupKey) -> String {
    let digest = format!("{:x}", Sha256::digest(key.as_str().as_bytes()));
    digest[..32].to_string()
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
