//! Result ordering for aggregate searches.

use std::cmp::Reverse;

use dealhub_core::{SortField, ValidatedOffer};

use crate::normalize::normalize_name;

/// Sort `offers` in place by `sort`. Every ordering is stable.
///
/// `query` is only consulted for [`SortField::Relevance`].
pub fn sort_offers(offers: &mut [ValidatedOffer], sort: SortField, query: &str) {
    match sort {
        SortField::Discount => offers.sort_by(|a, b| {
            b.discount_percentage
                .cmp(&a.discount_percentage)
                .then_with(|| b.confidence_score.cmp(&a.confidence_score))
        }),
        SortField::Price => offers.sort_by(|a, b| {
            a.sale_price
                .cmp(&b.sale_price)
                .then_with(|| b.discount_percentage.cmp(&a.discount_percentage))
        }),
        SortField::Popularity => offers.sort_by(|a, b| {
            b.confidence_score
                .cmp(&a.confidence_score)
                .then_with(|| b.discount_percentage.cmp(&a.discount_percentage))
        }),
        SortField::Date => offers.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at)),
        SortField::Relevance => {
            let tokens = query_tokens(query);
            offers.sort_by_cached_key(|offer| {
                (
                    Reverse(relevance(&tokens, &offer.normalized_name)),
                    Reverse(offer.discount_percentage),
                )
            });
        }
    }
}

fn query_tokens(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = normalize_name(query)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

/// Number of distinct query tokens that appear as words of `normalized_name`.
fn relevance(tokens: &[String], normalized_name: &str) -> usize {
    tokens
        .iter()
        .filter(|token| normalized_name.split(' ').any(|word| word == token.as_str()))
        .count()
}
