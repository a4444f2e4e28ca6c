//! Cross-source deduplication.

use std::collections::HashMap;

use dealhub_core::{DedupKey, ValidatedOffer};

/// Keep one representative per [`DedupKey`].
///
/// Within a group the offer with the highest `confidence_score` wins, then the
/// lowest `sale_price`, then the one seen first. Survivors keep their input
/// order, so the output is always a subsequence of `offers`.
#[must_use]
pub fn dedupe(offers: Vec<ValidatedOffer>) -> Vec<ValidatedOffer> {
    let mut winners: HashMap<&DedupKey, usize> = HashMap::with_capacity(offers.len());

    for (idx, offer) in offers.iter().enumerate() {
        winners
            .entry(&offer.dedup_key)
            .and_modify(|best| {
                if outranks(offer, &offers[*best]) {
                    *best = idx;
                }
            })
            .or_insert(idx);
    }

    let mut keep = vec![false; offers.len()];
    for idx in winners.into_values() {
        keep[idx] = true;
    }

    offers
        .into_iter()
        .zip(keep)
        .filter_map(|(offer, kept)| kept.then_some(offer))
        .collect()
}

/// Strictly better; ties keep the incumbent.
fn outranks(challenger: &ValidatedOffer, incumbent: &ValidatedOffer) -> bool {
    challenger.confidence_score > incumbent.confidence_score
        || (challenger.confidence_score == incumbent.confidence_score
            && challenger.sale_price < incumbent.sale_price)
}
