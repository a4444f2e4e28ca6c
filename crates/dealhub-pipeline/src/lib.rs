pub mod aggregator;
pub mod dedup;
pub mod error;
pub mod http_source;
pub mod normalize;
pub mod ranking;
pub mod scorer;
pub mod source;
pub mod store;
pub mod usage;
pub mod validator;

pub use aggregator::{Aggregator, AggregatorBuilder};
pub use dedup::dedupe;
pub use error::{
    AggregateError, BudgetExhausted, Quarantined, SinkError, SourceError, ValidationFailure,
};
pub use http_source::HttpSourceAdapter;
pub use normalize::{canonical_id, make_dedup_key, normalize_name, normalize_product_url};
pub use ranking::sort_offers;
pub use scorer::{score, SourceTrust};
pub use source::SourceAdapter;
pub use store::{MemoryOfferStore, OfferSink};
pub use usage::UsageTracker;
pub use validator::DiscountValidator;
