//! Service layer: transport, per-format adapters, normalization and the
//! topic filter.
//!
//! - [`FeedGateway`] / [`HttpGateway`]: one HTTP GET per source
//! - [`SourceAdapter`] implementations, looked up through [`AdapterSet`]
//! - [`normalize`]: raw entry to [`crate::models::Item`]
//! - [`RelevanceFilter`]: keyword filter for mixed-topic feeds

pub mod adapters;
mod gateway;
mod normalizer;
mod relevance;

pub use adapters::{
    AdapterSet, BooruAdapter, SourceAdapter, SyndicationAdapter, WikiChangesAdapter,
};
pub use gateway::{FeedGateway, HttpGateway};
pub use normalizer::normalize;
pub use relevance::RelevanceFilter;
