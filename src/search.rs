// ABOUTME: Search pipeline modules: classification, scoring, fusion, ranking
// ABOUTME: Candidate flow is retrieve → score → fuse → feed-rank → cluster

pub mod cluster;
pub mod feed;
pub mod hybrid;
pub mod keyword;
pub mod temporal;
pub mod vector;

pub use cluster::cluster_results;
pub use feed::rank_for_feed;
pub use hybrid::{hybrid_search, HybridMode};
pub use keyword::keyword_search;
pub use temporal::is_temporal_query;
pub use vector::{vector_search, VectorSearchParams, FEED_THRESHOLD, SEARCH_THRESHOLD};
