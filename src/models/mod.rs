// src/models/mod.rs

//! Domain models for the gazette pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod item;
mod snapshot;
mod source;

// Re-export all public types
pub use config::{
    Config, FetchConfig, GatewayConfig, MetaConfig, NormalizeConfig, RelevanceConfig,
    RetentionConfig,
};
pub use config::{ENV_GATEWAY_BASE, ENV_MAX_AGE_DAYS, ENV_MAX_ITEMS, ENV_TIMEOUT_SECS};
pub use item::{Item, RawEntry};
pub use snapshot::{CategoryBucket, Snapshot, SnapshotMeta};
pub use source::{CategoryConfig, IdentityPolicy, ParserHint, SourceConfig};
