//! Shared types, error model, and configuration for threadkb.
//!
//! This crate is the foundation depended on by all other threadkb crates.
//! It provides:
//! - [`ThreadKbError`]: the unified error type
//! - Domain types ([`CandidateArticle`], [`ExistingArticleRecord`], [`MergeResult`], [`KeywordSet`])
//! - Configuration ([`AppConfig`], [`ReconcileConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, KbConfig, MatchingConfig, PublishConfig, ReconcileConfig, SlackConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{Result, ThreadKbError};
pub use types::{
    CandidateArticle, CatalogEntry, DEFAULT_MAX_KEYWORDS, ExistingArticleRecord, KeywordSet,
    MergeResult, SourceLink,
};
