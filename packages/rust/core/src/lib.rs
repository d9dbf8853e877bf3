//! Article reconciliation engine for threadkb.
//!
//! Given a candidate article and a catalog of published articles, decides
//! whether the candidate is a new topic or an update, and produces the final
//! document:
//!
//! candidate → slug → [`TitleMatcher`] (over a [`Catalog`] listing) →
//! [`ArticleMerger`] if matched → [`PublishPlanner`] → [`MergeResult`].
//!
//! [`MergeResult`]: threadkb_shared::MergeResult

pub mod catalog;
pub mod matcher;
pub mod merger;
pub mod planner;
pub mod publish;

pub use catalog::{Catalog, FsCatalog, GitCatalog, MemoryCatalog};
pub use matcher::{MatchKind, TitleMatch, TitleMatcher};
pub use merger::{ADDITIONAL_CONTEXT_HEADING, ArticleMerger};
pub use planner::{PublishPlanner, change_summary_title};
pub use publish::{
    ChangeContext, ChangeRequest, FsPublisher, PublishReceipt, Publisher, SourceRef,
    validate_source_link,
};
