//! Publish planning: decide create-new vs. update-existing for a candidate
//! and produce the final document.
//!
//! The planner never fails. Catalog listing or read errors are logged and
//! treated as "no existing article".

use tracing::{info, instrument, warn};

use threadkb_markdown::{parse_candidate, parse_existing, render_new_article, resolve_title};
use threadkb_shared::{CandidateArticle, KeywordSet, MergeResult, ReconcileConfig, SourceLink};

use crate::catalog::{Catalog, join_path, normalize_dir};
use crate::matcher::{TitleMatch, TitleMatcher};
use crate::merger::ArticleMerger;

/// Reconciles candidates against one catalog.
pub struct PublishPlanner<C> {
    catalog: C,
    config: ReconcileConfig,
    matcher: TitleMatcher,
    merger: ArticleMerger,
}

impl<C: Catalog> PublishPlanner<C> {
    pub fn new(catalog: C, config: ReconcileConfig) -> Self {
        let matcher = TitleMatcher::new(config.min_token_len);
        let merger = ArticleMerger::new(config.max_keywords, config.source_label.clone());
        Self {
            catalog,
            config,
            matcher,
            merger,
        }
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Parse candidate markdown and plan it.
    pub fn plan_markdown(&self, markdown: &str, source_link: &str) -> MergeResult {
        let candidate = parse_candidate(markdown, source_link, &self.config.default_title);
        self.plan(&candidate)
    }

    /// Plan a parsed candidate.
    #[instrument(skip_all, fields(title = %candidate.title))]
    pub fn plan(&self, candidate: &CandidateArticle) -> MergeResult {
        let (title, slug) = resolve_title(&candidate.title, &self.config.default_title);
        let kb_dir = normalize_dir(&self.config.kb_dir);

        let updated = self
            .find_existing(&kb_dir, &slug)
            .and_then(|found| self.plan_update(candidate, &found, &title, &slug));
        if let Some(result) = updated {
            return result;
        }

        self.plan_create(candidate, &kb_dir, title, slug)
    }

    fn find_existing(&self, kb_dir: &str, slug: &str) -> Option<TitleMatch> {
        let entries = match self.catalog.list(kb_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = kb_dir, error = %e, "catalog listing failed, treating as empty");
                return None;
            }
        };
        self.matcher.find_match(slug, &entries)
    }

    fn plan_update(
        &self,
        candidate: &CandidateArticle,
        found: &TitleMatch,
        title: &str,
        slug: &str,
    ) -> Option<MergeResult> {
        let path = &found.entry.path;
        let raw = match self.catalog.read(path, self.config.base_ref.as_deref()) {
            Ok(Some(raw)) if !raw.trim().is_empty() => raw,
            Ok(_) => {
                warn!(%path, "matched article is missing or empty, creating new article");
                return None;
            }
            Err(e) => {
                warn!(%path, error = %e, "matched article unreadable, creating new article");
                return None;
            }
        };

        let existing = parse_existing(path, &raw, &self.config.source_label);
        let merged = self.merger.merge(&existing, candidate);

        info!(%path, kind = ?found.kind, "updating existing article");

        Some(MergeResult {
            final_content: merged.render(),
            is_update: true,
            file_path: path.clone(),
            change_summary_title: change_summary_title(true, title),
            title: title.to_string(),
            slug: slug.to_string(),
            keywords: merged.keywords,
            sources: merged.sources,
        })
    }

    fn plan_create(
        &self,
        candidate: &CandidateArticle,
        kb_dir: &str,
        title: String,
        slug: String,
    ) -> MergeResult {
        let file_path = join_path(kb_dir, &format!("{slug}.md"));
        let source = SourceLink::new(&self.config.source_label, candidate.source_link.trim());

        let mut keywords = KeywordSet::with_cap(self.config.max_keywords);
        keywords.extend(&candidate.keywords);

        info!(path = %file_path, "creating new article");

        MergeResult {
            final_content: render_new_article(candidate, &source),
            is_update: false,
            change_summary_title: change_summary_title(false, &title),
            file_path,
            title,
            slug,
            keywords: keywords.into_vec(),
            sources: vec![source],
        }
    }
}

/// `Add KB article: <title>` or `Update KB article: <title>`.
pub fn change_summary_title(is_update: bool, title: &str) -> String {
    let verb = if is_update { "Update" } else { "Add" };
    format!("{verb} KB article: {title}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use threadkb_shared::{CatalogEntry, Result, ThreadKbError};

    fn config() -> ReconcileConfig {
        ReconcileConfig {
            kb_dir: "kb".into(),
            base_ref: None,
            ..ReconcileConfig::default()
        }
    }

    const REDIS_HA: &str = "# Redis HA\n\n**Keywords:** redis, clustering\n\nSentinel watches the primary.\n\n---\n\n**Source:** [Slack Thread](S1)\n";

    /// Catalog whose every call fails.
    struct BrokenCatalog;

    impl Catalog for BrokenCatalog {
        fn list(&self, _dir: &str) -> Result<Vec<CatalogEntry>> {
            Err(ThreadKbError::catalog("listing unavailable"))
        }

        fn read(&self, _path: &str, _rev: Option<&str>) -> Result<Option<String>> {
            Err(ThreadKbError::catalog("read unavailable"))
        }
    }

    /// Lists entries but fails on read.
    struct UnreadableCatalog(MemoryCatalog);

    impl Catalog for UnreadableCatalog {
        fn list(&self, dir: &str) -> Result<Vec<CatalogEntry>> {
            self.0.list(dir)
        }

        fn read(&self, _path: &str, _rev: Option<&str>) -> Result<Option<String>> {
            Err(ThreadKbError::catalog("permission denied"))
        }
    }

    #[test]
    fn update_scenario() {
        let catalog = MemoryCatalog::new().with("kb/redis-ha.md", REDIS_HA);
        let planner = PublishPlanner::new(catalog, config());

        let result = planner.plan_markdown(
            "# Redis High Availability\n**Keywords:** redis, failover\n\nRun three sentinels across zones.\n",
            "S2",
        );

        assert!(result.is_update);
        assert_eq!(result.file_path, "kb/redis-ha.md");
        assert_eq!(result.keywords, vec!["redis", "clustering", "failover"]);
        let urls: Vec<_> = result.sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, ["S1", "S2"]);
        assert!(
            result
                .final_content
                .contains("## Additional Context\n\nRun three sentinels across zones.")
        );
        assert!(result.final_content.ends_with(
            "---\n\n**Sources:**\n- [Slack Thread](S1)\n- [Slack Thread](S2)\n"
        ));
        assert_eq!(
            result.change_summary_title,
            "Update KB article: Redis High Availability"
        );
    }

    #[test]
    fn create_scenario() {
        let planner = PublishPlanner::new(MemoryCatalog::new(), config());
        let candidate = "# GraphQL Pagination Patterns\n**Keywords:** graphql\n\nPrefer cursor-based pagination.\n";
        let result = planner.plan_markdown(candidate, "S3");

        assert!(!result.is_update);
        assert_eq!(result.file_path, "kb/graphql-pagination-patterns.md");
        assert_eq!(result.slug, "graphql-pagination-patterns");
        assert_eq!(
            result.final_content,
            format!("{}\n\n---\n\n**Source:** [Slack Thread](S3)\n", candidate.trim_end())
        );
        assert_eq!(
            result.change_summary_title,
            "Add KB article: GraphQL Pagination Patterns"
        );
    }

    #[test]
    fn create_path_caps_keywords() {
        let planner = PublishPlanner::new(MemoryCatalog::new(), config());
        let list: Vec<String> = (1..=12).map(|n| format!("k{n}")).collect();
        let candidate = format!("# Many Keywords\n**Keywords:** {}\n\nBody", list.join(", "));
        let result = planner.plan_markdown(&candidate, "S1");

        assert!(!result.is_update);
        assert_eq!(result.keywords.len(), 10);
        assert_eq!(result.keywords.last().map(String::as_str), Some("k10"));
    }

    #[test]
    fn exact_match_preferred_over_fuzzy() {
        let catalog = MemoryCatalog::new()
            .with("kb/redis-high-availability-notes.md", "# Notes\n\nA\n")
            .with("kb/redis-high-availability.md", "# Redis High Availability\n\nB\n");
        let planner = PublishPlanner::new(catalog, config());
        let result = planner.plan_markdown("# Redis High Availability\n\nC", "S9");
        assert_eq!(result.file_path, "kb/redis-high-availability.md");
    }

    #[test]
    fn listing_failure_degrades_to_create() {
        let planner = PublishPlanner::new(BrokenCatalog, config());
        let result = planner.plan_markdown("# Redis HA\n\nBody", "S2");
        assert!(!result.is_update);
        assert_eq!(result.file_path, "kb/redis-ha.md");
    }

    #[test]
    fn read_failure_degrades_to_create() {
        let inner = MemoryCatalog::new().with("kb/redis-ha.md", REDIS_HA);
        let planner = PublishPlanner::new(UnreadableCatalog(inner), config());
        let result = planner.plan_markdown("# Redis High Availability\n\nBody", "S2");
        assert!(!result.is_update);
        assert_eq!(result.file_path, "kb/redis-high-availability.md");
    }

    #[test]
    fn unnamed_candidate_uses_default_title() {
        let planner = PublishPlanner::new(MemoryCatalog::new(), config());
        let result = planner.plan_markdown("!!!\n\nNo heading here.", "S1");
        assert_eq!(result.title, "Thread Summary");
        assert_eq!(result.file_path, "kb/thread-summary.md");
    }

    #[test]
    fn replanning_merged_content_is_stable() {
        let mut catalog = MemoryCatalog::new().with("kb/redis-ha.md", REDIS_HA);
        let candidate = "# Redis HA\n**Keywords:** redis, failover\n\nRun three sentinels.";

        let first = PublishPlanner::new(catalog.clone(), config()).plan_markdown(candidate, "S2");
        catalog.insert("kb/redis-ha.md", first.final_content.clone());
        let second = PublishPlanner::new(catalog, config()).plan_markdown(candidate, "S2");

        assert_eq!(first.keywords, second.keywords);
        assert_eq!(first.sources, second.sources);
        assert_eq!(first.final_content, second.final_content);
    }

    #[test]
    fn planner_accepts_borrowed_catalog() {
        let catalog = MemoryCatalog::new();
        let planner = PublishPlanner::new(&catalog, config());
        assert!(!planner.plan_markdown("# X Topic", "S1").is_update);
    }
}
