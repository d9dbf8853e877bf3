//! Merge a candidate into an existing article.
//!
//! The merge works on typed parts and never drops recorded information:
//! keywords are unioned, sources only grow, and the candidate body is
//! appended under an `## Additional Context` section.

use tracing::{debug, warn};

use threadkb_markdown::ArticleDocument;
use threadkb_shared::{CandidateArticle, ExistingArticleRecord, KeywordSet, SourceLink};

/// Heading of the section each merged candidate body is appended under.
pub const ADDITIONAL_CONTEXT_HEADING: &str = "## Additional Context";

/// Combines existing articles with new candidates.
#[derive(Debug, Clone)]
pub struct ArticleMerger {
    max_keywords: usize,
    source_label: String,
}

impl ArticleMerger {
    pub fn new(max_keywords: usize, source_label: impl Into<String>) -> Self {
        Self {
            max_keywords,
            source_label: source_label.into(),
        }
    }

    /// Merge `candidate` into `existing`.
    ///
    /// Merging a candidate whose source link is already recorded and whose
    /// body is already present returns the existing article unchanged.
    pub fn merge(
        &self,
        existing: &ExistingArticleRecord,
        candidate: &CandidateArticle,
    ) -> ArticleDocument {
        let mut keywords = KeywordSet::with_cap(self.max_keywords);
        keywords.extend(&existing.keywords);
        keywords.extend(&candidate.keywords);

        let already_recorded = existing
            .sources
            .iter()
            .any(|s| s.url == candidate.source_link.trim());
        let body = self.merge_body(&existing.body, &candidate.body, already_recorded);
        let sources = self.merge_sources(&existing.sources, &candidate.source_link);

        debug!(
            path = %existing.path,
            keywords = keywords.len(),
            sources = sources.len(),
            "articles merged"
        );

        ArticleDocument {
            title: existing
                .title
                .clone()
                .or_else(|| Some(candidate.title.clone())),
            has_keywords_line: !keywords.is_empty(),
            keywords: keywords.into_vec(),
            body,
            sources,
        }
    }

    /// Append `addition` under a new section. A candidate from an already
    /// recorded source whose body is already present is a re-merge and adds
    /// nothing.
    fn merge_body(&self, existing: &str, addition: &str, already_recorded: bool) -> String {
        let addition = addition.trim();
        if addition.is_empty() || (already_recorded && existing.contains(addition)) {
            return existing.to_string();
        }

        let section = format!("{ADDITIONAL_CONTEXT_HEADING}\n\n{addition}");
        if existing.is_empty() {
            section
        } else {
            format!("{existing}\n\n{section}")
        }
    }

    fn merge_sources(&self, existing: &[SourceLink], new_link: &str) -> Vec<SourceLink> {
        let mut sources = existing.to_vec();
        let new_link = new_link.trim();
        if new_link.is_empty() {
            warn!("candidate has no source link, keeping recorded sources only");
            return sources;
        }
        if !sources.iter().any(|s| s.url == new_link) {
            sources.push(SourceLink::new(&self.source_label, new_link));
        }
        sources
    }
}

impl Default for ArticleMerger {
    fn default() -> Self {
        Self::new(threadkb_shared::DEFAULT_MAX_KEYWORDS, "Slack Thread")
    }
}
