//! Markdown handling for KB articles: slug normalization and metadata
//! extraction.
//!
//! Articles are parsed into a typed [`ArticleDocument`] (title, keywords,
//! body, sources) and only serialized back to markdown at the very end, so
//! repeated merges never operate on previously rendered text.

mod document;
mod slug;

use tracing::{debug, instrument};

use threadkb_shared::{CandidateArticle, ExistingArticleRecord, SourceLink};

pub use document::{ArticleDocument, render_keywords_line, render_sources};
pub use slug::{MAX_SLUG_LEN, resolve_title, slugify};

/// Parse a freshly generated article.
///
/// A missing or symbol-only title is replaced by `default_title`.
#[instrument(skip(markdown), fields(len = markdown.len()))]
pub fn parse_candidate(markdown: &str, source_link: &str, default_title: &str) -> CandidateArticle {
    let doc = ArticleDocument::parse(markdown, "");
    let (title, _) = resolve_title(doc.title.as_deref().unwrap_or(""), default_title);

    debug!(
        title = %title,
        keywords = doc.keywords.len(),
        "candidate parsed"
    );

    CandidateArticle {
        title,
        keywords: doc.keywords,
        body: doc.body,
        source_link: source_link.to_string(),
        raw: markdown.to_string(),
    }
}

/// Parse an article read from the catalog.
///
/// `source_label` is applied to source entries stored as bare URLs.
#[instrument(skip(raw_content), fields(len = raw_content.len()))]
pub fn parse_existing(path: &str, raw_content: &str, source_label: &str) -> ExistingArticleRecord {
    let doc = ArticleDocument::parse(raw_content, source_label);

    debug!(
        title = doc.title.as_deref().unwrap_or("<none>"),
        keywords = doc.keywords.len(),
        sources = doc.sources.len(),
        "existing article parsed"
    );

    ExistingArticleRecord {
        path: path.to_string(),
        raw_content: raw_content.to_string(),
        title: doc.title,
        keywords: doc.keywords,
        sources: doc.sources,
        body: doc.body,
    }
}

/// Render the content of a brand-new article: the candidate markdown as
/// produced, followed by a single-source block.
pub fn render_new_article(candidate: &CandidateArticle, source: &SourceLink) -> String {
    let sources = render_sources(std::slice::from_ref(source));
    let raw = candidate.raw.trim_end();
    if raw.is_empty() {
        return format!("---\n\n{sources}\n");
    }
    format!("{raw}\n\n---\n\n{sources}\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_extracts_parts() {
        let md = "# GraphQL Pagination Patterns\n**Keywords:** graphql, pagination\n\nUse cursors.\n";
        let c = parse_candidate(md, "S9", "Thread Summary");
        assert_eq!(c.title, "GraphQL Pagination Patterns");
        assert_eq!(c.keywords, vec!["graphql", "pagination"]);
        assert_eq!(c.body, "Use cursors.");
        assert_eq!(c.source_link, "S9");
        assert_eq!(c.raw, md);
    }

    #[test]
    fn candidate_without_title_uses_default() {
        let c = parse_candidate("Some notes without a heading.", "S1", "Thread Summary");
        assert_eq!(c.title, "Thread Summary");
        assert_eq!(c.body, "Some notes without a heading.");

        let c = parse_candidate("# ???\n\nBody", "S1", "Thread Summary");
        assert_eq!(c.title, "Thread Summary");
    }

    #[test]
    fn unspaced_heading_is_title() {
        let c = parse_candidate("#Redis HA\n\nBody", "S1", "Thread Summary");
        assert_eq!(c.title, "Redis HA");
        assert_eq!(c.body, "Body");

        let rec = parse_existing("kb/foo.md", "#Foo\n\nBody\n", "Slack Thread");
        assert_eq!(rec.title.as_deref(), Some("Foo"));
        assert_eq!(rec.body, "Body");
    }

    #[test]
    fn existing_record_fields() {
        let raw = "# Redis HA\n\n**Keywords:** redis, clustering\n\nSentinel setup.\n\n---\n\n**Source:** [Slack Thread](S1)\n";
        let rec = parse_existing("kb/redis-ha.md", raw, "Slack Thread");
        assert_eq!(rec.path, "kb/redis-ha.md");
        assert_eq!(rec.title.as_deref(), Some("Redis HA"));
        assert_eq!(rec.keywords, vec!["redis", "clustering"]);
        assert_eq!(rec.sources, vec![SourceLink::new("Slack Thread", "S1")]);
        assert_eq!(rec.body, "Sentinel setup.");
        assert_eq!(rec.raw_content, raw);
    }

    #[test]
    fn new_article_appends_single_source() {
        let md = "# GraphQL Pagination Patterns\n\nUse cursors.\n";
        let c = parse_candidate(md, "S2", "Thread Summary");
        let content = render_new_article(&c, &SourceLink::new("Slack Thread", "S2"));
        assert_eq!(
            content,
            "# GraphQL Pagination Patterns\n\nUse cursors.\n\n---\n\n**Source:** [Slack Thread](S2)\n"
        );
    }
}
