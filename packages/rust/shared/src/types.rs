//! Core domain types for threadkb articles.

use serde::{Deserialize, Serialize};

/// Default cap on the number of keywords an article keeps.
pub const DEFAULT_MAX_KEYWORDS: usize = 10;

// ---------------------------------------------------------------------------
// KeywordSet
// ---------------------------------------------------------------------------

/// Ordered keyword set: case-insensitive dedupe, first spelling wins, capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    items: Vec<String>,
    cap: usize,
}

impl KeywordSet {
    /// Empty set with the default cap.
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_MAX_KEYWORDS)
    }

    /// Empty set holding at most `cap` keywords.
    pub fn with_cap(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            cap,
        }
    }

    /// Empty set with no practical cap (used when parsing stored articles).
    pub fn unbounded() -> Self {
        Self::with_cap(usize::MAX)
    }

    /// Insert a keyword. Returns `false` if it was blank, already present
    /// (ignoring case), or the set is full.
    pub fn insert(&mut self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        if keyword.is_empty() || self.items.len() >= self.cap || self.contains(keyword) {
            return false;
        }
        self.items.push(keyword.to_string());
        true
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        self.items.iter().any(|k| k.to_lowercase() == needle)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: AsRef<str>> Extend<S> for KeywordSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for keyword in iter {
            self.insert(keyword.as_ref());
        }
    }
}

// ---------------------------------------------------------------------------
// SourceLink
// ---------------------------------------------------------------------------

/// One entry of an article's sources block: `[label](url)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLink {
    /// Link text.
    pub label: String,
    /// Link target (the originating conversation).
    pub url: String,
}

impl SourceLink {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

impl std::fmt::Display for SourceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]({})", self.label, self.url)
    }
}

// ---------------------------------------------------------------------------
// Catalog entries
// ---------------------------------------------------------------------------

/// One article file in the corpus listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Path relative to the corpus root (e.g., `kb/redis-ha.md`).
    pub path: String,
    /// File name (e.g., `redis-ha.md`).
    pub name: String,
}

impl CatalogEntry {
    /// Build an entry from a corpus-relative path; the name is its last segment.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { path, name }
    }

    /// File name without its `.md` extension.
    pub fn stem(&self) -> &str {
        self.name.strip_suffix(".md").unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------------

/// A freshly generated article waiting to be reconciled against the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateArticle {
    /// Heading text, without the `#` marker.
    pub title: String,
    /// Keywords in first-seen order.
    pub keywords: Vec<String>,
    /// Everything after the title and keywords line.
    pub body: String,
    /// Link back to the originating conversation.
    pub source_link: String,
    /// The candidate markdown exactly as produced.
    pub raw: String,
}

/// A previously published article, parsed from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingArticleRecord {
    /// Corpus-relative path.
    pub path: String,
    /// Content as read from the catalog.
    pub raw_content: String,
    /// Heading text, if the document had one.
    pub title: Option<String>,
    /// Keywords in stored order.
    pub keywords: Vec<String>,
    /// Sources in publication order.
    pub sources: Vec<SourceLink>,
    /// Content with title, keywords line and sources block removed.
    pub body: String,
}

// ---------------------------------------------------------------------------
// MergeResult
// ---------------------------------------------------------------------------

/// Terminal artifact of a reconciliation, handed to the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Full markdown document to write.
    pub final_content: String,
    /// `true` when an existing article is being extended.
    pub is_update: bool,
    /// Corpus-relative path to write to.
    pub file_path: String,
    /// Commit / PR title, e.g. `Add KB article: Redis High Availability`.
    pub change_summary_title: String,
    /// Candidate title after default-title fallback.
    pub title: String,
    /// Slug derived from `title`.
    pub slug: String,
    /// Keywords of the resulting document.
    pub keywords: Vec<String>,
    /// Sources of the resulting document, oldest first.
    pub sources: Vec<SourceLink>,
}
