//! Title matching: decide which existing article, if any, a candidate slug
//! refers to.
//!
//! 1. An entry whose file stem equals the slug is an exact match and wins.
//! 2. Otherwise slugs are compared by their significant tokens (hyphen
//!    separated parts of at least `min_token_len` chars). An entry qualifies
//!    when it shares at least one token and at least half (rounded down) of
//!    the smaller token set.
//! 3. Among qualifying entries the highest `common / smaller set` ratio wins;
//!    ties go to the entry listed first.

use std::collections::HashSet;

use tracing::debug;

use threadkb_shared::CatalogEntry;

/// How a catalog entry matched.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchKind {
    /// File stem equals the candidate slug.
    Exact,
    /// Token overlap heuristic.
    Fuzzy {
        /// Number of shared significant tokens.
        common: usize,
        /// `common / min(|candidate|, |existing|)`.
        ratio: f64,
    },
}

/// The catalog entry a candidate was matched to.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleMatch {
    pub entry: CatalogEntry,
    pub kind: MatchKind,
}

/// Matches candidate slugs against a catalog listing.
#[derive(Debug, Clone)]
pub struct TitleMatcher {
    min_token_len: usize,
}

impl Default for TitleMatcher {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TitleMatcher {
    pub fn new(min_token_len: usize) -> Self {
        Self { min_token_len }
    }

    /// Find the best entry for `slug`, or `None` if nothing qualifies.
    ///
    /// Besides `common >= min / 2`, a fuzzy match needs at least one shared
    /// token; with single-token slugs the half threshold alone is zero and
    /// would match unrelated articles.
    pub fn find_match(&self, slug: &str, entries: &[CatalogEntry]) -> Option<TitleMatch> {
        if slug.is_empty() {
            return None;
        }

        if let Some(entry) = entries.iter().find(|e| e.stem() == slug) {
            debug!(path = %entry.path, "exact title match");
            return Some(TitleMatch {
                entry: entry.clone(),
                kind: MatchKind::Exact,
            });
        }

        let wanted = self.significant_tokens(slug);
        if wanted.is_empty() {
            return None;
        }

        let mut best: Option<(usize, usize, f64)> = None;
        for (idx, entry) in entries.iter().enumerate() {
            let existing = self.significant_tokens(entry.stem());
            if existing.is_empty() {
                continue;
            }

            let common = wanted.intersection(&existing).count();
            let smaller = wanted.len().min(existing.len());
            if common == 0 || common < smaller / 2 {
                continue;
            }

            let ratio = common as f64 / smaller as f64;
            if best.is_none_or(|(_, _, best_ratio)| ratio > best_ratio) {
                best = Some((idx, common, ratio));
            }
        }

        best.map(|(idx, common, ratio)| {
            let entry = entries[idx].clone();
            debug!(path = %entry.path, common, ratio, "fuzzy title match");
            TitleMatch {
                entry,
                kind: MatchKind::Fuzzy { common, ratio },
            }
        })
    }

    /// Hyphen-separated slug parts with at least `min_token_len` chars.
    pub fn significant_tokens<'s>(&self, slug: &'s str) -> HashSet<&'s str> {
        slug.split('-')
            .filter(|token| token.chars().count() >= self.min_token_len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(paths: &[&str]) -> Vec<CatalogEntry> {
        paths.iter().map(|p| CatalogEntry::from_path(*p)).collect()
    }

    #[test]
    fn empty_catalog_never_matches() {
        let m = TitleMatcher::default();
        assert_eq!(m.find_match("graphql-pagination-patterns", &[]), None);
    }

    #[test]
    fn exact_match() {
        let m = TitleMatcher::default();
        let found = m
            .find_match("redis-ha", &entries(&["kb/api.md", "kb/redis-ha.md"]))
            .expect("match");
        assert_eq!(found.entry.path, "kb/redis-ha.md");
        assert_eq!(found.kind, MatchKind::Exact);
    }

    #[test]
    fn exact_beats_earlier_fuzzy() {
        let m = TitleMatcher::default();
        let listing = entries(&[
            "kb/redis-high-availability-guide.md",
            "kb/redis-high-availability.md",
        ]);
        let found = m.find_match("redis-high-availability", &listing).expect("match");
        assert_eq!(found.entry.path, "kb/redis-high-availability.md");
        assert_eq!(found.kind, MatchKind::Exact);
    }

    #[test]
    fn fuzzy_match_on_shared_tokens() {
        let m = TitleMatcher::default();
        let found = m
            .find_match("redis-high-availability", &entries(&["kb/redis-ha.md"]))
            .expect("match");
        assert_eq!(found.entry.path, "kb/redis-ha.md");
        assert_eq!(
            found.kind,
            MatchKind::Fuzzy {
                common: 1,
                ratio: 1.0
            }
        );
    }

    #[test]
    fn zero_overlap_never_matches() {
        let m = TitleMatcher::default();
        // One significant token each: half of one rounds down to zero, but
        // nothing is shared.
        assert_eq!(
            m.find_match("redis-ha", &entries(&["kb/graphql-faq.md"])),
            None
        );
    }

    #[test]
    fn below_threshold_does_not_match() {
        let m = TitleMatcher::default();
        // 1 of 4 shared, threshold is 2.
        let listing = entries(&["kb/kafka-consumer-group-rebalancing.md"]);
        assert_eq!(m.find_match("kafka-streams-state-stores", &listing), None);
    }

    #[test]
    fn highest_ratio_wins_over_listing_order() {
        let m = TitleMatcher::default();
        let listing = entries(&[
            "kb/postgres-index-tuning-guide.md",
            "kb/postgres-vacuum.md",
        ]);
        // First entry: 2 common of min(3, 4) = 0.67; second: 2 of 2 = 1.0.
        let found = m
            .find_match("postgres-vacuum-tuning", &listing)
            .expect("match");
        assert_eq!(found.entry.path, "kb/postgres-vacuum.md");
    }

    #[test]
    fn ties_go_to_first_listed() {
        let m = TitleMatcher::default();
        let listing = entries(&["kb/docker-build-cache.md", "kb/docker-layer-cache.md"]);
        let found = m.find_match("docker-cache-tips", &listing).expect("match");
        assert_eq!(found.entry.path, "kb/docker-build-cache.md");
    }

    #[test]
    fn short_tokens_are_ignored() {
        let m = TitleMatcher::default();
        let tokens = m.significant_tokens("how-to-set-up-redis-ha-mode");
        let mut sorted: Vec<_> = tokens.into_iter().collect();
        sorted.sort();
        assert_eq!(sorted, ["mode", "redis"]);
    }
}
