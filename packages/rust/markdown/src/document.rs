//! Typed article model: parse a KB article into its structural parts and
//! render it back.
//!
//! A KB article looks like:
//!
//! ```text
//! # Title
//!
//! **Keywords:** redis, clustering
//!
//! Body ...
//!
//! ---
//!
//! **Sources:**
//! - [Slack Thread](https://...)
//! - [Slack Thread](https://...)
//! ```
//!
//! Parsing is line-based and fence-aware: headings, keyword lines and rules
//! inside fenced code blocks are body text. Parsing never fails; any part that
//! cannot be found is left empty.

use std::sync::LazyLock;

use regex::Regex;

use threadkb_shared::{KeywordSet, SourceLink};

// The space after the marker is optional (`#Title`); a closing `#` run is
// only stripped when whitespace precedes it, so `C#` survives.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#+\s*([^#\s].*?)(?:\s+#+)?\s*$").expect("valid regex")
});

static KEYWORDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*Keywords:\*\*\s*(.*)$").expect("valid regex"));

static SOURCES_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*\*Sources?:\*\*\s*(.*)$").expect("valid regex"));

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)\s]+)\)").expect("valid regex"));

/// Structural parts of a KB article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleDocument {
    /// Text of the first heading, without the marker.
    pub title: Option<String>,
    /// Whether a `**Keywords:**` line was present (even if empty).
    pub has_keywords_line: bool,
    /// Keywords in stored order, deduplicated ignoring case.
    pub keywords: Vec<String>,
    /// Everything that is not title, keywords line or sources block.
    pub body: String,
    /// Entries of the trailing sources block, oldest first.
    pub sources: Vec<SourceLink>,
}

impl ArticleDocument {
    /// Parse markdown into its parts. Bare (unbracketed) source URLs are
    /// given `fallback_label` as link text.
    pub fn parse(markdown: &str, fallback_label: &str) -> Self {
        let lines: Vec<&str> = markdown.lines().collect();
        let fenced = fence_mask(&lines);

        let sources_block = find_sources_block(&lines, &fenced, fallback_label);
        let content_end = sources_block
            .as_ref()
            .map(|b| b.start)
            .unwrap_or(lines.len());

        let mut title = None;
        let mut title_idx = None;
        for (i, line) in lines[..content_end].iter().enumerate() {
            if fenced[i] {
                continue;
            }
            if let Some(caps) = HEADING_RE.captures(line) {
                title = Some(caps[1].to_string());
                title_idx = Some(i);
                break;
            }
        }

        let mut keywords_idx = None;
        let mut keywords = Vec::new();
        for (i, line) in lines[..content_end].iter().enumerate() {
            if fenced[i] || Some(i) == title_idx {
                continue;
            }
            if let Some(caps) = KEYWORDS_RE.captures(line.trim()) {
                keywords = split_keywords(&caps[1]);
                keywords_idx = Some(i);
                break;
            }
        }

        let body_lines: Vec<&str> = lines[..content_end]
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != title_idx && Some(*i) != keywords_idx)
            .map(|(_, line)| *line)
            .collect();
        let mut body = join_trimmed(&body_lines);

        let mut sources = Vec::new();
        if let Some(block) = sources_block {
            // Text hand-added below the link list belongs to the body.
            let trailer = join_trimmed(&lines[block.end..]);
            if !trailer.is_empty() {
                if !body.is_empty() {
                    body.push_str("\n\n");
                }
                body.push_str(&trailer);
            }
            sources = block.links;
        }

        Self {
            title,
            has_keywords_line: keywords_idx.is_some(),
            keywords,
            body,
            sources,
        }
    }

    /// Render the canonical form: title, keywords line, body, rule, sources.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(title) = &self.title {
            parts.push(format!("# {title}"));
        }
        if !self.keywords.is_empty() {
            parts.push(render_keywords_line(&self.keywords));
        }
        if !self.body.is_empty() {
            parts.push(self.body.clone());
        }
        if !self.sources.is_empty() {
            parts.push("---".to_string());
            parts.push(render_sources(&self.sources));
        }

        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }
}

/// Render `**Keywords:** a, b, c`.
pub fn render_keywords_line(keywords: &[String]) -> String {
    format!("**Keywords:** {}", keywords.join(", "))
}

/// Render a sources block: singular `Source` line for one link, a bulleted
/// `Sources` list otherwise. Empty input renders as an empty string.
pub fn render_sources(sources: &[SourceLink]) -> String {
    match sources {
        [] => String::new(),
        [only] => format!("**Source:** {only}"),
        many => {
            let mut out = String::from("**Sources:**");
            for link in many {
                out.push_str("\n- ");
                out.push_str(&link.to_string());
            }
            out
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Location and contents of a trailing sources block.
struct SourcesBlock {
    /// Index of the `---` rule.
    start: usize,
    /// One past the last line belonging to the block.
    end: usize,
    links: Vec<SourceLink>,
}

/// Mark each line that is inside (or delimits) a fenced code block.
fn fence_mask(lines: &[&str]) -> Vec<bool> {
    let mut mask = Vec::with_capacity(lines.len());
    let mut open: Option<&str> = None;

    for line in lines {
        let trimmed = line.trim_start();
        let marker = if trimmed.starts_with("```") {
            Some("```")
        } else if trimmed.starts_with("~~~") {
            Some("~~~")
        } else {
            None
        };

        match (open, marker) {
            (None, Some(m)) => {
                open = Some(m);
                mask.push(true);
            }
            (Some(o), Some(m)) if o == m => {
                open = None;
                mask.push(true);
            }
            (Some(_), _) => mask.push(true),
            (None, None) => mask.push(false),
        }
    }

    mask
}

/// Find the last `---` rule (outside fences) followed by a Source(s) label.
fn find_sources_block(
    lines: &[&str],
    fenced: &[bool],
    fallback_label: &str,
) -> Option<SourcesBlock> {
    for start in (0..lines.len()).rev() {
        if fenced[start] || lines[start].trim() != "---" {
            continue;
        }

        let Some(label_idx) = (start + 1..lines.len()).find(|&j| !lines[j].trim().is_empty())
        else {
            continue;
        };
        if fenced[label_idx] {
            continue;
        }
        let Some(caps) = SOURCES_LABEL_RE.captures(lines[label_idx].trim()) else {
            continue;
        };

        let mut links = parse_link_entry(&caps[1], fallback_label).unwrap_or_default();
        let mut end = label_idx + 1;
        let mut scan = end;
        while scan < lines.len() {
            let trimmed = lines[scan].trim();
            if trimmed.is_empty() {
                scan += 1;
                continue;
            }
            let entry = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
                .or_else(|| trimmed.strip_prefix("+ "))
                .unwrap_or(trimmed);
            match parse_link_entry(entry, fallback_label) {
                Some(found) => {
                    links.extend(found);
                    scan += 1;
                    end = scan;
                }
                None => break,
            }
        }

        return Some(SourcesBlock { start, end, links });
    }

    None
}

/// Parse one sources entry: bracketed links, or a single bare URL token.
fn parse_link_entry(text: &str, fallback_label: &str) -> Option<Vec<SourceLink>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let links: Vec<SourceLink> = LINK_RE
        .captures_iter(text)
        .map(|caps| SourceLink::new(&caps[1], &caps[2]))
        .collect();
    if !links.is_empty() {
        return Some(links);
    }

    if !text.contains(char::is_whitespace) && text.contains("://") {
        return Some(vec![SourceLink::new(fallback_label, text)]);
    }

    None
}

fn split_keywords(list: &str) -> Vec<String> {
    let mut set = KeywordSet::unbounded();
    set.extend(list.split(','));
    set.into_vec()
}

/// Join lines, dropping blank lines at both ends and trailing whitespace.
fn join_trimmed(lines: &[&str]) -> String {
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let last = lines.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last]
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
