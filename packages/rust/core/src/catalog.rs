//! Read-only views over the article corpus.
//!
//! Every [`Catalog`] lists `.md` files of one directory (non-recursive) in
//! case-sensitive lexicographic path order. The title matcher breaks ties by
//! this order, so implementations must keep it stable.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use threadkb_shared::{CatalogEntry, Result, ThreadKbError};

/// Read access to previously published articles.
pub trait Catalog {
    /// List the articles directly inside `dir`, sorted by path.
    /// A directory that does not exist lists as empty.
    fn list(&self, dir: &str) -> Result<Vec<CatalogEntry>>;

    /// Read an article. `rev` selects a revision where the store has them.
    /// Returns `Ok(None)` when the article does not exist.
    fn read(&self, path: &str, rev: Option<&str>) -> Result<Option<String>>;
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn list(&self, dir: &str) -> Result<Vec<CatalogEntry>> {
        (**self).list(dir)
    }

    fn read(&self, path: &str, rev: Option<&str>) -> Result<Option<String>> {
        (**self).read(path, rev)
    }
}

// ---------------------------------------------------------------------------
// FsCatalog
// ---------------------------------------------------------------------------

/// Catalog over a checked-out working tree. Revisions are ignored.
#[derive(Debug, Clone)]
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Catalog for FsCatalog {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn list(&self, dir: &str) -> Result<Vec<CatalogEntry>> {
        let dir = normalize_dir(dir);
        let dir_path = resolve_inside(&self.root, &dir)?;
        if !dir_path.is_dir() {
            debug!(path = %dir_path.display(), "catalog directory missing, listing empty");
            return Ok(Vec::new());
        }

        let read_dir = std::fs::read_dir(&dir_path).map_err(|e| ThreadKbError::io(&dir_path, e))?;
        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|e| ThreadKbError::io(&dir_path, e))?;
            let is_file = item
                .file_type()
                .map_err(|e| ThreadKbError::io(item.path(), e))?
                .is_file();
            let Some(name) = item.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if is_file && name.ends_with(".md") {
                entries.push(CatalogEntry::from_path(join_path(&dir, &name)));
            }
        }

        entries.sort();
        debug!(count = entries.len(), "catalog listed");
        Ok(entries)
    }

    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn read(&self, path: &str, _rev: Option<&str>) -> Result<Option<String>> {
        let file = resolve_inside(&self.root, path)?;
        match std::fs::read_to_string(&file) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ThreadKbError::io(file, e)),
        }
    }
}

// ---------------------------------------------------------------------------
// GitCatalog
// ---------------------------------------------------------------------------

/// Catalog over a git repository at a fixed revision, read through the
/// `git` CLI. Reads may override the revision per call.
#[derive(Debug, Clone)]
pub struct GitCatalog {
    repo: PathBuf,
    rev: String,
}

impl GitCatalog {
    pub fn new(repo: impl Into<PathBuf>, rev: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            rev: rev.into(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new("git")
            .arg("-C")
            .arg(&self.repo)
            .args(args)
            .output()
            .map_err(|e| ThreadKbError::catalog(format!("failed to run git: {e}")))
    }
}

impl Catalog for GitCatalog {
    #[instrument(skip(self), fields(repo = %self.repo.display(), rev = %self.rev))]
    fn list(&self, dir: &str) -> Result<Vec<CatalogEntry>> {
        let dir = normalize_dir(dir);
        let pathspec = format!("{dir}/");
        // `-z` keeps non-ASCII names unquoted.
        let mut args = vec!["ls-tree", "-z", "--name-only", self.rev.as_str()];
        if !dir.is_empty() {
            args.extend(["--", pathspec.as_str()]);
        }
        let output = self.git(&args)?;
        if !output.status.success() {
            return Err(ThreadKbError::catalog(format!(
                "git ls-tree {} failed: {}",
                self.rev,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let entries = parse_ls_tree(&String::from_utf8_lossy(&output.stdout));
        debug!(count = entries.len(), "catalog listed");
        Ok(entries)
    }

    #[instrument(skip(self), fields(repo = %self.repo.display()))]
    fn read(&self, path: &str, rev: Option<&str>) -> Result<Option<String>> {
        let rev = rev.unwrap_or(&self.rev);
        let object = format!("{rev}:{path}");
        let output = self.git(&["show", &object])?;
        if output.status.success() {
            return Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_path(&stderr) {
            return Ok(None);
        }
        Err(ThreadKbError::catalog(format!(
            "git show {object} failed: {}",
            stderr.trim()
        )))
    }
}

/// Turn NUL-separated `git ls-tree -z --name-only` output into sorted `.md`
/// entries.
fn parse_ls_tree(stdout: &str) -> Vec<CatalogEntry> {
    let mut entries: Vec<CatalogEntry> = stdout
        .split('\0')
        .filter(|line| line.ends_with(".md"))
        .map(CatalogEntry::from_path)
        .collect();
    entries.sort();
    entries
}

fn is_missing_path(stderr: &str) -> bool {
    stderr.contains("does not exist in") || stderr.contains("exists on disk, but not in")
}

// ---------------------------------------------------------------------------
// MemoryCatalog
// ---------------------------------------------------------------------------

/// In-memory catalog keyed by corpus-relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    docs: BTreeMap<String, String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.docs.insert(path.into(), content.into());
    }
}

impl Catalog for MemoryCatalog {
    fn list(&self, dir: &str) -> Result<Vec<CatalogEntry>> {
        let dir = normalize_dir(dir);
        let entries = self
            .docs
            .keys()
            .filter(|path| path.ends_with(".md"))
            .filter(|path| match path.rsplit_once('/') {
                Some((parent, _)) => parent == dir,
                None => dir.is_empty(),
            })
            .map(|path| CatalogEntry::from_path(path.as_str()))
            .collect();
        Ok(entries)
    }

    fn read(&self, path: &str, _rev: Option<&str>) -> Result<Option<String>> {
        Ok(self.docs.get(path).cloned())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Strip surrounding slashes and a leading `./`.
pub(crate) fn normalize_dir(dir: &str) -> String {
    dir.trim()
        .trim_start_matches("./")
        .trim_matches('/')
        .to_string()
}

/// Join a normalized directory and a file name with `/`.
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Resolve a corpus-relative path under `root`, rejecting escapes.
pub(crate) fn resolve_inside(root: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ThreadKbError::validation(format!(
            "path '{relative}' must stay inside the corpus"
        )));
    }
    Ok(root.join(rel))
}
