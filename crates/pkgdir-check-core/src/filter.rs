//! Ignored-path predicates consulted for every scanned entry.

use crate::error::Error;
use ahash::AHashSet;
use glob::Pattern;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error};

pub trait PathFilter: Send + Sync {
    fn is_ignored(&self, path: &Path) -> bool;
}

impl<F> PathFilter for F
where
    F: Fn(&Path) -> bool + Send + Sync,
{
    fn is_ignored(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Filter that ignores nothing.
pub struct NoFilter;

impl PathFilter for NoFilter {
    fn is_ignored(&self, _path: &Path) -> bool {
        false
    }
}

/// Glob pattern filter. Invalid patterns are logged and dropped.
pub struct GlobFilter {
    patterns: Vec<Pattern>,
}

impl GlobFilter {
    pub fn new(globs: &[String]) -> Self {
        let patterns = globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl PathFilter for GlobFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
    }
}

/// Paths git considers ignored inside a repository checkout.
///
/// `git ls-files` runs once. Wholly ignored directories are listed once
/// rather than file by file, so lookups match a path or any of its ancestors
/// against the collected set.
pub struct GitIgnoreFilter {
    root: PathBuf,
    ignored: AHashSet<PathBuf>,
}

impl GitIgnoreFilter {
    pub fn load(repo_root: &Path) -> Result<Self, Error> {
        let output = Command::new("git")
            .args([
                "ls-files",
                "--others",
                "--ignored",
                "--exclude-standard",
                "--directory",
                "-z",
            ])
            .current_dir(repo_root)
            .output()
            .map_err(|e| Error::Git(format!("failed to execute git ls-files: {}", e)))?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "git ls-files failed with status {}",
                output.status.code().unwrap_or(1)
            )));
        }

        let root = repo_root.canonicalize()?;
        let filter = Self::from_listing(root, &output.stdout);
        debug!("{} gitignored paths under {}", filter.ignored.len(), filter.root.display());
        Ok(filter)
    }

    /// Builds the filter from NUL separated, root relative paths as printed
    /// by `git ls-files -z`.
    pub fn from_listing(root: PathBuf, listing: &[u8]) -> Self {
        let ignored = listing
            .split(|b| *b == 0)
            .filter(|entry| !entry.is_empty())
            .map(|entry| path_from_bytes(entry.strip_suffix(b"/").unwrap_or(entry)))
            .collect();
        Self { root, ignored }
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

impl PathFilter for GitIgnoreFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        let relative = match path.strip_prefix(&self.root) {
            Ok(relative) => relative,
            Err(_) => return false,
        };
        relative
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| self.ignored.contains(p))
    }
}

/// Ignores a path when any inner filter does.
#[derive(Default)]
pub struct AnyFilter {
    filters: Vec<Box<dyn PathFilter>>,
}

impl AnyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: impl PathFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl PathFilter for AnyFilter {
    fn is_ignored(&self, path: &Path) -> bool {
        self.filters.iter().any(|f| f.is_ignored(path))
    }
}
