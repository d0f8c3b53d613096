use crate::filter::PathFilter;
use crate::platform;
use crate::rules::IGNORED_DIRS;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};
use walkdir::{DirEntry, FilterEntry, IntoIter, WalkDir};

/// A regular file found under `files/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuxFile {
    /// On-disk path relative to the package directory.
    pub path: PathBuf,
    /// `path` as reported in findings, `files/` prefix included.
    pub rel_path: String,
    pub name: String,
    pub mode: u32,
    pub size: u64,
}

type EntryPredicate = fn(&DirEntry) -> bool;

/// Lazy recursive walk of a package's `files/` subtree.
///
/// Version control metadata directories are pruned before descending,
/// symlinks are neither followed nor reported, and ignored files are skipped
/// one by one. Entries come out sorted by file name.
pub struct FilesWalker<'a> {
    pkg_path: PathBuf,
    filter: &'a dyn PathFilter,
    inner: Option<FilterEntry<IntoIter, EntryPredicate>>,
}

impl<'a> FilesWalker<'a> {
    /// A missing `files/` directory walks nothing.
    pub fn new(pkg_path: &Path, filter: &'a dyn PathFilter) -> Self {
        let root = pkg_path.join("files");
        let inner = if root.is_dir() {
            let walker = WalkDir::new(&root)
                .min_depth(1)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(keep_entry as EntryPredicate);
            Some(walker)
        } else {
            trace!("No files directory in {}", pkg_path.display());
            None
        };
        Self {
            pkg_path: pkg_path.to_path_buf(),
            filter,
            inner,
        }
    }

    fn visit(&self, entry: &DirEntry) -> Option<AuxFile> {
        if !entry.file_type().is_file() {
            return None;
        }
        let path = entry.path();
        if self.filter.is_ignored(path) {
            trace!("Ignoring {}", path.display());
            return None;
        }
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("Error getting metadata for {}: {}", path.display(), err);
                return None;
            }
        };
        let rel = path.strip_prefix(&self.pkg_path).unwrap_or(path).to_path_buf();
        Some(AuxFile {
            rel_path: rel.to_string_lossy().into_owned(),
            path: rel,
            name: entry.file_name().to_string_lossy().into_owned(),
            mode: platform::file_mode(&metadata),
            size: metadata.len(),
        })
    }
}

impl Iterator for FilesWalker<'_> {
    type Item = AuxFile;

    fn next(&mut self) -> Option<AuxFile> {
        loop {
            let entry = match self.inner.as_mut()?.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Error walking {}: {}", self.pkg_path.display(), err);
                    continue;
                }
            };
            if let Some(file) = self.visit(&entry) {
                return Some(file);
            }
        }
    }
}

fn keep_entry(entry: &DirEntry) -> bool {
    !(entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name)))
}
