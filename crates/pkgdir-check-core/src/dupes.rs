use crate::hasher::{Digest, Digester};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, trace};

/// A file recorded for duplicate detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizedFile {
    /// On-disk path relative to the package directory.
    pub path: PathBuf,
    /// Name reported in findings.
    pub display: String,
}

/// Non-empty files keyed by byte size.
///
/// Every file in a bucket has exactly the bucket's size. Buckets iterate in
/// ascending size order so duplicate groups come out deterministically.
#[derive(Debug, Default)]
pub struct FilesBySize {
    buckets: BTreeMap<u64, Vec<SizedFile>>,
}

impl FilesBySize {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, size: u64, file: SizedFile) {
        self.buckets.entry(size).or_default().push(file);
    }

    /// Consumes the map, keeping only buckets of two or more files, the only
    /// possible duplicates, in ascending size order.
    pub fn into_collisions(self) -> Vec<(u64, Vec<SizedFile>)> {
        self.buckets
            .into_iter()
            .filter(|(_, files)| files.len() > 1)
            .collect()
    }
}

/// Hashes one size bucket and returns its groups of identical files by
/// display name, each sorted. `base` is the directory the recorded paths are
/// relative to. A file that cannot be hashed is logged and left out of
/// grouping.
pub fn group_by_digest(
    base: &Path,
    size: u64,
    files: &[SizedFile],
    digester: &dyn Digester,
) -> Vec<Vec<String>> {
    let mut files_by_digest: AHashMap<Digest, Vec<String>> = AHashMap::new();
    for file in files {
        let path = base.join(&file.path);
        match digester.digest(&path) {
            Ok(digest) => {
                trace!("{} ({} bytes) -> {}", file.display, size, digest);
                files_by_digest
                    .entry(digest)
                    .or_default()
                    .push(file.display.clone());
            }
            Err(e) => {
                error!("Error hashing file '{}': {}", path.display(), e);
            }
        }
    }

    let mut groups: Vec<Vec<String>> = files_by_digest
        .into_values()
        .filter(|group| group.len() > 1)
        .map(|mut group| {
            group.sort();
            group
        })
        .collect();
    groups.sort();
    groups
}
