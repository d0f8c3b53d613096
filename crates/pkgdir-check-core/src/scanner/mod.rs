//! Package directory checks.
//!
//! [`PkgDirCheck::scan`] lists the package directory up front and returns a
//! [`PkgDirScan`] iterator that does the rest of the work on demand:
//!
//! 1. every directory entry (permissions, characters, ebuild UTF-8 and name
//!    checks), followed by the aggregated name findings;
//! 2. every regular file under `files/` (permissions, emptiness, characters,
//!    size), recorded by size;
//! 3. duplicate detection, hashing one colliding size bucket at a time.
//!
//! Dropping the iterator early stops all remaining filesystem work.

pub mod walk;

use crate::atom::Cpv;
use crate::dupes::{self, FilesBySize, SizedFile};
use crate::error::Error;
use crate::filter::PathFilter;
use crate::finding::{Finding, FindingKind};
use crate::hasher::Digester;
use crate::platform;
use crate::repo::PackageGroup;
use crate::rules::{self, EBUILD_EXT, KNOWN_PKGDIR_ENTRIES, UTF8_PROBE_LENGTH};
use std::collections::VecDeque;
use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, Read};
use std::mem;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walk::{AuxFile, FilesWalker};

pub struct PkgDirCheck<'a> {
    repo_root: PathBuf,
    filter: &'a dyn PathFilter,
    digester: &'a dyn Digester,
    strict_unknown_entries: bool,
}

impl<'a> PkgDirCheck<'a> {
    pub fn new(repo_root: &Path, filter: &'a dyn PathFilter, digester: &'a dyn Digester) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            filter,
            digester,
            strict_unknown_entries: false,
        }
    }

    /// Report entries other than ebuilds, `Manifest`, `metadata.xml` and
    /// `files` as unknown.
    pub fn strict_unknown_entries(mut self, strict: bool) -> Self {
        self.strict_unknown_entries = strict;
        self
    }

    /// Starts a scan of the group's package directory. Fails only when the
    /// directory itself cannot be listed.
    pub fn scan(&self, group: &PackageGroup) -> Result<PkgDirScan<'a>, Error> {
        let pkg_path = self
            .repo_root
            .join(group.category())
            .join(group.package());

        let listing = fs::read_dir(&pkg_path).map_err(|source| Error::MissingPackageDir {
            path: pkg_path.clone(),
            source,
        })?;
        let mut entries = Vec::new();
        for entry in listing {
            match entry {
                Ok(entry) => entries.push(entry.file_name()),
                Err(err) => warn!("Error reading entry in {}: {}", pkg_path.display(), err),
            }
        }
        entries.sort();
        debug!("Scanning {} ({} entries)", pkg_path.display(), entries.len());

        Ok(PkgDirScan {
            category: group.category().to_string(),
            package: group.package().to_string(),
            pkg_path,
            filter: self.filter,
            digester: self.digester,
            strict_unknown_entries: self.strict_unknown_entries,
            phase: Phase::Entries,
            pending: VecDeque::new(),
            entries: entries.into_iter(),
            names: NameAccumulator::default(),
            files: None,
            files_by_size: FilesBySize::new(),
            collisions: Vec::new().into_iter(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Entries,
    Files,
    Duplicates,
    Done,
}

/// Recipe names collected across one directory listing.
#[derive(Debug, Default)]
struct NameAccumulator {
    mismatched: Vec<String>,
    invalid: Vec<String>,
    unknown: Vec<String>,
}

impl NameAccumulator {
    fn into_findings(mut self) -> Vec<FindingKind> {
        let mut findings = Vec::new();
        if !self.mismatched.is_empty() {
            self.mismatched.sort();
            findings.push(FindingKind::MismatchedPN {
                ebuilds: self.mismatched,
            });
        }
        if !self.invalid.is_empty() {
            self.invalid.sort();
            findings.push(FindingKind::InvalidPN {
                ebuilds: self.invalid,
            });
        }
        if !self.unknown.is_empty() {
            self.unknown.sort();
            findings.push(FindingKind::UnknownPkgDirEntry {
                filenames: self.unknown,
            });
        }
        findings
    }
}

/// Lazy sequence of findings for one package directory.
pub struct PkgDirScan<'a> {
    category: String,
    package: String,
    pkg_path: PathBuf,
    filter: &'a dyn PathFilter,
    digester: &'a dyn Digester,
    strict_unknown_entries: bool,
    phase: Phase,
    pending: VecDeque<FindingKind>,
    entries: std::vec::IntoIter<OsString>,
    names: NameAccumulator,
    files: Option<FilesWalker<'a>>,
    files_by_size: FilesBySize,
    collisions: std::vec::IntoIter<(u64, Vec<SizedFile>)>,
}

impl PkgDirScan<'_> {
    pub fn pkg_path(&self) -> &Path {
        &self.pkg_path
    }

    fn check_entry(&mut self, entry: &OsStr) {
        let path = self.pkg_path.join(entry);
        let lossy = entry.to_string_lossy();
        let name: &str = &lossy;
        if self.filter.is_ignored(&path) {
            debug!("Ignoring {}", path.display());
            return;
        }

        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {
                if rules::is_executable(platform::file_mode(&metadata)) {
                    self.pending.push_back(FindingKind::ExecutableFile {
                        filename: name.to_string(),
                    });
                }
            }
            Ok(_) => {}
            Err(err) => debug!("Error getting metadata for {}: {}", path.display(), err),
        }

        let chars = rules::banned_chars(name);
        if !chars.is_empty() {
            self.pending.push_back(FindingKind::BannedCharacter {
                filename: name.to_string(),
                chars,
            });
        }

        if let Some(stem) = name.strip_suffix(EBUILD_EXT) {
            match probe_utf8(&path) {
                Ok(Some(error)) => self.pending.push_back(FindingKind::InvalidUtf8 {
                    filename: name.to_string(),
                    error,
                }),
                Ok(None) => {}
                Err(err) => warn!("Error reading {}: {}", path.display(), err),
            }

            match Cpv::parse_versioned_atom(&format!("={}/{}", self.category, stem)) {
                Ok(cpv) if cpv.package() != self.package => {
                    self.names.mismatched.push(stem.to_string())
                }
                Ok(_) => {}
                Err(_) => self.names.invalid.push(stem.to_string()),
            }
        } else if self.strict_unknown_entries && !KNOWN_PKGDIR_ENTRIES.contains(&name) {
            self.names.unknown.push(name.to_string());
        }
    }

    fn check_file(&mut self, file: AuxFile) {
        if rules::is_executable(file.mode) {
            self.pending.push_back(FindingKind::ExecutableFile {
                filename: file.rel_path.clone(),
            });
        }
        if file.size == 0 {
            self.pending.push_back(FindingKind::EmptyFile {
                filename: file.rel_path.clone(),
            });
        } else if rules::exceeds_size_limit(file.size) {
            self.pending.push_back(FindingKind::SizeViolation {
                filename: file.rel_path.clone(),
                size: file.size,
            });
        }
        let chars = rules::banned_chars(&file.name);
        if !chars.is_empty() {
            self.pending.push_back(FindingKind::BannedCharacter {
                filename: file.rel_path.clone(),
                chars,
            });
        }
        if file.size > 0 {
            self.files_by_size.insert(
                file.size,
                SizedFile {
                    path: file.path,
                    display: file.rel_path,
                },
            );
        }
    }

    fn advance(&mut self) {
        match self.phase {
            Phase::Entries => match self.entries.next() {
                Some(entry) => self.check_entry(&entry),
                None => {
                    let names = mem::take(&mut self.names);
                    self.pending.extend(names.into_findings());
                    self.files = Some(FilesWalker::new(&self.pkg_path, self.filter));
                    self.phase = Phase::Files;
                }
            },
            Phase::Files => match self.files.as_mut().and_then(|walker| walker.next()) {
                Some(file) => self.check_file(file),
                None => {
                    self.files = None;
                    let by_size = mem::take(&mut self.files_by_size);
                    self.collisions = by_size.into_collisions().into_iter();
                    self.phase = Phase::Duplicates;
                }
            },
            Phase::Duplicates => match self.collisions.next() {
                Some((size, files)) => {
                    let groups = dupes::group_by_digest(&self.pkg_path, size, &files, self.digester);
                    self.pending.extend(
                        groups
                            .into_iter()
                            .map(|files| FindingKind::DuplicateFiles { files }),
                    );
                }
                None => self.phase = Phase::Done,
            },
            Phase::Done => {}
        }
    }
}

impl Iterator for PkgDirScan<'_> {
    type Item = Finding;

    fn next(&mut self) -> Option<Finding> {
        loop {
            if let Some(kind) = self.pending.pop_front() {
                return Some(Finding::new(&self.category, &self.package, kind));
            }
            if self.phase == Phase::Done {
                return None;
            }
            self.advance();
        }
    }
}

/// Checks that the leading bytes of a file decode as UTF-8 and returns the
/// decode error if not.
///
/// Only the first [`UTF8_PROBE_LENGTH`] bytes are read; later bytes are never
/// validated. A multi-byte sequence cut off by the probe boundary of a longer
/// file is accepted.
pub fn probe_utf8(path: &Path) -> io::Result<Option<String>> {
    let mut buffer = Vec::with_capacity(UTF8_PROBE_LENGTH as usize + 1);
    File::open(path)?
        .take(UTF8_PROBE_LENGTH + 1)
        .read_to_end(&mut buffer)?;
    let truncated = buffer.len() as u64 > UTF8_PROBE_LENGTH;
    buffer.truncate(UTF8_PROBE_LENGTH as usize);

    match std::str::from_utf8(&buffer) {
        Ok(_) => Ok(None),
        Err(e) if truncated && e.error_len().is_none() => Ok(None),
        Err(e) => Ok(Some(e.to_string())),
    }
}
