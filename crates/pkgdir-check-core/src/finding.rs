use crate::rules;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum FindingKind {
    BannedCharacter { filename: String, chars: Vec<char> },
    InvalidPN { ebuilds: Vec<String> },
    MismatchedPN { ebuilds: Vec<String> },
    #[serde(rename = "InvalidUTF8")]
    InvalidUtf8 { filename: String, error: String },
    DuplicateFiles { files: Vec<String> },
    EmptyFile { filename: String },
    ExecutableFile { filename: String },
    UnknownPkgDirEntry { filenames: Vec<String> },
    SizeViolation { filename: String, size: u64 },
    EqualVersions { versions: Vec<String> },
}

/// Kind names, severities and one-line summaries of every finding.
pub const KNOWN_FINDINGS: [(&str, Severity, &str); 10] = [
    ("BannedCharacter", Severity::Error, "file or directory name has characters outside the allowed set"),
    ("InvalidPN", Severity::Error, "ebuilds that have invalid package names"),
    ("MismatchedPN", Severity::Error, "ebuilds that have different names than their parent directory"),
    ("InvalidUTF8", Severity::Error, "ebuild isn't UTF-8 compliant"),
    ("EqualVersions", Severity::Error, "ebuilds that have semantically equal versions"),
    ("DuplicateFiles", Severity::Warning, "two or more identical files in FILESDIR"),
    ("EmptyFile", Severity::Warning, "file in FILESDIR is empty"),
    ("ExecutableFile", Severity::Warning, "file has executable bit, but doesn't need it"),
    ("UnknownPkgDirEntry", Severity::Warning, "unknown files or directories in package directory"),
    ("SizeViolation", Severity::Warning, "file in FILESDIR is too large"),
];

impl FindingKind {
    pub fn name(&self) -> &'static str {
        match self {
            FindingKind::BannedCharacter { .. } => "BannedCharacter",
            FindingKind::InvalidPN { .. } => "InvalidPN",
            FindingKind::MismatchedPN { .. } => "MismatchedPN",
            FindingKind::InvalidUtf8 { .. } => "InvalidUTF8",
            FindingKind::DuplicateFiles { .. } => "DuplicateFiles",
            FindingKind::EmptyFile { .. } => "EmptyFile",
            FindingKind::ExecutableFile { .. } => "ExecutableFile",
            FindingKind::UnknownPkgDirEntry { .. } => "UnknownPkgDirEntry",
            FindingKind::SizeViolation { .. } => "SizeViolation",
            FindingKind::EqualVersions { .. } => "EqualVersions",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            FindingKind::BannedCharacter { .. }
            | FindingKind::InvalidPN { .. }
            | FindingKind::MismatchedPN { .. }
            | FindingKind::InvalidUtf8 { .. }
            | FindingKind::EqualVersions { .. } => Severity::Error,
            FindingKind::DuplicateFiles { .. }
            | FindingKind::EmptyFile { .. }
            | FindingKind::ExecutableFile { .. }
            | FindingKind::UnknownPkgDirEntry { .. }
            | FindingKind::SizeViolation { .. } => Severity::Warning,
        }
    }

    pub fn desc(&self) -> String {
        match self {
            FindingKind::BannedCharacter { filename, chars } => {
                let quoted: Vec<String> = chars.iter().map(|c| format!("{:?}", c)).collect();
                format!(
                    "filename {:?} character{} outside allowed set: {}",
                    filename,
                    plural(chars.len()),
                    quoted.join(", ")
                )
            }
            FindingKind::InvalidPN { ebuilds } => format!(
                "invalid package name{}: [ {} ]",
                plural(ebuilds.len()),
                ebuilds.join(", ")
            ),
            FindingKind::MismatchedPN { ebuilds } => format!(
                "mismatched package name{}: [ {} ]",
                plural(ebuilds.len()),
                ebuilds.join(", ")
            ),
            FindingKind::InvalidUtf8 { filename, error } => {
                format!("invalid UTF-8: {}: {:?}", error, filename)
            }
            FindingKind::DuplicateFiles { files } => {
                format!("duplicate identical files in FILESDIR: {}", quote_all(files))
            }
            FindingKind::EmptyFile { filename } => format!("empty file in FILESDIR: {:?}", filename),
            FindingKind::ExecutableFile { filename } => {
                format!("unnecessary executable bit: {:?}", filename)
            }
            FindingKind::UnknownPkgDirEntry { filenames } => {
                let suffix = if filenames.len() == 1 { "y" } else { "ies" };
                format!("unknown entr{}: {}", suffix, quote_all(filenames))
            }
            FindingKind::SizeViolation { filename, size } => format!(
                "{:?} exceeds 20k in size; {} total",
                filename,
                rules::format_size(*size)
            ),
            FindingKind::EqualVersions { versions } => {
                format!("equal package versions: [ {} ]", versions.join(", "))
            }
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

fn quote_all(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("{:?}", item))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single result reported against one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub category: String,
    pub package: String,
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl Finding {
    pub fn new(category: &str, package: &str, kind: FindingKind) -> Self {
        Self {
            category: category.to_string(),
            package: package.to_string(),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn desc(&self) -> String {
        self.kind.desc()
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.package)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}: {}", self.category, self.package, self.name(), self.desc())
    }
}
