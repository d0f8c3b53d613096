//! Category, package name and version parsing following the Package Manager
//! Specification.
//!
//! Only the subset needed to identify recipe files is supported: versioned
//! identities `category/package-version` and the `=` operator form. Ordering
//! and equality follow the PMS version comparison algorithm, so textually
//! different versions such as `1.0.2`, `1.0.2-r0` and `1.000.2` are equal.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AtomError {
    #[error("invalid category: {0:?}")]
    InvalidCategory(String),

    #[error("invalid package name: {0:?}")]
    InvalidPackage(String),

    #[error("invalid version: {0:?}")]
    InvalidVersion(String),

    #[error("missing version: {0:?}")]
    MissingVersion(String),

    #[error("unsupported atom: {0:?}")]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SuffixKind {
    Alpha,
    Beta,
    Pre,
    Rc,
    P,
}

impl SuffixKind {
    fn parse_prefix(s: &str) -> Option<(SuffixKind, &str)> {
        // "pre" must be tried before "p"
        const KINDS: [(&str, SuffixKind); 5] = [
            ("alpha", SuffixKind::Alpha),
            ("beta", SuffixKind::Beta),
            ("pre", SuffixKind::Pre),
            ("rc", SuffixKind::Rc),
            ("p", SuffixKind::P),
        ];
        KINDS
            .iter()
            .find_map(|(name, kind)| s.strip_prefix(*name).map(|rest| (*kind, rest)))
    }
}

#[derive(Debug, Clone)]
struct Suffix {
    kind: SuffixKind,
    number: String,
}

/// A parsed package version, including its optional revision.
#[derive(Debug, Clone)]
pub struct Version {
    literal: String,
    numbers: Vec<String>,
    letter: Option<char>,
    suffixes: Vec<Suffix>,
    revision: Option<String>,
}

impl Version {
    pub fn parse(s: &str) -> Result<Version, AtomError> {
        let invalid = || AtomError::InvalidVersion(s.to_string());

        let (body, revision) = match s.rfind("-r") {
            Some(idx) if is_digits(&s[idx + 2..]) => (&s[..idx], Some(s[idx + 2..].to_string())),
            _ => (s, None),
        };

        let (main, suffix_str) = match body.find('_') {
            Some(idx) => (&body[..idx], &body[idx..]),
            None => (body, ""),
        };

        let (numeric, letter) = match main.chars().last() {
            Some(c) if c.is_ascii_lowercase() => (&main[..main.len() - 1], Some(c)),
            _ => (main, None),
        };

        let numbers: Vec<String> = numeric.split('.').map(str::to_string).collect();
        if numbers.iter().any(|n| !is_digits(n)) {
            return Err(invalid());
        }

        let mut suffixes = Vec::new();
        if !suffix_str.is_empty() {
            for part in suffix_str[1..].split('_') {
                let (kind, number) = SuffixKind::parse_prefix(part).ok_or_else(invalid)?;
                if !number.is_empty() && !is_digits(number) {
                    return Err(invalid());
                }
                suffixes.push(Suffix {
                    kind,
                    number: number.to_string(),
                });
            }
        }

        Ok(Version {
            literal: s.to_string(),
            numbers,
            letter,
            suffixes,
            revision,
        })
    }

    /// The version exactly as written, revision included.
    pub fn as_str(&self) -> &str {
        &self.literal
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_numbers(&self.numbers, &other.numbers)
            .then_with(|| self.letter.cmp(&other.letter))
            .then_with(|| compare_suffixes(&self.suffixes, &other.suffixes))
            .then_with(|| {
                compare_integers(
                    self.revision.as_deref().unwrap_or("0"),
                    other.revision.as_deref().unwrap_or("0"),
                )
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

fn compare_numbers(a: &[String], b: &[String]) -> Ordering {
    let first = compare_integers(&a[0], &b[0]);
    if first != Ordering::Equal {
        return first;
    }
    for (x, y) in a.iter().zip(b.iter()).skip(1) {
        let ord = if x.starts_with('0') || y.starts_with('0') {
            x.trim_end_matches('0').cmp(y.trim_end_matches('0'))
        } else {
            compare_integers(x, y)
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_suffixes(a: &[Suffix], b: &[Suffix]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x
            .kind
            .cmp(&y.kind)
            .then_with(|| compare_integers(&x.number, &y.number));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    match a.len().cmp(&b.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Greater => extra_suffix_order(&a[b.len()]),
        Ordering::Less => extra_suffix_order(&b[a.len()]).reverse(),
    }
}

fn extra_suffix_order(extra: &Suffix) -> Ordering {
    if extra.kind == SuffixKind::P {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

/// Compares two unsigned decimal strings of any length. Empty means zero.
fn compare_integers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_category(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '.' | '-'))
}

pub fn is_valid_package_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => {}
        _ => return false,
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '_' | '-')) {
        return false;
    }
    // must not end in a hyphen followed by something that looks like a version
    !s.match_indices('-')
        .any(|(idx, _)| Version::parse(&s[idx + 1..]).is_ok())
}

/// A versioned package identity: `category/package-version`.
#[derive(Debug, Clone)]
pub struct Cpv {
    category: String,
    package: String,
    version: Version,
}

impl Cpv {
    pub fn new(category: &str, package: &str, version: &str) -> Result<Cpv, AtomError> {
        if !is_valid_category(category) {
            return Err(AtomError::InvalidCategory(category.to_string()));
        }
        if !is_valid_package_name(package) {
            return Err(AtomError::InvalidPackage(package.to_string()));
        }
        Ok(Cpv {
            category: category.to_string(),
            package: package.to_string(),
            version: Version::parse(version)?,
        })
    }

    /// Parses `category/package-version`.
    pub fn parse(s: &str) -> Result<Cpv, AtomError> {
        let (category, pv) = s
            .split_once('/')
            .ok_or_else(|| AtomError::Unsupported(s.to_string()))?;
        let (package, version) = split_package_version(pv)?;
        Cpv::new(category, package, version)
    }

    /// Parses the `=category/package-version` atom form used to validate
    /// recipe file names.
    pub fn parse_versioned_atom(s: &str) -> Result<Cpv, AtomError> {
        let rest = s
            .strip_prefix('=')
            .ok_or_else(|| AtomError::Unsupported(s.to_string()))?;
        Cpv::parse(rest)
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The literal version string, revision included.
    pub fn fullver(&self) -> &str {
        self.version.as_str()
    }

    /// `category/package` without the version.
    pub fn key(&self) -> String {
        format!("{}/{}", self.category, self.package)
    }
}

/// Splits `package-version[-rN]` at the hyphen that starts the version.
fn split_package_version(pv: &str) -> Result<(&str, &str), AtomError> {
    let mut start = pv.rfind('-');
    if let Some(idx) = start {
        let tail = &pv[idx + 1..];
        if tail.strip_prefix('r').is_some_and(is_digits) {
            start = pv[..idx].rfind('-');
        }
    }
    let idx = start.ok_or_else(|| AtomError::MissingVersion(pv.to_string()))?;
    let (package, version) = (&pv[..idx], &pv[idx + 1..]);
    if package.is_empty() {
        return Err(AtomError::InvalidPackage(pv.to_string()));
    }
    Ok((package, version))
}

impl fmt::Display for Cpv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-{}", self.category, self.package, self.version)
    }
}

impl Ord for Cpv {
    fn cmp(&self, other: &Self) -> Ordering {
        self.category
            .cmp(&other.category)
            .then_with(|| self.package.cmp(&other.package))
            .then_with(|| self.version.cmp(&other.version))
    }
}

impl PartialOrd for Cpv {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Cpv {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cpv {}
