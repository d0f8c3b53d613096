pub mod atom;
pub mod config;
pub mod dupes;
pub mod engine;
pub mod error;
pub mod filter;
pub mod finding;
pub mod hasher;
pub mod platform;
pub mod progress;
pub mod repo;
pub mod rules;
pub mod scanner;
pub mod versions;

pub use crate::config::AppConfig;
pub use engine::{CheckEngine, ScanResult, ScanStats};
pub use error::Error;
pub use finding::{Finding, FindingKind, Severity};
pub use progress::{ProgressReporter, SilentReporter};
pub use repo::{PackageGroup, PackageKey, Repository};
pub use scanner::{PkgDirCheck, PkgDirScan};
pub use versions::EqualVersionsCheck;
