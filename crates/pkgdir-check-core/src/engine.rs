use crate::config::AppConfig;
use crate::error::Error;
use crate::filter::{AnyFilter, GitIgnoreFilter, GlobFilter, PathFilter};
use crate::finding::{Finding, Severity};
use crate::hasher::{Digester, FileDigester};
use crate::progress::ProgressReporter;
use crate::repo::{PackageKey, Repository};
use crate::scanner::PkgDirCheck;
use crate::versions::EqualVersionsCheck;
use rayon::prelude::*;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Runs every package check across a repository.
pub struct CheckEngine {
    config: AppConfig,
    repo: Repository,
    filter: Box<dyn PathFilter>,
    digester: Box<dyn Digester>,
}

#[derive(Debug)]
pub struct ScanResult {
    pub findings: Vec<Finding>,
    pub stats: ScanStats,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanStats {
    pub packages_scanned: usize,
    pub packages_skipped: usize,
    pub packages_failed: usize,
    pub errors: usize,
    pub warnings: usize,
    pub duration: Duration,
}

enum PackageOutcome {
    Scanned(Vec<Finding>),
    Skipped,
    Failed,
}

impl CheckEngine {
    /// Opens the configured repository and builds the ignore filter from the
    /// glob patterns and, when enabled, git's ignore rules.
    pub fn new(config: AppConfig) -> Result<Self, Error> {
        let repo = Repository::open(Path::new(&config.repo_root))?;

        let mut filter = AnyFilter::new();
        let globs = GlobFilter::new(&config.ignore_patterns);
        if !globs.is_empty() {
            filter = filter.with(globs);
        }
        if config.use_gitignore {
            match GitIgnoreFilter::load(repo.root()) {
                Ok(git) => filter = filter.with(git),
                Err(e) => warn!("Not using gitignore rules: {}", e),
            }
        }

        let digester = FileDigester::new(config.digest_algorithm);
        Ok(Self::with_parts(config, repo, Box::new(filter), Box::new(digester)))
    }

    pub fn with_parts(
        config: AppConfig,
        repo: Repository,
        filter: Box<dyn PathFilter>,
        digester: Box<dyn Digester>,
    ) -> Self {
        Self {
            config,
            repo,
            filter,
            digester,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn pkgdir_check(&self) -> PkgDirCheck<'_> {
        PkgDirCheck::new(self.repo.root(), self.filter.as_ref(), self.digester.as_ref())
            .strict_unknown_entries(self.config.strict_unknown_entries)
    }

    /// Runs the package directory and equal versions checks on one package.
    /// Returns `None` when the directory holds no ebuild for the package.
    pub fn check_package(&self, key: &PackageKey) -> Result<Option<Vec<Finding>>, Error> {
        let Some(group) = self.repo.package_group(key)? else {
            return Ok(None);
        };
        let mut findings: Vec<Finding> = self.pkgdir_check().scan(&group)?.collect();
        findings.extend(EqualVersionsCheck::scan(&group));
        debug!("{}: {} findings", key, findings.len());
        Ok(Some(findings))
    }

    /// Scans the selected packages in parallel. A package that fails to scan
    /// is logged and counted; the rest of the run continues.
    pub fn run(
        &self,
        targets: &[String],
        reporter: &dyn ProgressReporter,
    ) -> Result<ScanResult, Error> {
        let start = Instant::now();
        let keys = self.repo.select(targets)?;
        info!("Checking {} packages in {}", keys.len(), self.repo.root().display());
        reporter.on_scan_start(keys.len());

        let outcomes: Vec<PackageOutcome> = keys
            .par_iter()
            .map(|key| {
                let outcome = match self.check_package(key) {
                    Ok(Some(findings)) => PackageOutcome::Scanned(findings),
                    Ok(None) => PackageOutcome::Skipped,
                    Err(e) => {
                        error!("Error checking {}: {}", key, e);
                        PackageOutcome::Failed
                    }
                };
                let count = match &outcome {
                    PackageOutcome::Scanned(findings) => findings.len(),
                    _ => 0,
                };
                reporter.on_package_complete(&key.to_string(), count);
                outcome
            })
            .collect();

        let mut stats = ScanStats::default();
        let mut findings = Vec::new();
        for outcome in outcomes {
            match outcome {
                PackageOutcome::Scanned(found) => {
                    stats.packages_scanned += 1;
                    findings.extend(found);
                }
                PackageOutcome::Skipped => stats.packages_skipped += 1,
                PackageOutcome::Failed => stats.packages_failed += 1,
            }
        }
        for finding in &findings {
            match finding.severity() {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
            }
        }
        stats.duration = start.elapsed();
        reporter.on_scan_complete(findings.len(), stats.duration.as_secs_f64());

        Ok(ScanResult { findings, stats })
    }
}
