use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Mutex;
use tempfile::tempdir;

use pkgdir_check_core::filter::NoFilter;
use pkgdir_check_core::hasher::FileDigester;
use pkgdir_check_core::{
    AppConfig, CheckEngine, PackageKey, ProgressReporter, Repository, Severity, SilentReporter,
};

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Create a repository with known problems.
/// Layout:
///   repo/
///     profiles/categories   (app-misc, dev-libs)
///     app-misc/clean/       clean-1.ebuild, metadata.xml
///     app-misc/versions/    versions-1.0.ebuild, versions-1.0-r0.ebuild, versions-2.ebuild
///     dev-libs/foo/         foo-1.ebuild, bar-1.ebuild, files/{a,b}.patch (identical), README
///     dev-libs/orphan/      metadata.xml only
fn create_test_repo(root: &Path) {
    write(&root.join("profiles/categories"), "app-misc\ndev-libs\n");

    write(&root.join("app-misc/clean/clean-1.ebuild"), "EAPI=8\n");
    write(&root.join("app-misc/clean/metadata.xml"), "<pkgmetadata/>\n");

    write(&root.join("app-misc/versions/versions-1.0.ebuild"), "EAPI=8\n");
    write(&root.join("app-misc/versions/versions-1.0-r0.ebuild"), "EAPI=8\n");
    write(&root.join("app-misc/versions/versions-2.ebuild"), "EAPI=8\n");

    write(&root.join("dev-libs/foo/foo-1.ebuild"), "EAPI=8\n");
    write(&root.join("dev-libs/foo/bar-1.ebuild"), "EAPI=8\n");
    write(&root.join("dev-libs/foo/files/a.patch"), "--- same\n");
    write(&root.join("dev-libs/foo/files/b.patch"), "--- same\n");
    write(&root.join("dev-libs/foo/README"), "notes\n");

    write(&root.join("dev-libs/orphan/metadata.xml"), "<pkgmetadata/>\n");
}

fn engine_for(root: &Path, strict: bool) -> CheckEngine {
    let config = AppConfig {
        repo_root: root.to_string_lossy().into_owned(),
        strict_unknown_entries: strict,
        use_gitignore: false,
        ..AppConfig::default()
    };
    let repo = Repository::open(root).unwrap();
    CheckEngine::with_parts(config, repo, Box::new(NoFilter), Box::new(FileDigester::default()))
}

#[test]
fn test_full_repository_scan() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("repo");
    create_test_repo(&root);

    let result = engine_for(&root, false).run(&[], &SilentReporter).unwrap();

    assert_eq!(result.stats.packages_scanned, 3);
    assert_eq!(result.stats.packages_skipped, 1);
    assert_eq!(result.stats.packages_failed, 0);

    let summary: Vec<(String, &str)> = result
        .findings
        .iter()
        .map(|f| (f.key(), f.name()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("app-misc/versions".to_string(), "EqualVersions"),
            ("dev-libs/foo".to_string(), "MismatchedPN"),
            ("dev-libs/foo".to_string(), "DuplicateFiles"),
        ]
    );
    assert_eq!(result.stats.errors, 2);
    assert_eq!(result.stats.warnings, 1);
}

#[test]
fn test_strict_mode_and_targets() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("repo");
    create_test_repo(&root);

    let result = engine_for(&root, true)
        .run(&["dev-libs/foo".to_string()], &SilentReporter)
        .unwrap();
    assert_eq!(result.stats.packages_scanned, 1);
    let unknown: Vec<_> = result
        .findings
        .iter()
        .filter(|f| f.name() == "UnknownPkgDirEntry")
        .collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].desc(), "unknown entry: \"README\"");
}

#[test]
fn test_check_single_package() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("repo");
    create_test_repo(&root);

    let engine = engine_for(&root, false);
    let clean = engine
        .check_package(&PackageKey::new("app-misc", "clean"))
        .unwrap();
    assert_eq!(clean, Some(Vec::new()));

    let versions = engine
        .check_package(&PackageKey::new("app-misc", "versions"))
        .unwrap()
        .unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].severity(), Severity::Error);
    assert_eq!(versions[0].desc(), "equal package versions: [ 1.0, 1.0-r0 ]");

    let orphan = engine
        .check_package(&PackageKey::new("dev-libs", "orphan"))
        .unwrap();
    assert!(orphan.is_none());
}

#[derive(Default)]
struct RecordingReporter {
    events: Mutex<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn on_scan_start(&self, total_packages: usize) {
        self.events.lock().unwrap().push(format!("start {}", total_packages));
    }

    fn on_package_complete(&self, package: &str, _findings: usize) {
        self.events.lock().unwrap().push(package.to_string());
    }

    fn on_scan_complete(&self, total_findings: usize, _duration_secs: f64) {
        self.events.lock().unwrap().push(format!("done {}", total_findings));
    }
}

#[test]
fn test_progress_events() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("repo");
    create_test_repo(&root);

    let reporter = RecordingReporter::default();
    engine_for(&root, false).run(&[], &reporter).unwrap();

    let events = reporter.events.into_inner().unwrap();
    assert_eq!(events.first().map(String::as_str), Some("start 4"));
    assert_eq!(events.last().map(String::as_str), Some("done 3"));
    assert_eq!(events.len(), 6);
}

#[test]
fn test_engine_honours_ignore_patterns() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("repo");
    create_test_repo(&root);

    let config = AppConfig {
        repo_root: root.to_string_lossy().into_owned(),
        ignore_patterns: vec!["**/files/b.patch".to_string()],
        use_gitignore: false,
        ..AppConfig::default()
    };
    let result = CheckEngine::new(config).unwrap().run(&[], &SilentReporter).unwrap();
    assert!(result.findings.iter().all(|f| f.name() != "DuplicateFiles"));
}

#[test]
fn test_engine_honours_gitignore() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("repo");
    create_test_repo(&root);
    write(&root.join(".gitignore"), "b.patch\nscratch/\n");
    write(&root.join("dev-libs/foo/files/scratch/empty.log"), "");

    let git_ok = Command::new("git")
        .args(["init", "-q"])
        .current_dir(&root)
        .status()
        .map(|status| status.success())
        .unwrap_or(false);
    if !git_ok {
        // git is not available on this machine
        return;
    }

    let config = AppConfig {
        repo_root: root.to_string_lossy().into_owned(),
        ..AppConfig::default()
    };
    let result = CheckEngine::new(config).unwrap().run(&[], &SilentReporter).unwrap();
    assert!(result.findings.iter().all(|f| f.name() != "DuplicateFiles"));
    assert!(result.findings.iter().all(|f| f.name() != "EmptyFile"));
}
