/// Trait for reporting scan progress.
///
/// The CLI implements it with indicatif. All methods have default no-op
/// implementations and may be called from several worker threads at once.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _total_packages: usize) {}
    fn on_package_complete(&self, _package: &str, _findings: usize) {}
    fn on_scan_complete(&self, _total_findings: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
