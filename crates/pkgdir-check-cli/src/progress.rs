use indicatif::{ProgressBar, ProgressStyle};
use pkgdir_check_core::ProgressReporter;
use std::sync::Mutex;

/// CLI progress reporter using an indicatif progress bar over packages.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, total_packages: usize) {
        let pb = ProgressBar::new(total_packages as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Checking [{bar:30.cyan/dim}] {pos}/{len} packages {msg}",
        ) {
            pb.set_style(
                style
                    .progress_chars("━╸─")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_package_complete(&self, package: &str, _findings: usize) {
        self.with_bar(|pb| {
            pb.set_message(package.to_string());
            pb.inc(1);
        });
    }

    fn on_scan_complete(&self, total_findings: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan complete: {} findings in {:.2}s",
            total_findings, duration_secs
        );
    }
}
