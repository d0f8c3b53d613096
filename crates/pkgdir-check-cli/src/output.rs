use colored::*;
use pkgdir_check_core::{Finding, ScanStats, Severity};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonFinding<'a> {
    severity: Severity,
    desc: String,
    #[serde(flatten)]
    finding: &'a Finding,
}

/// Findings grouped under a `category/package` header.
pub fn write_text(out: &mut impl Write, findings: &[Finding]) -> io::Result<()> {
    let mut current: Option<String> = None;
    for finding in findings {
        let key = finding.key();
        if current.as_deref() != Some(key.as_str()) {
            writeln!(out, "{}", key.bold())?;
            current = Some(key);
        }
        let name = match finding.severity() {
            Severity::Error => finding.name().red(),
            Severity::Warning => finding.name().yellow(),
        };
        writeln!(out, "  {}: {}", name, finding.desc())?;
    }
    Ok(())
}

/// One JSON object per line.
pub fn write_json(out: &mut impl Write, findings: &[Finding]) -> io::Result<()> {
    for finding in findings {
        let record = JsonFinding {
            severity: finding.severity(),
            desc: finding.desc(),
            finding,
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn summary(stats: &ScanStats) -> String {
    format!(
        "{} packages checked ({} without ebuilds, {} failed): {}, {} in {:.2}s",
        stats.packages_scanned,
        stats.packages_skipped,
        stats.packages_failed,
        format!("{} errors", stats.errors).red(),
        format!("{} warnings", stats.warnings).yellow(),
        stats.duration.as_secs_f64(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgdir_check_core::FindingKind;

    fn sample() -> Vec<Finding> {
        vec![
            Finding::new(
                "cat",
                "a",
                FindingKind::EmptyFile {
                    filename: "files/x".to_string(),
                },
            ),
            Finding::new(
                "cat",
                "a",
                FindingKind::SizeViolation {
                    filename: "files/big".to_string(),
                    size: 30_000,
                },
            ),
            Finding::new(
                "cat",
                "b",
                FindingKind::EqualVersions {
                    versions: vec!["1".to_string(), "1-r0".to_string()],
                },
            ),
        ]
    }

    #[test]
    fn test_text_groups_by_package() {
        colored::control::set_override(false);
        let mut buf = Vec::new();
        write_text(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "cat/a\n  EmptyFile: empty file in FILESDIR: \"files/x\"\n  \
             SizeViolation: \"files/big\" exceeds 20k in size; 29.3 KiB total\n\
             cat/b\n  EqualVersions: equal package versions: [ 1, 1-r0 ]\n"
        );
    }

    #[test]
    fn test_json_lines() {
        let mut buf = Vec::new();
        write_json(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1]["kind"], "SizeViolation");
        assert_eq!(lines[1]["severity"], "warning");
        assert_eq!(lines[1]["size"], 30_000);
        assert_eq!(lines[2]["category"], "cat");
        assert_eq!(lines[2]["package"], "b");
        assert_eq!(lines[2]["versions"][1], "1-r0");
        assert_eq!(lines[2]["severity"], "error");
    }
}
