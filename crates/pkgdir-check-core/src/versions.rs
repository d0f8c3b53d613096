use crate::atom::Cpv;
use crate::finding::{Finding, FindingKind};
use crate::repo::PackageGroup;
use std::collections::{BTreeMap, BTreeSet};

/// Flags ebuilds whose versions differ textually but compare equal, such as
/// `1.0`, `1.0-r0` and `1.00`.
///
/// Only neighbours in sorted order are compared. `Cpv` equality is defined
/// as its ordering returning `Equal`, so equal versions always sort next to
/// each other.
pub struct EqualVersionsCheck;

impl EqualVersionsCheck {
    pub fn scan(group: &PackageGroup) -> impl Iterator<Item = Finding> {
        let mut sorted: Vec<&Cpv> = group.pkgs().iter().collect();
        sorted.sort();

        let mut equal_versions: BTreeMap<&Cpv, BTreeSet<String>> = BTreeMap::new();
        for pair in sorted.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b {
                equal_versions
                    .entry(a)
                    .or_default()
                    .extend([a.fullver().to_string(), b.fullver().to_string()]);
            }
        }

        let findings: Vec<Finding> = equal_versions
            .into_iter()
            .map(|(cpv, versions)| {
                Finding::new(
                    cpv.category(),
                    cpv.package(),
                    FindingKind::EqualVersions {
                        versions: versions.into_iter().collect(),
                    },
                )
            })
            .collect();
        findings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions_of(cpvs: &[&str]) -> Vec<Vec<String>> {
        let group = PackageGroup::parse(cpvs).unwrap();
        EqualVersionsCheck::scan(&group)
            .map(|finding| match finding.kind {
                FindingKind::EqualVersions { versions } => versions,
                other => panic!("unexpected finding {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_revision_zero_is_equal() {
        assert_eq!(versions_of(&["cat/pkg-1.0", "cat/pkg-1.0-r0"]), vec![vec!["1.0", "1.0-r0"]]);
    }

    #[test]
    fn test_distinct_versions() {
        assert!(versions_of(&["cat/pkg-1.0", "cat/pkg-1.1"]).is_empty());
        assert!(versions_of(&["cat/pkg-1.0"]).is_empty());
    }

    #[test]
    fn test_runs_merge_into_one_finding() {
        let found = versions_of(&[
            "cat/pkg-1.0.2-r00",
            "cat/pkg-2",
            "cat/pkg-1.000.2",
            "cat/pkg-1.0.2",
            "cat/pkg-2.0",
            "cat/pkg-02",
        ]);
        assert_eq!(
            found,
            vec![
                vec!["1.0.2", "1.0.2-r00", "1.000.2"],
                vec!["02", "2"],
            ]
        );
    }
}
