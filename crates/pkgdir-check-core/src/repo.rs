use crate::atom::{self, Cpv};
use crate::error::Error;
use crate::rules::EBUILD_EXT;
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Top-level repository directories that never hold packages.
const NON_CATEGORY_DIRS: [&str; 5] = ["eclass", "licenses", "metadata", "profiles", "scripts"];

/// A `category/package` pair naming one package directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageKey {
    pub category: String,
    pub package: String,
}

impl PackageKey {
    pub fn new(category: &str, package: &str) -> Self {
        Self {
            category: category.to_string(),
            package: package.to_string(),
        }
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.package)
    }
}

/// All ebuild versions of one package. Never empty.
#[derive(Debug, Clone)]
pub struct PackageGroup {
    pkgs: Vec<Cpv>,
}

impl PackageGroup {
    pub fn new(pkgs: Vec<Cpv>) -> Result<Self, Error> {
        let first = pkgs.first().ok_or(Error::EmptyPackageGroup)?;
        if let Some(other) = pkgs.iter().find(|p| p.key() != first.key()) {
            return Err(Error::MixedPackageGroup(first.key(), other.key()));
        }
        Ok(Self { pkgs })
    }

    /// Builds a group from `category/package-version` strings.
    pub fn parse<S: AsRef<str>>(cpvs: &[S]) -> Result<Self, Error> {
        let pkgs = cpvs
            .iter()
            .map(|s| Cpv::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(pkgs)
    }

    pub fn category(&self) -> &str {
        self.pkgs[0].category()
    }

    pub fn package(&self) -> &str {
        self.pkgs[0].package()
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(self.category(), self.package())
    }

    pub fn pkgs(&self) -> &[Cpv] {
        &self.pkgs
    }

    pub fn len(&self) -> usize {
        self.pkgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pkgs.is_empty()
    }
}

/// An ebuild repository laid out as `category/package/*.ebuild`.
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    categories: Vec<String>,
}

impl Repository {
    pub fn open(root: &Path) -> Result<Self, Error> {
        if !root.is_dir() {
            return Err(Error::NotARepository(root.to_path_buf()));
        }
        let root = root.canonicalize()?;
        let categories = load_categories(&root)?;
        debug!("{} categories in {}", categories.len(), root.display());
        Ok(Self { root, categories })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn package_dir(&self, key: &PackageKey) -> PathBuf {
        self.root.join(&key.category).join(&key.package)
    }

    /// Every package directory of `category`, sorted.
    pub fn category_packages(&self, category: &str) -> Result<Vec<PackageKey>, Error> {
        let dir = self.root.join(category);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys: Vec<PackageKey> = list_subdirs(&dir)?
            .into_iter()
            .map(|package| PackageKey::new(category, &package))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Every package directory in the repository, sorted.
    pub fn packages(&self) -> Result<Vec<PackageKey>, Error> {
        let mut keys = Vec::new();
        for category in &self.categories {
            keys.extend(self.category_packages(category)?);
        }
        Ok(keys)
    }

    /// Resolves `category` and `category/package` targets. No targets selects
    /// the whole repository.
    pub fn select(&self, targets: &[String]) -> Result<Vec<PackageKey>, Error> {
        if targets.is_empty() {
            return self.packages();
        }
        let mut keys = BTreeSet::new();
        for target in targets {
            let target = target.trim_end_matches('/');
            match target.split_once('/') {
                Some((category, package)) => {
                    let key = PackageKey::new(category, package);
                    if self.package_dir(&key).is_dir() {
                        keys.insert(key);
                    } else {
                        warn!("No such package directory: {}", key);
                    }
                }
                None => {
                    let packages = self.category_packages(target)?;
                    if packages.is_empty() {
                        warn!("No packages found for target: {}", target);
                    }
                    keys.extend(packages);
                }
            }
        }
        Ok(keys.into_iter().collect())
    }

    /// Builds the package group from the ebuilds whose names match the
    /// directory. Directories without any such ebuild yield `None`.
    pub fn package_group(&self, key: &PackageKey) -> Result<Option<PackageGroup>, Error> {
        let dir = self.package_dir(key);
        let mut pkgs = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = name.strip_suffix(EBUILD_EXT) else {
                continue;
            };
            match Cpv::parse(&format!("{}/{}", key.category, stem)) {
                Ok(cpv) if cpv.package() == key.package => pkgs.push(cpv),
                Ok(_) | Err(_) => debug!("Skipping {}/{} for package group", key, name),
            }
        }
        if pkgs.is_empty() {
            debug!("No valid ebuilds in {}", key);
            return Ok(None);
        }
        pkgs.sort();
        Ok(Some(PackageGroup::new(pkgs)?))
    }
}

fn load_categories(root: &Path) -> Result<Vec<String>, Error> {
    let categories_file = root.join("profiles").join("categories");
    let mut categories: Vec<String> = if categories_file.is_file() {
        fs::read_to_string(&categories_file)?
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    } else {
        list_subdirs(root)?
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .filter(|name| !NON_CATEGORY_DIRS.contains(&name.as_str()))
            .filter(|name| atom::is_valid_category(name))
            .collect()
    };
    categories.sort();
    categories.dedup();
    Ok(categories)
}

fn list_subdirs(dir: &Path) -> Result<Vec<String>, Error> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "EAPI=8\n").unwrap();
    }

    #[test]
    fn test_group_rejects_empty_and_mixed() {
        assert!(matches!(
            PackageGroup::new(Vec::new()),
            Err(Error::EmptyPackageGroup)
        ));
        assert!(matches!(
            PackageGroup::parse(&["cat/a-1", "cat/b-1"]),
            Err(Error::MixedPackageGroup(..))
        ));
        let group = PackageGroup::parse(&["cat/a-1", "cat/a-2"]).unwrap();
        assert_eq!(group.key(), PackageKey::new("cat", "a"));
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_discovers_categories_without_profiles() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("dev-libs/foo/foo-1.ebuild"));
        touch(&tmp.path().join("app-misc/bar/bar-2.ebuild"));
        touch(&tmp.path().join("eclass/foo.eclass"));
        fs::create_dir_all(tmp.path().join(".git")).unwrap();

        let repo = Repository::open(tmp.path()).unwrap();
        assert_eq!(repo.categories(), ["app-misc", "dev-libs"]);
        let keys = repo.packages().unwrap();
        assert_eq!(
            keys,
            vec![PackageKey::new("app-misc", "bar"), PackageKey::new("dev-libs", "foo")]
        );
    }

    #[test]
    fn test_profiles_categories_wins() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("dev-libs/foo/foo-1.ebuild"));
        touch(&tmp.path().join("app-misc/bar/bar-2.ebuild"));
        fs::create_dir_all(tmp.path().join("profiles")).unwrap();
        fs::write(tmp.path().join("profiles/categories"), "# comment\ndev-libs\n").unwrap();

        let repo = Repository::open(tmp.path()).unwrap();
        assert_eq!(repo.categories(), ["dev-libs"]);
    }

    #[test]
    fn test_package_group_skips_foreign_ebuilds() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("cat/bar/bar-1.ebuild"));
        touch(&tmp.path().join("cat/bar/bar-1.0-r0.ebuild"));
        touch(&tmp.path().join("cat/bar/foo-1.ebuild"));
        touch(&tmp.path().join("cat/bar/???.ebuild"));
        touch(&tmp.path().join("cat/empty/metadata.xml"));

        let repo = Repository::open(tmp.path()).unwrap();
        let group = repo
            .package_group(&PackageKey::new("cat", "bar"))
            .unwrap()
            .unwrap();
        let versions: Vec<&str> = group.pkgs().iter().map(|p| p.fullver()).collect();
        assert_eq!(versions, ["1", "1.0-r0"]);
        assert!(repo
            .package_group(&PackageKey::new("cat", "empty"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_select_targets() {
        let tmp = tempdir().unwrap();
        touch(&tmp.path().join("cat/a/a-1.ebuild"));
        touch(&tmp.path().join("cat/b/b-1.ebuild"));
        touch(&tmp.path().join("other/c/c-1.ebuild"));

        let repo = Repository::open(tmp.path()).unwrap();
        let keys = repo
            .select(&["cat/".to_string(), "cat/a".to_string(), "other/missing".to_string()])
            .unwrap();
        assert_eq!(keys, vec![PackageKey::new("cat", "a"), PackageKey::new("cat", "b")]);
    }

    #[test]
    fn test_open_rejects_missing_root() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Repository::open(&tmp.path().join("nope")),
            Err(Error::NotARepository(_))
        ));
    }
}
