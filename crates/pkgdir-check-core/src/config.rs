use crate::hasher::DigestAlgorithm;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub repo_root: String,
    /// Report anything in a package directory besides ebuilds, `Manifest`,
    /// `metadata.xml` and `files`.
    pub strict_unknown_entries: bool,
    pub ignore_patterns: Vec<String>,
    pub use_gitignore: bool,
    pub digest_algorithm: DigestAlgorithm,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repo_root: ".".to_string(),
            strict_unknown_entries: false,
            ignore_patterns: Vec::new(),
            use_gitignore: true,
            digest_algorithm: DigestAlgorithm::default(),
        }
    }
}

/// Reads an optional `PkgdirCheck.{toml,yaml,json}` from the working
/// directory, then `PKGDIR_CHECK_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("PkgdirCheck").required(false))
        .add_source(
            Environment::with_prefix("PKGDIR_CHECK")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
