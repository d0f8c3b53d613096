use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Atom error: {0}")]
    Atom(#[from] crate::atom::AtomError),

    #[error("package directory missing or unreadable: {}: {source}", path.display())]
    MissingPackageDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("package group must hold at least one ebuild")]
    EmptyPackageGroup,

    #[error("package group mixes {0} and {1}")]
    MixedPackageGroup(String, String),

    #[error("not a repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Git error: {0}")]
    Git(String),
}
