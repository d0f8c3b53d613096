use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Content hash used to confirm duplicates after a size collision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => f.write_str("sha256"),
            DigestAlgorithm::Blake3 => f.write_str("blake3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

pub trait Digester: Send + Sync {
    fn digest(&self, path: &Path) -> io::Result<Digest>;
}

/// Streams file contents through the configured algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDigester {
    algorithm: DigestAlgorithm,
}

impl FileDigester {
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }
}

impl Digester for FileDigester {
    fn digest(&self, path: &Path) -> io::Result<Digest> {
        let file = File::open(path)?;
        match self.algorithm {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::default();
                feed(file, |chunk| sha2::Digest::update(&mut hasher, chunk))?;
                Ok(Digest(sha2::Digest::finalize(hasher).into()))
            }
            DigestAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                feed(file, |chunk| {
                    hasher.update(chunk);
                })?;
                Ok(Digest(*hasher.finalize().as_bytes()))
            }
        }
    }
}

fn feed(mut file: File, mut update: impl FnMut(&[u8])) -> io::Result<()> {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        update(&buffer[..read]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_known_value() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("abc");
        fs::write(&path, "abc").unwrap();
        let digest = FileDigester::new(DigestAlgorithm::Sha256).digest(&path).unwrap();
        assert_eq!(
            digest.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_blake3_matches_one_shot_hash() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("big");
        let content = vec![0x5Au8; READ_BUFFER_SIZE * 2 + 17];
        fs::write(&path, &content).unwrap();
        let digest = FileDigester::new(DigestAlgorithm::Blake3).digest(&path).unwrap();
        assert_eq!(digest.as_bytes(), blake3::hash(&content).as_bytes());
    }

    #[test]
    fn test_missing_file_errors() {
        let tmp = tempdir().unwrap();
        assert!(FileDigester::default().digest(&tmp.path().join("nope")).is_err());
    }
}
