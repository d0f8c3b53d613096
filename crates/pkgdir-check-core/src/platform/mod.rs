use std::fs::Metadata;

/// Permission bits of a file. Platforms without unix modes report none.
#[cfg(unix)]
pub fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
pub fn file_mode(_metadata: &Metadata) -> u32 {
    0
}
