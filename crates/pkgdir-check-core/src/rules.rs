//! Stateless filename, size and permission policies.

/// Files inside `files/` larger than this many bytes are flagged.
pub const SIZE_LIMIT: u64 = 20_480;

/// Number of leading bytes of a recipe file probed for UTF-8 validity.
pub const UTF8_PROBE_LENGTH: u64 = 8192;

pub const EBUILD_EXT: &str = ".ebuild";

/// Entries a strictly validated package directory may hold besides recipes.
pub const KNOWN_PKGDIR_ENTRIES: [&str; 3] = ["Manifest", "metadata.xml", "files"];

/// Version control metadata directories never descended into under `files/`.
pub const IGNORED_DIRS: [&str; 4] = ["CVS", "cvs", ".svn", ".bzr"];

const EXEC_BITS: u32 = 0o111;

pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+' | ':')
}

/// Characters of `name` outside the allowed set, sorted and deduplicated.
pub fn banned_chars(name: &str) -> Vec<char> {
    let mut chars: Vec<char> = name.chars().filter(|c| !is_allowed_char(*c)).collect();
    chars.sort_unstable();
    chars.dedup();
    chars
}

pub fn is_executable(mode: u32) -> bool {
    mode & EXEC_BITS != 0
}

pub fn exceeds_size_limit(size: u64) -> bool {
    size > SIZE_LIMIT
}

/// Human readable size using binary units, e.g. `21.0 KiB`.
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];
    if size < 1024 {
        return format!("{} B", size);
    }
    let mut value = size as f64 / 1024.0;
    let mut unit = UNITS[0];
    for next in UNITS[1..].iter().copied() {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{:.1} {}", value, unit)
}
