use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Longest file name (in bytes) most filesystems accept
const MAX_NAME_BYTES: usize = 255;

static RESERVED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").expect("reserved name regex")
});

/// Convert a string to a single safe path segment
///
/// Drops characters that are illegal in file names on common platforms
/// (including both path separators), control characters, trailing dots and
/// spaces, and Windows device names. The result never contains a separator
/// and is never empty, `.` or `..`. Applying it twice gives the same result.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '?' | '<' | '>' | ':' | '*' | '|' | '"'))
        .filter(|c| !c.is_control())
        .collect();

    let truncated = truncate_to_boundary(&cleaned, MAX_NAME_BYTES);
    let trimmed = truncated.trim_end_matches(['.', ' ']);

    if trimmed.is_empty() || RESERVED_NAME.is_match(trimmed) {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Directory all items of one category are written below
pub fn category_dir(output_root: &Path, category_id: &str) -> PathBuf {
    output_root.join(sanitize_filename(category_id))
}

/// Directory for one item: `<category_dir>/<name> [<id>]`, sanitized
pub fn item_dir(category_dir: &Path, item_name: &str, item_id: &str) -> PathBuf {
    category_dir.join(sanitize_filename(&format!("{item_name} [{item_id}]")))
}

/// Create a directory and its parents; succeeds if it already exists
pub async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    ::log::debug!("Ensured directory {}", dir.display());
    Ok(())
}
