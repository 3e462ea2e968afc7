use std::path::PathBuf;

use sha2::{Digest, Sha256};
use url::Url;

/// Maps a resource URL to its relative path inside the workspace.
///
/// Path segments are sanitized for the filesystem; an empty or
/// trailing-slash path becomes `index.html`; a query string appends
/// `--{short_hash(url)}` before the extension so query variants of the
/// same path land in distinct files.
pub fn save_path_for(url: &Url) -> PathBuf {
    let mut segments: Vec<String> = url
        .path_segments()
        .map(|parts| {
            parts
                .filter(|segment| !segment.is_empty())
                .map(sanitize_segment)
                .collect()
        })
        .unwrap_or_default();

    if segments.is_empty() || url.path().ends_with('/') {
        segments.push("index.html".to_string());
    }

    if let Some(query) = url.query() {
        if !query.is_empty() {
            if let Some(last) = segments.last_mut() {
                *last = append_variant_hash(last, url.as_str());
            }
        }
    }

    segments.iter().collect()
}

/// Whether the final path component already carries an extension.
pub(crate) fn has_extension(path: &std::path::Path) -> bool {
    path.extension().is_some()
}

fn append_variant_hash(filename: &str, url: &str) -> String {
    let hash = short_hash(url);
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}--{hash}.{ext}"),
        _ => format!("{filename}--{hash}"),
    }
}

fn sanitize_segment(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "_".to_string();
    }
    if cleaned.len() > 80 {
        cleaned.truncate(80);
    }
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
