use std::fs;
use std::path::Path;

use capture_logging::capture_warn;
use sitegrab_core::format_size;

/// Point-in-time aggregate of a directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirSnapshot {
    pub file_count: u64,
    pub dir_count: u64,
    pub total_bytes: u64,
}

impl DirSnapshot {
    pub fn total_size_formatted(&self) -> String {
        format_size(self.total_bytes)
    }
}

/// Recursively counts files, directories, and cumulative size.
///
/// Best-effort: a traversal error at any node is logged and that subtree
/// contributes nothing. Never fails.
pub fn snapshot(dir: &Path) -> DirSnapshot {
    let mut snap = DirSnapshot::default();
    walk_count(dir, &mut snap);
    snap
}

fn walk_count(dir: &Path, snap: &mut DirSnapshot) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            capture_warn!("failed to read {} while counting: {err}", dir.display());
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                capture_warn!("failed to read entry under {}: {err}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                snap.dir_count += 1;
                walk_count(&path, snap);
            }
            Ok(meta) => {
                snap.file_count += 1;
                snap.total_bytes += meta.len();
            }
            Err(err) => {
                capture_warn!("failed to stat {}: {err}", path.display());
            }
        }
    }
}

/// Renders the directory tree one line per entry, nested with ASCII
/// box-drawing prefixes and annotated with formatted sizes. Enumeration
/// order is whatever the OS yields; this is a display artifact.
pub fn render_tree(dir: &Path) -> String {
    let mut tree = String::new();
    walk_tree(dir, "", &mut tree);
    tree
}

fn walk_tree(dir: &Path, prefix: &str, tree: &mut String) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            capture_warn!("failed to read {} while rendering: {err}", dir.display());
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(err) => {
                capture_warn!("failed to stat {}: {err}", path.display());
                continue;
            }
        };
        // Directories report their own stat size, not their contents.
        let name = entry.file_name();
        tree.push_str(&format!(
            "{prefix}├── {} ({})\n",
            name.to_string_lossy(),
            format_size(meta.len())
        ));
        if meta.is_dir() {
            walk_tree(&path, &format!("{prefix}│   "), tree);
        }
    }
}

/// Deletes a directory tree: files first, depth-first into
/// subdirectories, then the emptied directory itself. No-op when the
/// path does not exist; idempotent on retry; best-effort on errors.
pub fn delete_recursive(dir: &Path) {
    if !dir.exists() {
        return;
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            capture_warn!("failed to read {} while deleting: {err}", dir.display());
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false);
        if is_dir {
            delete_recursive(&path);
        } else if let Err(err) = fs::remove_file(&path) {
            capture_warn!("failed to delete {}: {err}", path.display());
        }
    }
    if let Err(err) = fs::remove_dir(dir) {
        capture_warn!("failed to remove {}: {err}", dir.display());
    }
}
