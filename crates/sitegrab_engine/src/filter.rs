use std::fs;
use std::path::Path;

use capture_logging::{capture_info, capture_warn};
use sitegrab_core::{is_retained, FileCategory};

/// Deletes every file under `root` whose extension is not covered by the
/// retained categories. Directories are never deleted here, only emptied
/// of excluded files; empty leftovers are benign.
///
/// Best-effort and idempotent: walk errors are logged and skipped, and a
/// second run over a filtered tree deletes nothing.
pub fn filter_files(root: &Path, retained: &[FileCategory]) {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) => {
            capture_warn!("failed to read {} while filtering: {err}", root.display());
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = match fs::metadata(&path) {
            Ok(meta) => meta.is_dir(),
            Err(err) => {
                capture_warn!("failed to stat {}: {err}", path.display());
                continue;
            }
        };
        if is_dir {
            filter_files(&path, retained);
            continue;
        }
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        if !is_retained(retained, &extension) {
            match fs::remove_file(&path) {
                Ok(()) => capture_info!("filtered out {}", path.display()),
                Err(err) => capture_warn!("failed to delete {}: {err}", path.display()),
            }
        }
    }
}
