use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive destination dir not creatable: {0}")]
    DestinationDir(String),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Packages `source`'s contents into a single zip at `dest`, entry names
/// relative to `source` (no wrapping folder), maximum compression.
///
/// The zip is built in a temp file beside `dest` and persisted with a
/// rename, so a failed run leaves no partial artifact behind.
pub fn archive_directory(source: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
    let parent = dest.parent().unwrap_or(Path::new("."));
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| ArchiveError::DestinationDir(e.to_string()))?;
    }

    let mut tmp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = ZipWriter::new(tmp.as_file_mut());
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(9));
        add_dir_entries(&mut writer, source, "", options)?;
        writer.finish()?;
    }
    tmp.as_file_mut().flush()?;

    if dest.exists() {
        fs::remove_file(dest)?;
    }
    tmp.persist(dest).map_err(|e| ArchiveError::Io(e.error))?;
    Ok(dest.to_path_buf())
}

fn add_dir_entries(
    writer: &mut ZipWriter<&mut File>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> Result<(), ArchiveError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name().to_string_lossy().into_owned();
        // Zip entry names always use forward slashes, whatever the host OS.
        let name = if prefix.is_empty() {
            file_name
        } else {
            format!("{prefix}/{file_name}")
        };
        if path.is_dir() {
            writer.add_directory(name.clone(), options)?;
            add_dir_entries(writer, &path, &name, options)?;
        } else {
            writer.start_file(name, options)?;
            let mut file = File::open(&path)?;
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer)?;
            writer.write_all(&buffer)?;
        }
    }
    Ok(())
}
