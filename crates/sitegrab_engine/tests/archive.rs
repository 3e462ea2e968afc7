use std::fs::{self, File};
use std::io::Read;
use std::sync::Once;

use sitegrab_engine::archive_directory;
use tempfile::TempDir;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(capture_logging::initialize_for_tests);
}

fn seed_source(root: &std::path::Path) {
    fs::create_dir_all(root.join("assets")).unwrap();
    fs::write(root.join("index.html"), "<html>home</html>").unwrap();
    fs::write(root.join("assets/site.css"), "body{}").unwrap();
}

fn entry_names(path: &std::path::Path) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn archives_contents_without_wrapping_folder() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("demo");
    seed_source(&source);
    let dest = temp.path().join("demo.zip");

    let produced = archive_directory(&source, &dest).unwrap();
    assert_eq!(produced, dest);

    let names = entry_names(&dest);
    assert_eq!(
        names,
        vec![
            "assets/".to_string(),
            "assets/site.css".to_string(),
            "index.html".to_string(),
        ]
    );

    // Extraction reproduces the exact bytes.
    let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
    let mut contents = String::new();
    archive
        .by_name("index.html")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "<html>home</html>");
}

#[test]
fn creates_missing_destination_parent() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("demo");
    seed_source(&source);
    let dest = temp.path().join("projects/nested/demo.zip");

    archive_directory(&source, &dest).unwrap();
    assert!(dest.is_file());
}

#[test]
fn replaces_an_existing_artifact() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("demo");
    seed_source(&source);
    let dest = temp.path().join("demo.zip");
    fs::write(&dest, "stale bytes, not a zip").unwrap();

    archive_directory(&source, &dest).unwrap();
    assert!(entry_names(&dest).contains(&"index.html".to_string()));
}

#[test]
fn failed_run_leaves_no_artifact() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let missing_source = temp.path().join("nope");
    let dest = temp.path().join("demo.zip");

    assert!(archive_directory(&missing_source, &dest).is_err());
    assert!(!dest.exists());
}
