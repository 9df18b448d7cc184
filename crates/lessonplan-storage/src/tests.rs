//! Library tests against a temporary directory

use super::*;
use lessonplan_ingest::{PdfError, TextBackend};
use tempfile::tempdir;

/// Treats the stored bytes as already-extracted UTF-8 text.
struct Utf8Backend;

impl TextBackend for Utf8Backend {
    fn name(&self) -> &'static str {
        "utf8"
    }

    fn extract(&self, data: &[u8]) -> std::result::Result<String, PdfError> {
        String::from_utf8(data.to_vec()).map_err(|e| PdfError::ExtractionFailed(e.to_string()))
    }
}

fn test_library() -> (SyllabusLibrary, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let library = SyllabusLibrary::open(StorageConfig::at(dir.path()))
        .unwrap()
        .with_extractor(ExtractorChain::empty().with_backend(Utf8Backend));
    (library, dir)
}

const SYLLABUS: &[u8] = "2026 Science\nL1: 세포 | 세포를 관찰한다\n1주 3.02-3.06 11A\nL1 실습\n2주 3.09-3.13 11B\n복습"
    .as_bytes();

#[test]
fn test_open_lays_out_folders() {
    let (library, dir) = test_library();
    assert!(dir.path().join("syllabi").is_dir());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("syllabi_index.json")).unwrap(),
        "[]"
    );
    assert!(library.list().is_empty());
}

#[test]
fn test_add_stores_file_and_parse() {
    let (library, dir) = test_library();
    let entry = library.add("life/science.pdf", SYLLABUS).unwrap();

    assert_eq!(entry.name, "life/science.pdf");
    assert!(entry.path.starts_with(dir.path().join("syllabi")));
    assert!(entry
        .path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_life_science.pdf"));
    assert_eq!(std::fs::read(&entry.path).unwrap(), SYLLABUS);

    assert_eq!(entry.weeks.len(), 2);
    assert_eq!(entry.year, Some(2026));
    assert_eq!(entry.outline_map.get("L1").unwrap().topic, "세포");
    assert!(!entry.extraction_failed);

    let listed = library.list();
    assert_eq!(listed, vec![entry.clone()]);
    assert_eq!(entry.as_parse().week(2).unwrap().body_text, "복습");
}

#[test]
fn test_get_by_prefix() {
    let (library, _dir) = test_library();
    let entry = library.add("a.pdf", SYLLABUS).unwrap();
    let id = entry.id.to_string();

    assert_eq!(library.get(&id).unwrap().id, entry.id);
    assert_eq!(library.get(&id[..8].to_uppercase()).unwrap().id, entry.id);
    assert!(matches!(library.get("zzzz"), Err(StorageError::NotFound(_))));
    assert!(matches!(library.get(""), Err(StorageError::NotFound(_))));
}

#[test]
fn test_dedupe_returns_existing_entry() {
    let (library, _dir) = test_library();
    let first = library.add("a.pdf", SYLLABUS).unwrap();
    let again = library.add("b.pdf", SYLLABUS).unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(library.list().len(), 1);
}

#[test]
fn test_remove_deletes_file_and_entry() {
    let (library, _dir) = test_library();
    let keep = library.add("keep.pdf", "1주 3.02-3.06".as_bytes()).unwrap();
    let gone = library.add("gone.pdf", SYLLABUS).unwrap();

    let removed = library.remove(&gone.id.to_string()).unwrap();
    assert_eq!(removed.id, gone.id);
    assert!(!gone.path.exists());
    assert_eq!(library.list(), vec![keep]);

    assert!(matches!(
        library.remove(&gone.id.to_string()),
        Err(StorageError::NotFound(_))
    ));
}

#[test]
fn test_corrupt_index_reads_as_empty() {
    let (library, dir) = test_library();
    std::fs::write(dir.path().join("syllabi_index.json"), "{not json").unwrap();
    assert!(library.list().is_empty());

    // The next write replaces the corrupt index.
    library.add("a.pdf", SYLLABUS).unwrap();
    assert_eq!(library.list().len(), 1);
}

#[test]
fn test_ensure_outline_reparses_empty_maps() {
    let (library, dir) = test_library();
    let entry = library.add("a.pdf", SYLLABUS).unwrap();

    // Simulate an entry written before outline codes were parsed.
    let mut stale = entry.clone();
    stale.outline_map = OutlineCodeMap::new();
    stale.weeks.clear();
    std::fs::write(
        dir.path().join("syllabi_index.json"),
        serde_json::to_string(&vec![stale]).unwrap(),
    )
    .unwrap();

    let refreshed = library.ensure_outline(&entry.id.to_string()).unwrap();
    assert_eq!(refreshed.outline_map.len(), 1);
    assert_eq!(refreshed.weeks.len(), 2);
    assert_eq!(library.list()[0].outline_map.len(), 1);
}

#[test]
fn test_load_document_and_reparse() {
    let (library, _dir) = test_library();
    let entry = library.add("a.pdf", SYLLABUS).unwrap();

    let doc = library.load_document(&entry.id.to_string()).unwrap();
    assert_eq!(doc.bytes, SYLLABUS);
    assert!(doc.text.starts_with("2026 Science"));

    let reparsed = library.reparse(&entry.id.to_string()).unwrap();
    assert_eq!(reparsed.weeks, entry.weeks);
}

#[test]
fn test_failed_extraction_is_recorded_not_raised() {
    let dir = tempdir().unwrap();
    let library = SyllabusLibrary::open(StorageConfig::at(dir.path()))
        .unwrap()
        .with_extractor(ExtractorChain::empty());
    let entry = library.add("scan.pdf", b"%PDF-1.4 image only").unwrap();
    assert!(entry.extraction_failed);
    assert!(entry.weeks.is_empty());
}

#[test]
fn test_import_dir_adds_only_pdfs() {
    let (library, _dir) = test_library();
    let source = tempdir().unwrap();
    std::fs::create_dir(source.path().join("nested")).unwrap();
    std::fs::write(source.path().join("a.pdf"), "1주 3.02-3.06").unwrap();
    std::fs::write(source.path().join("nested/B.PDF"), "2주 3.09-3.13").unwrap();
    std::fs::write(source.path().join("notes.txt"), "3주").unwrap();

    let added = library.import_dir(source.path()).unwrap();
    let names: Vec<_> = added.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.pdf", "B.PDF"]);
}

#[test]
fn test_invalid_names() {
    let (library, _dir) = test_library();
    assert!(matches!(library.add("  ", SYLLABUS), Err(StorageError::InvalidName(_))));
    assert!(matches!(library.add("..", SYLLABUS), Err(StorageError::InvalidName(_))));
}
