//! Syllabus library
//!
//! Keeps uploaded syllabus PDFs on disk together with a JSON index of what
//! was parsed out of them:
//!
//! ```text
//! <root>/
//! ├── syllabi/
//! │   └── <uuid>_<name>.pdf
//! └── syllabi_index.json
//! ```
//!
//! The index stores weeks and outline codes so drafting a week does not
//! re-run PDF extraction. A corrupt or unreadable index is treated as empty.

#[cfg(test)]
mod tests;

use chrono::{DateTime, Utc};
use lessonplan_ingest::{
    parse_extraction, ExtractorChain, OutlineCodeMap, SegmenterConfig, SyllabusParse, WeekRecord,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

const SYLLABI_DIR: &str = "syllabi";
const INDEX_FILE: &str = "syllabi_index.json";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode library index: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no syllabus with id `{0}`")]
    NotFound(String),
    #[error("id prefix `{0}` matches more than one syllabus")]
    Ambiguous(String),
    #[error("invalid syllabus name `{0}`")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Library root; holds the `syllabi/` folder and the index.
    pub root: PathBuf,
    /// Date convention used when parsing uploads.
    pub segmenter: SegmenterConfig,
    /// Return the existing entry when identical bytes are added again.
    pub dedupe: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            segmenter: SegmenterConfig::default(),
            dedupe: true,
        }
    }
}

impl StorageConfig {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    pub fn syllabi_dir(&self) -> PathBuf {
        self.root.join(SYLLABI_DIR)
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One stored syllabus and what was parsed from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: Uuid,
    /// Name as uploaded.
    pub name: String,
    pub path: PathBuf,
    pub uploaded_at: DateTime<Utc>,
    pub sha256: String,
    #[serde(default)]
    pub weeks: Vec<WeekRecord>,
    #[serde(default)]
    pub outline_map: OutlineCodeMap,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub extraction_failed: bool,
}

impl LibraryEntry {
    /// Picker label: `name (uploaded_at)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.uploaded_at.format("%Y-%m-%dT%H:%M:%S"))
    }

    /// The stored parse, shaped like a fresh one.
    pub fn as_parse(&self) -> SyllabusParse {
        SyllabusParse {
            weeks: self.weeks.clone(),
            outline_map: self.outline_map.clone(),
            year: self.year,
            extraction_failed: self.extraction_failed,
            backend: None,
        }
    }

    fn apply(&mut self, parse: SyllabusParse) {
        self.weeks = parse.weeks;
        self.outline_map = parse.outline_map;
        self.year = parse.year;
        self.extraction_failed = parse.extraction_failed;
    }
}

/// Stored bytes plus their extracted text.
#[derive(Debug, Clone)]
pub struct SyllabusDocument {
    pub id: Uuid,
    pub name: String,
    pub bytes: Vec<u8>,
    pub text: String,
}

// ============================================================================
// Library
// ============================================================================

pub struct SyllabusLibrary {
    config: StorageConfig,
    extractor: ExtractorChain,
}

impl SyllabusLibrary {
    /// Open (and lay out, if needed) the library at `config.root`.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let syllabi = config.syllabi_dir();
        fs::create_dir_all(&syllabi).map_err(io_err(&syllabi))?;

        let index = config.index_path();
        if !index.exists() {
            fs::write(&index, "[]").map_err(io_err(&index))?;
        }

        Ok(Self {
            config,
            extractor: ExtractorChain::default(),
        })
    }

    pub fn with_extractor(mut self, extractor: ExtractorChain) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Entries in upload order.
    pub fn list(&self) -> Vec<LibraryEntry> {
        self.load_index()
    }

    /// Look up by full id or a unique id prefix.
    pub fn get(&self, id: &str) -> Result<LibraryEntry> {
        let key = id.trim().to_ascii_lowercase();
        if key.is_empty() {
            return Err(StorageError::NotFound(id.to_string()));
        }

        let mut matches = self
            .load_index()
            .into_iter()
            .filter(|entry| entry.id.to_string().starts_with(&key));
        let first = matches.next().ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        if first.id.to_string() != key && matches.next().is_some() {
            return Err(StorageError::Ambiguous(id.to_string()));
        }
        Ok(first)
    }

    /// Store `bytes` under `name`, parse them and record the entry.
    pub fn add(&self, name: &str, bytes: &[u8]) -> Result<LibraryEntry> {
        let safe_name = sanitize_name(name)?;
        let sha256 = hex_digest(bytes);

        let mut index = self.load_index();
        if self.config.dedupe {
            if let Some(existing) = index.iter().find(|e| e.sha256 == sha256) {
                tracing::info!(id = %existing.id, name, "syllabus already in library");
                return Ok(existing.clone());
            }
        }

        let id = Uuid::new_v4();
        let path = self.config.syllabi_dir().join(format!("{id}_{safe_name}"));
        fs::write(&path, bytes).map_err(io_err(&path))?;

        let parse = parse_extraction(self.extractor.extract(bytes), &self.config.segmenter);
        let mut entry = LibraryEntry {
            id,
            name: name.to_string(),
            path,
            uploaded_at: Utc::now(),
            sha256,
            weeks: Vec::new(),
            outline_map: OutlineCodeMap::new(),
            year: None,
            extraction_failed: false,
        };
        entry.apply(parse);

        index.push(entry.clone());
        self.save_index(&index)?;
        tracing::info!(id = %entry.id, name, weeks = entry.weeks.len(), "syllabus added");
        Ok(entry)
    }

    pub fn add_file(&self, path: &Path) -> Result<LibraryEntry> {
        let bytes = fs::read(path).map_err(io_err(path))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| StorageError::InvalidName(path.display().to_string()))?;
        self.add(&name, &bytes)
    }

    /// Add every `.pdf` under `dir`. Unreadable entries are skipped.
    pub fn import_dir(&self, dir: &Path) -> Result<Vec<LibraryEntry>> {
        let mut added = Vec::new();
        for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable path");
                    continue;
                }
            };
            let is_pdf = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
            if entry.file_type().is_file() && is_pdf {
                added.push(self.add_file(entry.path())?);
            }
        }
        Ok(added)
    }

    pub fn load_document(&self, id: &str) -> Result<SyllabusDocument> {
        let entry = self.get(id)?;
        let bytes = fs::read(&entry.path).map_err(io_err(&entry.path))?;
        let text = self.extractor.extract(&bytes).text;
        Ok(SyllabusDocument {
            id: entry.id,
            name: entry.name,
            bytes,
            text,
        })
    }

    /// Delete the stored file and its index entry.
    pub fn remove(&self, id: &str) -> Result<LibraryEntry> {
        let entry = self.get(id)?;
        match fs::remove_file(&entry.path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %entry.path.display(), "stored PDF already missing");
            }
            Err(err) => return Err(io_err(&entry.path)(err)),
        }

        let index: Vec<_> = self
            .load_index()
            .into_iter()
            .filter(|e| e.id != entry.id)
            .collect();
        self.save_index(&index)?;
        tracing::info!(id = %entry.id, "syllabus removed");
        Ok(entry)
    }

    /// Re-run extraction and parsing for a stored syllabus.
    pub fn reparse(&self, id: &str) -> Result<LibraryEntry> {
        let entry = self.get(id)?;
        self.reparse_entry(entry)
    }

    /// Re-parse only when the stored outline map is empty; entries from
    /// older parser versions pick up outline codes this way.
    pub fn ensure_outline(&self, id: &str) -> Result<LibraryEntry> {
        let entry = self.get(id)?;
        if !entry.outline_map.is_empty() {
            return Ok(entry);
        }
        self.reparse_entry(entry)
    }

    fn reparse_entry(&self, mut entry: LibraryEntry) -> Result<LibraryEntry> {
        let bytes = fs::read(&entry.path).map_err(io_err(&entry.path))?;
        let parse = parse_extraction(self.extractor.extract(&bytes), &self.config.segmenter);
        entry.apply(parse);

        let mut index = self.load_index();
        if let Some(slot) = index.iter_mut().find(|e| e.id == entry.id) {
            *slot = entry.clone();
        }
        self.save_index(&index)?;
        tracing::debug!(id = %entry.id, weeks = entry.weeks.len(), "syllabus reparsed");
        Ok(entry)
    }

    // ------------------------------------------------------------------
    // Index
    // ------------------------------------------------------------------

    fn load_index(&self) -> Vec<LibraryEntry> {
        let path = self.config.index_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "library index unreadable");
                return Vec::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "library index corrupt; treating as empty");
            Vec::new()
        })
    }

    fn save_index(&self, entries: &[LibraryEntry]) -> Result<()> {
        let path = self.config.index_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&tmp, json).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        tracing::debug!(entries = entries.len(), "library index written");
        Ok(())
    }
}

/// Path separators are replaced so the stored name stays one file.
fn sanitize_name(name: &str) -> Result<String> {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect();
    if safe.is_empty() || safe.chars().all(|c| c == '.' || c == '_') {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(safe)
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
