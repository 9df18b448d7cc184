//! CLI configuration: an optional JSON file plus environment overrides.

use anyhow::{Context, Result};
use lessonplan_ingest::{DraftOptions, SegmenterConfig};
use lessonplan_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "LESSONPLAN_HOME";
pub const TEACHER_ENV: &str = "LESSONPLAN_TEACHER";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonplanConfig {
    /// Library root; `data` in the working directory when unset.
    pub library_root: Option<PathBuf>,
    /// Printed on reports.
    pub teacher_name: Option<String>,
    /// Overrides the default materials line on reports.
    pub materials: Option<String>,
    pub segmenter: SegmenterConfig,
    pub draft: DraftOptions,
}

impl LessonplanConfig {
    /// Read `path` if given, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config: {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid config JSON: {}", path.display()))?
            }
            None => Self::default(),
        };
        Ok(config.with_env(
            std::env::var(HOME_ENV).ok(),
            std::env::var(TEACHER_ENV).ok(),
        ))
    }

    /// Non-empty environment values win over the file.
    pub fn with_env(mut self, home: Option<String>, teacher: Option<String>) -> Self {
        if let Some(home) = home.filter(|h| !h.trim().is_empty()) {
            self.library_root = Some(PathBuf::from(home));
        }
        if let Some(teacher) = teacher.filter(|t| !t.trim().is_empty()) {
            self.teacher_name = Some(teacher.trim().to_string());
        }
        self
    }

    pub fn storage(&self) -> StorageConfig {
        let mut storage = match &self.library_root {
            Some(root) => StorageConfig::at(root),
            None => StorageConfig::default(),
        };
        storage.segmenter = self.segmenter.clone();
        storage
    }
}
