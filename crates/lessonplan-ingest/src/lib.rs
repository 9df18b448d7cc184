//! Syllabus ingestion for lesson planning
//!
//! Turns a syllabus PDF into weekly lesson-plan drafts:
//! - PDF text extraction with backend fallback
//! - Week segmentation (week number, date range, class labels, body)
//! - Field inference (class, date, audience, topic, objective)
//! - Draft table generation and edit reconciliation
//! - Plain-text report composition
//!
//! Nothing here fails on bad input. Extraction failure, missing weeks and
//! incomplete inference are reported as values the caller shows to the user.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod draft;
pub mod inference;
pub mod outline;
pub mod pdf;
pub mod reconcile;
pub mod report;
pub mod weeks;

pub use draft::{generate, generate_with, serialize, DraftOptions, DraftRow, Stage};
pub use inference::{infer, infer_with, FieldSource, InferenceContext, InferredFields};
pub use outline::{OutlineCodeMap, OutlineEntry, OutlineError};
pub use pdf::{
    extract, BackendFailure, Extraction, ExtractorChain, LopdfBackend, PdfError,
    PdfExtractBackend, TextBackend,
};
pub use reconcile::{reconcile, reconcile_detailed, ReconciledRow};
pub use report::{
    extract_draft_block, LessonReport, PlainTextRenderer, ReportRenderer, TemplateFields,
};
pub use weeks::{
    detect_year, segment, segment_with, DateOrder, DateRange, MonthDay, SegmenterConfig,
    WeekRecord,
};

// ============================================================================
// Whole-syllabus parse
// ============================================================================

/// Everything recovered from one syllabus.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyllabusParse {
    pub weeks: Vec<WeekRecord>,
    /// Outline table found inside the syllabus text; often empty.
    pub outline_map: OutlineCodeMap,
    pub year: Option<i32>,
    /// Every extraction backend failed; `weeks` is then empty.
    #[serde(default)]
    pub extraction_failed: bool,
    #[serde(default)]
    pub backend: Option<String>,
}

impl SyllabusParse {
    pub fn no_weeks_found(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn week(&self, week_index: u32) -> Option<&WeekRecord> {
        self.weeks.iter().find(|w| w.week_index == week_index)
    }

    pub fn context_for(&self, file_name: Option<&str>) -> InferenceContext {
        InferenceContext {
            file_name: file_name.map(str::to_string),
            year: self.year,
        }
    }
}

pub fn parse_syllabus_text(text: &str, config: &SegmenterConfig) -> SyllabusParse {
    SyllabusParse {
        weeks: segment_with(text, config),
        outline_map: OutlineCodeMap::from_syllabus_text(text),
        year: detect_year(text),
        extraction_failed: false,
        backend: None,
    }
}

pub fn parse_syllabus_pdf(data: &[u8], config: &SegmenterConfig) -> SyllabusParse {
    parse_extraction(ExtractorChain::default().extract(data), config)
}

/// Parse an already-run extraction.
pub fn parse_extraction(extraction: Extraction, config: &SegmenterConfig) -> SyllabusParse {
    let mut parse = parse_syllabus_text(&extraction.text, config);
    parse.extraction_failed = extraction.failed();
    parse.backend = extraction.backend;

    tracing::info!(
        weeks = parse.weeks.len(),
        outline_codes = parse.outline_map.len(),
        backend = parse.backend.as_deref().unwrap_or("none"),
        "syllabus parsed"
    );
    parse
}

/// Read and parse a syllabus file: `.pdf` through the extractor chain,
/// anything else as UTF-8 text.
pub fn parse_syllabus_file(path: &Path, config: &SegmenterConfig) -> Result<SyllabusParse> {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read PDF: {}", path.display()))?;
        Ok(parse_syllabus_pdf(&data, config))
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read syllabus text: {}", path.display()))?;
        Ok(parse_syllabus_text(&pdf::normalize_text(&text), config))
    }
}

// ============================================================================
// Per-week draft
// ============================================================================

/// Inferred fields and the generated rows for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub week_index: u32,
    pub week_label: String,
    pub fields: InferredFields,
    pub rows: Vec<DraftRow>,
}

impl LessonDraft {
    pub fn text(&self) -> String {
        serialize(&self.rows)
    }

    pub fn report(&self) -> LessonReport {
        LessonReport::from_fields(&self.fields, self.text())
    }
}

/// Infer, apply user overrides, and generate the draft for one week.
///
/// A caller-supplied outline map takes precedence over codes found in the
/// syllabus itself.
pub fn draft_for_week(
    parse: &SyllabusParse,
    week: &WeekRecord,
    extra_outline: Option<&OutlineCodeMap>,
    context: &InferenceContext,
    overrides: &InferredFields,
    options: &DraftOptions,
) -> LessonDraft {
    let mut outline = parse.outline_map.clone();
    if let Some(extra) = extra_outline {
        outline.extend(extra);
    }

    let fields = infer_with(week, Some(&outline), context).override_with(overrides);
    let missing = fields.missing();
    if !missing.is_empty() {
        tracing::debug!(week = week.week_index, ?missing, "fields left for manual entry");
    }

    LessonDraft {
        week_index: week.week_index,
        week_label: week.label(),
        rows: generate_with(&fields, options),
        fields,
    }
}
