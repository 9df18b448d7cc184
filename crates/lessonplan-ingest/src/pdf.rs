//! PDF Extraction Module
//!
//! Turns syllabus PDF bytes into plain text through an ordered chain of
//! extraction backends. A backend that returns an error, panics, or yields
//! only whitespace is recorded as a failure and the next one is tried.
//! When every backend fails the caller receives empty text together with the
//! recorded failures; extraction never returns an error.

use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// Backends
// ============================================================================

/// A single way of getting text out of PDF bytes.
pub trait TextBackend {
    /// Short name used in logs and in [`Extraction::backend`].
    fn name(&self) -> &'static str;

    fn extract(&self, data: &[u8]) -> Result<String, PdfError>;
}

/// Primary backend: `pdf-extract`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

/// Secondary backend: page-by-page text operators through `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfBackend;

#[cfg(feature = "pdf")]
impl TextBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, data: &[u8]) -> Result<String, PdfError> {
        pdf_extract::extract_text_from_mem(data)
            .map_err(|e| PdfError::ExtractionFailed(e.to_string()))
    }
}

#[cfg(feature = "pdf")]
impl TextBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, data: &[u8]) -> Result<String, PdfError> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| PdfError::ExtractionFailed(e.to_string()))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                // A single unreadable page should not hide the rest.
                Err(err) => tracing::debug!(page = page_number, error = %err, "lopdf page skipped"),
            }
        }

        if pages.is_empty() {
            return Err(PdfError::ExtractionFailed("no readable pages".to_string()));
        }
        Ok(pages.join("\n"))
    }
}

#[cfg(not(feature = "pdf"))]
impl TextBackend for PdfExtractBackend {
    fn name(&self) -> &'static str {
        "pdf-extract"
    }

    fn extract(&self, _data: &[u8]) -> Result<String, PdfError> {
        Err(PdfError::FeatureNotEnabled)
    }
}

#[cfg(not(feature = "pdf"))]
impl TextBackend for LopdfBackend {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&self, _data: &[u8]) -> Result<String, PdfError> {
        Err(PdfError::FeatureNotEnabled)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("PDF backend panicked (malformed document)")]
    Panicked,
    #[error("PDF backend produced no text")]
    EmptyText,
    #[error("PDF feature not enabled. Compile with --features pdf")]
    FeatureNotEnabled,
}

// ============================================================================
// Extraction chain
// ============================================================================

/// Why one backend in the chain was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: String,
    pub reason: String,
}

/// Result of running the chain. `backend` names the backend whose text was
/// kept; `None` means every backend failed and `text` is empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub text: String,
    pub backend: Option<String>,
    pub failures: Vec<BackendFailure>,
}

impl Extraction {
    /// Informational flag for the "both extraction paths failed" case.
    pub fn failed(&self) -> bool {
        self.backend.is_none()
    }
}

/// Backends tried in priority order.
pub struct ExtractorChain {
    backends: Vec<Box<dyn TextBackend>>,
}

impl Default for ExtractorChain {
    fn default() -> Self {
        Self::empty()
            .with_backend(PdfExtractBackend)
            .with_backend(LopdfBackend)
    }
}

impl ExtractorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain with no backends; every extraction fails softly.
    pub fn empty() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    pub fn with_backend(mut self, backend: impl TextBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn extract(&self, data: &[u8]) -> Extraction {
        let mut failures = Vec::new();

        for backend in &self.backends {
            match run_backend(backend.as_ref(), data) {
                Ok(text) => {
                    tracing::debug!(
                        backend = backend.name(),
                        chars = text.chars().count(),
                        "pdf text extracted"
                    );
                    return Extraction {
                        text,
                        backend: Some(backend.name().to_string()),
                        failures,
                    };
                }
                Err(err) => {
                    tracing::warn!(backend = backend.name(), error = %err, "pdf backend failed");
                    failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Extraction {
            text: String::new(),
            backend: None,
            failures,
        }
    }
}

fn run_backend(backend: &dyn TextBackend, data: &[u8]) -> Result<String, PdfError> {
    // Some backends panic on malformed input instead of returning an error.
    let raw = panic::catch_unwind(AssertUnwindSafe(|| backend.extract(data)))
        .map_err(|_| PdfError::Panicked)??;

    let text = normalize_text(&raw);
    if text.trim().is_empty() {
        return Err(PdfError::EmptyText);
    }
    Ok(text)
}

/// Extract text with the default chain, returning `""` when nothing works.
pub fn extract(data: &[u8]) -> String {
    ExtractorChain::default().extract(data).text
}

// ============================================================================
// Text cleanup
// ============================================================================

/// Normalize extracted text for pattern matching.
///
/// NFKC folds full-width digits and punctuation (`３주`, `：`) and recomposes
/// Hangul jamo into syllables. Control characters other than newline and tab
/// are dropped, form feeds become line breaks and trailing whitespace is
/// trimmed from every line.
pub fn normalize_text(raw: &str) -> String {
    let folded: String = raw
        .nfkc()
        .map(|c| if c == '\x0C' { '\n' } else { c })
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();

    let mut out = String::with_capacity(folded.len());
    for line in folded.lines() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim_end_matches('\n').to_string()
}

// ============================================================================
// Tests
// ============================================================================
