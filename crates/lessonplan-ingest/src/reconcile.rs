//! Draft edit reconciliation
//!
//! Reads user-edited draft text back into [`DraftRow`]s using the separators
//! [`crate::draft::serialize`] writes. A line that does not split into exactly
//! four cells is kept whole in `content` so no edit is lost.

use serde::{Deserialize, Serialize};

use crate::draft::{DraftRow, COLUMN_SEPARATOR};

const CELLS_PER_ROW: usize = 4;

/// A reconciled row with the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledRow {
    pub row: DraftRow,
    /// 1-based line number in the edited text.
    pub line: usize,
    /// The line had the wrong number of cells.
    pub malformed: bool,
}

pub fn reconcile(edited_text: &str) -> Vec<DraftRow> {
    reconcile_detailed(edited_text)
        .into_iter()
        .map(|reconciled| reconciled.row)
        .collect()
}

pub fn reconcile_detailed(edited_text: &str) -> Vec<ReconciledRow> {
    edited_text
        .lines()
        .enumerate()
        .filter(|(_, raw)| !raw.trim().is_empty())
        .map(|(idx, raw)| parse_line(raw, idx + 1))
        .collect()
}

fn parse_line(raw: &str, line: usize) -> ReconciledRow {
    let trimmed = raw.trim();
    let cells: Vec<&str> = trimmed.split(COLUMN_SEPARATOR).map(str::trim).collect();

    if let [stage, time, content, note] = cells.as_slice() {
        return ReconciledRow {
            row: DraftRow::new(*stage, *time, *content, *note),
            line,
            malformed: false,
        };
    }

    tracing::warn!(
        line,
        cells = cells.len(),
        expected = CELLS_PER_ROW,
        "draft line kept as content"
    );
    ReconciledRow {
        row: DraftRow::content_only(trimmed),
        line,
        malformed: true,
    }
}
