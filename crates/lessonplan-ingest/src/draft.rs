//! Draft table generation
//!
//! A lesson draft is always three rows (introduction, development, closing)
//! so the renderer sees a stable table shape whatever the inference found.
//! The text form is one row per line with cells separated by `|`; see
//! [`crate::reconcile`] for the way back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::inference::InferredFields;

pub const COLUMN_SEPARATOR: char = '|';
pub const ROW_SEPARATOR: char = '\n';

pub const TOPIC_PLACEHOLDER: &str = "[TOPIC]";
pub const OBJECTIVE_PLACEHOLDER: &str = "[OBJECTIVE]";

/// Fixed pedagogical stages, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Introduction,
    Development,
    Closing,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Introduction, Stage::Development, Stage::Closing];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Introduction => "도입",
            Stage::Development => "전개",
            Stage::Closing => "정리",
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Stage::Introduction => 10,
            Stage::Development => 25,
            Stage::Closing => 5,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.label() == label.trim())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the lesson table. All cells are free text once edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRow {
    pub stage: String,
    pub time: String,
    pub content: String,
    pub note: String,
}

impl DraftRow {
    pub fn new(
        stage: impl Into<String>,
        time: impl Into<String>,
        content: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            time: time.into(),
            content: content.into(),
            note: note.into(),
        }
    }

    /// A row holding only unparsed text.
    pub fn content_only(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn to_line(&self) -> String {
        [&self.stage, &self.time, &self.content, &self.note]
            .map(|cell| cell.as_str())
            .join(&COLUMN_SEPARATOR.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftOptions {
    /// Open the introduction with a prayer.
    pub include_prayer: bool,
    /// Teacher memo appended to the development row.
    pub plan_note: Option<String>,
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self {
            include_prayer: true,
            plan_note: None,
        }
    }
}

pub fn generate(fields: &InferredFields) -> Vec<DraftRow> {
    generate_with(fields, &DraftOptions::default())
}

pub fn generate_with(fields: &InferredFields, options: &DraftOptions) -> Vec<DraftRow> {
    let topic = cell_or(fields.topic.as_deref(), TOPIC_PLACEHOLDER);
    let objective = cell_or(fields.objective.as_deref(), OBJECTIVE_PLACEHOLDER);

    Stage::ALL
        .into_iter()
        .map(|stage| {
            let content = match stage {
                Stage::Introduction => {
                    let opening = if options.include_prayer {
                        "기도 및 출석 확인"
                    } else {
                        "출석 확인"
                    };
                    format!("{opening}, 지난 시간 복습, 학습 목표 안내: {objective}")
                }
                Stage::Development => {
                    let mut content = format!("{topic} 설명 및 활동");
                    if let Some(note) = options
                        .plan_note
                        .as_deref()
                        .map(sanitize_cell)
                        .filter(|note| !note.is_empty())
                    {
                        content.push_str(&format!(" (메모: {note})"));
                    }
                    content
                }
                Stage::Closing => {
                    format!("{topic} 핵심 정리, 형성평가, 과제 안내, 다음 시간 예고")
                }
            };
            DraftRow::new(stage.label(), format!("{}분", stage.minutes()), content, "")
        })
        .collect()
}

/// Text block the editor shows and the exporters embed.
pub fn serialize(rows: &[DraftRow]) -> String {
    rows.iter()
        .map(DraftRow::to_line)
        .collect::<Vec<_>>()
        .join(&ROW_SEPARATOR.to_string())
}

fn cell_or(value: Option<&str>, placeholder: &str) -> String {
    value
        .map(sanitize_cell)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Substituted text must not carry either separator.
pub fn sanitize_cell(value: &str) -> String {
    value
        .replace(COLUMN_SEPARATOR, "/")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
