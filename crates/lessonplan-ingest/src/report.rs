//! Report composition
//!
//! Fills the weekly plan/report from inferred fields and a draft. The
//! plain-text form embeds the draft block verbatim; fixed-layout output
//! goes through a [`ReportRenderer`] supplied by the caller.

use serde::{Deserialize, Serialize};

use crate::draft::DraftRow;
use crate::inference::InferredFields;
use crate::reconcile::reconcile;

pub const DEFAULT_TITLE: &str = "주간 수업 계획서 및 보고서";
pub const DEFAULT_MATERIALS: &str = "교재, 활동지, 필기구";
pub const NOTHING_TO_REPORT: &str = "특이사항 없음";

const PLAN_SECTION: &str = "[수업계획서]";
const REPORT_SECTION: &str = "[수업보고서]";
const TABLE_HEADER: &str = "단계|시간|내용|비고";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonReport {
    pub doc_title: String,
    pub teacher_name: String,
    pub class_name: String,
    pub class_date: String,
    pub audience: String,
    pub materials: String,
    pub topic: String,
    pub objective: String,
    pub evaluation: String,
    pub student_notes: String,
    pub teacher_notes: String,
    pub draft_text: String,
}

impl Default for LessonReport {
    fn default() -> Self {
        Self {
            doc_title: DEFAULT_TITLE.to_string(),
            teacher_name: String::new(),
            class_name: String::new(),
            class_date: String::new(),
            audience: String::new(),
            materials: DEFAULT_MATERIALS.to_string(),
            topic: String::new(),
            objective: String::new(),
            evaluation: String::new(),
            student_notes: String::new(),
            teacher_notes: String::new(),
            draft_text: String::new(),
        }
    }
}

impl LessonReport {
    /// Pre-fill from inference; missing values stay empty for manual entry.
    pub fn from_fields(fields: &InferredFields, draft_text: impl Into<String>) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            class_name: text(&fields.class_name),
            class_date: text(&fields.class_date),
            audience: text(&fields.audience),
            topic: text(&fields.topic),
            objective: text(&fields.objective),
            draft_text: draft_text.into(),
            ..Default::default()
        }
    }

    pub fn with_teacher(mut self, teacher_name: impl Into<String>) -> Self {
        self.teacher_name = teacher_name.into();
        self
    }

    pub fn rows(&self) -> Vec<DraftRow> {
        reconcile(&self.draft_text)
    }

    pub fn compose_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n\n", self.doc_title));
        out.push_str(&format!("교사: {}\n", self.teacher_name));
        out.push_str(&format!("수업: {}\n", self.class_name));
        out.push_str(&format!("수업날짜: {}\n", self.class_date));
        out.push_str(&format!("대상: {}\n", self.audience));
        out.push_str(&format!("수업 필요물품/준비물: {}\n\n", self.materials));
        out.push_str("[수업 주제 및 수업 목적]\n");
        out.push_str(&format!("수업 주제: {}\n", self.topic));
        out.push_str(&format!("수업 목적: {}\n\n", self.objective));
        out.push_str(&format!(
            "{PLAN_SECTION}\n{TABLE_HEADER}\n{}\n\n",
            self.draft_text.trim_end()
        ));
        out.push_str(&format!("{REPORT_SECTION}\n"));
        out.push_str(&format!("수업평가: {}\n", or_nothing(&self.evaluation)));
        out.push_str(&format!("학생특이사항: {}\n", or_nothing(&self.student_notes)));
        out.push_str(&format!("교사메모: {}\n", or_nothing(&self.teacher_notes)));
        out
    }

    /// Ordered field-name → value mapping for a fixed-layout renderer.
    pub fn template_fields(&self) -> TemplateFields {
        let values = [
            ("doc_title", self.doc_title.clone()),
            ("teacher_name", self.teacher_name.clone()),
            ("class_name", self.class_name.clone()),
            ("class_date", self.class_date.clone()),
            ("audience", self.audience.clone()),
            ("materials", self.materials.clone()),
            ("topic", self.topic.clone()),
            ("objective", self.objective.clone()),
            ("evaluation", or_nothing(&self.evaluation).to_string()),
            ("student_notes", or_nothing(&self.student_notes).to_string()),
            ("teacher_notes", or_nothing(&self.teacher_notes).to_string()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        TemplateFields {
            values,
            lesson_rows: self.rows(),
        }
    }
}

fn or_nothing(value: &str) -> &str {
    if value.trim().is_empty() {
        NOTHING_TO_REPORT
    } else {
        value
    }
}

/// What a renderer receives: scalar fields in layout order plus the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFields {
    pub values: Vec<(String, String)>,
    pub lesson_rows: Vec<DraftRow>,
}

impl TemplateFields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Turns template fields into a document.
pub trait ReportRenderer {
    type Error: std::error::Error;

    fn render(&self, fields: &TemplateFields) -> Result<Vec<u8>, Self::Error>;
}

/// `name: value` lines followed by the lesson table.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextRenderer;

impl ReportRenderer for PlainTextRenderer {
    type Error = std::convert::Infallible;

    fn render(&self, fields: &TemplateFields) -> Result<Vec<u8>, Self::Error> {
        let mut out = String::new();
        for (name, value) in &fields.values {
            out.push_str(&format!("{name}: {value}\n"));
        }
        out.push_str("lesson_rows:\n");
        for row in &fields.lesson_rows {
            out.push_str(&format!("  {}\n", row.to_line()));
        }
        Ok(out.into_bytes())
    }
}

/// Recover the draft block from a composed report, or `None` when the
/// plan section is missing.
pub fn extract_draft_block(report_text: &str) -> Option<String> {
    let (_, after) = report_text.split_once(PLAN_SECTION)?;
    let body = after.split(REPORT_SECTION).next().unwrap_or_default();

    let block = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && *line != TABLE_HEADER)
        .collect::<Vec<_>>()
        .join("\n");
    Some(block)
}
