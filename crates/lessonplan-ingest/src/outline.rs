//! Outline-code tables
//!
//! Many syllabi carry a reference table mapping short codes (`L1.2`,
//! `BIO3-1`, `U4`) to a unit topic and its learning objective. The weekly
//! plan then only mentions the code. [`OutlineCodeMap`] holds that table,
//! either recovered from the syllabus text itself or loaded from a
//! caller-supplied JSON or delimited file.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static OUTLINE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[\s\-*•·]*(?P<code>[A-Za-z]{1,4}\d{1,2}(?:[.\-]\d{1,2}){0,2})\s*(?:[):|\]]|\.\s|\t|\s{2,}|\s+-\s+)\s*(?P<rest>\S.*)$",
    )
    .expect("outline line regex")
});

static GRADE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[Gg]\d{1,2}$").expect("grade code regex"));

/// Separators between topic and objective, tried in order.
const OBJECTIVE_SEPARATORS: &[&str] = &["|", " - ", " – ", "→", "=>", " / "];

const CODE_HEADERS: &[&str] = &["code", "outline", "코드", "성취기준", "단원코드"];
const TOPIC_HEADERS: &[&str] = &["topic", "수업 주제", "주제", "단원"];
const OBJECTIVE_HEADERS: &[&str] = &["objective", "수업 목적", "목적", "목표", "학습목표"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub code: String,
    pub topic: String,
    #[serde(default)]
    pub objective: Option<String>,
}

/// Code → (topic, objective), in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutlineCodeMap {
    entries: Vec<OutlineEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum OutlineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid outline JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid outline table: {0}")]
    Csv(#[from] csv::Error),
    #[error("outline table has no usable rows")]
    Empty,
}

impl OutlineCodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutlineEntry> {
        self.entries.iter()
    }

    /// Insert or replace. Codes compare case-insensitively.
    pub fn insert(&mut self, code: &str, topic: &str, objective: Option<&str>) {
        let code = normalize_code(code);
        let topic = topic.trim();
        if code.is_empty() || topic.is_empty() {
            return;
        }
        let entry = OutlineEntry {
            code,
            topic: topic.to_string(),
            objective: objective
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string),
        };
        match self.entries.iter_mut().find(|e| e.code == entry.code) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, code: &str) -> Option<&OutlineEntry> {
        let code = normalize_code(code);
        self.entries.iter().find(|e| e.code == code)
    }

    /// Entry for the first token in `text` that is a known code.
    pub fn lookup_in(&self, text: &str) -> Option<&OutlineEntry> {
        if self.entries.is_empty() {
            return None;
        }
        text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '-'))
            .map(|token| token.trim_matches(|c| c == '.' || c == '-'))
            .filter(|token| !token.is_empty())
            .find_map(|token| self.get(token))
    }

    /// Merge `other` into `self`; entries from `other` win on conflicts.
    pub fn extend(&mut self, other: &OutlineCodeMap) {
        for entry in &other.entries {
            self.insert(&entry.code, &entry.topic, entry.objective.as_deref());
        }
    }

    // ------------------------------------------------------------------
    // Builders
    // ------------------------------------------------------------------

    /// Recover an outline table embedded in syllabus text.
    ///
    /// A table line starts with a code, a separator, the topic and
    /// optionally the objective: `L1.2: 세포의 구조 | 세포 소기관의 기능을 설명한다`.
    pub fn from_syllabus_text(text: &str) -> Self {
        let mut map = Self::new();

        for line in text.lines() {
            let Some(caps) = OUTLINE_LINE_RE.captures(line) else {
                continue;
            };
            let code = &caps["code"];
            if GRADE_CODE_RE.is_match(code) {
                continue;
            }
            let (topic, objective) = split_topic_objective(&caps["rest"]);
            map.insert(code, topic, objective);
        }

        if !map.is_empty() {
            tracing::debug!(entries = map.len(), "outline codes found in syllabus text");
        }
        map
    }

    /// JSON object (`{"L1": {"topic": .., "objective": ..}}` or
    /// `{"L1": "topic"}`) or array of `{code, topic, objective}`.
    pub fn from_json(json: &str) -> Result<Self, OutlineError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum JsonValue {
            Pair {
                topic: String,
                #[serde(default)]
                objective: Option<String>,
            },
            Topic(String),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum JsonTable {
            Rows(Vec<OutlineEntry>),
            Object(HashMap<String, JsonValue>),
        }

        let mut map = Self::new();
        match serde_json::from_str::<JsonTable>(json)? {
            JsonTable::Rows(rows) => {
                for row in rows {
                    map.insert(&row.code, &row.topic, row.objective.as_deref());
                }
            }
            JsonTable::Object(object) => {
                let mut codes: Vec<_> = object.into_iter().collect();
                codes.sort_by(|a, b| a.0.cmp(&b.0));
                for (code, value) in codes {
                    match value {
                        JsonValue::Pair { topic, objective } => {
                            map.insert(&code, &topic, objective.as_deref())
                        }
                        JsonValue::Topic(topic) => map.insert(&code, &topic, None),
                    }
                }
            }
        }

        if map.is_empty() {
            return Err(OutlineError::Empty);
        }
        Ok(map)
    }

    /// Tab-, pipe- or comma-delimited table with CSV quoting. A header row
    /// naming the code/topic/objective columns is honored; otherwise columns
    /// are taken positionally.
    pub fn from_delimited(table: &str) -> Result<Self, OutlineError> {
        let table = table.trim_start_matches('\u{feff}');
        let Some(first) = table.lines().find(|l| !l.trim().is_empty()) else {
            return Err(OutlineError::Empty);
        };
        let delimiter = if first.contains('\t') {
            b'\t'
        } else if first.contains('|') {
            b'|'
        } else {
            b','
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .delimiter(delimiter)
            .from_reader(table.as_bytes());
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().any(|cell| !cell.is_empty()) {
                rows.push(record);
            }
        }
        let Some(first) = rows.first() else {
            return Err(OutlineError::Empty);
        };

        let header: Vec<String> = first.iter().map(str::to_lowercase).collect();
        let pick = |names: &[&str]| header.iter().position(|h| names.contains(&h.as_str()));
        let (columns, body) = match (pick(CODE_HEADERS), pick(TOPIC_HEADERS)) {
            (Some(code), Some(topic)) => ((code, topic, pick(OBJECTIVE_HEADERS)), &rows[1..]),
            _ => ((0, 1, Some(2)), &rows[..]),
        };

        let mut map = Self::new();
        for row in body {
            let cell = |idx: usize| row.get(idx).unwrap_or("");
            let objective = columns.2.map(cell).filter(|o| !o.is_empty());
            map.insert(cell(columns.0), cell(columns.1), objective);
        }

        if map.is_empty() {
            return Err(OutlineError::Empty);
        }
        Ok(map)
    }

    /// Load a caller-supplied table; `.json` files are parsed as JSON,
    /// anything else as a delimited table.
    pub fn load(path: &Path) -> Result<Self, OutlineError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_delimited(&content)
        }
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn split_topic_objective(rest: &str) -> (&str, Option<&str>) {
    for sep in OBJECTIVE_SEPARATORS {
        if let Some((topic, objective)) = rest.split_once(sep) {
            let (topic, objective) = (topic.trim(), objective.trim());
            if !topic.is_empty() {
                return (topic, Some(objective).filter(|o| !o.is_empty()));
            }
        }
    }
    (rest.trim(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_syllabus_text() {
        let text = "\
성취기준 목록
L1.1: 생명의 특성 | 생물의 특성을 설명할 수 있다
L1.2) 세포의 구조 - 세포 소기관의 기능을 설명한다
U3  광합성
G11 학생 대상
1주 3.02-3.06 L1.1";
        let map = OutlineCodeMap::from_syllabus_text(text);

        assert_eq!(map.len(), 3);
        let first = map.get("l1.1").expect("L1.1 present");
        assert_eq!(first.topic, "생명의 특성");
        assert_eq!(first.objective.as_deref(), Some("생물의 특성을 설명할 수 있다"));
        assert_eq!(
            map.get("L1.2").and_then(|e| e.objective.as_deref()),
            Some("세포 소기관의 기능을 설명한다")
        );
        assert_eq!(map.get("U3").map(|e| e.topic.as_str()), Some("광합성"));
        assert_eq!(map.get("U3").and_then(|e| e.objective.clone()), None);
        assert!(map.get("G11").is_none());
    }

    #[test]
    fn test_lookup_first_token_wins() {
        let mut map = OutlineCodeMap::new();
        map.insert("B2", "유전", None);
        map.insert("A1", "세포", Some("세포를 이해한다"));

        let entry = map.lookup_in("오늘은 (A1) 다음 주 B2.").expect("match");
        assert_eq!(entry.code, "A1");
        assert!(map.lookup_in("코드 없음").is_none());
        assert!(OutlineCodeMap::new().lookup_in("A1").is_none());
    }

    #[test]
    fn test_from_json_object_and_rows() {
        let map = OutlineCodeMap::from_json(
            r#"{"A1": {"topic": "세포", "objective": "세포를 이해한다"}, "B2": "유전"}"#,
        )
        .expect("object form");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("b2").map(|e| e.topic.as_str()), Some("유전"));

        let rows = OutlineCodeMap::from_json(
            r#"[{"code": "C3", "topic": "생태계", "objective": null}]"#,
        )
        .expect("row form");
        assert_eq!(rows.get("C3").map(|e| e.topic.as_str()), Some("생태계"));

        assert!(matches!(OutlineCodeMap::from_json("[]"), Err(OutlineError::Empty)));
        assert!(matches!(OutlineCodeMap::from_json("{"), Err(OutlineError::Json(_))));
    }

    #[test]
    fn test_from_delimited_with_korean_header() {
        let table = "코드\t수업 주제\t수업 목적\nA1\t세포\t세포를 이해한다\nA2\t조직\t\n";
        let map = OutlineCodeMap::from_delimited(table).expect("table");
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("A2").and_then(|e| e.objective.clone()), None);
    }

    #[test]
    fn test_from_delimited_positional() {
        let map = OutlineCodeMap::from_delimited("A1,세포,세포를 이해한다\nA2,\"조직\"").expect("csv");
        assert_eq!(map.get("A2").map(|e| e.topic.as_str()), Some("조직"));
        assert!(matches!(OutlineCodeMap::from_delimited("\n \n"), Err(OutlineError::Empty)));
    }

    #[test]
    fn test_from_delimited_quoted_comma() {
        let table = "\u{feff}code,topic,objective\nA1,\"세포, 조직\",세포를 이해한다\nA2,유전,\"멘델의 법칙, 유전자\"";
        let map = OutlineCodeMap::from_delimited(table).expect("csv");
        let a1 = map.get("A1").expect("A1 present");
        assert_eq!(a1.topic, "세포, 조직");
        assert_eq!(a1.objective.as_deref(), Some("세포를 이해한다"));
        assert_eq!(
            map.get("A2").and_then(|e| e.objective.as_deref()),
            Some("멘델의 법칙, 유전자")
        );
    }

    #[test]
    fn test_from_delimited_pipe_table() {
        let map = OutlineCodeMap::from_delimited("코드|주제|목표\nB1 | 생태계 | 먹이 그물을 설명한다").expect("pipe");
        assert_eq!(map.get("B1").map(|e| e.topic.as_str()), Some("생태계"));
    }
}
