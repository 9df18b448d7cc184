//! Field inference
//!
//! Derives editable defaults (class name, date, audience, topic, objective)
//! for one [`WeekRecord`]. Every field walks its own fallback chain:
//!
//! 1. structured tokens already on the record (dates, class labels)
//! 2. outline-code lookup in the week text
//! 3. keyword heuristics: explicitly labelled lines first, then the theme
//!    keyword table
//! 4. `None`
//!
//! A `None` is surfaced to the user for manual entry. Nothing here
//! fabricates a plausible default and nothing here fails.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::path::Path;
use std::sync::LazyLock;

use crate::outline::OutlineCodeMap;
use crate::weeks::{MonthDay, WeekRecord};

static DATE_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})[./-](\d{1,2})\s*\(?([월화수목금토일])\)").expect("date/day regex")
});

static DAY_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[월화수목금토일](?:\s*/\s*[월화수목금토일])+").expect("weekday list regex")
});

static SCHEDULE_NOTICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)휴강|공휴일|대체휴일|행사|시험|고사|holiday|no class").expect("notice regex")
});

static GRADE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|[^A-Za-z])G\s*(\d{1,2})(?:\D|$)").expect("grade regex"));

static SUBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Life\s*Science|Social\s*Studies|Science|Math(?:ematics)?|English|Biology|Chemistry|Physics|생명과학|통합과학|국어|수학|과학|영어|사회|생물)")
        .expect("subject regex")
});

static FILE_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)20\d{2}|\d{1,2}\s*주(?:차)?|syllabus|plan|weekly|week|강의계획서|수업계획서|계획서")
        .expect("file name noise regex")
});

static TOPIC_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*(?:수업\s*주제|학습\s*주제|주제|단원명?|topic|theme|unit(?:\s*\d+)?)\s*[:：]\s*(\S.*?)\s*$")
        .expect("topic line regex")
});

static OBJECTIVE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^\s*(?:수업\s*목[적표]|학습\s*목표|목[적표]|objectives?|goals?)\s*[:：]\s*(\S.*?)\s*$")
        .expect("objective line regex")
});

/// Theme keyword → canonical (topic, objective). The first keyword to occur
/// in the week text wins.
pub struct ThemeRule {
    pub keywords: &'static [&'static str],
    pub topic: &'static str,
    pub objective: &'static str,
}

pub const THEME_RULES: &[ThemeRule] = &[
    ThemeRule {
        keywords: &["오리엔테이션", "orientation"],
        topic: "오리엔테이션",
        objective: "수업 운영 방식과 평가 기준을 이해한다.",
    },
    ThemeRule {
        keywords: &["세포", "cell"],
        topic: "세포의 구조와 기능",
        objective: "세포 소기관의 구조와 기능을 설명할 수 있다.",
    },
    ThemeRule {
        keywords: &["광합성", "photosynthesis"],
        topic: "광합성",
        objective: "광합성 과정에서 빛에너지가 화학 에너지로 전환되는 과정을 설명할 수 있다.",
    },
    ThemeRule {
        keywords: &["세포호흡", "호흡", "respiration"],
        topic: "세포 호흡",
        objective: "세포 호흡을 통해 에너지가 생성되는 과정을 설명할 수 있다.",
    },
    ThemeRule {
        keywords: &["유전", "dna", "genetic", "heredity"],
        topic: "유전",
        objective: "유전 물질과 형질의 유전 원리를 설명할 수 있다.",
    },
    ThemeRule {
        keywords: &["진화", "evolution"],
        topic: "진화와 다양성",
        objective: "진화의 증거와 생물 다양성의 의미를 설명할 수 있다.",
    },
    ThemeRule {
        keywords: &["생태계", "ecosystem", "ecology"],
        topic: "생태계와 환경",
        objective: "생태계 구성 요소의 상호 작용을 설명할 수 있다.",
    },
    ThemeRule {
        keywords: &["소화", "digestion"],
        topic: "소화와 순환",
        objective: "영양소의 소화와 흡수 과정을 설명할 수 있다.",
    },
    ThemeRule {
        keywords: &["중간고사", "기말고사", "midterm", "final exam", "시험", "exam"],
        topic: "평가 및 복습",
        objective: "학습한 내용을 점검하고 부족한 부분을 보완한다.",
    },
    ThemeRule {
        keywords: &["복습", "review"],
        topic: "단원 복습",
        objective: "앞서 배운 핵심 개념을 정리하고 적용할 수 있다.",
    },
];

// ============================================================================
// Types
// ============================================================================

/// Where the topic came from; lower layers mean lower confidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldSource {
    OutlineCode(String),
    LabelledLine,
    ThemeKeyword(String),
}

/// Editable defaults for one week; each field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredFields {
    pub class_name: Option<String>,
    pub class_date: Option<String>,
    pub audience: Option<String>,
    pub topic: Option<String>,
    pub objective: Option<String>,
    #[serde(default)]
    pub topic_source: Option<FieldSource>,
    /// The week mentions a holiday, exam or school event.
    #[serde(default)]
    pub schedule_notice: bool,
}

impl InferredFields {
    /// Names of the fields left for manual entry.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("class_name", &self.class_name),
            ("class_date", &self.class_date),
            ("audience", &self.audience),
            ("topic", &self.topic),
            ("objective", &self.objective),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Apply user overrides; `Some` values replace inferred ones.
    pub fn override_with(mut self, overrides: &InferredFields) -> Self {
        let pick = |own: &mut Option<String>, other: &Option<String>| {
            if let Some(value) = other.as_ref().filter(|v| !v.trim().is_empty()) {
                *own = Some(value.trim().to_string());
            }
        };
        pick(&mut self.class_name, &overrides.class_name);
        pick(&mut self.class_date, &overrides.class_date);
        pick(&mut self.audience, &overrides.audience);
        pick(&mut self.objective, &overrides.objective);
        if overrides.topic.as_ref().is_some_and(|t| !t.trim().is_empty()) {
            pick(&mut self.topic, &overrides.topic);
            self.topic_source = None;
        }
        self
    }
}

/// Facts about the syllabus as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceContext {
    /// Uploaded file name; often the only place the subject is written.
    pub file_name: Option<String>,
    /// Academic year, used to print full dates.
    pub year: Option<i32>,
}

// ============================================================================
// Inference
// ============================================================================

pub fn infer(record: &WeekRecord, outline_map: Option<&OutlineCodeMap>) -> InferredFields {
    infer_with(record, outline_map, &InferenceContext::default())
}

pub fn infer_with(
    record: &WeekRecord,
    outline_map: Option<&OutlineCodeMap>,
    context: &InferenceContext,
) -> InferredFields {
    let text = record.search_text();

    // A code on the marker line (`3주 3.09-3.13 U3`) has the shape of a
    // class label and is segmented as one; it still names the outline entry.
    let (code_labels, session_labels): (Vec<&str>, Vec<&str>) = record
        .class_labels
        .iter()
        .map(String::as_str)
        .partition(|label| outline_map.is_some_and(|map| map.get(label).is_some()));

    let outline = outline_map.and_then(|map| {
        code_labels
            .first()
            .and_then(|code| map.get(code))
            .or_else(|| map.lookup_in(&text))
    });
    let labelled_topic = capture_line(&TOPIC_LINE_RE, &text);
    let labelled_objective = capture_line(&OBJECTIVE_LINE_RE, &text);
    let theme = first_theme(&text);

    let (topic, topic_source) = if let Some(entry) = outline {
        (Some(entry.topic.clone()), Some(FieldSource::OutlineCode(entry.code.clone())))
    } else if let Some(topic) = labelled_topic {
        (Some(topic), Some(FieldSource::LabelledLine))
    } else if let Some((keyword, rule)) = theme {
        (Some(rule.topic.to_string()), Some(FieldSource::ThemeKeyword(keyword.to_string())))
    } else {
        (None, None)
    };

    let objective = outline
        .and_then(|entry| entry.objective.clone())
        .or(labelled_objective)
        .or_else(|| theme.map(|(_, rule)| rule.objective.to_string()));

    InferredFields {
        class_name: infer_class_name(&text, context),
        class_date: infer_class_date(record, &text, context),
        audience: infer_audience(&session_labels, &text),
        topic,
        objective,
        topic_source,
        schedule_notice: SCHEDULE_NOTICE_RE.is_match(&text),
    }
}

fn capture_line(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Earliest keyword wins; on a tie the longer keyword does, so `세포호흡`
/// beats `세포`.
fn first_theme(text: &str) -> Option<(&'static str, &'static ThemeRule)> {
    let lower = text.to_lowercase();
    THEME_RULES
        .iter()
        .flat_map(|rule| rule.keywords.iter().map(move |kw| (*kw, rule)))
        .filter_map(|(kw, rule)| find_keyword(&lower, kw).map(|pos| (pos, kw, rule)))
        .min_by_key(|(pos, kw, _)| (*pos, Reverse(kw.len())))
        .map(|(_, kw, rule)| (kw, rule))
}

/// Byte offset of `keyword` in `lower`. ASCII keywords must be a whole word
/// (a plural `s` is allowed) so that `cell` misses `excellent` and
/// `cellphone`, and `exam` misses `examples`.
fn find_keyword(lower: &str, keyword: &str) -> Option<usize> {
    if !keyword.is_ascii() {
        return lower.find(keyword);
    }
    let is_word = |c: char| c.is_ascii_alphanumeric();
    lower.match_indices(keyword).map(|(pos, _)| pos).find(|&pos| {
        let starts_word = lower[..pos].chars().next_back().is_none_or(|c| !is_word(c));
        let after = &lower[pos + keyword.len()..];
        let after = after.strip_prefix('s').unwrap_or(after);
        starts_word && after.chars().next().is_none_or(|c| !is_word(c))
    })
}

fn infer_class_name(text: &str, context: &InferenceContext) -> Option<String> {
    let stem = context
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).file_stem())
        .map(|stem| stem.to_string_lossy().replace(['_', '-'], " "))
        .unwrap_or_default();

    let haystack = format!("{stem} {text}");
    if let Some(m) = SUBJECT_RE.find(&haystack) {
        return Some(title_case(m.as_str()));
    }

    let cleaned = FILE_NOISE_RE.replace_all(&stem, " ");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

/// `life  science` → `Life Science`; Hangul passes through.
fn title_case(words: &str) -> String {
    words
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn infer_class_date(record: &WeekRecord, text: &str, context: &InferenceContext) -> Option<String> {
    let mut dates: Vec<String> = Vec::new();
    for caps in DATE_DAY_RE.captures_iter(text) {
        let (Ok(month), Ok(day)) = (caps[1].parse::<u8>(), caps[2].parse::<u8>()) else {
            continue;
        };
        if MonthDay::new(month, day).is_none() {
            continue;
        }
        let date = match context.year {
            Some(year) => format!("{year}.{month:02}.{day:02}({})", &caps[3]),
            None => format!("{month:02}.{day:02}({})", &caps[3]),
        };
        if !dates.contains(&date) {
            dates.push(date);
        }
    }
    if !dates.is_empty() {
        return Some(dates.join(", "));
    }

    let range = record.date_range.filter(|r| !r.is_empty())?;
    Some(match DAY_ONLY_RE.find(text) {
        Some(days) => format!("{range} ({})", days.as_str().replace(' ', "")),
        None => range.to_string(),
    })
}

/// `labels` are the record's class labels minus any outline codes.
fn infer_audience(labels: &[&str], text: &str) -> Option<String> {
    let joined = labels.join(" ");
    let explicit = GRADE_RE
        .captures(text)
        .or_else(|| GRADE_RE.captures(&joined))
        .map(|caps| format!("G{}", &caps[1]));
    if explicit.is_some() {
        return explicit;
    }

    let first = labels.first()?;
    let digits: String = first.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        Some(labels.join(", "))
    } else {
        Some(format!("G{digits}"))
    }
}

// ============================================================================
// Tests
// ============================================================================
