//! Week segmentation
//!
//! Splits extracted syllabus text into one [`WeekRecord`] per week marker.
//! A marker line looks like
//!
//! ```text
//! 3주 3.09-3.13 수업 11A, 11B
//! 제4주차 3.16(월)~3.20(금)
//! Week 5  4/6 - 4/10  11A 11C
//! ```
//!
//! i.e. a week number with a week unit, an optional date range and optional
//! trailing class-session labels. Every line after a marker belongs to that
//! week's body until the next marker. Text before the first marker is
//! preamble and never becomes a week.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;

static WEEK_KO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\-*•·\[(]*(?:제\s*)?(\d{1,2})\s*주(차)?").expect("week marker regex")
});

static WEEK_EN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\s\-*•·\[(]*(?:week|wk)\.?\s*(\d{1,2})\b").expect("week marker regex")
});

const DAY_SUFFIX: &str = r"(?:\s*\(\s*[월화수목금토일]\s*\))?";

static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(\d{{1,2}})\s*[./]\s*(\d{{1,2}})\.?{DAY_SUFFIX}\s*[-~–—]\s*(\d{{1,2}})\s*[./]\s*(\d{{1,2}})\.?{DAY_SUFFIX}"
    ))
    .expect("date range regex")
});

static SINGLE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(\d{{1,2}})\s*[./]\s*(\d{{1,2}})\.?{DAY_SUFFIX}")).expect("date regex")
});

static CLASS_LABEL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{1,2}[A-Za-z]|[A-Za-z]{1,3}\d{1,2})$").expect("class label regex")
});

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(20\d{2})(?:\D|$)").expect("year regex"));

// ============================================================================
// Types
// ============================================================================

/// Which number comes first in an ambiguous `a.b` date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// `3.09` is March 9th (Korean school calendars).
    #[default]
    MonthDay,
    /// `9.03` is March 9th.
    DayMonth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmenterConfig {
    pub date_order: DateOrder,
}

/// Calendar day without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u8,
    pub day: u8,
}

impl MonthDay {
    /// `None` for an impossible month or day. February allows the 29th
    /// because the year is unknown.
    pub fn new(month: u8, day: u8) -> Option<Self> {
        let last_day = match month {
            2 => 29,
            4 | 6 | 9 | 11 => 30,
            1..=12 => 31,
            _ => return None,
        };
        (1..=last_day).contains(&day).then_some(Self { month, day })
    }

    fn from_parts(first: &str, second: &str, order: DateOrder) -> Option<Self> {
        let a = first.parse::<u8>().ok()?;
        let b = second.parse::<u8>().ok()?;
        match order {
            DateOrder::MonthDay => Self::new(a, b),
            DateOrder::DayMonth => Self::new(b, a),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.month, self.day)
    }
}

/// Week date range; either end may be unparseable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<MonthDay>,
    pub end: Option<MonthDay>,
}

impl DateRange {
    pub fn new(start: Option<MonthDay>, end: Option<MonthDay>) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |d: Option<MonthDay>| d.map(|d| d.to_string()).unwrap_or_else(|| "?".into());
        match (self.start, self.end) {
            (Some(start), None) => write!(f, "{start}"),
            (start, end) => write!(f, "{}-{}", show(start), show(end)),
        }
    }
}

/// One week of the syllabus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRecord {
    /// 1-based week number as written in the document.
    pub week_index: u32,
    pub date_range: Option<DateRange>,
    pub class_labels: BTreeSet<String>,
    /// Leftover words on the marker line (e.g. `수업`, `중간고사`).
    #[serde(default)]
    pub heading: String,
    pub body_text: String,
}

impl WeekRecord {
    fn new(week_index: u32) -> Self {
        Self {
            week_index,
            date_range: None,
            class_labels: BTreeSet::new(),
            heading: String::new(),
            body_text: String::new(),
        }
    }

    /// Display label used by pickers: `3주 (3.09-3.13)`.
    pub fn label(&self) -> String {
        match &self.date_range {
            Some(range) => format!("{}주 ({range})", self.week_index),
            None => format!("{}주", self.week_index),
        }
    }

    /// Heading and body joined; what the inferencer searches.
    pub fn search_text(&self) -> String {
        match (self.heading.is_empty(), self.body_text.is_empty()) {
            (true, _) => self.body_text.clone(),
            (false, true) => self.heading.clone(),
            (false, false) => format!("{}\n{}", self.heading, self.body_text),
        }
    }

    fn push_body_line(&mut self, line: &str) {
        if !self.body_text.is_empty() {
            self.body_text.push('\n');
        }
        self.body_text.push_str(line);
    }

    fn absorb_marker(&mut self, marker: WeekMarker) {
        if let Some(range) = marker.date_range {
            let existing = self.date_range.get_or_insert(range);
            existing.start = existing.start.or(range.start);
            existing.end = existing.end.or(range.end);
        }
        self.class_labels.extend(marker.class_labels);
        if !marker.heading.is_empty() {
            if !self.heading.is_empty() {
                self.heading.push(' ');
            }
            self.heading.push_str(&marker.heading);
        }
    }
}

// ============================================================================
// Marker parsing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct WeekMarker {
    week_index: u32,
    date_range: Option<DateRange>,
    class_labels: BTreeSet<String>,
    heading: String,
}

fn parse_marker(line: &str, config: &SegmenterConfig) -> Option<WeekMarker> {
    let (week_index, rest) = match_week_token(line)?;

    let mut remainder = rest.to_string();
    let date_range = if let Some(caps) = DATE_RANGE_RE.captures(rest) {
        let range = DateRange::new(
            MonthDay::from_parts(&caps[1], &caps[2], config.date_order),
            MonthDay::from_parts(&caps[3], &caps[4], config.date_order),
        );
        remainder = DATE_RANGE_RE.replace(rest, " ").into_owned();
        Some(range)
    } else if let Some(caps) = SINGLE_DATE_RE.captures(rest) {
        let start = MonthDay::from_parts(&caps[1], &caps[2], config.date_order);
        remainder = SINGLE_DATE_RE.replace(rest, " ").into_owned();
        Some(DateRange::new(start, None))
    } else {
        None
    };

    let (class_labels, heading) = split_class_labels(&remainder);

    Some(WeekMarker {
        week_index,
        date_range,
        class_labels,
        heading,
    })
}

/// Separate class-session labels (`11A`, `B2`, `11A반`) from the other words
/// left on a marker line.
fn split_class_labels(remainder: &str) -> (BTreeSet<String>, String) {
    let mut labels = BTreeSet::new();
    let mut words = Vec::new();

    for word in remainder
        .split(|c: char| c.is_whitespace() || c == ',' || c == '/')
        .map(|w| w.trim_matches(|c: char| matches!(c, '(' | ')' | '[' | ']')))
        .filter(|w| !w.is_empty())
    {
        let token = word.strip_suffix('반').unwrap_or(word);
        if CLASS_LABEL_RE.is_match(token) {
            labels.insert(token.to_uppercase());
        } else {
            words.push(word);
        }
    }

    (labels, words.join(" "))
}

/// Week number at the start of the line, plus the text after the unit.
fn match_week_token(line: &str) -> Option<(u32, &str)> {
    if let Some(caps) = WEEK_KO_RE.captures(line) {
        let whole = caps.get(0)?;
        let rest = &line[whole.end()..];
        // `3주제` is "three topics", not week 3.
        let glued_to_word = caps.get(2).is_none()
            && rest.chars().next().is_some_and(is_hangul_syllable);
        if !glued_to_word {
            let week_index = caps[1].parse().ok()?;
            return (week_index > 0).then_some((week_index, rest));
        }
    }

    let caps = WEEK_EN_RE.captures(line)?;
    let week_index = caps[1].parse().ok()?;
    let rest = &line[caps.get(0)?.end()..];
    (week_index > 0).then_some((week_index, rest))
}

fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

// ============================================================================
// Segmentation
// ============================================================================

/// Segment text using the default (month.day) date convention.
pub fn segment(text: &str) -> Vec<WeekRecord> {
    segment_with(text, &SegmenterConfig::default())
}

pub fn segment_with(text: &str, config: &SegmenterConfig) -> Vec<WeekRecord> {
    let mut weeks: Vec<WeekRecord> = Vec::new();
    let mut position_by_index: HashMap<u32, usize> = HashMap::new();
    let mut current: Option<usize> = None;
    let mut last_index: Option<u32> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(marker) = parse_marker(line, config) else {
            if let Some(pos) = current {
                weeks[pos].push_body_line(line);
            }
            continue;
        };

        if let Some(&pos) = position_by_index.get(&marker.week_index) {
            tracing::debug!(week = marker.week_index, "duplicate week marker merged");
            weeks[pos].absorb_marker(marker);
            current = Some(pos);
            continue;
        }

        if last_index.is_some_and(|last| marker.week_index < last) {
            tracing::debug!(
                week = marker.week_index,
                previous = last_index,
                "non-monotonic week number"
            );
        }
        last_index = Some(marker.week_index);

        let mut record = WeekRecord::new(marker.week_index);
        record.absorb_marker(marker);
        position_by_index.insert(record.week_index, weeks.len());
        current = Some(weeks.len());
        weeks.push(record);
    }

    weeks
}

/// First four-digit `20xx` year in the text.
pub fn detect_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

// ============================================================================
// Tests
// ============================================================================
