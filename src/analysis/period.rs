//! Best-effort period extraction from context identifiers.
//!
//! Works on the identifier text alone (`Duration_1_1_2024_To_12_31_2024`,
//! `AsOf_2024-12-31`, `FY2024Q4`), so the result is only a compatibility hint
//! and never a substitute for real context equality.
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::warn;

const SEP: &str = r"[_\-.]";
const RANGE: &str = r"[_\-.]?(?:to|through|thru)[_\-.]?";
const DURATION_LEAD: &str = r"^(?:duration|period|from)";
const INSTANT_LEAD: &str = r"^(?:asof|instant|as_of|at)";

/// Leading words that reveal the period type even when no date parses.
const PERIOD_TYPE_INDICATORS: &[(&str, PeriodType)] = &[
    ("duration", PeriodType::Duration),
    ("period", PeriodType::Duration),
    ("from", PeriodType::Duration),
    ("asof", PeriodType::Instant),
    ("instant", PeriodType::Instant),
    ("as_of", PeriodType::Instant),
    ("at", PeriodType::Instant),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Instant,
    Duration,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeriodInfo {
    pub period_type: PeriodType,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub year: Option<String>,
    /// `d_<start>_<end>`, `i_<date>`, `y_<year>`, or empty when nothing was found.
    pub period_key: String,
}

#[derive(Debug, Clone, Copy)]
enum PatternKind {
    DurationMdy,
    DurationYmd,
    InstantMdy,
    InstantYmd,
    YearOnly,
}

pub struct PeriodExtractor {
    patterns: Vec<(PatternKind, Regex)>,
}

impl Default for PeriodExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodExtractor {
    pub fn new() -> Self {
        let md = format!(r"(\d{{1,2}}){SEP}(\d{{1,2}})");
        let mdy = format!(r"{md}{SEP}(\d{{4}})");
        let ymd = format!(r"(\d{{4}}){SEP}{md}");
        let templates = [
            (PatternKind::DurationMdy, format!("{DURATION_LEAD}{SEP}{mdy}{RANGE}{mdy}")),
            (PatternKind::DurationYmd, format!("{DURATION_LEAD}{SEP}{ymd}{RANGE}{ymd}")),
            (PatternKind::InstantMdy, format!("{INSTANT_LEAD}{SEP}{mdy}")),
            (PatternKind::InstantYmd, format!("{INSTANT_LEAD}{SEP}{ymd}")),
            (PatternKind::YearOnly, r"(\d{4})".to_string()),
        ];

        let patterns = templates
            .into_iter()
            .filter_map(|(kind, source)| match Regex::new(&source) {
                Ok(re) => Some((kind, re)),
                Err(e) => {
                    warn!(pattern = ?kind, error = %e, "Failed to compile period pattern");
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn extract(&self, context_id: &str) -> PeriodInfo {
        if context_id.is_empty() {
            return PeriodInfo::default();
        }

        let lowered = context_id.to_lowercase();
        let detected = detect_period_type(&lowered);

        for (kind, re) in &self.patterns {
            if let Some(caps) = re.captures(&lowered) {
                return build(*kind, &caps, detected);
            }
        }

        PeriodInfo { period_type: detected, ..PeriodInfo::default() }
    }
}

fn detect_period_type(lowered: &str) -> PeriodType {
    PERIOD_TYPE_INDICATORS
        .iter()
        .find(|(indicator, _)| {
            lowered
                .strip_prefix(indicator)
                .is_some_and(|rest| !rest.starts_with(|c: char| c.is_ascii_alphabetic()))
        })
        .map_or(PeriodType::Unknown, |&(_, ptype)| ptype)
}

fn group<'h>(caps: &Captures<'h>, i: usize) -> &'h str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn format_date(year: &str, month: &str, day: &str) -> Option<String> {
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    if year.len() != 4 || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some(format!("{}-{:02}-{:02}", year, month, day))
}

fn build(kind: PatternKind, caps: &Captures<'_>, detected: PeriodType) -> PeriodInfo {
    match kind {
        PatternKind::DurationMdy | PatternKind::DurationYmd => {
            // Group layout: (m, d, y, m, d, y) or (y, m, d, y, m, d).
            let (start, end) = match kind {
                PatternKind::DurationMdy => (
                    format_date(group(caps, 3), group(caps, 1), group(caps, 2)),
                    format_date(group(caps, 6), group(caps, 4), group(caps, 5)),
                ),
                _ => (
                    format_date(group(caps, 1), group(caps, 2), group(caps, 3)),
                    format_date(group(caps, 4), group(caps, 5), group(caps, 6)),
                ),
            };
            let end_year = match kind {
                PatternKind::DurationMdy => group(caps, 6),
                _ => group(caps, 4),
            };
            let period_key = match (&start, &end) {
                (Some(s), Some(e)) => format!("d_{}_{}", s, e),
                _ => String::new(),
            };
            PeriodInfo {
                period_type: PeriodType::Duration,
                start_date: start,
                end_date: end,
                year: Some(end_year.to_string()),
                period_key,
            }
        }
        PatternKind::InstantMdy | PatternKind::InstantYmd => {
            let (year, date) = match kind {
                PatternKind::InstantMdy => (group(caps, 3), format_date(group(caps, 3), group(caps, 1), group(caps, 2))),
                _ => (group(caps, 1), format_date(group(caps, 1), group(caps, 2), group(caps, 3))),
            };
            PeriodInfo {
                period_type: PeriodType::Instant,
                period_key: date.as_ref().map(|d| format!("i_{}", d)).unwrap_or_default(),
                start_date: None,
                end_date: date,
                year: Some(year.to_string()),
            }
        }
        PatternKind::YearOnly => {
            let year = group(caps, 1).to_string();
            PeriodInfo {
                period_type: detected,
                period_key: format!("y_{}", year),
                year: Some(year),
                ..PeriodInfo::default()
            }
        }
    }
}
