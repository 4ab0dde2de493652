use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::analysis::dates::{find_ranges, month_index, months_inclusive, DateRange};
use crate::analysis::scoring::experience_match_score;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExperienceEntry {
    pub start_date: NaiveDate,
    /// Resolved end; equals the analysis month when `current` is set.
    pub end_date: NaiveDate,
    pub current: bool,
    pub role: Option<String>,
    pub duration_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Fresher,
    Intermediate,
    Experienced,
    Senior,
}

impl ExperienceLevel {
    pub fn from_months(total_months: u32) -> Self {
        match total_months {
            0..=11 => ExperienceLevel::Fresher,
            12..=35 => ExperienceLevel::Intermediate,
            36..=119 => ExperienceLevel::Experienced,
            _ => ExperienceLevel::Senior,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperienceAnalysis {
    pub entries: Vec<ExperienceEntry>,
    /// Sum over merged intervals; overlapping roles are not double counted.
    pub total_months: u32,
    pub level: ExperienceLevel,
    pub required_months: Option<u32>,
    pub meets_requirement: bool,
    pub unparsed_ranges: usize,
    pub score: f64,
}

const MAX_ROLE_CHARS: usize = 100;

/// Entries for every resolvable date range in the experience text, plus the count of
/// ranges that were dropped.
pub fn parse_experience(text: &str, today: NaiveDate) -> (Vec<ExperienceEntry>, usize) {
    let scan = find_ranges(text, today);
    let entries = scan
        .ranges
        .iter()
        .map(|range| ExperienceEntry {
            start_date: range.start,
            end_date: range.end,
            current: range.current,
            role: role_near(text, range),
            duration_months: months_inclusive(range.start, range.end),
        })
        .collect();
    (entries, scan.unparsed)
}

/// Role text on the range's line (after it, then before it), else the previous line.
fn role_near(text: &str, range: &DateRange) -> Option<String> {
    let line_start = text[..range.span.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[range.span.end..]
        .find('\n')
        .map_or(text.len(), |i| range.span.end + i);

    let after = clean_role(&text[range.span.end..line_end]);
    let before = || clean_role(&text[line_start..range.span.start]);
    let previous_line = || {
        text[..line_start]
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(clean_role)
    };

    after.or_else(before).or_else(previous_line)
}

fn clean_role(fragment: &str) -> Option<String> {
    let trimmed = fragment.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, ',' | '|' | ':' | '-' | '–' | '—' | '(' | ')' | '•' | '*' | '@')
    });
    if !trimmed.chars().any(char::is_alphabetic) {
        return None;
    }
    Some(trimmed.chars().take(MAX_ROLE_CHARS).collect::<String>().trim_end().to_string())
}

/// Total months covered by `entries`, merging overlapping or touching intervals first.
pub fn total_experience_months(entries: &[ExperienceEntry]) -> u32 {
    let mut intervals: Vec<(i32, i32)> = entries
        .iter()
        .map(|e| (month_index(e.start_date), month_index(e.end_date)))
        .collect();
    intervals.sort_unstable();

    let mut merged: Vec<(i32, i32)> = Vec::new();
    for (start, end) in intervals {
        match merged.last_mut() {
            Some(last) if start <= last.1 + 1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }

    merged
        .iter()
        .map(|(start, end)| (end - start + 1).max(0) as u32)
        .sum()
}

/// Experience-requirement rules for job descriptions, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementRule {
    /// "freshers welcome", "no experience required", "0 years"
    ZeroExperience,
    /// "2-4 years": the lower bound
    YearRange,
    /// "3+ years", "at least 5 years", "4 years of experience": the largest stated
    MinimumYears,
    /// "three years of experience"
    WordYears,
}

static ZERO_EXPERIENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:freshers?|no\s+(?:prior\s+)?experience|entry[\s\-]level|0\s*\+?\s*(?:years?|yrs?)\b)",
    )
    .expect("valid zero-experience regex")
});

static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s*(?:-|–|to)\s*\d{1,2}\s*\+?\s*(?:years?|yrs?)\b")
        .expect("valid year-range regex")
});

static MINIMUM_YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:(?:at\s+least|minimum(?:\s+of)?|min\.?)\s+(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b|\b(\d{1,2})\s*\+\s*(?:years?|yrs?)\b|\b(\d{1,2})\s*(?:years?|yrs?)(?:['’]s?)?\s+(?:of\s+)?(?:[a-z\-]+\s+){0,3}?(?:experience|exp)\b)",
    )
    .expect("valid minimum-years regex")
});

static WORD_YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(one|two|three|four|five|six|seven|eight|nine|ten)\s*\+?\s*years?\b")
        .expect("valid word-years regex")
});

const NUMBER_WORDS: [&str; 10] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

impl RequirementRule {
    pub const ORDERED: [RequirementRule; 4] = [
        RequirementRule::ZeroExperience,
        RequirementRule::YearRange,
        RequirementRule::MinimumYears,
        RequirementRule::WordYears,
    ];

    /// Required years under this rule, if it fires.
    fn apply(&self, text: &str) -> Option<u32> {
        match self {
            RequirementRule::ZeroExperience => ZERO_EXPERIENCE_RE.is_match(text).then_some(0),
            RequirementRule::YearRange => YEAR_RANGE_RE
                .captures_iter(text)
                .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
                .min(),
            RequirementRule::MinimumYears => MINIMUM_YEARS_RE
                .captures_iter(text)
                .filter_map(|caps| {
                    (1..=3)
                        .find_map(|i| caps.get(i))
                        .and_then(|m| m.as_str().parse::<u32>().ok())
                })
                .max(),
            RequirementRule::WordYears => WORD_YEARS_RE
                .captures_iter(text)
                .filter_map(|caps| {
                    let word = caps.get(1)?.as_str().to_lowercase();
                    NUMBER_WORDS
                        .iter()
                        .position(|w| *w == word)
                        .map(|i| i as u32 + 1)
                })
                .max(),
        }
    }
}

/// Months of experience a job description asks for; `None` when it states none.
pub fn parse_required_months(job_description: &str) -> Option<u32> {
    RequirementRule::ORDERED
        .iter()
        .find_map(|rule| rule.apply(job_description))
        .map(|years| years * 12)
}

pub fn analyze_experience(
    experience_text: Option<&str>,
    job_description: &str,
    today: NaiveDate,
) -> ExperienceAnalysis {
    let (entries, unparsed_ranges) = match experience_text {
        Some(text) => parse_experience(text, today),
        None => (Vec::new(), 0),
    };
    let total_months = total_experience_months(&entries);
    let required_months = parse_required_months(job_description);

    ExperienceAnalysis {
        level: ExperienceLevel::from_months(total_months),
        meets_requirement: required_months.map_or(true, |required| total_months >= required),
        score: experience_match_score(total_months, required_months),
        entries,
        total_months,
        required_months,
        unparsed_ranges,
    }
}
