//! Date-range recognition for experience timelines.
//!
//! Dates are found by a small set of named rules tried in precedence order; a span
//! claimed by an earlier rule is never re-read by a later one. Two dates (or a date
//! and a "present" marker) joined by a range separator form a [`DateRange`].

use std::ops::Range;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const MIN_YEAR: i32 = 1950;
pub const MAX_YEAR: i32 = 2100;

const MONTH_PREFIXES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

static MONTH_NAME_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?,?[ \t]*(\d{4})\b",
    )
    .expect("valid month-name regex")
});

static NUMERIC_MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(0?[1-9]|1[0-2])[/.\-](\d{4})\b").expect("valid numeric month regex")
});

static YEAR_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{4})[/.\-](0[1-9]|1[0-2])\b").expect("valid year-month regex")
});

static YEAR_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"));

static PRESENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:present|current(?:ly)?|now|ongoing|today|till[ \t]+date|to[ \t]+date)\b")
        .expect("valid present regex")
});

static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[ \t]*(?:-|–|—|~|to|till|until|through|thru)[ \t]*$")
        .expect("valid separator regex")
});

/// Date-token rules in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRule {
    /// "Jan 2020", "September, 2019"
    MonthNameYear,
    /// "01/2020", "3-2021"
    NumericMonthYear,
    /// "2020-01", "2020/11"
    YearMonth,
    /// "2020", month unknown
    YearOnly,
    /// "Present", "current", "till date"
    Present,
}

impl DateRule {
    pub const ORDERED: [DateRule; 5] = [
        DateRule::MonthNameYear,
        DateRule::NumericMonthYear,
        DateRule::YearMonth,
        DateRule::YearOnly,
        DateRule::Present,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            DateRule::MonthNameYear => &*MONTH_NAME_YEAR_RE,
            DateRule::NumericMonthYear => &*NUMERIC_MONTH_YEAR_RE,
            DateRule::YearMonth => &*YEAR_MONTH_RE,
            DateRule::YearOnly => &*YEAR_ONLY_RE,
            DateRule::Present => &*PRESENT_RE,
        }
    }

    fn parse(&self, caps: &Captures<'_>) -> DateValue {
        let number = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
        match self {
            DateRule::MonthNameYear => {
                let month = caps.get(1).and_then(|m| month_from_name(m.as_str()));
                match (month, number(2)) {
                    (Some(month), Some(year)) => DateValue::Month { year: year as i32, month },
                    _ => DateValue::Invalid,
                }
            }
            DateRule::NumericMonthYear => match (number(1), number(2)) {
                (Some(month), Some(year)) => DateValue::Month { year: year as i32, month },
                _ => DateValue::Invalid,
            },
            DateRule::YearMonth => match (number(1), number(2)) {
                (Some(year), Some(month)) => DateValue::Month { year: year as i32, month },
                _ => DateValue::Invalid,
            },
            DateRule::YearOnly => match number(1) {
                Some(year) => DateValue::Year(year as i32),
                None => DateValue::Invalid,
            },
            DateRule::Present => DateValue::Present,
        }
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_PREFIXES
        .iter()
        .position(|prefix| lower.starts_with(prefix))
        .map(|i| i as u32 + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateValue {
    Month { year: i32, month: u32 },
    Year(i32),
    Present,
    Invalid,
}

#[derive(Debug, Clone)]
struct DateToken {
    span: Range<usize>,
    value: DateValue,
}

/// A resolved employment interval. Dates are first-of-month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// The range ended with a "present" marker.
    pub current: bool,
    /// Byte span of the whole range in the scanned text.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct RangeScan {
    pub ranges: Vec<DateRange>,
    /// Ranges that were recognized but could not be resolved.
    pub unparsed: usize,
}

fn tokenize_dates(text: &str) -> Vec<DateToken> {
    let mut tokens: Vec<DateToken> = Vec::new();
    for rule in DateRule::ORDERED {
        for caps in rule.regex().captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let span = whole.range();
            let claimed = tokens
                .iter()
                .any(|t| span.start < t.span.end && t.span.start < span.end);
            if !claimed {
                tokens.push(DateToken {
                    span,
                    value: rule.parse(&caps),
                });
            }
        }
    }
    tokens.sort_by_key(|t| t.span.start);
    tokens
}

fn joined_by_separator(text: &str, left: &DateToken, right: &DateToken) -> bool {
    let gap = &text[left.span.end..right.span.start];
    if SEPARATOR_RE.is_match(gap) {
        return true;
    }
    // "2019 to date" / "2019 till date": the marker carries its own separator.
    right.value == DateValue::Present
        && gap.chars().all(|c| c == ' ' || c == '\t')
        && {
            let marker = text[right.span.clone()].to_lowercase();
            marker.starts_with("to") || marker.starts_with("till")
        }
}

/// Resolves a start token: year-only starts in January.
fn resolve_start(value: DateValue) -> Option<NaiveDate> {
    match value {
        DateValue::Month { year, month } => first_of_month(year, month),
        DateValue::Year(year) => first_of_month(year, 1),
        DateValue::Present | DateValue::Invalid => None,
    }
}

/// Resolves an end token: year-only ends in December, "present" is `today`'s month.
fn resolve_end(value: DateValue, today: NaiveDate) -> Option<(NaiveDate, bool)> {
    match value {
        DateValue::Month { year, month } => first_of_month(year, month).map(|d| (d, false)),
        DateValue::Year(year) => first_of_month(year, 12).map(|d| (d, false)),
        DateValue::Present => first_of_month(today.year(), today.month()).map(|d| (d, true)),
        DateValue::Invalid => None,
    }
}

fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Finds every date range in `text`. Ranges whose dates cannot be resolved, that end
/// before they start, or that start after `today` are dropped and counted. An end
/// after `today` is clamped to the current month.
pub fn find_ranges(text: &str, today: NaiveDate) -> RangeScan {
    let tokens = tokenize_dates(text);
    let this_month = first_of_month(today.year(), today.month());
    let mut scan = RangeScan::default();

    let mut i = 0;
    while i + 1 < tokens.len() {
        let (left, right) = (&tokens[i], &tokens[i + 1]);
        if left.value == DateValue::Present || !joined_by_separator(text, left, right) {
            i += 1;
            continue;
        }

        let resolved = resolve_start(left.value)
            .zip(resolve_end(right.value, today))
            .filter(|(start, (end, _))| start <= end)
            .filter(|(start, _)| this_month.map_or(true, |now| *start <= now));

        match resolved {
            Some((start, (end, current))) => scan.ranges.push(DateRange {
                start,
                end: this_month.map_or(end, |now| end.min(now)),
                current,
                span: left.span.start..right.span.end,
            }),
            None => scan.unparsed += 1,
        }
        i += 2;
    }

    scan
}

/// Whole months from `start` through `end`, both inclusive.
pub fn months_inclusive(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = month_index(end) - month_index(start) + 1;
    months.max(0) as u32
}

pub fn month_index(date: NaiveDate) -> i32 {
    date.year() * 12 + date.month0() as i32
}
