//! Degree detection and field-of-study classification, for both the resume and the
//! job description's requirements.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::scoring::education_match_score;
use crate::dictionaries::education::{contains_phrase, DegreePattern, UNCLASSIFIED};
use crate::dictionaries::EducationDictionary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegreeLevel {
    HighSchool,
    Associate,
    Bachelor,
    Master,
    Doctorate,
    Other,
}

impl DegreeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DegreeLevel::HighSchool => "high_school",
            DegreeLevel::Associate => "associate",
            DegreeLevel::Bachelor => "bachelor",
            DegreeLevel::Master => "master",
            DegreeLevel::Doctorate => "doctorate",
            DegreeLevel::Other => "other",
        }
    }

    /// Ordering used for "meets the required level". `Other` satisfies nothing.
    pub fn rank(&self) -> u8 {
        match self {
            DegreeLevel::Other => 0,
            DegreeLevel::HighSchool => 1,
            DegreeLevel::Associate => 2,
            DegreeLevel::Bachelor => 3,
            DegreeLevel::Master => 4,
            DegreeLevel::Doctorate => 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EducationEntry {
    pub degree_level: DegreeLevel,
    /// The degree as written ("B.Sc", "Bachelor of Technology").
    pub degree: String,
    /// Controlled-vocabulary domain, or `unclassified`.
    pub domain: String,
    pub field_of_study: Option<String>,
    pub institution: Option<String>,
    pub raw_text: String,
}

/// A degree requirement read from a job description. `None` means unspecified.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EducationRequirement {
    pub level: Option<DegreeLevel>,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationMatch {
    /// The job description states no education requirement.
    NotRequired,
    Exact,
    Related,
    Unrelated,
    /// Requirements exist but the resume lists no degree.
    NoEntries,
}

#[derive(Debug, Clone, Serialize)]
pub struct EducationAnalysis {
    pub entries: Vec<EducationEntry>,
    pub requirements: Vec<EducationRequirement>,
    pub match_kind: EducationMatch,
    pub score: f64,
}

const FIELD_CONNECTORS: &[&str] = &[
    "in", "of", "degree", "with", "major", "majoring", "specialization", "specialisation",
    "honours", "honors", "hons", "program", "programme", "a", "the",
];

const FIELD_STOP_WORDS: &[&str] = &["from", "at", "and", "or", "with", "required", "preferred"];

const MAX_FIELD_WORDS: usize = 6;

const INSTITUTION_MARKERS: &[&str] = &[
    "university", "college", "institute", "school", "academy", "polytechnic",
];

/// How many lines below a degree are searched for its institution.
const INSTITUTION_LOOKAHEAD: usize = 2;

static FIELD_ONLY_REQUIREMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:degree|diploma|graduate|background)\s+(?:in|of)\s+")
        .expect("valid degree requirement regex")
});

struct DegreeHit<'d> {
    span: Range<usize>,
    pattern: &'d DegreePattern,
}

/// Non-overlapping degree mentions, longest alias first at any contested position.
fn find_degrees<'d>(text: &str, dictionary: &'d EducationDictionary) -> Vec<DegreeHit<'d>> {
    let mut candidates: Vec<DegreeHit<'d>> = dictionary
        .degrees()
        .iter()
        .flat_map(|pattern| {
            pattern
                .find_iter(text)
                .map(move |m| DegreeHit {
                    span: m.range(),
                    pattern,
                })
                .collect::<Vec<_>>()
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| b.span.len().cmp(&a.span.len()))
    });

    let mut accepted: Vec<DegreeHit<'d>> = Vec::new();
    for candidate in candidates {
        let overlaps = accepted
            .last()
            .map_or(false, |last| candidate.span.start < last.span.end);
        if !overlaps {
            accepted.push(candidate);
        }
    }
    accepted
}

fn line_bounds(text: &str, span: &Range<usize>) -> Range<usize> {
    let start = text[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let end = text[span.end..]
        .find('\n')
        .map_or(text.len(), |i| span.end + i);
    start..end
}

/// The field-of-study phrase following a degree: "in Computer Science", ": Physics".
fn field_phrase(rest: &str) -> Option<String> {
    let rest = rest.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | '(' | ',' | '.')
    });
    let end = rest
        .find(|c: char| matches!(c, '\n' | ',' | ';' | '|' | '(' | ')' | '–' | '—') || c.is_ascii_digit())
        .unwrap_or(rest.len());

    let words: Vec<&str> = rest[..end]
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '&'))
        .filter(|w| !w.is_empty())
        .skip_while(|w| FIELD_CONNECTORS.contains(&w.to_lowercase().as_str()))
        .take_while(|w| !FIELD_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .take(MAX_FIELD_WORDS)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn find_institution(text: &str, line: &Range<usize>) -> Option<String> {
    let following = text[line.end..].lines().skip(1).take(INSTITUTION_LOOKAHEAD);
    std::iter::once(&text[line.clone()])
        .chain(following)
        .find_map(|candidate| {
            candidate
                .split(|c: char| matches!(c, ',' | ';' | '|' | '(' | ')' | '–' | '—'))
                .flat_map(|segment| segment.split(" - "))
                .map(str::trim)
                .find(|segment| {
                    let lower = segment.to_lowercase();
                    INSTITUTION_MARKERS
                        .iter()
                        .any(|marker| contains_phrase(&lower, marker))
                })
                .map(str::to_string)
        })
}

/// Extracts degree entries from education text. Entries with the same level,
/// domain and institution are reported once.
pub fn parse_education(text: &str, dictionary: &EducationDictionary) -> Vec<EducationEntry> {
    let mut entries: Vec<EducationEntry> = Vec::new();

    for hit in find_degrees(text, dictionary) {
        let line = line_bounds(text, &hit.span);
        let field_of_study = field_phrase(&text[hit.span.end..line.end]);

        let domain = field_of_study
            .as_deref()
            .and_then(|field| dictionary.resolve_domain(field))
            .or(hit.pattern.domain.as_deref())
            .or_else(|| {
                // "Computer Science - B.Sc" puts the field before the degree.
                field_of_study
                    .is_none()
                    .then(|| dictionary.resolve_domain(&text[line.start..hit.span.start]))
                    .flatten()
            })
            .unwrap_or(UNCLASSIFIED)
            .to_string();

        let entry = EducationEntry {
            degree_level: hit.pattern.level,
            degree: text[hit.span.clone()].to_string(),
            domain,
            field_of_study,
            institution: find_institution(text, &line),
            raw_text: text[line].trim().to_string(),
        };

        let duplicate = entries.iter().any(|e| {
            e.degree_level == entry.degree_level
                && e.domain == entry.domain
                && e.institution == entry.institution
        });
        if !duplicate {
            entries.push(entry);
        }
    }

    entries
}

/// Degree requirements stated in a job description.
pub fn parse_requirements(
    job_description: &str,
    dictionary: &EducationDictionary,
) -> Vec<EducationRequirement> {
    let mut requirements: Vec<EducationRequirement> = Vec::new();

    for hit in find_degrees(job_description, dictionary) {
        let line = line_bounds(job_description, &hit.span);
        let domain = field_phrase(&job_description[hit.span.end..line.end])
            .and_then(|field| dictionary.resolve_domain(&field).map(str::to_string))
            .or_else(|| hit.pattern.domain.clone());
        push_unique(
            &mut requirements,
            EducationRequirement {
                level: Some(hit.pattern.level),
                domain,
            },
        );
    }

    let stated_domains: Vec<Option<String>> = requirements.iter().map(|r| r.domain.clone()).collect();
    for m in FIELD_ONLY_REQUIREMENT_RE.find_iter(job_description) {
        let Some(domain) = field_phrase(&job_description[m.end()..])
            .and_then(|field| dictionary.resolve_domain(&field).map(str::to_string))
        else {
            continue;
        };
        if stated_domains.contains(&Some(domain.clone())) {
            continue;
        }
        push_unique(
            &mut requirements,
            EducationRequirement {
                level: None,
                domain: Some(domain),
            },
        );
    }

    requirements
}

fn push_unique(requirements: &mut Vec<EducationRequirement>, requirement: EducationRequirement) {
    if !requirements.contains(&requirement) {
        requirements.push(requirement);
    }
}

pub fn analyze_education(
    education_text: &str,
    job_description: &str,
    dictionary: &EducationDictionary,
) -> EducationAnalysis {
    let entries = parse_education(education_text, dictionary);
    let requirements = parse_requirements(job_description, dictionary);
    let (score, match_kind) = education_match_score(&entries, &requirements, dictionary);

    EducationAnalysis {
        entries,
        requirements,
        match_kind,
        score,
    }
}
