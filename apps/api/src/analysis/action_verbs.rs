use std::collections::BTreeMap;

use serde::Serialize;

use crate::analysis::experience::ExperienceLevel;
use crate::analysis::length::count_words;
use crate::analysis::scoring::{action_verb_score, round2};
use crate::analysis::sections::classify_line;
use crate::dictionaries::{ActionVerbDictionary, SectionKeywords};

/// Lines shorter than this are labels or fragments, not statements.
const MIN_STATEMENT_WORDS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityCategory {
    VeryWeak,
    Weak,
    Average,
    Strong,
    Outstanding,
}

/// Upper bounds (exclusive, in percent) for VeryWeak, Weak, Average and Strong.
struct DensityThresholds([f64; 4]);

impl DensityThresholds {
    fn for_level(level: ExperienceLevel) -> Self {
        match level {
            ExperienceLevel::Fresher => DensityThresholds([0.40, 0.80, 1.40, 2.50]),
            ExperienceLevel::Intermediate => DensityThresholds([0.30, 0.60, 1.20, 2.00]),
            ExperienceLevel::Experienced | ExperienceLevel::Senior => {
                DensityThresholds([0.20, 0.45, 0.80, 1.60])
            }
        }
    }

    fn categorize(&self, density: f64) -> DensityCategory {
        const ORDER: [DensityCategory; 4] = [
            DensityCategory::VeryWeak,
            DensityCategory::Weak,
            DensityCategory::Average,
            DensityCategory::Strong,
        ];
        ORDER
            .iter()
            .zip(self.0)
            .find(|(_, bound)| density < *bound)
            .map_or(DensityCategory::Outstanding, |(category, _)| *category)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionVerbAnalysis {
    pub statement_lines: usize,
    pub lines_starting_with_verb: usize,
    pub verb_occurrences: usize,
    /// Verb occurrences per hundred words.
    pub density: f64,
    pub density_category: DensityCategory,
    /// Canonical verb → occurrences anywhere in the resume.
    pub verb_usage: BTreeMap<String, usize>,
    pub score: f64,
}

/// The statement part of a line: bullets and numbering stripped, inline headings
/// reduced to their content, standalone headings dropped.
fn statement_of<'a>(line: &'a str, sections: &SectionKeywords) -> Option<&'a str> {
    let body = match classify_line(line, sections) {
        Some(heading) => &line[heading.body_start?..],
        None => line,
    };
    let body = body
        .trim_start()
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•' | '▪' | '◦' | '·' | '>' | '–' | '—' | '+'))
        .trim_start();
    let body = strip_numbering(body);
    (body.split_whitespace().count() >= MIN_STATEMENT_WORDS).then_some(body)
}

/// "1. Led" / "2) Built" → "Led" / "Built".
fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 && digits <= 2 {
        if let Some(rest) = line[digits..].strip_prefix(['.', ')']) {
            return rest.trim_start();
        }
    }
    line
}

fn normalize_word(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase()
}

pub fn analyze_action_verbs(
    resume: &str,
    verbs: &ActionVerbDictionary,
    sections: &SectionKeywords,
    level: ExperienceLevel,
    calibration: f64,
) -> ActionVerbAnalysis {
    let statements: Vec<&str> = resume
        .lines()
        .filter_map(|line| statement_of(line, sections))
        .collect();
    let lines_starting_with_verb = statements
        .iter()
        .filter(|statement| {
            statement
                .split_whitespace()
                .next()
                .and_then(|first| verbs.canonical_for(&normalize_word(first)))
                .is_some()
        })
        .count();

    let mut verb_usage: BTreeMap<String, usize> = BTreeMap::new();
    for word in resume.split_whitespace() {
        if let Some(canonical) = verbs.canonical_for(&normalize_word(word)) {
            *verb_usage.entry(canonical.to_string()).or_default() += 1;
        }
    }
    let verb_occurrences: usize = verb_usage.values().sum();

    let word_count = count_words(resume);
    let density = if word_count == 0 {
        0.0
    } else {
        verb_occurrences as f64 / word_count as f64 * 100.0
    };

    ActionVerbAnalysis {
        statement_lines: statements.len(),
        lines_starting_with_verb,
        verb_occurrences,
        density: round2(density),
        density_category: DensityThresholds::for_level(level).categorize(density),
        verb_usage,
        score: action_verb_score(lines_starting_with_verb, statements.len(), calibration),
    }
}
