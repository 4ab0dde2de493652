//! Sub-scores and the composite ATS score.
//!
//! Every function here is pure: it reads only the extracted structures passed in.
//! All scores are on a 0–100 scale, clamped, and rounded to two decimals. The
//! composite is the weighted sum of the five rounded components.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::analysis::education::{EducationEntry, EducationMatch, EducationRequirement};
use crate::analysis::length::LengthRange;
use crate::analysis::sections::SectionKind;
use crate::analysis::skills::SkillMatch;
use crate::dictionaries::{DictionaryError, EducationDictionary};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Composite weight table. Loaded from `scoring.json`; must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringWeights {
    pub skills_match: f64,
    pub education_match: f64,
    pub action_verb_density: f64,
    pub resume_length: f64,
    pub section_coverage: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skills_match: 0.40,
            education_match: 0.15,
            action_verb_density: 0.15,
            resume_length: 0.10,
            section_coverage: 0.20,
        }
    }
}

impl ScoringWeights {
    pub fn weight(&self, component: ScoreComponent) -> f64 {
        match component {
            ScoreComponent::SkillsMatch => self.skills_match,
            ScoreComponent::EducationMatch => self.education_match,
            ScoreComponent::ActionVerbDensity => self.action_verb_density,
            ScoreComponent::ResumeLength => self.resume_length,
            ScoreComponent::SectionCoverage => self.section_coverage,
        }
    }
}

fn default_calibration() -> f64 {
    0.35
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,
    /// Fraction of statement lines opening with an action verb that earns a full score.
    #[serde(default = "default_calibration")]
    pub action_verb_calibration: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            action_verb_calibration: default_calibration(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), DictionaryError> {
        let mut sum = 0.0;
        for component in ScoreComponent::ALL {
            let weight = self.weights.weight(component);
            if !(0.0..=1.0).contains(&weight) {
                return Err(DictionaryError::InvalidWeights(format!(
                    "weight for {} is {weight}, expected a value in [0, 1]",
                    component.as_str()
                )));
            }
            sum += weight;
        }
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DictionaryError::InvalidWeights(format!(
                "weights sum to {sum}, expected 1.0"
            )));
        }
        if !(self.action_verb_calibration > 0.0 && self.action_verb_calibration <= 1.0) {
            return Err(DictionaryError::InvalidWeights(format!(
                "action_verb_calibration is {}, expected a value in (0, 1]",
                self.action_verb_calibration
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    SkillsMatch,
    EducationMatch,
    ActionVerbDensity,
    ResumeLength,
    SectionCoverage,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 5] = [
        ScoreComponent::SkillsMatch,
        ScoreComponent::EducationMatch,
        ScoreComponent::ActionVerbDensity,
        ScoreComponent::ResumeLength,
        ScoreComponent::SectionCoverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreComponent::SkillsMatch => "skills_match",
            ScoreComponent::EducationMatch => "education_match",
            ScoreComponent::ActionVerbDensity => "action_verb_density",
            ScoreComponent::ResumeLength => "resume_length",
            ScoreComponent::SectionCoverage => "section_coverage",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoreBreakdown {
    pub components: BTreeMap<ScoreComponent, f64>,
    /// Reported alongside the composite; not one of its inputs.
    pub experience_match: f64,
    pub ats_score: f64,
}

impl ScoreBreakdown {
    pub fn new(
        components: BTreeMap<ScoreComponent, f64>,
        experience_match: f64,
        weights: &ScoringWeights,
    ) -> Self {
        let ats_score = composite_score(&components, weights);
        ScoreBreakdown {
            components,
            experience_match,
            ats_score,
        }
    }

    /// All-zero breakdown, used for empty input.
    pub fn zeroed() -> Self {
        ScoreBreakdown {
            components: ScoreComponent::ALL.iter().map(|c| (*c, 0.0)).collect(),
            experience_match: 0.0,
            ats_score: 0.0,
        }
    }
}

/// Importance of each expected section in the coverage score. Sums to 1.0.
pub const SECTION_IMPORTANCE: &[(SectionKind, f64)] = &[
    (SectionKind::Contact, 0.20),
    (SectionKind::Summary, 0.10),
    (SectionKind::Skills, 0.20),
    (SectionKind::Education, 0.15),
    (SectionKind::Experience, 0.25),
    (SectionKind::Projects, 0.05),
    (SectionKind::Certifications, 0.05),
];

// ────────────────────────────────────────────────────────────────────────────
// Sub-scores
// ────────────────────────────────────────────────────────────────────────────

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn finish(value: f64) -> f64 {
    round2(value.clamp(0.0, 100.0))
}

/// Share of job-description skills also found in the resume. A job description that
/// names no skills is a vacuous match (100).
pub fn skills_match_score(matches: &[SkillMatch]) -> f64 {
    let required = matches.iter().filter(|m| m.found_in_jd).count();
    if required == 0 {
        return 100.0;
    }
    let met = matches
        .iter()
        .filter(|m| m.found_in_jd && m.found_in_resume)
        .count();
    finish(met as f64 / required as f64 * 100.0)
}

/// Best pairing of any resume degree with any stated requirement.
///
/// - 100: same (or unspecified) domain, level met
/// - 70: adjacent domain with level met, or same domain below the level
/// - 30: anything else, `unclassified` included
/// - 0: requirements stated but the resume lists no degree
pub fn education_match_score(
    entries: &[EducationEntry],
    requirements: &[EducationRequirement],
    dictionary: &EducationDictionary,
) -> (f64, EducationMatch) {
    if requirements.is_empty() {
        return (100.0, EducationMatch::NotRequired);
    }
    if entries.is_empty() {
        return (0.0, EducationMatch::NoEntries);
    }

    let pair = |entry: &EducationEntry, requirement: &EducationRequirement| {
        let level_met = requirement
            .level
            .map_or(true, |level| entry.degree_level.rank() >= level.rank());
        let same_domain = requirement
            .domain
            .as_deref()
            .map_or(true, |domain| entry.domain == domain);
        let adjacent = requirement
            .domain
            .as_deref()
            .map_or(false, |domain| dictionary.are_adjacent(&entry.domain, domain));

        match (same_domain, adjacent, level_met) {
            (true, _, true) => (100.0, EducationMatch::Exact),
            (true, _, false) | (false, true, true) => (70.0, EducationMatch::Related),
            _ => (30.0, EducationMatch::Unrelated),
        }
    };

    entries
        .iter()
        .flat_map(|entry| requirements.iter().map(move |req| pair(entry, req)))
        .fold((30.0, EducationMatch::Unrelated), |best, candidate| {
            if candidate.0 > best.0 {
                candidate
            } else {
                best
            }
        })
}

/// 100 when nothing is required, else the fraction of required months covered.
pub fn experience_match_score(total_months: u32, required_months: Option<u32>) -> f64 {
    match required_months {
        None | Some(0) => 100.0,
        Some(required) => finish(total_months as f64 / required as f64 * 100.0),
    }
}

/// Share of statement lines that open with an action verb, scaled so that
/// `calibration` earns 100.
pub fn action_verb_score(lines_with_verb: usize, statement_lines: usize, calibration: f64) -> f64 {
    if statement_lines == 0 || calibration <= 0.0 {
        return 0.0;
    }
    let ratio = lines_with_verb as f64 / statement_lines as f64;
    finish((ratio / calibration).min(1.0) * 100.0)
}

pub fn resume_length_score(word_count: usize, expected: &LengthRange) -> f64 {
    if word_count < expected.min_words {
        finish(word_count as f64 / expected.min_words as f64 * 100.0)
    } else if word_count <= expected.max_words {
        100.0
    } else if word_count <= expected.long_words {
        70.0
    } else {
        40.0
    }
}

/// Weighted share of the expected sections that are present.
pub fn section_coverage_score(present: &BTreeSet<SectionKind>) -> f64 {
    let covered: f64 = SECTION_IMPORTANCE
        .iter()
        .filter(|(kind, _)| present.contains(kind))
        .map(|(_, weight)| weight)
        .sum();
    finish(covered * 100.0)
}

pub fn composite_score(components: &BTreeMap<ScoreComponent, f64>, weights: &ScoringWeights) -> f64 {
    let total: f64 = ScoreComponent::ALL
        .iter()
        .map(|component| {
            let score = components.get(component).copied().unwrap_or(0.0);
            weights.weight(*component) * score
        })
        .sum();
    finish(total)
}
