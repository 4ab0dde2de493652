//! Resume analysis pipeline.
//!
//! raw text → section detection → {contact, skills, education, experience, action
//! verbs, length} → scoring → [`AnalysisResult`].
//!
//! `analyze` is a pure function of its inputs: the dictionaries are shared read-only and
//! the date used to resolve "present" is passed in by the caller.

pub mod action_verbs;
pub mod contact;
pub mod dates;
pub mod education;
pub mod experience;
pub mod handlers;
pub mod length;
pub mod scoring;
pub mod sections;
pub mod skills;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dictionaries::Dictionaries;

use action_verbs::{analyze_action_verbs, ActionVerbAnalysis, DensityCategory};
use contact::{extract_contact, find_email, find_phone, ContactInfo};
use education::{analyze_education, EducationAnalysis, EducationMatch};
use experience::{analyze_experience, ExperienceAnalysis, ExperienceLevel};
use length::{analyze_length, LengthAnalysis, LengthCategory, LengthRange};
use scoring::{section_coverage_score, ScoreBreakdown, ScoreComponent};
use sections::{detect_sections, Section, SectionKind};
use skills::{analyze_skills, SkillAnalysis};

/// Partial-extraction signals. None of these abort the analysis.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisWarning {
    EmptyResume,
    NoSectionsDetected,
    NoJobDescriptionSkills,
    NoEducationEntries,
    NoExperienceDates,
    UnparsedDateRanges { count: usize },
    MissingContactField { field: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub detected: Vec<Section>,
    pub present: Vec<SectionKind>,
    pub missing: Vec<SectionKind>,
    pub coverage_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    /// Date "present" was resolved against.
    pub analyzed_on: NaiveDate,
    pub contact: ContactInfo,
    pub sections: SectionSummary,
    pub skills: SkillAnalysis,
    pub education: EducationAnalysis,
    pub experience: ExperienceAnalysis,
    pub action_verbs: ActionVerbAnalysis,
    pub length: LengthAnalysis,
    pub scores: ScoreBreakdown,
    pub warnings: Vec<AnalysisWarning>,
}

impl AnalysisResult {
    /// Result for blank input: nothing extracted, every score 0.
    pub fn empty(analyzed_on: NaiveDate) -> Self {
        AnalysisResult {
            analyzed_on,
            contact: ContactInfo::default(),
            sections: SectionSummary {
                detected: Vec::new(),
                present: Vec::new(),
                missing: SectionKind::EXPECTED.to_vec(),
                coverage_score: 0.0,
            },
            skills: SkillAnalysis {
                matches: Vec::new(),
                matched: Vec::new(),
                missing: Vec::new(),
                resume_only: Vec::new(),
                technical: Default::default(),
                soft: Default::default(),
                jd_skill_count: 0,
                score: 0.0,
            },
            education: EducationAnalysis {
                entries: Vec::new(),
                requirements: Vec::new(),
                match_kind: EducationMatch::NoEntries,
                score: 0.0,
            },
            experience: ExperienceAnalysis {
                entries: Vec::new(),
                total_months: 0,
                level: ExperienceLevel::Fresher,
                required_months: None,
                meets_requirement: false,
                unparsed_ranges: 0,
                score: 0.0,
            },
            action_verbs: ActionVerbAnalysis {
                statement_lines: 0,
                lines_starting_with_verb: 0,
                verb_occurrences: 0,
                density: 0.0,
                density_category: DensityCategory::VeryWeak,
                verb_usage: BTreeMap::new(),
                score: 0.0,
            },
            length: LengthAnalysis {
                word_count: 0,
                expected: LengthRange::for_level(ExperienceLevel::Fresher),
                category: LengthCategory::Short,
                score: 0.0,
            },
            scores: ScoreBreakdown::zeroed(),
            warnings: vec![AnalysisWarning::EmptyResume],
        }
    }

    pub fn is_empty_input(&self) -> bool {
        self.warnings.contains(&AnalysisWarning::EmptyResume)
    }
}

/// Analyzes `resume` against `job_description`.
pub fn analyze(
    dictionaries: &Dictionaries,
    resume: &str,
    job_description: &str,
    today: NaiveDate,
) -> AnalysisResult {
    if resume.trim().is_empty() {
        warn!("Empty resume text; returning zeroed analysis");
        return AnalysisResult::empty(today);
    }

    let detected = detect_sections(resume, &dictionaries.sections);
    let contact = extract_contact(resume, &detected);
    let sections = summarize_sections(detected);

    let section_text = |kind: SectionKind| {
        sections
            .detected
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.text.as_str())
    };

    let skills = analyze_skills(resume, job_description, &dictionaries.skills);
    let education = analyze_education(
        section_text(SectionKind::Education).unwrap_or(resume),
        job_description,
        &dictionaries.education,
    );
    let experience = analyze_experience(section_text(SectionKind::Experience), job_description, today);
    let action_verbs = analyze_action_verbs(
        resume,
        &dictionaries.action_verbs,
        &dictionaries.sections,
        experience.level,
        dictionaries.scoring.action_verb_calibration,
    );
    let length = analyze_length(resume, experience.level);

    debug!(
        sections = sections.present.len(),
        resume_skills = skills.matches.iter().filter(|m| m.found_in_resume).count(),
        jd_skills = skills.jd_skill_count,
        degrees = education.entries.len(),
        roles = experience.entries.len(),
        total_months = experience.total_months,
        words = length.word_count,
        "Extraction complete"
    );

    let components: BTreeMap<ScoreComponent, f64> = [
        (ScoreComponent::SkillsMatch, skills.score),
        (ScoreComponent::EducationMatch, education.score),
        (ScoreComponent::ActionVerbDensity, action_verbs.score),
        (ScoreComponent::ResumeLength, length.score),
        (ScoreComponent::SectionCoverage, sections.coverage_score),
    ]
    .into_iter()
    .collect();
    let scores = ScoreBreakdown::new(components, experience.score, &dictionaries.scoring.weights);

    let warnings = collect_warnings(&contact, &sections, &skills, &education, &experience);

    info!(
        ats_score = scores.ats_score,
        warnings = warnings.len(),
        "Resume analyzed"
    );

    AnalysisResult {
        analyzed_on: today,
        contact,
        sections,
        skills,
        education,
        experience,
        action_verbs,
        length,
        scores,
        warnings,
    }
}

/// Present/missing expected sections. Contact counts as present when a contact section
/// exists, or when the block above the first recognized heading carries an email or a
/// phone number.
fn summarize_sections(detected: Vec<Section>) -> SectionSummary {
    let has_headings = detected.iter().any(|s| s.kind != SectionKind::Header);
    let header_has_contact = detected
        .iter()
        .filter(|s| s.kind == SectionKind::Header)
        .any(|s| find_email(&s.text).is_some() || find_phone(&s.text).is_some());

    let mut present: BTreeSet<SectionKind> = detected
        .iter()
        .map(|s| s.kind)
        .filter(|kind| SectionKind::EXPECTED.contains(kind))
        .collect();
    if has_headings && header_has_contact {
        present.insert(SectionKind::Contact);
    }

    let coverage_score = section_coverage_score(&present);
    SectionSummary {
        missing: SectionKind::EXPECTED
            .iter()
            .filter(|kind| !present.contains(kind))
            .copied()
            .collect(),
        present: present.into_iter().collect(),
        detected,
        coverage_score,
    }
}

fn collect_warnings(
    contact: &ContactInfo,
    sections: &SectionSummary,
    skills: &SkillAnalysis,
    education: &EducationAnalysis,
    experience: &ExperienceAnalysis,
) -> Vec<AnalysisWarning> {
    let mut warnings = Vec::new();

    if sections.detected.iter().all(|s| s.kind == SectionKind::Header) {
        warnings.push(AnalysisWarning::NoSectionsDetected);
    }
    if skills.jd_skill_count == 0 {
        warnings.push(AnalysisWarning::NoJobDescriptionSkills);
    }
    if education.entries.is_empty() {
        warnings.push(AnalysisWarning::NoEducationEntries);
    }
    if experience.entries.is_empty() {
        warnings.push(AnalysisWarning::NoExperienceDates);
    }
    if experience.unparsed_ranges > 0 {
        warnings.push(AnalysisWarning::UnparsedDateRanges {
            count: experience.unparsed_ranges,
        });
    }

    let fields = [
        ("name", contact.name.is_none()),
        ("email", contact.email.is_none()),
        ("phone", contact.phone.is_none()),
    ];
    for (field, missing) in fields {
        if missing {
            warnings.push(AnalysisWarning::MissingContactField {
                field: field.to_string(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "John Doe\njohn@example.com\n555-123-4567\nSkills: Python, SQL\nEducation: B.Sc Computer Science\nExperience: Jan 2020 - Dec 2022 Software Engineer";
    const JOB: &str = "Requires Python, Java, B.Sc Computer Science, 2+ years experience";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn run(resume: &str, job: &str) -> AnalysisResult {
        let dicts = Dictionaries::builtin().unwrap();
        analyze(&dicts, resume, job, today())
    }

    #[test]
    fn test_reference_scenario() {
        let result = run(RESUME, JOB);

        assert_eq!(result.contact.email.as_deref(), Some("john@example.com"));
        assert_eq!(result.contact.phone.as_deref(), Some("5551234567"));
        assert_eq!(result.contact.name.as_deref(), Some("John Doe"));

        assert_eq!(result.skills.matched, vec!["python"]);
        assert_eq!(result.skills.missing, vec!["java"]);
        assert_eq!(result.skills.score, 50.0);

        assert_eq!(result.education.match_kind, EducationMatch::Exact);
        assert_eq!(result.education.score, 100.0);

        assert_eq!(result.experience.total_months, 36);
        assert_eq!(result.experience.required_months, Some(24));
        assert!(result.experience.meets_requirement);
        assert_eq!(result.experience.entries[0].role.as_deref(), Some("Software Engineer"));

        assert_eq!(result.action_verbs.score, 0.0);
        assert_eq!(result.length.word_count, 19);
        assert_eq!(result.length.score, 5.43);

        assert_eq!(
            result.sections.present,
            vec![
                SectionKind::Contact,
                SectionKind::Skills,
                SectionKind::Education,
                SectionKind::Experience
            ]
        );
        assert_eq!(result.sections.coverage_score, 80.0);

        // 0.40*50 + 0.15*100 + 0.15*0 + 0.10*5.43 + 0.20*80
        assert_eq!(result.scores.ats_score, 51.54);
        assert_eq!(result.scores.experience_match, 100.0);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_blank_resume_is_zeroed() {
        let result = run("   \n\t ", JOB);
        assert!(result.is_empty_input());
        assert_eq!(result.scores.ats_score, 0.0);
        assert!(result.scores.components.values().all(|v| *v == 0.0));
        assert_eq!(result.sections.missing.len(), SectionKind::EXPECTED.len());
    }

    #[test]
    fn test_no_sections_gives_zero_coverage() {
        let result = run(
            "Jane Roe jane@example.com\nI write Python and Rust every day at work.",
            "Python developer",
        );
        assert_eq!(result.sections.coverage_score, 0.0);
        assert!(result.sections.present.is_empty());
        assert!(result.warnings.contains(&AnalysisWarning::NoSectionsDetected));
        assert!(result.scores.ats_score >= 0.0 && result.scores.ats_score <= 100.0);
    }

    #[test]
    fn test_resume_without_education_section_has_no_phantom_degree() {
        let resume = "Ms. Jane Roe\njane@example.com\nSkills: Python\nExperience: Jan 2020 - Dec 2022 Data Analyst";
        let result = run(resume, "Requires Python. Questions? Email me.");
        assert!(result.education.entries.is_empty(), "{:?}", result.education.entries);
        assert!(result.education.requirements.is_empty());
        assert_eq!(result.education.match_kind, EducationMatch::NotRequired);
        assert_eq!(result.education.score, 100.0);
    }

    #[test]
    fn test_job_description_without_skills() {
        let result = run(RESUME, "Join our friendly team");
        assert_eq!(result.skills.score, 100.0);
        assert_eq!(result.education.match_kind, EducationMatch::NotRequired);
        assert!(result.warnings.contains(&AnalysisWarning::NoJobDescriptionSkills));
    }

    #[test]
    fn test_scores_stay_in_range() {
        let resume = "EXPERIENCE\nLed, built, designed, shipped\n".repeat(200);
        let result = run(&resume, JOB);
        for score in result.scores.components.values() {
            assert!((0.0..=100.0).contains(score));
        }
        assert!((0.0..=100.0).contains(&result.scores.ats_score));
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let first = serde_json::to_value(run(RESUME, JOB)).unwrap();
        let second = serde_json::to_value(run(RESUME, JOB)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_contact_fields_are_warned() {
        let result = run("Skills\nRust, Go", JOB);
        for field in ["name", "email", "phone"] {
            assert!(result.warnings.contains(&AnalysisWarning::MissingContactField {
                field: field.to_string()
            }));
        }
    }
}
