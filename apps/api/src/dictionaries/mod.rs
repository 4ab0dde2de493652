//! Canonical dictionaries: static reference data loaded once at process start.
//!
//! Six JSON files (see `apps/api/data/`): technical skills, soft skills, education
//! degrees/domains, action verbs, section keywords, and the scoring configuration.
//! The built-in set is embedded at compile time; `DICTIONARY_DIR` swaps in a directory.
//! Any missing or malformed file is a startup failure, never a per-request one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;

use crate::analysis::scoring::ScoringConfig;
use crate::analysis::skills::SkillKind;

pub mod education;
pub mod sections;
pub mod skills;
pub mod verbs;

pub use education::EducationDictionary;
pub use sections::SectionKeywords;
pub use skills::SkillDictionary;
pub use verbs::ActionVerbDictionary;

pub const SKILLS_FILE: &str = "skills.json";
pub const SOFT_SKILLS_FILE: &str = "soft_skills.json";
pub const EDUCATION_FILE: &str = "education.json";
pub const ACTION_VERBS_FILE: &str = "action_verbs.json";
pub const SECTIONS_FILE: &str = "sections.json";
pub const SCORING_FILE: &str = "scoring.json";

/// Configuration error: a dictionary is missing, malformed, or internally inconsistent.
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dictionary '{name}': {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Ambiguous alias '{alias}': claimed by both '{first}' and '{second}'")]
    AmbiguousAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Invalid pattern for alias '{alias}': {source}")]
    InvalidPattern {
        alias: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid scoring configuration: {0}")]
    InvalidWeights(String),

    #[error("Dictionary '{0}' is empty")]
    Empty(String),

    #[error("Invalid dictionary entry: {0}")]
    Invalid(String),
}

/// Raw JSON text of the six dictionary files.
struct Sources<'a> {
    skills: &'a str,
    soft_skills: &'a str,
    education: &'a str,
    action_verbs: &'a str,
    sections: &'a str,
    scoring: &'a str,
}

/// All reference data the analysis core reads. Immutable after construction; share it
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Dictionaries {
    pub skills: SkillDictionary,
    pub education: EducationDictionary,
    pub action_verbs: ActionVerbDictionary,
    pub sections: SectionKeywords,
    pub scoring: ScoringConfig,
}

impl Dictionaries {
    /// Loads from `dir` when given, otherwise the built-in set.
    pub fn load(dir: Option<&Path>) -> Result<Self, DictionaryError> {
        let dictionaries = match dir {
            Some(dir) => Self::load_from_dir(dir)?,
            None => Self::builtin()?,
        };
        let soft_skills = dictionaries
            .skills
            .entries()
            .iter()
            .filter(|entry| entry.kind == SkillKind::Soft)
            .count();
        info!(
            source = %dir.map_or_else(|| "built-in".to_string(), |d| d.display().to_string()),
            technical_skills = dictionaries.skills.len() - soft_skills,
            soft_skills,
            degree_aliases = dictionaries.education.degrees().len(),
            domains = dictionaries.education.domain_count(),
            action_verbs = dictionaries.action_verbs.len(),
            section_keywords = dictionaries.sections.len(),
            "Dictionaries loaded"
        );
        Ok(dictionaries)
    }

    /// The dictionaries shipped in `apps/api/data`, embedded at compile time.
    pub fn builtin() -> Result<Self, DictionaryError> {
        Self::from_sources(&Sources {
            skills: include_str!("../../data/skills.json"),
            soft_skills: include_str!("../../data/soft_skills.json"),
            education: include_str!("../../data/education.json"),
            action_verbs: include_str!("../../data/action_verbs.json"),
            sections: include_str!("../../data/sections.json"),
            scoring: include_str!("../../data/scoring.json"),
        })
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, DictionaryError> {
        let read = |file: &str| -> Result<String, DictionaryError> {
            let path = dir.join(file);
            fs::read_to_string(&path).map_err(|source| DictionaryError::Io { path, source })
        };

        let skills = read(SKILLS_FILE)?;
        let soft_skills = read(SOFT_SKILLS_FILE)?;
        let education = read(EDUCATION_FILE)?;
        let action_verbs = read(ACTION_VERBS_FILE)?;
        let sections = read(SECTIONS_FILE)?;
        let scoring = read(SCORING_FILE)?;

        Self::from_sources(&Sources {
            skills: &skills,
            soft_skills: &soft_skills,
            education: &education,
            action_verbs: &action_verbs,
            sections: &sections,
            scoring: &scoring,
        })
    }

    fn from_sources(sources: &Sources<'_>) -> Result<Self, DictionaryError> {
        let technical: BTreeMap<String, Vec<String>> = parse("skills", sources.skills)?;
        let soft: BTreeMap<String, Vec<String>> = parse("soft_skills", sources.soft_skills)?;
        let verbs: BTreeMap<String, Vec<String>> = parse("action_verbs", sources.action_verbs)?;
        let scoring: ScoringConfig = parse("scoring", sources.scoring)?;
        scoring.validate()?;

        Ok(Dictionaries {
            skills: SkillDictionary::new(technical, soft)?,
            education: EducationDictionary::from_json(sources.education)?,
            action_verbs: ActionVerbDictionary::new(verbs)?,
            sections: SectionKeywords::from_json(sources.sections)?,
            scoring,
        })
    }
}

fn parse<T: DeserializeOwned>(name: &str, raw: &str) -> Result<T, DictionaryError> {
    serde_json::from_str(raw).map_err(|source| DictionaryError::Malformed {
        name: name.to_string(),
        source,
    })
}
