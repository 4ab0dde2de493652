use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::analysis::scoring::skills_match_score;
use crate::dictionaries::skills::{compact_key, split_phrases, tokenize, SkillEntry};
use crate::dictionaries::SkillDictionary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Technical,
    Soft,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkillMatch {
    pub canonical_name: String,
    pub kind: SkillKind,
    /// Dictionary aliases that produced a hit, in either text.
    pub aliases_matched: BTreeSet<String>,
    pub found_in_resume: bool,
    pub found_in_jd: bool,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SkillBreakdown {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillAnalysis {
    /// Union of skills found in either text, technical first, then by name.
    pub matches: Vec<SkillMatch>,
    /// Required by the job description and present in the resume.
    pub matched: Vec<String>,
    /// Required by the job description, absent from the resume.
    pub missing: Vec<String>,
    /// Present in the resume, not asked for by the job description.
    pub resume_only: Vec<String>,
    pub technical: SkillBreakdown,
    pub soft: SkillBreakdown,
    pub jd_skill_count: usize,
    pub score: f64,
}

/// Canonical skills mentioned in `text`, with the aliases that hit.
///
/// Scans token n-grams longest first within each phrase, so "react native" is one hit
/// rather than "react" plus noise, and "SQL, Server" stays two tokens apart. Each window
/// is compared by its compact key, which makes "Node.js", "nodejs" and "node js"
/// equivalent.
pub fn find_skills<'d>(
    text: &str,
    dictionary: &'d SkillDictionary,
) -> BTreeMap<&'d str, (&'d SkillEntry, BTreeSet<String>)> {
    let mut found: BTreeMap<&'d str, (&'d SkillEntry, BTreeSet<String>)> = BTreeMap::new();

    for phrase in split_phrases(text) {
        let tokens: Vec<String> = tokenize(phrase).into_iter().map(compact_key).collect();

        let mut i = 0;
        while i < tokens.len() {
            let widest = dictionary.max_window().min(tokens.len() - i);
            let hit = (1..=widest).rev().find_map(|width| {
                let key: String = tokens[i..i + width].concat();
                dictionary.lookup_key(&key).map(|hit| (width, hit))
            });

            match hit {
                Some((width, (entry, alias))) => {
                    found
                        .entry(entry.canonical.as_str())
                        .or_insert_with(|| (entry, BTreeSet::new()))
                        .1
                        .insert(alias.to_string());
                    i += width;
                }
                None => i += 1,
            }
        }
    }

    found
}

/// Matches resume skills against job-description skills.
pub fn analyze_skills(resume: &str, job_description: &str, dictionary: &SkillDictionary) -> SkillAnalysis {
    let in_resume = find_skills(resume, dictionary);
    let in_jd = find_skills(job_description, dictionary);

    let names: BTreeSet<&str> = in_resume.keys().chain(in_jd.keys()).copied().collect();
    let mut matches: Vec<SkillMatch> = names
        .into_iter()
        .filter_map(|name| {
            let resume_hit = in_resume.get(name);
            let jd_hit = in_jd.get(name);
            let (entry, _) = resume_hit.or(jd_hit)?;
            let aliases_matched = resume_hit
                .into_iter()
                .chain(jd_hit)
                .flat_map(|(_, aliases)| aliases.iter().cloned())
                .collect();
            Some(SkillMatch {
                canonical_name: entry.canonical.clone(),
                kind: entry.kind,
                aliases_matched,
                found_in_resume: resume_hit.is_some(),
                found_in_jd: jd_hit.is_some(),
            })
        })
        .collect();
    matches.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.canonical_name.cmp(&b.canonical_name)));

    let names_where = |kind: Option<SkillKind>, pred: fn(&SkillMatch) -> bool| -> Vec<String> {
        matches
            .iter()
            .filter(|m| kind.map_or(true, |k| m.kind == k) && pred(m))
            .map(|m| m.canonical_name.clone())
            .collect()
    };
    let is_matched: fn(&SkillMatch) -> bool = |m| m.found_in_jd && m.found_in_resume;
    let is_missing: fn(&SkillMatch) -> bool = |m| m.found_in_jd && !m.found_in_resume;
    let is_resume_only: fn(&SkillMatch) -> bool = |m| m.found_in_resume && !m.found_in_jd;

    let breakdown = |kind| SkillBreakdown {
        matched: names_where(Some(kind), is_matched),
        missing: names_where(Some(kind), is_missing),
    };

    SkillAnalysis {
        matched: names_where(None, is_matched),
        missing: names_where(None, is_missing),
        resume_only: names_where(None, is_resume_only),
        technical: breakdown(SkillKind::Technical),
        soft: breakdown(SkillKind::Soft),
        jd_skill_count: matches.iter().filter(|m| m.found_in_jd).count(),
        score: skills_match_score(&matches),
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionaries::Dictionaries;

    fn dictionary() -> SkillDictionary {
        Dictionaries::builtin().unwrap().skills
    }

    #[test]
    fn test_spelling_variants_resolve_to_one_skill() {
        let dict = dictionary();
        for text in ["Node.js", "nodejs", "node js", "NODE.JS"] {
            let found = find_skills(text, &dict);
            assert!(found.contains_key("node.js"), "{text} did not match");
        }
    }

    #[test]
    fn test_whole_token_matching() {
        let dict = dictionary();
        let found = find_skills("JavaScript and Reactive streams", &dict);
        assert!(found.contains_key("javascript"));
        assert!(!found.contains_key("java"));
        assert!(!found.contains_key("react"));
    }

    #[test]
    fn test_longest_window_wins() {
        let dict = dictionary();
        let found = find_skills("Built apps with React Native", &dict);
        assert!(found.contains_key("react native"));
        assert!(!found.contains_key("react"));
    }

    #[test]
    fn test_multi_word_skill_does_not_span_separators() {
        let dict = dictionary();
        let analysis = analyze_skills(
            "Skills: Python, SQL, Server administration",
            "Requires SQL",
            &dict,
        );
        assert_eq!(analysis.matched, vec!["sql"]);
        assert_eq!(analysis.resume_only, vec!["python"]);
        assert_eq!(analysis.score, 100.0);

        for text in ["Databases: SQL\nServer rooms", "I know SQL. Server uptime matters", "SQL; Server"] {
            let found = find_skills(text, &dict);
            assert!(found.contains_key("sql"), "{text}");
            assert!(!found.contains_key("microsoft sql server"), "{text}");
        }
    }

    #[test]
    fn test_multi_word_skill_within_one_phrase() {
        let dict = dictionary();
        for text in ["Administered SQL Server 2019", "SQL-Server", "sql_server, mssql"] {
            let found = find_skills(text, &dict);
            assert!(found.contains_key("microsoft sql server"), "{text}");
        }
    }

    #[test]
    fn test_aliases_are_recorded() {
        let dict = dictionary();
        let found = find_skills("AWS, Amazon Web Services and k8s", &dict);
        let (_, aliases) = &found["amazon web services"];
        assert_eq!(
            aliases.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["amazon web services", "aws"]
        );
        assert!(found.contains_key("kubernetes"));
    }

    #[test]
    fn test_match_lists_and_score() {
        let analysis = analyze_skills(
            "Python, SQL, Docker. Strong communication skills.",
            "Requires Python, Java and teamwork",
            &dictionary(),
        );

        assert_eq!(analysis.matched, vec!["python"]);
        assert_eq!(analysis.missing, vec!["java", "teamwork"]);
        assert_eq!(analysis.resume_only, vec!["docker", "sql", "communication"]);
        assert_eq!(analysis.technical.missing, vec!["java"]);
        assert_eq!(analysis.soft.missing, vec!["teamwork"]);
        assert_eq!(analysis.jd_skill_count, 3);
        assert!((analysis.score - 33.33).abs() < 1e-9);
    }

    #[test]
    fn test_no_jd_skills_is_vacuous_match() {
        let analysis = analyze_skills("Python", "Looking for a great colleague", &dictionary());
        assert_eq!(analysis.jd_skill_count, 0);
        assert_eq!(analysis.score, 100.0);
    }
}
