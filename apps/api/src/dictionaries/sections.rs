use std::collections::{BTreeMap, HashMap};

use crate::analysis::sections::SectionKind;
use crate::dictionaries::education::contains_phrase;
use crate::dictionaries::DictionaryError;

/// Section-keyword families ("work experience", "employment history" → Experience).
#[derive(Debug, Clone)]
pub struct SectionKeywords {
    /// Normalized keywords, longest first so the most specific heading wins.
    keywords: Vec<(SectionKind, String)>,
}

impl SectionKeywords {
    pub fn from_json(raw: &str) -> Result<Self, DictionaryError> {
        let families: BTreeMap<SectionKind, Vec<String>> =
            serde_json::from_str(raw).map_err(|source| DictionaryError::Malformed {
                name: "sections".to_string(),
                source,
            })?;

        if families.is_empty() {
            return Err(DictionaryError::Empty("sections".to_string()));
        }
        if families.contains_key(&SectionKind::Header) {
            return Err(DictionaryError::Invalid(
                "'header' is implicit and cannot carry keywords".to_string(),
            ));
        }

        let mut owners: HashMap<String, SectionKind> = HashMap::new();
        let mut keywords = Vec::new();
        for (kind, family) in families {
            for keyword in family {
                let keyword = normalize_heading(&keyword);
                if keyword.is_empty() {
                    continue;
                }
                match owners.get(&keyword) {
                    Some(owner) if *owner != kind => {
                        return Err(DictionaryError::AmbiguousAlias {
                            alias: keyword,
                            first: owner.as_str().to_string(),
                            second: kind.as_str().to_string(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        owners.insert(keyword.clone(), kind);
                        keywords.push((kind, keyword));
                    }
                }
            }
        }

        keywords.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.1.cmp(&b.1)));
        Ok(SectionKeywords { keywords })
    }

    /// The whole normalized line is a keyword (singular/plural tolerant).
    pub fn match_heading(&self, normalized: &str) -> Option<(SectionKind, &str)> {
        self.keywords
            .iter()
            .find(|(_, keyword)| same_modulo_plural(normalized, keyword))
            .map(|(kind, keyword)| (*kind, keyword.as_str()))
    }

    /// The normalized line contains a keyword on word boundaries.
    pub fn find_within(&self, normalized: &str) -> Option<(SectionKind, &str)> {
        self.keywords
            .iter()
            .find(|(_, keyword)| {
                contains_phrase(normalized, keyword)
                    || keyword
                        .strip_suffix('s')
                        .map_or(false, |singular| contains_phrase(normalized, singular))
            })
            .map(|(kind, keyword)| (*kind, keyword.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Lowercases a heading candidate, strips bullet/rule decoration and trailing
/// punctuation, and collapses separators (`-`, `|`, `/`, `_`) to single spaces.
pub fn normalize_heading(line: &str) -> String {
    let trimmed = line
        .trim()
        .trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, '#' | '*' | '•' | '▪' | '-' | '=' | '_' | '>' | '|' | '~')
        })
        .trim_end_matches(|c: char| {
            c.is_whitespace()
                || matches!(c, ':' | '-' | '–' | '—' | '=' | '_' | '|' | '.' | '*' | '~')
        });

    trimmed
        .to_lowercase()
        .replace('&', " and ")
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '|' | '/' | '_' | '–' | '—'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn same_modulo_plural(candidate: &str, keyword: &str) -> bool {
    candidate == keyword
        || candidate.strip_suffix('s') == Some(keyword)
        || keyword.strip_suffix('s') == Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "skills": ["skills", "technical skills"],
        "experience": ["experience", "work experience"],
        "education": ["education"]
    }"#;

    #[test]
    fn test_normalize_heading_strips_decoration() {
        assert_eq!(normalize_heading("## WORK-EXPERIENCE: "), "work experience");
        assert_eq!(normalize_heading("• Skills & Tools"), "skills and tools");
        assert_eq!(normalize_heading("Work | Experience"), "work experience");
    }

    #[test]
    fn test_match_heading_tolerates_plural() {
        let keywords = SectionKeywords::from_json(FIXTURE).unwrap();
        assert_eq!(
            keywords.match_heading("skill").map(|(k, _)| k),
            Some(SectionKind::Skills)
        );
        assert_eq!(
            keywords.match_heading("work experiences").map(|(k, _)| k),
            Some(SectionKind::Experience)
        );
        assert!(keywords.match_heading("experience with rust").is_none());
    }

    #[test]
    fn test_find_within_prefers_longest_keyword() {
        let keywords = SectionKeywords::from_json(FIXTURE).unwrap();
        assert_eq!(
            keywords.find_within("my technical skills"),
            Some((SectionKind::Skills, "technical skills"))
        );
    }

    #[test]
    fn test_keyword_in_two_families_is_rejected() {
        let raw = r#"{ "skills": ["skills"], "other": ["skills"] }"#;
        assert!(matches!(
            SectionKeywords::from_json(raw),
            Err(DictionaryError::AmbiguousAlias { .. })
        ));
    }

    #[test]
    fn test_header_family_is_rejected() {
        let raw = r#"{ "header": ["top"] }"#;
        assert!(matches!(
            SectionKeywords::from_json(raw),
            Err(DictionaryError::Invalid(_))
        ));
    }
}
