use std::collections::{BTreeMap, BTreeSet, HashMap};

use regex::{Match, Regex};
use serde::Deserialize;

use crate::analysis::education::DegreeLevel;
use crate::dictionaries::DictionaryError;

/// Domain assigned when a field of study matches nothing in the vocabulary.
pub const UNCLASSIFIED: &str = "unclassified";

#[derive(Debug, Deserialize)]
struct RawEducation {
    degrees: Vec<RawDegree>,
    domains: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    adjacency: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawDegree {
    level: DegreeLevel,
    #[serde(default)]
    domain: Option<String>,
    aliases: Vec<String>,
}

/// A compiled degree alias ("B.Sc", "Bachelor of Science", "PhD", ...).
#[derive(Debug, Clone)]
pub struct DegreePattern {
    pub alias: String,
    pub level: DegreeLevel,
    /// Domain implied by the degree itself (BCA → computer_science), if any.
    pub domain: Option<String>,
    pattern: Regex,
    guard: ShortAliasGuard,
}

/// Two-letter aliases ("BA", "BE", "M.S.") collide with ordinary words ("be.", "Ms."),
/// so they only count when written in capitals with every internal dot the alias has.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ShortAliasGuard {
    None,
    Capitalized { internal_dots: usize },
}

impl ShortAliasGuard {
    fn for_alias(alias: &str) -> Self {
        if alias.chars().filter(|c| c.is_alphabetic()).count() > 2 {
            return ShortAliasGuard::None;
        }
        ShortAliasGuard::Capitalized {
            internal_dots: internal_dots(alias),
        }
    }

    fn accepts(self, written: &str) -> bool {
        match self {
            ShortAliasGuard::None => true,
            ShortAliasGuard::Capitalized { internal_dots: dots } => {
                !written.chars().any(char::is_lowercase) && internal_dots(written) == dots
            }
        }
    }
}

/// Dots between letters; a trailing full stop does not count.
fn internal_dots(s: &str) -> usize {
    s.trim_end_matches('.').matches('.').count()
}

impl DegreePattern {
    fn compile(alias: &str, level: DegreeLevel, domain: Option<String>) -> Result<Self, DictionaryError> {
        let alias = alias.trim().to_lowercase();
        let mut body = String::new();
        for c in alias.chars() {
            match c {
                '.' => body.push_str(r"\.?"),
                ' ' => body.push_str(r"[\s.\-]*"),
                '\'' => body.push_str("['’]?"),
                other => body.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
            }
        }
        let pattern = Regex::new(&format!(r"(?i)\b{body}")).map_err(|source| {
            DictionaryError::InvalidPattern {
                alias: alias.clone(),
                source,
            }
        })?;

        let guard = ShortAliasGuard::for_alias(&alias);

        Ok(DegreePattern {
            alias,
            level,
            domain,
            pattern,
            guard,
        })
    }

    /// All occurrences of this alias in `text` that end on a word boundary and pass
    /// the short-alias guard.
    pub fn find_iter<'t>(&'t self, text: &'t str) -> impl Iterator<Item = Match<'t>> + 't {
        self.pattern.find_iter(text).filter(move |m| {
            let ends_cleanly = text[m.end()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            let written_as_degree = self.guard.accepts(m.as_str());
            ends_cleanly && written_as_degree
        })
    }
}

/// Degree aliases, field-of-study vocabulary and the domain adjacency table.
#[derive(Debug, Clone)]
pub struct EducationDictionary {
    degrees: Vec<DegreePattern>,
    /// (domain, alias) pairs, aliases lowercased.
    domain_aliases: Vec<(String, String)>,
    domains: BTreeSet<String>,
    adjacency: BTreeMap<String, BTreeSet<String>>,
}

impl EducationDictionary {
    pub fn from_json(raw: &str) -> Result<Self, DictionaryError> {
        let raw: RawEducation =
            serde_json::from_str(raw).map_err(|source| DictionaryError::Malformed {
                name: "education".to_string(),
                source,
            })?;

        if raw.degrees.is_empty() || raw.domains.is_empty() {
            return Err(DictionaryError::Empty("education".to_string()));
        }

        let domains: BTreeSet<String> = raw.domains.keys().map(|d| d.to_lowercase()).collect();
        let require_known = |domain: &str| -> Result<(), DictionaryError> {
            if domains.contains(domain) {
                Ok(())
            } else {
                Err(DictionaryError::Invalid(format!(
                    "education domain '{domain}' is referenced but not defined"
                )))
            }
        };

        let mut degrees = Vec::new();
        let mut seen_degree_aliases: HashMap<String, DegreeLevel> = HashMap::new();
        for degree in raw.degrees {
            let domain = degree.domain.map(|d| d.to_lowercase());
            if let Some(domain) = &domain {
                require_known(domain)?;
            }
            for alias in &degree.aliases {
                let key = alias.trim().to_lowercase();
                if let Some(level) = seen_degree_aliases.insert(key.clone(), degree.level) {
                    return Err(DictionaryError::AmbiguousAlias {
                        alias: key,
                        first: level.as_str().to_string(),
                        second: degree.level.as_str().to_string(),
                    });
                }
                degrees.push(DegreePattern::compile(alias, degree.level, domain.clone())?);
            }
        }

        let mut domain_aliases = Vec::new();
        let mut seen_domain_aliases: HashMap<String, String> = HashMap::new();
        for (domain, aliases) in &raw.domains {
            let domain = domain.to_lowercase();
            for alias in std::iter::once(domain.replace('_', " ")).chain(aliases.iter().map(|a| a.trim().to_lowercase())) {
                match seen_domain_aliases.get(&alias) {
                    Some(owner) if owner != &domain => {
                        return Err(DictionaryError::AmbiguousAlias {
                            alias,
                            first: owner.clone(),
                            second: domain,
                        });
                    }
                    Some(_) => continue,
                    None => {
                        seen_domain_aliases.insert(alias.clone(), domain.clone());
                        domain_aliases.push((domain.clone(), alias));
                    }
                }
            }
        }

        let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (domain, related) in raw.adjacency {
            let domain = domain.to_lowercase();
            require_known(&domain)?;
            for other in related {
                let other = other.to_lowercase();
                require_known(&other)?;
                adjacency.entry(domain.clone()).or_default().insert(other.clone());
                adjacency.entry(other).or_default().insert(domain.clone());
            }
        }

        Ok(EducationDictionary {
            degrees,
            domain_aliases,
            domains,
            adjacency,
        })
    }

    pub fn degrees(&self) -> &[DegreePattern] {
        &self.degrees
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    /// Resolves a field-of-study phrase to a domain by the longest vocabulary entry it
    /// contains on word boundaries.
    pub fn resolve_domain(&self, phrase: &str) -> Option<&str> {
        let phrase = phrase.to_lowercase();
        let mut best: Option<(&str, usize)> = None;
        for (domain, alias) in &self.domain_aliases {
            if alias.len() > best.map_or(0, |(_, len)| len) && contains_phrase(&phrase, alias) {
                best = Some((domain.as_str(), alias.len()));
            }
        }
        best.map(|(domain, _)| domain)
    }

    /// Symmetric adjacency lookup. A domain is not adjacent to itself.
    pub fn are_adjacent(&self, a: &str, b: &str) -> bool {
        self.adjacency
            .get(a)
            .map_or(false, |related| related.contains(b))
    }
}

/// Word-bounded substring test on lowercase text.
pub(crate) fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        before.map_or(true, |c| !c.is_alphanumeric()) && after.map_or(true, |c| !c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "degrees": [
            { "level": "bachelor", "aliases": ["b.sc", "bachelor of science", "bachelor", "ba"] },
            { "level": "master", "aliases": ["m.s.", "m.e.", "msc"] },
            { "level": "bachelor", "domain": "computer_science", "aliases": ["bca"] }
        ],
        "domains": {
            "computer_science": ["computer science", "cs", "information technology"],
            "electronics": ["electronics"],
            "mechanical": ["mechanical engineering"]
        },
        "adjacency": { "computer_science": ["electronics"] }
    }"#;

    fn fixture() -> EducationDictionary {
        EducationDictionary::from_json(FIXTURE).unwrap()
    }

    fn matches<'t>(dict: &'t EducationDictionary, alias: &str, text: &'t str) -> Vec<&'t str> {
        dict.degrees()
            .iter()
            .find(|d| d.alias == alias)
            .unwrap()
            .find_iter(text)
            .map(|m| m.as_str())
            .collect()
    }

    #[test]
    fn test_dotted_alias_matches_with_or_without_dots() {
        let dict = fixture();
        assert_eq!(matches(&dict, "b.sc", "B.Sc Computer Science"), vec!["B.Sc"]);
        assert_eq!(matches(&dict, "b.sc", "BSc in Physics"), vec!["BSc"]);
    }

    #[test]
    fn test_alias_requires_trailing_word_boundary() {
        let dict = fixture();
        assert!(matches(&dict, "bachelor", "Bachelors programme").is_empty());
    }

    #[test]
    fn test_short_alias_requires_uppercase() {
        let dict = fixture();
        assert_eq!(matches(&dict, "ba", "BA in Economics"), vec!["BA"]);
        assert!(matches(&dict, "ba", "ba in economics").is_empty());
    }

    #[test]
    fn test_short_dotted_alias_requires_dots() {
        let dict = fixture();
        assert_eq!(matches(&dict, "m.s.", "M.S. in Robotics"), vec!["M.S."]);
        assert_eq!(matches(&dict, "m.s.", "M.S in Robotics"), vec!["M.S"]);
        assert!(matches(&dict, "m.s.", "Proficient in MS Office").is_empty());
    }

    #[test]
    fn test_short_dotted_alias_ignores_ordinary_words() {
        let dict = fixture();
        assert!(matches(&dict, "m.s.", "Ms. Jane Roe").is_empty());
        assert!(matches(&dict, "m.s.", "m.s. in robotics").is_empty());
        assert!(matches(&dict, "m.e.", "Questions? Email me.").is_empty());
        assert!(matches(&dict, "m.e.", "Contact ME. Thanks").is_empty());
        assert_eq!(matches(&dict, "m.e.", "M.E. Mechanical"), vec!["M.E."]);
    }

    #[test]
    fn test_resolve_domain_prefers_longest_alias() {
        let dict = fixture();
        assert_eq!(
            dict.resolve_domain("Computer Science (Honours)"),
            Some("computer_science")
        );
        assert_eq!(
            dict.resolve_domain("Mechanical Engineering"),
            Some("mechanical")
        );
        assert_eq!(dict.resolve_domain("Fine Arts"), None);
    }

    #[test]
    fn test_resolve_domain_respects_word_boundaries() {
        let dict = fixture();
        // "cs" must not fire inside "physics"
        assert_eq!(dict.resolve_domain("physics"), None);
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let dict = fixture();
        assert!(dict.are_adjacent("computer_science", "electronics"));
        assert!(dict.are_adjacent("electronics", "computer_science"));
        assert!(!dict.are_adjacent("computer_science", "mechanical"));
    }

    #[test]
    fn test_unknown_adjacency_domain_is_rejected() {
        let raw = FIXTURE.replace(r#"["electronics"] }"#, r#"["astrology"] }"#);
        let result = EducationDictionary::from_json(&raw);
        assert!(matches!(result, Err(DictionaryError::Invalid(_))));
    }

    #[test]
    fn test_domain_alias_shared_by_two_domains_is_rejected() {
        let raw = FIXTURE.replace(r#""electronics": ["electronics"]"#, r#""electronics": ["cs"]"#);
        let result = EducationDictionary::from_json(&raw);
        assert!(matches!(result, Err(DictionaryError::AmbiguousAlias { .. })));
    }
}
