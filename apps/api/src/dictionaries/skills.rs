use std::collections::{BTreeMap, HashMap};

use crate::analysis::skills::SkillKind;
use crate::dictionaries::DictionaryError;

/// One canonical skill and every surface form that resolves to it.
#[derive(Debug, Clone)]
pub struct SkillEntry {
    pub canonical: String,
    pub kind: SkillKind,
    /// Dictionary aliases, canonical name first.
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
struct AliasTarget {
    entry: usize,
    alias: String,
}

/// Alias index over the technical and soft-skill dictionaries.
///
/// Aliases are keyed by their compact form (see [`compact_key`]), so "Node.js",
/// "nodejs" and "node js" all land on the same slot. Construction fails if two
/// canonical entries claim the same compact key.
#[derive(Debug, Clone)]
pub struct SkillDictionary {
    entries: Vec<SkillEntry>,
    index: HashMap<String, AliasTarget>,
    max_window: usize,
}

impl SkillDictionary {
    pub fn new(
        technical: BTreeMap<String, Vec<String>>,
        soft: BTreeMap<String, Vec<String>>,
    ) -> Result<Self, DictionaryError> {
        if technical.is_empty() {
            return Err(DictionaryError::Empty("skills".to_string()));
        }

        let mut dictionary = SkillDictionary {
            entries: Vec::new(),
            index: HashMap::new(),
            max_window: 1,
        };

        let sources = technical
            .into_iter()
            .map(|(canonical, aliases)| (canonical, aliases, SkillKind::Technical))
            .chain(
                soft.into_iter()
                    .map(|(canonical, aliases)| (canonical, aliases, SkillKind::Soft)),
            );

        for (canonical, aliases, kind) in sources {
            dictionary.insert(canonical, aliases, kind)?;
        }

        Ok(dictionary)
    }

    fn insert(
        &mut self,
        canonical: String,
        aliases: Vec<String>,
        kind: SkillKind,
    ) -> Result<(), DictionaryError> {
        let canonical = canonical.trim().to_lowercase();
        let entry_idx = self.entries.len();

        let mut surface_forms = vec![canonical.clone()];
        for alias in aliases {
            let alias = alias.trim().to_lowercase();
            if !surface_forms.contains(&alias) {
                surface_forms.push(alias);
            }
        }

        for alias in &surface_forms {
            let key = compact_key(alias);
            if !key.chars().any(char::is_alphanumeric) {
                return Err(DictionaryError::Invalid(format!(
                    "skill alias '{alias}' has no matchable characters"
                )));
            }

            match self.index.get(&key) {
                Some(existing) if existing.entry != entry_idx => {
                    return Err(DictionaryError::AmbiguousAlias {
                        alias: alias.clone(),
                        first: self.entries[existing.entry].canonical.clone(),
                        second: canonical,
                    });
                }
                // Same entry, different spelling of the same key ("team work" / "teamwork").
                Some(_) => continue,
                None => {
                    self.max_window = self.max_window.max(tokenize(alias).len());
                    self.index.insert(
                        key,
                        AliasTarget {
                            entry: entry_idx,
                            alias: alias.clone(),
                        },
                    );
                }
            }
        }

        self.entries.push(SkillEntry {
            canonical,
            kind,
            aliases: surface_forms,
        });
        Ok(())
    }

    /// Resolves any spelling of an alias to its canonical entry.
    #[cfg(test)]
    pub(crate) fn resolve(&self, alias: &str) -> Option<&SkillEntry> {
        self.index
            .get(&compact_key(alias))
            .map(|target| &self.entries[target.entry])
    }

    /// Looks up an already-compacted key; returns the entry and the dictionary alias hit.
    pub(crate) fn lookup_key(&self, key: &str) -> Option<(&SkillEntry, &str)> {
        self.index
            .get(key)
            .map(|target| (&self.entries[target.entry], target.alias.as_str()))
    }

    pub fn entries(&self) -> &[SkillEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest alias, in tokens. Bounds the n-gram window used while scanning text.
    pub fn max_window(&self) -> usize {
        self.max_window
    }
}

/// List, bracket and sentence punctuation plus line breaks. A multi-word skill never
/// spans one of these.
fn is_phrase_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | ',' | ';' | ':' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '!' | '?'
            | '<' | '>' | '&' | '*' | '•' | '·'
    )
}

/// Splits text into the runs a skill alias may occupy.
///
/// A full stop followed by whitespace also ends a run, so "Python. SQL Server" keeps
/// "Python" apart from "SQL Server" while "Node.js" stays whole.
pub fn split_phrases(text: &str) -> Vec<&str> {
    let mut phrases = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        let sentence_end =
            c == '.' && chars.peek().map_or(true, |&(_, next)| next.is_whitespace());
        if is_phrase_break(c) || sentence_end {
            phrases.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    phrases.push(&text[start..]);
    phrases.retain(|phrase| !phrase.trim().is_empty());
    phrases
}

/// Splits one phrase into skill-matching tokens.
///
/// Punctuation that is part of skill names (`.`, `+`, `#`, `-`) is kept inside tokens;
/// whitespace, `/`, `|` and `\\` separate tokens of the same phrase. Trailing periods are
/// dropped so a skill at the end of a sentence still matches.
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c.is_whitespace() || matches!(c, '/' | '|' | '\\') || is_phrase_break(c))
        .map(|token| {
            token
                .trim_end_matches('.')
                .trim_matches(|c: char| c == '-' || c == '\'' || c == '’')
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Whitespace/punctuation-insensitive key for alias comparison.
///
/// Keeps alphanumerics plus `+` and `#` (so C, C++ and C# stay distinct) and a leading
/// `.` (so ".NET" does not collide with the word "net").
pub fn compact_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut key = String::with_capacity(trimmed.len());
    if trimmed.starts_with('.') {
        key.push('.');
    }
    for c in trimmed.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() || c == '+' || c == '#' {
            key.push(c);
        }
    }
    key
}
