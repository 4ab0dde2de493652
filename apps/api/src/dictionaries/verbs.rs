use std::collections::{BTreeMap, HashMap};

use crate::dictionaries::DictionaryError;

/// Action verbs keyed by every inflection ("led" → "lead").
#[derive(Debug, Clone)]
pub struct ActionVerbDictionary {
    forms: HashMap<String, String>,
    canonical_count: usize,
}

impl ActionVerbDictionary {
    pub fn new(raw: BTreeMap<String, Vec<String>>) -> Result<Self, DictionaryError> {
        if raw.is_empty() {
            return Err(DictionaryError::Empty("action_verbs".to_string()));
        }

        let canonical_count = raw.len();
        let mut forms: HashMap<String, String> = HashMap::new();
        for (canonical, inflections) in raw {
            let canonical = canonical.trim().to_lowercase();
            for form in std::iter::once(canonical.clone()).chain(inflections) {
                let form = form.trim().to_lowercase();
                match forms.get(&form) {
                    Some(owner) if owner != &canonical => {
                        return Err(DictionaryError::AmbiguousAlias {
                            alias: form,
                            first: owner.clone(),
                            second: canonical,
                        });
                    }
                    Some(_) => {}
                    None => {
                        forms.insert(form, canonical.clone());
                    }
                }
            }
        }

        Ok(ActionVerbDictionary {
            forms,
            canonical_count,
        })
    }

    /// Canonical verb for a lowercase word, if it is an action verb form.
    pub fn canonical_for(&self, word: &str) -> Option<&str> {
        self.forms.get(word).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.canonical_count
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inflections_resolve_to_canonical() {
        let mut raw = BTreeMap::new();
        raw.insert("lead".to_string(), vec!["led".to_string(), "Leading".to_string()]);
        let dict = ActionVerbDictionary::new(raw).unwrap();

        assert_eq!(dict.canonical_for("led"), Some("lead"));
        assert_eq!(dict.canonical_for("leading"), Some("lead"));
        assert_eq!(dict.canonical_for("lead"), Some("lead"));
        assert_eq!(dict.canonical_for("followed"), None);
    }

    #[test]
    fn test_shared_inflection_is_rejected() {
        let mut raw = BTreeMap::new();
        raw.insert("lead".to_string(), vec!["led".to_string()]);
        raw.insert("guide".to_string(), vec!["led".to_string()]);
        assert!(matches!(
            ActionVerbDictionary::new(raw),
            Err(DictionaryError::AmbiguousAlias { .. })
        ));
    }
}
