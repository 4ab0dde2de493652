use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::analysis::sections::{Section, SectionKind};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+\d{1,3}[ .\-]?)?(?:\(\d{1,4}\)[ .\-]?)?\d(?:[ .\-]?\d){6,14}")
        .expect("valid phone regex")
});

/// "2019-2021", "2019 - 2021": year ranges that the phone pattern would otherwise accept.
static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:19|20)\d{2}\s*[\-.]\s*(?:19|20)\d{2}$").expect("valid year range regex")
});

const NAME_STOPLIST: &[&str] = &["resume", "curriculum vitae", "cv", "bio data", "biodata"];

/// Lines considered for the name when no section heading bounds the header block.
const UNBOUNDED_NAME_LINES: usize = 5;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Digits only, with a leading `+` when the number was written with a country code.
    pub phone: Option<String>,
}

/// Extracts contact fields. Each field is searched in the contact section, then the
/// header block, then the whole document. Absence is reported as `None`.
pub fn extract_contact(text: &str, sections: &[Section]) -> ContactInfo {
    let contact = sections.iter().find(|s| s.kind == SectionKind::Contact);
    let header = sections.iter().find(|s| s.kind == SectionKind::Header);
    let scopes: Vec<&str> = contact
        .into_iter()
        .chain(header)
        .map(|s| s.text.as_str())
        .chain(std::iter::once(text))
        .collect();

    let email = scopes.iter().find_map(|scope| find_email(scope));
    let phone = scopes.iter().find_map(|scope| find_phone(scope));
    let name = find_name(text, sections);

    ContactInfo { name, email, phone }
}

pub fn find_email(text: &str) -> Option<String> {
    EMAIL_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn find_phone(text: &str) -> Option<String> {
    PHONE_RE
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            let isolated = before.map_or(true, |c| !c.is_alphanumeric() && c != '/')
                && after.map_or(true, |c| !c.is_alphanumeric() && c != '/');
            isolated && !YEAR_RANGE_RE.is_match(m.as_str())
        })
        .find_map(|m| normalize_phone(m.as_str()))
}

/// Digits with an optional leading `+`; `None` outside the 7–15 digit payload.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if !(7..=15).contains(&digits.len()) {
        return None;
    }
    if raw.trim_start().starts_with('+') {
        Some(format!("+{digits}"))
    } else {
        Some(digits)
    }
}

fn find_name(text: &str, sections: &[Section]) -> Option<String> {
    let has_headings = sections.iter().any(|s| s.kind != SectionKind::Header);
    let candidates: Vec<&str> = match sections.iter().find(|s| s.kind == SectionKind::Header) {
        Some(header) if has_headings => header.text.lines().collect(),
        Some(_) => text.lines().take(UNBOUNDED_NAME_LINES).collect(),
        None => return None,
    };

    candidates
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| is_name_like(line))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn is_name_like(line: &str) -> bool {
    let lower = line.to_lowercase();
    if NAME_STOPLIST.contains(&lower.as_str()) {
        return false;
    }
    if line.chars().any(|c| c.is_ascii_digit() || c == '@' || c == '|' || c == ':')
        || lower.contains("http")
        || lower.contains("www.")
    {
        return false;
    }
    let words = line.split_whitespace().count();
    (1..=4).contains(&words)
        && line
            .split_whitespace()
            .all(|w| w.chars().all(|c| c.is_alphabetic() || matches!(c, '.' | '-' | '\'')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sections::detect_sections;
    use crate::dictionaries::Dictionaries;

    fn extract(text: &str) -> ContactInfo {
        let dicts = Dictionaries::builtin().unwrap();
        let sections = detect_sections(text, &dicts.sections);
        extract_contact(text, &sections)
    }

    #[test]
    fn test_extracts_all_fields_from_header() {
        let contact = extract("John Doe\njohn@example.com\n555-123-4567\nSkills: Python");
        assert_eq!(contact.name.as_deref(), Some("John Doe"));
        assert_eq!(contact.email.as_deref(), Some("john@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("5551234567"));
    }

    #[test]
    fn test_international_phone_formats() {
        assert_eq!(find_phone("Tel: +1 (555) 123-4567").as_deref(), Some("+15551234567"));
        assert_eq!(find_phone("+91 98765 43210").as_deref(), Some("+919876543210"));
        assert_eq!(find_phone("555.123.4567").as_deref(), Some("5551234567"));
    }

    #[test]
    fn test_year_ranges_and_short_numbers_are_not_phones() {
        assert_eq!(find_phone("2019-2021"), None);
        assert_eq!(find_phone("Room 12345"), None);
    }

    #[test]
    fn test_stoplisted_header_is_skipped_for_name() {
        let contact = extract("RESUME\nAda Lovelace\nada@example.org\nExperience\nAnalyst");
        assert_eq!(contact.name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let contact = extract("Experience\nBuilt things");
        assert_eq!(contact, ContactInfo::default());
    }

    #[test]
    fn test_contact_section_is_searched_first() {
        let text = "Jane Roe\nContact\njane@work.io\nSummary\nreach me at old@home.net";
        let contact = extract(text);
        assert_eq!(contact.email.as_deref(), Some("jane@work.io"));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let text = "Ana Silva\nana@example.com\n+44 20 7946 0958";
        assert_eq!(extract(text), extract(text));
    }
}
