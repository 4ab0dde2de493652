//! Section detection: splits resume text into labeled regions.
//!
//! A line opens a section only when one of the ordered [`HeadingRule`]s accepts it.
//! Text before the first recognized heading becomes the implicit `header` section.
//! A later heading of a family already seen is merged into the first section of
//! that family.

use serde::{Deserialize, Serialize};

use crate::dictionaries::sections::normalize_heading;
use crate::dictionaries::SectionKeywords;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Implicit leading block above the first recognized heading.
    Header,
    Contact,
    Summary,
    Skills,
    Education,
    Experience,
    Projects,
    Certifications,
    Other,
}

impl SectionKind {
    /// Sections a resume is expected to carry, in reporting order.
    pub const EXPECTED: [SectionKind; 7] = [
        SectionKind::Contact,
        SectionKind::Summary,
        SectionKind::Skills,
        SectionKind::Education,
        SectionKind::Experience,
        SectionKind::Projects,
        SectionKind::Certifications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Header => "header",
            SectionKind::Contact => "contact",
            SectionKind::Summary => "summary",
            SectionKind::Skills => "skills",
            SectionKind::Education => "education",
            SectionKind::Experience => "experience",
            SectionKind::Projects => "projects",
            SectionKind::Certifications => "certifications",
            SectionKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Section {
    pub kind: SectionKind,
    /// The heading line as written, `None` for the implicit header block.
    pub heading: Option<String>,
    pub text: String,
    /// Byte offsets into the analyzed text. For merged sections the span covers
    /// the first heading through the end of the last merged block.
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Heading rules in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingRule {
    /// The whole line is a section keyword: "EDUCATION", "Work Experience:".
    Standalone,
    /// Keyword followed by a colon with content on the same line: "Skills: Rust, Go".
    Inline,
    /// A short title-cased or all-caps line containing a keyword: "Relevant Projects".
    Decorated,
}

impl HeadingRule {
    pub const ORDERED: [HeadingRule; 3] = [
        HeadingRule::Standalone,
        HeadingRule::Inline,
        HeadingRule::Decorated,
    ];

    fn apply(&self, line: &str, keywords: &SectionKeywords) -> Option<HeadingMatch> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        match self {
            HeadingRule::Standalone => {
                if trimmed.chars().count() > 60 {
                    return None;
                }
                let normalized = normalize_heading(trimmed);
                if normalized.split(' ').count() > 6 {
                    return None;
                }
                keywords.match_heading(&normalized).map(|(kind, _)| HeadingMatch {
                    kind,
                    rule: *self,
                    body_start: None,
                    keyword_leads: true,
                })
            }
            HeadingRule::Inline => {
                let colon = line.find(':')?;
                let label = &line[..colon];
                if label.split_whitespace().count() > 4 {
                    return None;
                }
                let body_start = colon + 1;
                if line[body_start..].trim().is_empty() {
                    return None;
                }
                keywords
                    .match_heading(&normalize_heading(label))
                    .map(|(kind, _)| HeadingMatch {
                        kind,
                        rule: *self,
                        body_start: Some(body_start),
                        keyword_leads: true,
                    })
            }
            HeadingRule::Decorated => {
                if !looks_like_heading(trimmed) {
                    return None;
                }
                let normalized = normalize_heading(trimmed);
                keywords.find_within(&normalized).map(|(kind, keyword)| HeadingMatch {
                    kind,
                    rule: *self,
                    body_start: None,
                    keyword_leads: leads_with(&normalized, keyword),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingMatch {
    pub kind: SectionKind,
    pub rule: HeadingRule,
    /// Byte offset within the line where inline section content begins.
    pub body_start: Option<usize>,
    /// The section keyword is the line's first word(s) ("Projects and Talks", not
    /// "Head of Education Programs").
    pub keyword_leads: bool,
}

impl HeadingMatch {
    /// Inside Experience a title-case line that only mentions a keyword is a job title,
    /// so a decorated heading there must lead with its keyword or be all caps.
    fn opens_section(&self, line: &str, current: SectionKind) -> bool {
        self.rule != HeadingRule::Decorated
            || current != SectionKind::Experience
            || self.keyword_leads
            || is_all_caps(line)
    }
}

fn leads_with(normalized: &str, keyword: &str) -> bool {
    std::iter::once(keyword)
        .chain(keyword.strip_suffix('s'))
        .any(|k| {
            normalized
                .strip_prefix(k)
                .map_or(false, |rest| rest.is_empty() || rest.starts_with(' '))
        })
}

fn is_all_caps(line: &str) -> bool {
    let mut letters = line.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

/// First heading rule that accepts `line`, if any.
pub fn classify_line(line: &str, keywords: &SectionKeywords) -> Option<HeadingMatch> {
    HeadingRule::ORDERED
        .iter()
        .find_map(|rule| rule.apply(line, keywords))
}

const SMALL_WORDS: &[&str] = &["and", "of", "the", "for", "in", "&", "/", "-", "|"];

/// Short, unpunctuated, and either all-caps or title case.
fn looks_like_heading(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() || words.len() > 5 || line.chars().count() > 40 {
        return false;
    }
    if line.ends_with('.') || line.ends_with(',') || line.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if !line.chars().any(char::is_alphabetic) {
        return false;
    }
    if is_all_caps(line) {
        return true;
    }

    words.iter().all(|word| {
        SMALL_WORDS.contains(&word.to_lowercase().as_str())
            || word
                .chars()
                .find(|c| c.is_alphanumeric())
                .map_or(true, char::is_uppercase)
    })
}

struct OpenSection {
    kind: SectionKind,
    heading: Option<String>,
    start_offset: usize,
    body_offset: usize,
}

/// Splits `text` into ordered sections. Never fails; a document with no recognized
/// headings yields at most the implicit header section.
pub fn detect_sections(text: &str, keywords: &SectionKeywords) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = OpenSection {
        kind: SectionKind::Header,
        heading: None,
        start_offset: 0,
        body_offset: 0,
    };

    let mut offset = 0;
    for raw_line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += raw_line.len();
        let line = raw_line.trim_end_matches(['\n', '\r']);

        let Some(heading) = classify_line(line, keywords) else {
            continue;
        };
        if !heading.opens_section(line, current.kind) {
            continue;
        }

        close_section(&mut sections, text, &current, line_start);
        let heading_text = match heading.body_start {
            Some(body_start) => line[..body_start - 1].trim().to_string(),
            None => line.trim().to_string(),
        };
        current = OpenSection {
            kind: heading.kind,
            heading: Some(heading_text),
            start_offset: line_start,
            body_offset: match heading.body_start {
                Some(body_start) => line_start + body_start,
                None => offset,
            },
        };
    }
    close_section(&mut sections, text, &current, text.len());

    sections
}

fn close_section(sections: &mut Vec<Section>, text: &str, open: &OpenSection, end: usize) {
    let body = text[open.body_offset.min(end)..end].trim();

    if open.kind == SectionKind::Header {
        if !body.is_empty() {
            sections.push(Section {
                kind: SectionKind::Header,
                heading: None,
                text: body.to_string(),
                start_offset: open.start_offset,
                end_offset: end,
            });
        }
        return;
    }

    if let Some(existing) = sections.iter_mut().find(|s| s.kind == open.kind) {
        if !body.is_empty() {
            if !existing.text.is_empty() {
                existing.text.push('\n');
            }
            existing.text.push_str(body);
        }
        existing.end_offset = end;
        return;
    }

    sections.push(Section {
        kind: open.kind,
        heading: open.heading.clone(),
        text: body.to_string(),
        start_offset: open.start_offset,
        end_offset: end,
    });
}
