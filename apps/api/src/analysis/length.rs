use serde::Serialize;

use crate::analysis::experience::ExperienceLevel;
use crate::analysis::scoring::resume_length_score;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthCategory {
    Short,
    Good,
    Long,
    OverlyLong,
}

/// Expected word-count window for an experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthRange {
    pub min_words: usize,
    pub max_words: usize,
    /// Beyond `max_words` but still tolerable.
    pub long_words: usize,
}

impl LengthRange {
    pub fn for_level(level: ExperienceLevel) -> Self {
        let (min_words, max_words, long_words) = match level {
            ExperienceLevel::Fresher => (150, 300, 450),
            ExperienceLevel::Intermediate => (250, 450, 650),
            ExperienceLevel::Experienced => (350, 650, 900),
            ExperienceLevel::Senior => (450, 900, 1200),
        };
        LengthRange {
            min_words,
            max_words,
            long_words,
        }
    }

    pub fn categorize(&self, word_count: usize) -> LengthCategory {
        if word_count < self.min_words {
            LengthCategory::Short
        } else if word_count <= self.max_words {
            LengthCategory::Good
        } else if word_count <= self.long_words {
            LengthCategory::Long
        } else {
            LengthCategory::OverlyLong
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LengthAnalysis {
    pub word_count: usize,
    pub expected: LengthRange,
    pub category: LengthCategory,
    pub score: f64,
}

/// Whitespace-separated tokens.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn analyze_length(resume: &str, level: ExperienceLevel) -> LengthAnalysis {
    let word_count = count_words(resume);
    let expected = LengthRange::for_level(level);
    LengthAnalysis {
        word_count,
        expected,
        category: expected.categorize(word_count),
        score: resume_length_score(word_count, &expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_senior_tolerates_longer_resumes() {
        let fresher = LengthRange::for_level(ExperienceLevel::Fresher);
        let senior = LengthRange::for_level(ExperienceLevel::Senior);
        assert_eq!(fresher.categorize(800), LengthCategory::OverlyLong);
        assert_eq!(senior.categorize(800), LengthCategory::Good);
    }

    #[test]
    fn test_category_boundaries() {
        let range = LengthRange::for_level(ExperienceLevel::Intermediate);
        assert_eq!(range.categorize(249), LengthCategory::Short);
        assert_eq!(range.categorize(250), LengthCategory::Good);
        assert_eq!(range.categorize(450), LengthCategory::Good);
        assert_eq!(range.categorize(451), LengthCategory::Long);
        assert_eq!(range.categorize(651), LengthCategory::OverlyLong);
    }

    #[test]
    fn test_analyze_length_counts_words() {
        let analysis = analyze_length("one two  three\nfour", ExperienceLevel::Fresher);
        assert_eq!(analysis.word_count, 4);
        assert_eq!(analysis.category, LengthCategory::Short);
        // 100 * 4 / 150
        assert_eq!(analysis.score, 2.67);
    }
}
