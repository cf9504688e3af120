//! Size report for the text a crew run produced.

use std::fmt;

use serde::Serialize;

use crate::types::JobResult;

/// Rough quality band derived from the amount of generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentGrade {
    Excellent,
    Good,
    Moderate,
    Limited,
}

impl ContentGrade {
    pub fn from_chars(total: usize) -> Self {
        match total {
            n if n >= 1000 => Self::Excellent,
            n if n >= 500 => Self::Good,
            n if n >= 200 => Self::Moderate,
            _ => Self::Limited,
        }
    }
}

impl fmt::Display for ContentGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Limited => "limited",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSize {
    pub name: String,
    pub chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub sections: Vec<SectionSize>,
    pub total_chars: usize,
    pub grade: ContentGrade,
}

impl ResultSummary {
    /// Count characters per result section. A run that only returned a
    /// bare `output` is reported as a single `output` section.
    pub fn from_result(result: &JobResult) -> Self {
        let mut sections: Vec<SectionSize> = result
            .results
            .iter()
            .map(|(name, text)| SectionSize {
                name: name.clone(),
                chars: text.chars().count(),
            })
            .collect();
        if sections.is_empty() {
            if let Some(output) = &result.output {
                sections.push(SectionSize {
                    name: "output".to_string(),
                    chars: output.chars().count(),
                });
            }
        }
        let total_chars = sections.iter().map(|s| s.chars).sum();
        Self {
            sections,
            total_chars,
            grade: ContentGrade::from_chars(total_chars),
        }
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "  {}: {} chars", section.name, section.chars)?;
        }
        write!(f, "  total: {} chars ({})", self.total_chars, self.grade)
    }
}
