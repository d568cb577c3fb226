//! Report sections produced by the generation pipeline

use serde::{Deserialize, Serialize};

/// Identifier of one generated report section, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    InitialAssessment,
    FrameworkAnalysis,
    ManagementIssues,
    IssueRationale,
    ImplementationChallenges,
    AdvisoryPlan,
    SroiModel,
}

impl SectionId {
    pub const ALL: [SectionId; 7] = [
        SectionId::InitialAssessment,
        SectionId::FrameworkAnalysis,
        SectionId::ManagementIssues,
        SectionId::IssueRationale,
        SectionId::ImplementationChallenges,
        SectionId::AdvisoryPlan,
        SectionId::SroiModel,
    ];

    /// Zero-based position in the pipeline
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn from_index(index: usize) -> Option<SectionId> {
        Self::ALL.get(index).copied()
    }

    /// Heading used for the section in the rendered report
    pub fn title(&self) -> &'static str {
        match self {
            SectionId::InitialAssessment => "ESG Initial Assessment",
            SectionId::FrameworkAnalysis => "Framework Analysis",
            SectionId::ManagementIssues => "Management Issues",
            SectionId::IssueRationale => "Issue Rationale",
            SectionId::ImplementationChallenges => "Implementation Challenges",
            SectionId::AdvisoryPlan => "Advisory Plan",
            SectionId::SroiModel => "SROI Analysis",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            SectionId::InitialAssessment => "initial-assessment",
            SectionId::FrameworkAnalysis => "framework-analysis",
            SectionId::ManagementIssues => "management-issues",
            SectionId::IssueRationale => "issue-rationale",
            SectionId::ImplementationChallenges => "implementation-challenges",
            SectionId::AdvisoryPlan => "advisory-plan",
            SectionId::SroiModel => "sroi-model",
        }
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// A generated section; text is `None` until its stage succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    pub id: SectionId,
    pub title: String,
    pub text: Option<String>,
}

impl ReportSection {
    pub fn pending(id: SectionId) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            text: None,
        }
    }

    pub fn is_produced(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }
}

/// All seven sections with text, ready for rendering
///
/// Only constructible when every section has been produced, so the
/// renderer never sees a partial bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedSections {
    sections: Vec<ReportSection>,
}

impl CompletedSections {
    /// Returns the first missing section id when the bundle is incomplete
    pub fn try_from_sections(sections: &[ReportSection]) -> Result<Self, SectionId> {
        let mut ordered = Vec::with_capacity(SectionId::ALL.len());
        for id in SectionId::ALL {
            let section = sections
                .iter()
                .find(|s| s.id == id && s.is_produced())
                .ok_or(id)?;
            ordered.push(section.clone());
        }
        Ok(Self { sections: ordered })
    }

    /// Sections in report order, each paired with its text
    pub fn iter(&self) -> impl Iterator<Item = (&ReportSection, &str)> {
        self.sections
            .iter()
            .map(|s| (s, s.text.as_deref().unwrap_or_default()))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
