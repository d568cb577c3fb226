//! Prompt templates for the seven generation stages
//!
//! Each stage declares the sections it reads; a prompt is only built when
//! all of them are present, so the service is never called with a hole in
//! its context.

use shared_types::{OrganizationClassification, SectionId};

use crate::errors::PipelineError;
use crate::session::Session;

/// Target length of each section in words
pub fn word_target(stage: SectionId) -> u32 {
    match stage {
        SectionId::InitialAssessment => 730,
        SectionId::FrameworkAnalysis => 680,
        SectionId::ManagementIssues => 700,
        SectionId::IssueRationale => 750,
        SectionId::ImplementationChallenges => 700,
        SectionId::AdvisoryPlan => 700,
        SectionId::SroiModel => 700,
    }
}

/// Prior sections a stage feeds into its prompt, in prompt order
pub fn required_inputs(stage: SectionId) -> &'static [SectionId] {
    use SectionId::*;
    match stage {
        InitialAssessment | FrameworkAnalysis => &[],
        ManagementIssues => &[InitialAssessment, FrameworkAnalysis],
        IssueRationale => &[ManagementIssues, InitialAssessment, FrameworkAnalysis],
        ImplementationChallenges => &[InitialAssessment, FrameworkAnalysis, ManagementIssues],
        AdvisoryPlan => &[
            InitialAssessment,
            FrameworkAnalysis,
            ManagementIssues,
            IssueRationale,
            ImplementationChallenges,
        ],
        SroiModel => &[
            InitialAssessment,
            FrameworkAnalysis,
            ManagementIssues,
            IssueRationale,
            ImplementationChallenges,
            AdvisoryPlan,
        ],
    }
}

/// Whether the stage templates the organization profile into its prompt
fn uses_profile(stage: SectionId) -> bool {
    matches!(
        stage,
        SectionId::InitialAssessment
            | SectionId::FrameworkAnalysis
            | SectionId::AdvisoryPlan
            | SectionId::SroiModel
    )
}

/// Build the prompt for `stage` from the session's current contents
pub fn build_prompt(stage: SectionId, session: &Session) -> Result<String, PipelineError> {
    let classification = match stage {
        SectionId::FrameworkAnalysis => Some(
            session
                .classification()
                .filter(|c| !c.is_empty())
                .ok_or(PipelineError::MissingSelection)?,
        ),
        _ => session.classification(),
    };

    let prior = required_inputs(stage)
        .iter()
        .map(|input| {
            session
                .section_text(*input)
                .ok_or(PipelineError::MissingInput {
                    stage,
                    input: *input,
                })
        })
        .collect::<Result<Vec<_>, _>>()?
        .join("\n\n");

    let profile = if uses_profile(stage) {
        session.profile().prompt_context(classification)
    } else {
        String::new()
    };
    let words = word_target(stage);

    let prompt = match stage {
        SectionId::InitialAssessment => format!(
            "Based on this organization's profile and ESG readiness responses:\n{profile}\n\n\
             Provide a {words}-word analysis with specific references to the data provided, \
             formatted in narrative form with headers and paragraphs."
        ),
        SectionId::FrameworkAnalysis => {
            let sections = classification.map(framework_sections).unwrap_or_default();
            format!(
                "As an ESG consultant specializing in Malaysian standards and frameworks, provide a \
                 comprehensive analysis for an organization with multiple classifications:\n\n\
                 Organization Profile:\n{profile}\n\n\
                 This organization operates under multiple classifications:\n{sections}\n\
                 Please provide:\n\
                 1. A detailed analysis of how each framework applies to this specific organization\n\
                 2. Areas of overlap between different frameworks that create synergies\n\
                 3. Potential conflicts or challenges in implementing multiple framework requirements\n\
                 4. Recommendations for prioritizing and harmonizing framework implementation\n\
                 5. Specific examples of how the organization can benefit from its multi-framework approach\n\n\
                 Write in narrative form ({words} words) with headers and bullet points, including:\n\
                 - Supporting facts and figures\n\
                 - Specific references for each organization type\n\
                 - Cross-framework integration strategies\n\
                 - Implementation recommendations\n\n\
                 Focus on practical implementation while acknowledging the complexity of managing \
                 multiple frameworks."
            )
        }
        SectionId::ManagementIssues => format!(
            "Based on the previous analyses:\n{prior}\n\n\
             Generate a list of the top 10 issues or questions that Management should address.\n\
             Format as {words} words in narrative form with:\n\
             - Clear headers for key areas\n\
             - Bullet points identifying specific issues\n\
             - Supporting facts and figures\n\
             - Industry-specific references"
        ),
        SectionId::IssueRationale => format!(
            "Based on these management issues and previous analyses:\n{prior}\n\n\
             Provide a {words}-word explanation of why each issue needs to be addressed, with:\n\
             - Specific references to ESG guidelines and standards\n\
             - Industry best practices\n\
             - Supporting facts and figures\n\
             - Framework citations"
        ),
        SectionId::ImplementationChallenges => format!(
            "Based on the previous analyses:\n{prior}\n\n\
             Provide a {words}-word analysis of potential ESG implementation challenges covering:\n\
             1. Human Capital Availability and Expertise\n\
             2. Budgeting and Financial Resources\n\
             3. Infrastructure\n\
             4. Stakeholder Management\n\
             5. Regulatory Compliance\n\
             6. Other Challenges\n\n\
             Format in narrative form with supporting facts and specific references."
        ),
        SectionId::AdvisoryPlan => format!(
            "Based on all previous analyses:\n{profile}\n\n{prior}\n\n\
             ({words} words): Explain what the ESG Advisory team can do and how it can assist, \
             including:\n\
             - Implementation support methods\n\
             - Technical expertise areas\n\
             - Training programs\n\
             - Monitoring systems\n\n\
             Include supporting facts, figures, and statistical references."
        ),
        SectionId::SroiModel => format!(
            "Based on all previous analyses:\n{profile}\n\n{prior}\n\n\
             ({words} words): Provide a Social Return on Investment (SROI) model with:\n\
             1. Calculation Methodology:\n\
             - Explain SROI calculations using plain text (avoid mathematical notation)\n\
             - Example: \"For every 1 dollar invested, X value is generated\" instead of formulas\n\
             - Use clear, narrative descriptions of calculations\n\n\
             2. Financial Projections:\n\
             - Present numbers in plain text format\n\
             - Use clear currency formatting (e.g., \"RM 1,000\")\n\
             - Write ratios in plain language\n\n\
             3. Implementation Guidelines:\n\
             - Use clear, narrative text\n\
             - Avoid special characters or mathematical symbols\n\
             - Present steps in numbered format\n\n\
             Format all numerical examples in plain text with proper spacing."
        ),
    };
    Ok(prompt)
}

/// One block per selected type listing the frameworks it brings in
fn framework_sections(classification: &OrganizationClassification) -> String {
    classification
        .types()
        .iter()
        .map(|t| {
            let frameworks: Vec<String> = classification
                .frameworks_for(*t)
                .into_iter()
                .map(|f| format!("- {}", f))
                .collect();
            format!(
                "Organization Type: {}\nRelevant Frameworks:\n{}\n",
                t.label(),
                frameworks.join("\n")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{OrganizationProfile, OrganizationType, ReadinessAnswers, READINESS_QUESTIONS};

    fn session() -> Session {
        let mut answers = ReadinessAnswers::new();
        for q in READINESS_QUESTIONS.iter() {
            answers.answer_index(q.id, 2).unwrap();
        }
        Session::new(
            OrganizationProfile::new("Acme Holdings", "Insurance", "Underwriting")
                .with_answers(answers),
        )
        .unwrap()
    }

    #[test]
    fn test_initial_prompt_carries_profile() {
        let prompt = build_prompt(SectionId::InitialAssessment, &session()).unwrap();
        assert!(prompt.contains("Acme Holdings"));
        assert!(prompt.contains("Have you started formal ESG initiatives"));
        assert!(prompt.contains("730-word"));
    }

    #[test]
    fn test_framework_prompt_needs_selection() {
        let result = build_prompt(SectionId::FrameworkAnalysis, &session());
        assert_eq!(result, Err(PipelineError::MissingSelection));
    }

    #[test]
    fn test_framework_prompt_lists_each_type() {
        let mut session = session();
        session
            .select_organization_types(OrganizationClassification::new(
                [OrganizationType::Ngo, OrganizationType::Others],
                vec!["B Corp Certification".to_string()],
            ))
            .unwrap();
        let prompt = build_prompt(SectionId::FrameworkAnalysis, &session).unwrap();
        assert!(prompt.contains("Organization Type: NGO\nRelevant Frameworks:\n- Global Reporting Initiative (GRI)"));
        assert!(prompt.contains("Organization Type: Others"));
        assert!(prompt.contains("- B Corp Certification"));
        assert!(prompt.contains("(680 words)"));
    }

    #[test]
    fn test_later_stage_reports_first_missing_input() {
        let mut session = session();
        session.record_output(SectionId::InitialAssessment, "First analysis".to_string());
        let result = build_prompt(SectionId::ManagementIssues, &session);
        assert_eq!(
            result,
            Err(PipelineError::MissingInput {
                stage: SectionId::ManagementIssues,
                input: SectionId::FrameworkAnalysis,
            })
        );
    }

    #[test]
    fn test_rationale_puts_issues_first() {
        let mut session = session();
        session.record_output(SectionId::InitialAssessment, "ANALYSIS-ONE".to_string());
        session.record_output(SectionId::FrameworkAnalysis, "ANALYSIS-TWO".to_string());
        session.record_output(SectionId::ManagementIssues, "ISSUES".to_string());
        let prompt = build_prompt(SectionId::IssueRationale, &session).unwrap();
        let issues = prompt.find("ISSUES").unwrap();
        let one = prompt.find("ANALYSIS-ONE").unwrap();
        let two = prompt.find("ANALYSIS-TWO").unwrap();
        assert!(issues < one && one < two);
        assert!(!prompt.contains("Acme Holdings"));
    }

    #[test]
    fn test_each_stage_only_reads_earlier_sections() {
        for stage in SectionId::ALL {
            for input in required_inputs(stage) {
                assert!(input.index() < stage.index(), "{stage} reads {input}");
            }
        }
    }
}
