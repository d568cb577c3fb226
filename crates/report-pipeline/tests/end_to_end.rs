//! Seven generated stages rendered into a finished report

use async_trait::async_trait;
use chrono::NaiveDate;
use report_engine::{render_report, ContactDetails, MemoryResources, RenderOptions, ReportDocument};
use report_pipeline::{GenerateOptions, Pipeline, ServiceError, Session, TextGenerator};
use shared_types::{
    OrganizationClassification, OrganizationProfile, OrganizationType, ReadinessAnswers,
    SectionId, READINESS_QUESTIONS,
};

/// Answers every prompt with a short structured narrative
struct Canned;

#[async_trait]
impl TextGenerator for Canned {
    async fn generate(&self, prompt: &str, _: &GenerateOptions) -> Result<String, ServiceError> {
        let first_line = prompt.lines().next().unwrap_or_default();
        Ok(format!(
            "## Overview\n{first_line}\n\n### Key Findings\n\
             1. Appoint an ESG lead\n2. Measure energy use\n\
             - Engage suppliers\n- Publish a policy\n\n\
             The organization should act on these points within the year."
        ))
    }
}

fn profile() -> OrganizationProfile {
    let mut answers = ReadinessAnswers::new();
    for (i, question) in READINESS_QUESTIONS.iter().enumerate() {
        answers.answer_index(question.id, i % 4).unwrap();
    }
    OrganizationProfile::new("Acme Holdings", "Energy and Utilities", "Solar farms")
        .with_answers(answers)
}

#[tokio::test]
async fn test_seven_stages_produce_a_full_report() {
    let classification = OrganizationClassification::new(
        [OrganizationType::PublicListedCompany, OrganizationType::GovernmentAgency],
        vec![],
    );
    let mut session = Session::new(profile()).unwrap();
    session.select_organization_types(classification.clone()).unwrap();

    let pipeline = Pipeline::new(Canned);
    let sections = pipeline.run_to_completion(&mut session).await.unwrap();
    assert_eq!(sections.len(), SectionId::ALL.len());
    assert_eq!(session.current_stage(), 7);

    let document = ReportDocument {
        profile: session.profile().clone(),
        classification,
        sections,
        contact: ContactDetails::default(),
        report_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
    };
    let options = RenderOptions::new(
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    );
    let report = render_report(&document, &MemoryResources::new(), &options).unwrap();

    // cover, contents, profile, seven sections, disclaimer, back page
    assert!(report.page_count >= 12, "only {} pages", report.page_count);
    assert!(!report.bytes.is_empty());
    assert_eq!(report.toc.len(), 8);

    let pdf = lopdf::Document::load_mem(&report.bytes).unwrap();
    assert_eq!(pdf.get_pages().len(), report.page_count);
}

#[tokio::test]
async fn test_saved_session_resumes_without_regenerating() {
    let mut session = Session::new(profile()).unwrap();
    session
        .select_organization_types(OrganizationClassification::new(
            [OrganizationType::Ngo],
            vec![],
        ))
        .unwrap();

    let pipeline = Pipeline::new(Canned);
    pipeline.advance(&mut session).await.unwrap();
    pipeline.advance(&mut session).await.unwrap();
    let saved = session.to_json().unwrap();

    let mut resumed = Session::from_json(&saved).unwrap();
    assert_eq!(resumed.next_stage(), Some(SectionId::ManagementIssues));
    let before = resumed.section_text(SectionId::InitialAssessment).map(String::from);
    pipeline.run_to_completion(&mut resumed).await.unwrap();
    assert_eq!(
        resumed.section_text(SectionId::InitialAssessment).map(String::from),
        before
    );
    assert!(resumed.is_complete());
}
