//! The seven-stage generation chain

use shared_types::{CompletedSections, SectionId};
use tracing::{info, warn};

use crate::errors::{PipelineError, ServiceError};
use crate::generator::{GenerateOptions, TextGenerator};
use crate::prompts;
use crate::session::Session;

/// What a stage invocation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Generated(SectionId),
    /// The section already had text; the service was not called
    AlreadyComplete(SectionId),
}

impl StageOutcome {
    pub fn stage(&self) -> SectionId {
        match self {
            StageOutcome::Generated(stage) | StageOutcome::AlreadyComplete(stage) => *stage,
        }
    }
}

/// Runs stages against a [`TextGenerator`], writing results into a session
///
/// Nothing is retried. A service failure is recorded on the session and
/// blocks further stages until [`Session::clear_failure`] is called.
pub struct Pipeline<G> {
    generator: G,
    options: GenerateOptions,
}

impl<G: TextGenerator> Pipeline<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            options: GenerateOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Produce one section
    ///
    /// A section that already has text is left alone. Only the session's
    /// next stage may be generated; later stages, missing inputs and a
    /// missing organization-type selection are reported without calling
    /// the service.
    pub async fn run_stage(
        &self,
        session: &mut Session,
        stage: SectionId,
    ) -> Result<StageOutcome, PipelineError> {
        if session.section(stage).is_produced() {
            return Ok(StageOutcome::AlreadyComplete(stage));
        }
        if let Some(next) = session.next_stage().filter(|next| *next != stage) {
            return Err(PipelineError::OutOfOrder { stage, next });
        }
        if let Some(failure) = session.failure() {
            return Err(PipelineError::Halted {
                stage: failure.stage,
                message: failure.message.clone(),
            });
        }

        let prompt = prompts::build_prompt(stage, session)?;
        info!(stage = %stage, position = stage.index() + 1, "Generating section");

        let result = match self.generator.generate(&prompt, &self.options).await {
            Ok(text) if text.trim().is_empty() => Err(ServiceError::MalformedResponse(
                "service returned empty text".to_string(),
            )),
            other => other,
        };

        match result {
            Ok(text) => {
                info!(stage = %stage, chars = text.len(), "Section generated");
                session.record_output(stage, text);
                Ok(StageOutcome::Generated(stage))
            }
            Err(source) => {
                warn!(stage = %stage, error = %source, "Generation failed");
                session.record_failure(stage, source.to_string());
                Err(PipelineError::Service { stage, source })
            }
        }
    }

    /// Run the session's next stage
    pub async fn advance(&self, session: &mut Session) -> Result<StageOutcome, PipelineError> {
        let stage = session.next_stage().ok_or(PipelineError::Complete)?;
        self.run_stage(session, stage).await
    }

    /// Advance until every section exists or a stage fails
    pub async fn run_to_completion(
        &self,
        session: &mut Session,
    ) -> Result<CompletedSections, PipelineError> {
        while session.next_stage().is_some() {
            self.advance(session).await?;
        }
        session
            .completed_sections()
            .map_err(|stage| PipelineError::Halted {
                stage,
                message: "section has no text".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use shared_types::{
        OrganizationClassification, OrganizationProfile, OrganizationType, ReadinessAnswers,
        READINESS_QUESTIONS,
    };
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every prompt it was given
    #[derive(Default)]
    struct Scripted {
        responses: Mutex<VecDeque<Result<String, ServiceError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn with(responses: impl IntoIterator<Item = Result<String, ServiceError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                prompts: Mutex::default(),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, prompt: &str, _: &GenerateOptions) -> Result<String, ServiceError> {
            let n = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("## Section {n}\nNarrative number {n}.")))
        }
    }

    fn session() -> Session {
        let mut answers = ReadinessAnswers::new();
        for q in READINESS_QUESTIONS.iter() {
            answers.answer_index(q.id, 1).unwrap();
        }
        Session::new(
            OrganizationProfile::new("Acme Holdings", "Retail and E-commerce", "Online grocery")
                .with_answers(answers),
        )
        .unwrap()
    }

    fn selected(mut session: Session) -> Session {
        session
            .select_organization_types(OrganizationClassification::new(
                [OrganizationType::SmeEnterprise, OrganizationType::Ngo],
                vec![],
            ))
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_completed_stage_is_not_regenerated() {
        let pipeline = Pipeline::new(Scripted::default());
        let mut session = session();

        let first = pipeline.run_stage(&mut session, SectionId::InitialAssessment).await;
        assert_eq!(first, Ok(StageOutcome::Generated(SectionId::InitialAssessment)));
        let text = session.section_text(SectionId::InitialAssessment).map(String::from);

        let second = pipeline.run_stage(&mut session, SectionId::InitialAssessment).await;
        assert_eq!(second, Ok(StageOutcome::AlreadyComplete(SectionId::InitialAssessment)));
        assert_eq!(pipeline.generator.calls(), 1);
        assert_eq!(session.section_text(SectionId::InitialAssessment).map(String::from), text);
    }

    #[tokio::test]
    async fn test_missing_selection_skips_the_service() {
        let pipeline = Pipeline::new(Scripted::default());
        let mut session = session();
        pipeline.advance(&mut session).await.unwrap();

        let result = pipeline.advance(&mut session).await;
        assert_eq!(result, Err(PipelineError::MissingSelection));
        assert_eq!(pipeline.generator.calls(), 1);
        assert!(session.failure().is_none());

        let mut session = selected(session);
        let result = pipeline.advance(&mut session).await;
        assert_eq!(result, Ok(StageOutcome::Generated(SectionId::FrameworkAnalysis)));
    }

    #[tokio::test]
    async fn test_later_stages_wait_their_turn() {
        let pipeline = Pipeline::new(Scripted::default());
        let mut session = selected(session());

        // Stage 2 needs no earlier text but still follows stage 1
        let result = pipeline.run_stage(&mut session, SectionId::FrameworkAnalysis).await;
        assert_eq!(
            result,
            Err(PipelineError::OutOfOrder {
                stage: SectionId::FrameworkAnalysis,
                next: SectionId::InitialAssessment,
            })
        );
        assert_eq!(pipeline.generator.calls(), 0);
        assert!(session.failure().is_none());

        for _ in 0..3 {
            pipeline.advance(&mut session).await.unwrap();
        }
        let result = pipeline.run_stage(&mut session, SectionId::AdvisoryPlan).await;
        assert_eq!(
            result,
            Err(PipelineError::OutOfOrder {
                stage: SectionId::AdvisoryPlan,
                next: SectionId::IssueRationale,
            })
        );
        assert_eq!(pipeline.generator.calls(), 3);
        assert_eq!(session.current_stage(), 3);

        let result = pipeline.run_stage(&mut session, SectionId::IssueRationale).await;
        assert_eq!(result, Ok(StageOutcome::Generated(SectionId::IssueRationale)));
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let pipeline = Pipeline::new(Scripted::default());
        let mut session = selected(session());

        let mut order = Vec::new();
        while !session.is_complete() {
            order.push(pipeline.advance(&mut session).await.unwrap().stage());
        }
        assert_eq!(order, SectionId::ALL.to_vec());
        assert_eq!(pipeline.advance(&mut session).await, Err(PipelineError::Complete));

        // Later prompts carry the earlier narratives
        let prompts = pipeline.generator.prompts.lock().unwrap();
        assert!(prompts[6].contains("Narrative number 6."));
        assert!(prompts[6].contains("Narrative number 1."));
    }

    #[tokio::test]
    async fn test_failure_halts_and_keeps_earlier_sections() {
        let pipeline = Pipeline::new(Scripted::with([
            Ok("Assessment".to_string()),
            Ok("Frameworks".to_string()),
            Err(ServiceError::Status {
                status: 429,
                body: "rate limited".to_string(),
            }),
        ]));
        let mut session = selected(session());

        let result = pipeline.run_to_completion(&mut session).await;
        assert!(matches!(
            result,
            Err(PipelineError::Service {
                stage: SectionId::ManagementIssues,
                ..
            })
        ));
        assert_eq!(session.current_stage(), 2);
        assert_eq!(session.section_text(SectionId::FrameworkAnalysis), Some("Frameworks"));
        assert!(session.section_text(SectionId::ManagementIssues).is_none());

        // Not retried until the caller clears the failure
        let result = pipeline.advance(&mut session).await;
        assert!(matches!(result, Err(PipelineError::Halted { stage: SectionId::ManagementIssues, .. })));
        assert_eq!(pipeline.generator.calls(), 3);

        let failure = session.clear_failure().unwrap();
        assert!(failure.message.contains("429"));
        let completed = pipeline.run_to_completion(&mut session).await.unwrap();
        assert_eq!(completed.len(), 7);
        assert_eq!(pipeline.generator.calls(), 8);
    }

    #[tokio::test]
    async fn test_empty_response_is_a_failure() {
        let pipeline = Pipeline::new(Scripted::with([Ok("   \n".to_string())]));
        let mut session = session();

        let result = pipeline.advance(&mut session).await;
        assert!(matches!(
            result,
            Err(PipelineError::Service {
                source: ServiceError::MalformedResponse(_),
                ..
            })
        ));
        assert!(session.section_text(SectionId::InitialAssessment).is_none());
        assert_eq!(session.failure().map(|f| f.stage), Some(SectionId::InitialAssessment));
    }
}
