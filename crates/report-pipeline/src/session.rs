//! Explicit session context shared by the pipeline and its callers

use serde::{Deserialize, Serialize};
use shared_types::{
    CompletedSections, OrganizationClassification, OrganizationProfile, ReportSection, SectionId,
};
use tracing::{debug, warn};

use crate::errors::{PipelineError, SessionError};

/// A stage failure held on the session until the caller clears it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageFailure {
    pub stage: SectionId,
    pub message: String,
}

/// Everything one report run needs: the profile, the chosen organization
/// types, the seven sections and the stage marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    profile: OrganizationProfile,
    #[serde(default)]
    classification: Option<OrganizationClassification>,
    sections: Vec<ReportSection>,
    #[serde(default)]
    current_stage: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<StageFailure>,
}

impl Session {
    pub fn new(profile: OrganizationProfile) -> Result<Self, PipelineError> {
        profile.validate()?;
        Ok(Self {
            profile,
            classification: None,
            sections: SectionId::ALL.iter().map(|id| ReportSection::pending(*id)).collect(),
            current_stage: 0,
            failure: None,
        })
    }

    pub fn profile(&self) -> &OrganizationProfile {
        &self.profile
    }

    /// Replace the profile; refused once any section has been produced
    pub fn update_profile(&mut self, profile: OrganizationProfile) -> Result<(), PipelineError> {
        if self.sections.iter().any(ReportSection::is_produced) {
            return Err(PipelineError::ProfileLocked);
        }
        profile.validate()?;
        self.profile = profile;
        Ok(())
    }

    pub fn classification(&self) -> Option<&OrganizationClassification> {
        self.classification.as_ref()
    }

    /// Record the organization types chosen for the framework analysis
    ///
    /// A framework analysis that already exists is kept as it is.
    pub fn select_organization_types(
        &mut self,
        classification: OrganizationClassification,
    ) -> Result<(), PipelineError> {
        if classification.is_empty() {
            return Err(PipelineError::MissingSelection);
        }
        if self.section(SectionId::FrameworkAnalysis).is_produced() {
            warn!("Organization types changed after the framework analysis was generated; keeping the existing analysis");
        }
        self.classification = Some(classification);
        Ok(())
    }

    pub fn section(&self, id: SectionId) -> &ReportSection {
        &self.sections[id.index()]
    }

    /// Produced text of a section, `None` while it is pending
    pub fn section_text(&self, id: SectionId) -> Option<&str> {
        let section = self.section(id);
        if section.is_produced() {
            section.text.as_deref()
        } else {
            None
        }
    }

    pub fn sections(&self) -> &[ReportSection] {
        &self.sections
    }

    /// Number of sections produced without a gap from the first stage
    pub fn current_stage(&self) -> usize {
        self.current_stage
    }

    /// The stage `advance` will run next
    pub fn next_stage(&self) -> Option<SectionId> {
        SectionId::from_index(self.current_stage)
    }

    pub fn is_complete(&self) -> bool {
        self.next_stage().is_none()
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.failure.as_ref()
    }

    /// Forget a recorded failure so the stage may be attempted again
    pub fn clear_failure(&mut self) -> Option<StageFailure> {
        self.failure.take()
    }

    /// All seven sections, or the first one still missing
    pub fn completed_sections(&self) -> Result<CompletedSections, SectionId> {
        CompletedSections::try_from_sections(&self.sections)
    }

    pub(crate) fn record_output(&mut self, stage: SectionId, text: String) {
        let section = &mut self.sections[stage.index()];
        if section.is_produced() {
            return;
        }
        section.text = Some(text);
        self.current_stage = self.leading_produced();
    }

    pub(crate) fn record_failure(&mut self, stage: SectionId, message: String) {
        self.failure = Some(StageFailure { stage, message });
    }

    fn leading_produced(&self) -> usize {
        self.sections.iter().take_while(|s| s.is_produced()).count()
    }

    pub fn to_json(&self) -> Result<String, SessionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a saved session, checking it against the section catalog
    pub fn from_json(json: &str) -> Result<Self, SessionError> {
        let mut session: Session = serde_json::from_str(json)?;
        session
            .profile
            .validate()
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;

        if session.sections.len() != SectionId::ALL.len() {
            return Err(SessionError::Corrupt(format!(
                "expected {} sections, found {}",
                SectionId::ALL.len(),
                session.sections.len()
            )));
        }
        for (section, id) in session.sections.iter().zip(SectionId::ALL) {
            if section.id != id {
                return Err(SessionError::Corrupt(format!(
                    "section {} found where {} was expected",
                    section.id, id
                )));
            }
        }

        let stage = session.leading_produced();
        if stage != session.current_stage {
            debug!(stored = session.current_stage, actual = stage, "Recomputed current stage");
            session.current_stage = stage;
        }
        Ok(session)
    }
}
