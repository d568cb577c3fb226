use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{self, OrganizationType, OTHER_INDUSTRY, READINESS_QUESTIONS};

/// Reasons a profile cannot start the pipeline
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Industry 'Others' selected but no industry was specified")]
    UnspecifiedIndustry,

    #[error("Readiness question '{0}' has not been answered")]
    UnansweredQuestion(&'static str),

    #[error("Unknown readiness question: {0}")]
    UnknownQuestion(String),

    #[error("Answer '{answer}' is not an option for question '{question}'")]
    InvalidAnswer { question: String, answer: String },
}

/// Selected option per readiness question, keyed by question id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadinessAnswers(BTreeMap<String, String>);

impl ReadinessAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer by option text, replacing any previous answer
    pub fn answer(&mut self, question_id: &str, option: &str) -> Result<(), ProfileError> {
        let question = catalog::question(question_id)
            .ok_or_else(|| ProfileError::UnknownQuestion(question_id.to_string()))?;
        if !question.has_option(option) {
            return Err(ProfileError::InvalidAnswer {
                question: question_id.to_string(),
                answer: option.to_string(),
            });
        }
        self.0.insert(question_id.to_string(), option.to_string());
        Ok(())
    }

    /// Record an answer by zero-based option index
    pub fn answer_index(&mut self, question_id: &str, index: usize) -> Result<(), ProfileError> {
        let question = catalog::question(question_id)
            .ok_or_else(|| ProfileError::UnknownQuestion(question_id.to_string()))?;
        let option = question
            .options
            .get(index)
            .ok_or_else(|| ProfileError::InvalidAnswer {
                question: question_id.to_string(),
                answer: format!("option #{}", index + 1),
            })?;
        self.0.insert(question_id.to_string(), option.to_string());
        Ok(())
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Answers in questionnaire order, paired with the question prompt
    pub fn in_question_order(&self) -> Vec<(&'static str, &str)> {
        READINESS_QUESTIONS
            .iter()
            .filter_map(|q| self.get(q.id).map(|a| (q.prompt, a)))
            .collect()
    }

    fn validate(&self) -> Result<(), ProfileError> {
        for (id, answer) in &self.0 {
            let question =
                catalog::question(id).ok_or_else(|| ProfileError::UnknownQuestion(id.clone()))?;
            if !question.has_option(answer) {
                return Err(ProfileError::InvalidAnswer {
                    question: id.clone(),
                    answer: answer.clone(),
                });
            }
        }
        for question in READINESS_QUESTIONS.iter() {
            if self.get(question.id).is_none() {
                return Err(ProfileError::UnansweredQuestion(question.id));
            }
        }
        Ok(())
    }
}

/// Organization profile collected in the first questionnaire step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub name: String,
    /// Catalog industry or the user's own wording when "Others" was chosen
    pub industry: String,
    pub core_activities: String,
    #[serde(default)]
    pub answers: ReadinessAnswers,
}

impl OrganizationProfile {
    pub fn new(
        name: impl Into<String>,
        industry: impl Into<String>,
        core_activities: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            industry: industry.into(),
            core_activities: core_activities.into(),
            answers: ReadinessAnswers::new(),
        }
    }

    pub fn with_answers(mut self, answers: ReadinessAnswers) -> Self {
        self.answers = answers;
        self
    }

    /// Check the profile is complete enough to start generating
    pub fn validate(&self) -> Result<(), ProfileError> {
        if self.name.trim().is_empty() {
            return Err(ProfileError::MissingField("name"));
        }
        if self.industry.trim().is_empty() {
            return Err(ProfileError::MissingField("industry"));
        }
        if self.industry.trim() == OTHER_INDUSTRY {
            return Err(ProfileError::UnspecifiedIndustry);
        }
        if self.core_activities.trim().is_empty() {
            return Err(ProfileError::MissingField("core_activities"));
        }
        self.answers.validate()
    }

    /// JSON rendering used inside generation prompts
    ///
    /// Readiness answers are keyed by the full question text so the model
    /// sees what each answer refers to.
    pub fn prompt_context(&self, classification: Option<&OrganizationClassification>) -> String {
        let responses: serde_json::Map<String, serde_json::Value> = self
            .answers
            .in_question_order()
            .into_iter()
            .map(|(q, a)| (q.to_string(), serde_json::Value::String(a.to_string())))
            .collect();

        let mut context = serde_json::json!({
            "organization_name": self.name,
            "industry": self.industry,
            "core_activities": self.core_activities,
            "esg_responses": responses,
        });
        if let Some(classification) = classification {
            context["organization_types"] = serde_json::json!(classification
                .types()
                .iter()
                .map(|t| t.label())
                .collect::<Vec<_>>());
            if !classification.other_frameworks().is_empty() {
                context["other_frameworks"] = serde_json::json!(classification.other_frameworks());
            }
        }
        serde_json::to_string_pretty(&context).unwrap_or_else(|_| context.to_string())
    }
}

/// Organization types chosen in the framework-selection step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationClassification {
    types: Vec<OrganizationType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    other_frameworks: Vec<String>,
}

impl OrganizationClassification {
    /// Build a classification; duplicate types are dropped, order kept.
    /// Free-text frameworks are only retained when `Others` is selected.
    pub fn new(types: impl IntoIterator<Item = OrganizationType>, other_frameworks: Vec<String>) -> Self {
        let mut unique = Vec::new();
        for t in types {
            if !unique.contains(&t) {
                unique.push(t);
            }
        }
        let other_frameworks = if unique.contains(&OrganizationType::Others) {
            other_frameworks
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect()
        } else {
            Vec::new()
        };
        Self {
            types: unique,
            other_frameworks,
        }
    }

    pub fn types(&self) -> &[OrganizationType] {
        &self.types
    }

    pub fn other_frameworks(&self) -> &[String] {
        &self.other_frameworks
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Frameworks for one selected type, including free text for `Others`
    pub fn frameworks_for(&self, org_type: OrganizationType) -> Vec<String> {
        let mut frameworks: Vec<String> =
            org_type.frameworks().iter().map(|f| f.to_string()).collect();
        if org_type == OrganizationType::Others {
            frameworks.extend(self.other_frameworks.iter().cloned());
        }
        frameworks
    }

    /// De-duplicated union of frameworks across all selected types
    pub fn frameworks(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for t in &self.types {
            for framework in self.frameworks_for(*t) {
                if !all.contains(&framework) {
                    all.push(framework);
                }
            }
        }
        all
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn org_type() -> impl Strategy<Value = OrganizationType> {
        (0..OrganizationType::ALL.len()).prop_map(|i| OrganizationType::ALL[i])
    }

    proptest! {
        #[test]
        fn frameworks_are_a_duplicate_free_union(
            types in proptest::collection::vec(org_type(), 0..8),
            extra in proptest::collection::vec("[A-Za-z ]{0,12}", 0..3),
        ) {
            let classification = OrganizationClassification::new(types.clone(), extra);
            let all = classification.frameworks();

            let mut unique = all.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), all.len());

            for t in &types {
                for framework in t.frameworks() {
                    prop_assert!(all.iter().any(|f| f == framework));
                }
            }
        }
    }
}
