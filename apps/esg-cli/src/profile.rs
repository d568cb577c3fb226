//! Questionnaire answers read from a JSON or TOML file

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;
use shared_types::{
    OrganizationClassification, OrganizationProfile, OrganizationType, ReadinessAnswers,
};

/// An answer given either as the option's 1-based number or its exact text
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AnswerChoice {
    Number(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileFile {
    pub name: String,
    pub industry: String,
    pub core_activities: String,
    /// Keyed by readiness question id
    #[serde(default)]
    pub answers: BTreeMap<String, AnswerChoice>,
    /// Organization type labels or identifiers
    #[serde(default)]
    pub organization_types: Vec<String>,
    #[serde(default)]
    pub other_frameworks: Vec<String>,
}

impl ProfileFile {
    /// Parse by file extension; `.toml` is TOML, anything else JSON
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile: {}", path.display()))?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&content).context("Failed to parse TOML profile")
        } else {
            serde_json::from_str(&content).context("Failed to parse JSON profile")
        }
    }

    /// Build and validate the organization profile
    pub fn profile(&self) -> anyhow::Result<OrganizationProfile> {
        let mut answers = ReadinessAnswers::new();
        for (question, choice) in &self.answers {
            match choice {
                AnswerChoice::Number(0) => bail!("Answer numbers start at 1 (question '{question}')"),
                AnswerChoice::Number(n) => answers.answer_index(question, n - 1)?,
                AnswerChoice::Text(text) => answers.answer(question, text)?,
            }
        }
        let profile = OrganizationProfile::new(&self.name, &self.industry, &self.core_activities)
            .with_answers(answers);
        profile.validate()?;
        Ok(profile)
    }

    /// The selected organization types, `None` when the file names none
    pub fn classification(&self) -> anyhow::Result<Option<OrganizationClassification>> {
        if self.organization_types.is_empty() {
            return Ok(None);
        }
        let types = self
            .organization_types
            .iter()
            .map(|t| t.parse::<OrganizationType>().map_err(anyhow::Error::msg))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Some(OrganizationClassification::new(
            types,
            self.other_frameworks.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TOML_PROFILE: &str = r#"
        name = "Acme Holdings"
        industry = "Insurance"
        core_activities = "General insurance underwriting"
        organization_types = ["Financial Institution", "others"]
        other_frameworks = ["B Corp Certification"]

        [answers]
        initiatives = 2
        motivation = "To attract investors or access green funding."
        ownership = 1
        standards_awareness = 3
        impact_measurement = 4
        challenges = 2
    "#;

    #[test]
    fn test_toml_profile_builds() {
        let file: ProfileFile = toml::from_str(TOML_PROFILE).unwrap();
        let profile = file.profile().unwrap();
        assert_eq!(
            profile.answers.get("initiatives"),
            Some("Yes, we've started basic efforts but lack a structured plan.")
        );
        let classification = file.classification().unwrap().unwrap();
        assert_eq!(
            classification.types(),
            &[OrganizationType::FinancialInstitution, OrganizationType::Others]
        );
        assert!(classification
            .frameworks()
            .contains(&"B Corp Certification".to_string()));
    }

    #[test]
    fn test_json_profile_without_types() {
        let json = r#"{
            "name": "Acme",
            "industry": "Telecommunications",
            "core_activities": "Fibre",
            "answers": {"initiatives": 1, "motivation": 1, "ownership": 1,
                        "standards_awareness": 1, "impact_measurement": 1, "challenges": 1}
        }"#;
        let file: ProfileFile = serde_json::from_str(json).unwrap();
        assert!(file.profile().is_ok());
        assert_eq!(file.classification().unwrap(), None);
    }

    #[test]
    fn test_bad_answers_are_reported() {
        let mut file: ProfileFile = toml::from_str(TOML_PROFILE).unwrap();
        file.answers.insert("challenges".into(), AnswerChoice::Number(0));
        assert!(file.profile().is_err());

        file.answers.insert("challenges".into(), AnswerChoice::Number(9));
        assert!(file.profile().is_err());

        file.answers.remove("challenges");
        let err = file.profile().unwrap_err();
        assert!(err.to_string().contains("challenges"));
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let mut file: ProfileFile = toml::from_str(TOML_PROFILE).unwrap();
        file.organization_types.push("Cooperative".into());
        assert!(file.classification().is_err());
    }
}
