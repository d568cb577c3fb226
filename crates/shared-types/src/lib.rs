pub mod catalog;
pub mod section;
pub mod types;

pub use catalog::{OrganizationType, ReadinessQuestion, INDUSTRIES, READINESS_QUESTIONS};
pub use section::{CompletedSections, ReportSection, SectionId};
pub use types::{OrganizationClassification, OrganizationProfile, ProfileError, ReadinessAnswers};
