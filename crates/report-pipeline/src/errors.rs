use std::time::Duration;

use shared_types::{ProfileError, SectionId};
use thiserror::Error;

/// Failures of the text generation service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("API key not found in environment variable {0}")]
    MissingApiKey(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("No organization type selected")]
    MissingSelection,

    #[error("Stage {stage} needs the {input} section first")]
    MissingInput { stage: SectionId, input: SectionId },

    #[error("Stage {stage} cannot run before stage {next}")]
    OutOfOrder { stage: SectionId, next: SectionId },

    #[error("Stage {stage} failed: {source}")]
    Service {
        stage: SectionId,
        #[source]
        source: ServiceError,
    },

    #[error("Pipeline halted at stage {stage}: {message}")]
    Halted { stage: SectionId, message: String },

    #[error("All stages have completed")]
    Complete,

    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),

    #[error("Profile cannot change once generation has produced output")]
    ProfileLocked,
}

/// Problems reading a saved session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Session file is inconsistent: {0}")]
    Corrupt(String),
}
