//! ESG narrative generation
//!
//! A [`Session`] holds the organization profile, the selected organization
//! types and the seven report sections. A [`Pipeline`] fills the sections
//! one stage at a time through a [`TextGenerator`].

pub mod errors;
pub mod generator;
pub mod openai;
pub mod pipeline;
pub mod prompts;
pub mod session;

pub use errors::{PipelineError, ServiceError, SessionError};
pub use generator::{GenerateOptions, TextGenerator, WithTimeout, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use openai::{OpenAiClient, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL};
pub use pipeline::{Pipeline, StageOutcome};
pub use prompts::build_prompt;
pub use session::{Session, StageFailure};
