use thiserror::Error;

/// Fatal render failures; no partial document is returned with any of these
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Malformed block: {0}")]
    MalformedBlock(String),

    #[error("Layout failed: {0}")]
    Layout(String),

    #[error("PDF encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
