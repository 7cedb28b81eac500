//! Error types for the rendering pipeline and its collaborators

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering Markdown to an image
///
/// Every variant is terminal for the current pipeline run: nothing is retried
/// internally except individual readiness polls, and the next invocation
/// always starts from a fresh surface.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to launch or initialize the render surface
    #[error("Surface initialization failed: {0}")]
    Init(String),

    /// The composed document failed to load (bad resource, navigation error)
    #[error("Failed to load document: {0}")]
    LoadFailure(String),

    /// The document-load event did not fire within the load deadline
    #[error("Document load timed out after {0}ms")]
    LoadTimeout(u64),

    /// The readiness flag never became true within the polling ceiling
    #[error("Timed out waiting for markdown to render ({0}ms)")]
    RenderTimeout(u64),

    /// The content container element was not found in the document
    #[error("Container not found")]
    ContainerNotFound,

    /// The captured raster (or the resulting crop) had zero area
    #[error("Capture produced an empty image")]
    CaptureEmpty,

    /// The end-to-end wall-clock budget was exceeded
    #[error("Render timed out after {0}ms")]
    OverallTimeout(u64),

    /// A pipeline run is already in flight for this renderer
    #[error("A conversion is already in progress")]
    Busy,

    /// Input text was empty or whitespace-only (rejected before the pipeline)
    #[error("Input text is empty")]
    EmptyInput,

    /// Script evaluation inside the surface failed
    #[error("Script evaluation failed: {0}")]
    Script(String),

    /// Failed to decode or encode the captured raster
    #[error("Image processing failed: {0}")]
    Image(String),

    /// Chat-completion request failed
    #[error("Chat request failed: {0}")]
    Chat(String),

    /// Invalid or unreadable settings
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

// `headless_chrome` surfaces anyhow errors from every tab operation.
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Other(err.to_string())
    }
}
