use enough::StopReason;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Format not found: {0}")]
    FormatNotFound(String),

    #[error("Render cancelled ({0:?})")]
    Cancelled(StopReason),

    #[error("Failed to read input: {0}")]
    InputReadError(String),

    #[error("Failed to write output: {0}")]
    OutputWriteError(String),

    #[error("Failed to encode output image: {0}")]
    EncodeError(String),

    #[error("Render worker failed: {0}")]
    WorkerFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl RenderError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Cancellation is "no error, no result" for callers, not a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

impl From<StopReason> for RenderError {
    fn from(reason: StopReason) -> Self {
        Self::Cancelled(reason)
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
