/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Error types for extraction operations
///
/// External tool failures are not represented here: they feed the
/// fallback policy in [`crate::tool`] and end the run quietly.
#[derive(Debug)]
pub enum ExtractError {
    /// Creating the output directory or writing a screenshot failed
    Io(std::io::Error),

    /// The bundle dump was not valid JSON
    Parse(serde_json::Error),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io(err) => write!(f, "I/O error: {}", err),
            ExtractError::Parse(err) => write!(f, "Malformed bundle dump: {}", err),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Io(err) => Some(err),
            ExtractError::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        ExtractError::Io(err)
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Parse(err)
    }
}
