use thiserror::Error;

/// Errors raised while generating solver scripts or decoding solver output.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A line does not match the expected token arity or type.
    #[error("Format error: {0}")]
    Format(String),

    /// A requested block marker is absent from the captured output.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A node, triangle or corner index is out of range.
    #[error("Index error: {0}")]
    Index(String),

    /// Invalid catalog parameterization or configuration.
    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
