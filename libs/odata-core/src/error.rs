use thiserror::Error;

/// Errors raised while building the formatter registry or parsing media types.
///
/// "No formatter matched" is deliberately absent: selection reports it as an
/// empty candidate list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("formatter configuration error: {0}")]
    Configuration(String),

    #[error("invalid media type: {0}")]
    InvalidMediaType(String),
}

pub type Result<T> = std::result::Result<T, Error>;
