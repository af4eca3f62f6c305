//! Failure classes shared by the console and HTTP surfaces.

use std::fmt;

use crate::extractor::ExtractError;
use crate::provider::ProviderError;

/// How a failed summarisation should be reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input file does not exist
    NotFound,
    /// The input file is not a readable PDF
    MalformedInput,
    /// Bad provider name, missing credential or an unusable provider reply
    InvalidRequest,
    /// The provider could not be reached
    Connection,
    /// Everything else
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::MalformedInput => "malformed input",
            ErrorKind::InvalidRequest => "invalid request",
            ErrorKind::Connection => "connection error",
            ErrorKind::Unexpected => "unexpected error",
        };
        f.write_str(label)
    }
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::NotFound(_) => ErrorKind::NotFound,
            ExtractError::Malformed(_) => ErrorKind::MalformedInput,
            ExtractError::Io(_) => ErrorKind::Unexpected,
        }
    }
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::UnsupportedProvider(_)
            | ProviderError::MissingCredential(_)
            | ProviderError::InvalidRequest(_)
            | ProviderError::InvalidResponse { .. } => ErrorKind::InvalidRequest,
            ProviderError::Connection { .. } => ErrorKind::Connection,
            ProviderError::Api { .. } | ProviderError::Client(_) => ErrorKind::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderKind;
    use std::path::PathBuf;

    #[test]
    fn extraction_failures_are_classified() {
        assert_eq!(
            ExtractError::NotFound(PathBuf::from("x.pdf")).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ExtractError::Malformed("bad xref".into()).kind(),
            ErrorKind::MalformedInput
        );
    }

    #[test]
    fn provider_failures_are_classified() {
        assert_eq!(
            ProviderError::UnsupportedProvider("x".into()).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(
            ProviderError::MissingCredential(ProviderKind::OpenAi).kind(),
            ErrorKind::InvalidRequest
        );
        assert_eq!(
            ProviderError::Connection {
                provider: ProviderKind::Ollama,
                message: "refused".into()
            }
            .kind(),
            ErrorKind::Connection
        );
        assert_eq!(
            ProviderError::Api {
                provider: ProviderKind::OpenAi,
                status: 500,
                body: String::new()
            }
            .kind(),
            ErrorKind::Unexpected
        );
    }
}
