use fcstamp_core::HostError;
use thiserror::Error;

/// Failures of the generate/insert operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodeError {
    /// Passed through unchanged from the document host.
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("You have reached the maximum quantity of unique numbers.")]
    CapacityExhausted { existing: usize, max: usize },
    #[error("Unable to generate unique code. You may have reached the maximum quantity of unique numbers.")]
    GenerationExhausted { attempts: usize },
    #[error("Please generate a code first")]
    NoPendingCode,
    /// Host rejected the insertion as an invalid argument; callers suppress it.
    #[error("insertion ignored: {0}")]
    IgnorableInsertion(HostError),
    #[error("invalid code '{0}'")]
    InvalidCode(String),
}

impl CodeError {
    /// Whether the failure should reach the user's status area.
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, CodeError::IgnorableInsertion(_))
    }
}
