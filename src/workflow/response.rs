//! The sub-step outcome envelope.

use crate::error::{PolarisError, Result};

/// Outcome of one sub-step, or of a whole workflow.
///
/// Exactly one variant applies: a success carrying a payload, a success
/// without one, or a failure carrying its cause. Responses are never
/// partially successful.
#[derive(Debug)]
pub enum SubStepResponse<T> {
    /// Succeeded and produced data for the next sub-step.
    Success(T),

    /// Succeeded without producing data.
    SuccessEmpty,

    /// Failed; later sub-steps must not run.
    Failure(PolarisError),
}

impl<T> SubStepResponse<T> {
    /// Create a success response carrying `payload`.
    pub fn success(payload: T) -> Self {
        SubStepResponse::Success(payload)
    }

    /// Create a success response without payload.
    pub fn success_empty() -> Self {
        SubStepResponse::SuccessEmpty
    }

    /// Create a failure response.
    pub fn failure(cause: impl Into<PolarisError>) -> Self {
        SubStepResponse::Failure(cause.into())
    }

    /// Check if this response is a success, with or without payload.
    pub fn is_success(&self) -> bool {
        !self.is_failure()
    }

    /// Check if this response is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, SubStepResponse::Failure(_))
    }

    /// Check if this response is a success that carries a payload.
    pub fn has_payload(&self) -> bool {
        matches!(self, SubStepResponse::Success(_))
    }

    /// Borrow the payload of a successful response.
    ///
    /// # Panics
    ///
    /// Reading the payload of a failure is a programming error; check
    /// [`is_success`](Self::is_success) first or use
    /// [`into_result`](Self::into_result).
    #[track_caller]
    pub fn payload(&self) -> Option<&T> {
        match self {
            SubStepResponse::Success(payload) => Some(payload),
            SubStepResponse::SuccessEmpty => None,
            SubStepResponse::Failure(cause) => {
                panic!("payload read from a failed sub-step response: {cause}")
            }
        }
    }

    /// Borrow the cause of a failed response.
    pub fn cause(&self) -> Option<&PolarisError> {
        match self {
            SubStepResponse::Failure(cause) => Some(cause),
            _ => None,
        }
    }

    /// Convert into a `Result`, with `None` for a success without payload.
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            SubStepResponse::Success(payload) => Ok(Some(payload)),
            SubStepResponse::SuccessEmpty => Ok(None),
            SubStepResponse::Failure(cause) => Err(cause),
        }
    }

    /// Transform the payload of a successful response.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SubStepResponse<U> {
        match self {
            SubStepResponse::Success(payload) => SubStepResponse::Success(f(payload)),
            SubStepResponse::SuccessEmpty => SubStepResponse::SuccessEmpty,
            SubStepResponse::Failure(cause) => SubStepResponse::Failure(cause),
        }
    }
}

impl<T> From<Result<T>> for SubStepResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(payload) => SubStepResponse::Success(payload),
            Err(cause) => SubStepResponse::Failure(cause),
        }
    }
}
