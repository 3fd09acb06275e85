//! Error types for the execution engine

use spikeforge_ir::ErrorKind;
use thiserror::Error;

use crate::scheduler::Phase;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised by the compiled image, scheduler and recorders
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Scheduling call issued in the wrong lifecycle phase
    #[error("Cannot {operation} while the model is {phase}")]
    NotReady {
        /// Attempted operation
        operation: &'static str,
        /// Current lifecycle phase
        phase: Phase,
    },

    /// Run target does not lie ahead of the current step
    #[error("Target step {target} is not after current step {current}")]
    InvalidTarget {
        /// Requested step
        target: u64,
        /// Current step
        current: u64,
    },

    /// Handle from another model or to a removed object
    #[error("Stale {what} handle")]
    StaleHandle {
        /// Kind of object the handle refers to
        what: &'static str,
    },

    /// Index outside its valid range
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        /// Indexed collection
        what: &'static str,
        /// Offending index
        index: u64,
        /// Collection length
        len: u64,
    },

    /// Unknown variable, constant or group name
    #[error("{what} '{name}' not found")]
    NotFound {
        /// Kind of object looked up
        what: &'static str,
        /// Requested name
        name: String,
    },

    /// Recorder signal selection not supported by the neuron's type
    #[error("Invalid recorder selection: {reason}")]
    InvalidFlags {
        /// Reason for rejection
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Lowered model description cannot be turned into an image
    #[error("Invalid image: {reason}")]
    InvalidImage {
        /// Reason for rejection
        reason: String,
    },

    /// Worker pool could not be created
    #[error("Thread pool error: {reason}")]
    ThreadPool {
        /// Reason for failure
        reason: String,
    },
}

impl RuntimeError {
    /// Create an out of range error
    pub fn out_of_range(what: &'static str, index: impl TryInto<u64>, len: impl TryInto<u64>) -> Self {
        Self::OutOfRange {
            what,
            index: index.try_into().unwrap_or(u64::MAX),
            len: len.try_into().unwrap_or(u64::MAX),
        }
    }

    /// Create a not found error
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    /// Create an invalid flags error
    pub fn invalid_flags(reason: impl Into<String>) -> Self {
        Self::InvalidFlags {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }

    /// Create an invalid image error
    pub fn invalid_image(reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            reason: reason.into(),
        }
    }

    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::NotReady { .. } => ErrorKind::NotReady,
            RuntimeError::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            RuntimeError::StaleHandle { .. } => ErrorKind::StaleHandle,
            RuntimeError::OutOfRange { .. } => ErrorKind::OutOfRange,
            RuntimeError::NotFound { .. } => ErrorKind::NotFound,
            RuntimeError::InvalidFlags { .. } => ErrorKind::InvalidFlags,
            RuntimeError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            RuntimeError::InvalidImage { .. } | RuntimeError::ThreadPool { .. } => {
                ErrorKind::GenerationError
            }
        }
    }
}
