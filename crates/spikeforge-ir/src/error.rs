//! Error types for the neuron type catalog

use core::fmt;
use thiserror::Error;

/// Result type for catalog and type-description operations
pub type Result<T> = std::result::Result<T, IrError>;

/// Closed classification of every failure the engine can report.
///
/// Each crate keeps its own error enum with descriptive payloads; all of them
/// map onto one of these kinds through a `kind()` method so callers can branch
/// without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown name, type, group or variable
    NotFound,
    /// Name already taken
    DuplicateName,
    /// Index outside the valid range
    OutOfRange,
    /// Destination or source slot already bound
    SlotOccupied,
    /// No free slot left for the synapse type
    SlotsExhausted,
    /// Connector name not registered
    UnknownConnector,
    /// Connector argument key not recognised or missing
    UnknownArgument,
    /// Structural mutation after generation
    ModelAlreadyGenerated,
    /// Inconsistent or unsupported compile request
    GenerationError,
    /// Scheduling before generation/initialization
    NotReady,
    /// Non-advancing run target
    InvalidTarget,
    /// Unsupported recorder signal selection
    InvalidFlags,
    /// Neuron type name not registered in the catalog
    UnknownType,
    /// Group neuron count not positive
    InvalidCount,
    /// Numeric parameter outside its domain
    InvalidParameter,
    /// Handle refers to a destroyed object or another model
    StaleHandle,
    /// Neuron type already bound by a group
    TypeInUse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors raised while describing or registering neuron types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    /// Neuron type not found in the catalog
    #[error("Neuron type '{name}' not found")]
    TypeNotFound {
        /// Requested type name
        name: String,
    },

    /// Neuron type registered twice
    #[error("Neuron type '{name}' is already registered")]
    DuplicateType {
        /// Offending type name
        name: String,
    },

    /// Two entries with one name inside a type
    #[error("Duplicate {what} '{name}' in neuron type '{type_name}'")]
    DuplicateMember {
        /// Kind of entry (state variable, constant, ...)
        what: &'static str,
        /// Entry name
        name: String,
        /// Owning type
        type_name: String,
    },

    /// Type description missing a required part
    #[error("Invalid neuron type '{type_name}': {reason}")]
    InvalidType {
        /// Type name
        type_name: String,
        /// Reason for rejection
        reason: String,
    },

    /// Type cannot change because a group uses it
    #[error("Neuron type '{name}' is bound by {groups} group(s) and cannot be modified")]
    TypeInUse {
        /// Type name
        name: String,
        /// Number of outstanding bindings
        groups: usize,
    },
}

impl IrError {
    /// Create an invalid type error
    pub fn invalid_type(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidType {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a duplicate member error
    pub fn duplicate_member(
        what: &'static str,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self::DuplicateMember {
            what,
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            IrError::TypeNotFound { .. } => ErrorKind::NotFound,
            IrError::DuplicateType { .. } | IrError::DuplicateMember { .. } => {
                ErrorKind::DuplicateName
            }
            IrError::InvalidType { .. } => ErrorKind::InvalidParameter,
            IrError::TypeInUse { .. } => ErrorKind::TypeInUse,
        }
    }
}
