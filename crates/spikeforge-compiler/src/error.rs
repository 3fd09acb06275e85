//! Error types for model building and generation

use spikeforge_ir::{ErrorKind, IrError};
use spikeforge_runtime::RuntimeError;
use thiserror::Error;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Errors raised while building, generating or driving a model
#[derive(Error, Debug)]
pub enum CompilerError {
    /// Catalog or type description error
    #[error("Catalog error: {0}")]
    Ir(#[from] IrError),

    /// Runtime layer error
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Neuron type not registered
    #[error("Unknown neuron type '{name}'")]
    UnknownType {
        /// Requested type name
        name: String,
    },

    /// Group name already used in the model
    #[error("Group name '{name}' is already in use")]
    DuplicateName {
        /// Offending name
        name: String,
    },

    /// Group size not positive
    #[error("Group '{name}' must contain at least one neuron, got {count}")]
    InvalidCount {
        /// Group name
        name: String,
        /// Requested count
        count: u32,
    },

    /// Unknown group, variable or constant
    #[error("{what} '{name}' not found")]
    NotFound {
        /// Kind of object looked up
        what: &'static str,
        /// Requested name
        name: String,
    },

    /// Index outside its valid range
    #[error("{what} index {index} out of range for group '{group}' (len {len})")]
    OutOfRange {
        /// Indexed collection
        what: &'static str,
        /// Group the index applies to
        group: String,
        /// Offending index
        index: u64,
        /// Collection length
        len: u64,
    },

    /// Destination slot already bound
    #[error("Slot {slot} of synapse type {syn_type} on neuron {neuron} of group '{group}' is already connected")]
    SlotOccupied {
        /// Destination group
        group: String,
        /// Destination neuron
        neuron: u32,
        /// Destination synapse type
        syn_type: u32,
        /// Destination slot
        slot: u32,
    },

    /// Synapse type has no free slot left
    #[error("Synapse type {syn_type} on neuron {neuron} of group '{group}' has no free slot (capacity {capacity})")]
    SlotsExhausted {
        /// Destination group
        group: String,
        /// Destination neuron
        neuron: u32,
        /// Destination synapse type
        syn_type: u32,
        /// Slot capacity
        capacity: u32,
    },

    /// Connector not registered
    #[error("Unknown connector '{name}'")]
    UnknownConnector {
        /// Requested connector
        name: String,
    },

    /// Connector argument unknown or missing
    #[error("Connector '{connector}': {reason} argument '{key}'")]
    UnknownArgument {
        /// Connector name
        connector: String,
        /// Argument key
        key: String,
        /// "unknown" or "missing required"
        reason: &'static str,
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

    /// Structural change after generation
    #[error("Cannot {operation}: model has already been generated")]
    ModelAlreadyGenerated {
        /// Attempted operation
        operation: &'static str,
    },

    /// Model cannot be compiled
    #[error("Generation failed: {reason}")]
    Generation {
        /// Reason for failure
        reason: String,
    },

    /// Operation needs a generated model
    #[error("Cannot {operation}: model has not been generated")]
    NotGenerated {
        /// Attempted operation
        operation: &'static str,
    },

    /// Configuration error
    #[error("Configuration error: {reason}")]
    Config {
        /// Reason for failure
        reason: String,
    },

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompilerError {
    /// Create a not found error
    pub fn not_found(what: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            name: name.into(),
        }
    }

    /// Create an out of range error
    pub fn out_of_range(what: &'static str, group: impl Into<String>, index: impl Into<u64>, len: impl Into<u64>) -> Self {
        Self::OutOfRange {
            what,
            group: group.into(),
            index: index.into(),
            len: len.into(),
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

    /// Create a generation error
    pub fn generation(reason: impl Into<String>) -> Self {
        Self::Generation {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Error classification
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompilerError::Ir(e) => e.kind(),
            CompilerError::Runtime(e) => e.kind(),
            CompilerError::UnknownType { .. } => ErrorKind::UnknownType,
            CompilerError::DuplicateName { .. } => ErrorKind::DuplicateName,
            CompilerError::InvalidCount { .. } => ErrorKind::InvalidCount,
            CompilerError::NotFound { .. } => ErrorKind::NotFound,
            CompilerError::OutOfRange { .. } => ErrorKind::OutOfRange,
            CompilerError::SlotOccupied { .. } => ErrorKind::SlotOccupied,
            CompilerError::SlotsExhausted { .. } => ErrorKind::SlotsExhausted,
            CompilerError::UnknownConnector { .. } => ErrorKind::UnknownConnector,
            CompilerError::UnknownArgument { .. } => ErrorKind::UnknownArgument,
            CompilerError::InvalidParameter { .. } | CompilerError::Config { .. } | CompilerError::Io(_) => {
                ErrorKind::InvalidParameter
            }
            CompilerError::ModelAlreadyGenerated { .. } => ErrorKind::ModelAlreadyGenerated,
            CompilerError::Generation { .. } => ErrorKind::GenerationError,
            CompilerError::NotGenerated { .. } => ErrorKind::NotReady,
        }
    }
}
