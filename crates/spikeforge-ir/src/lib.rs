//! Neuron type descriptions for the spikeforge simulation engine
//!
//! This crate holds everything a model is declared from: neuron types with
//! their state, global, constant and synapse layouts, the catalog they are
//! registered in, the traits through which externally supplied dynamics are
//! hosted, and the precision abstraction the compiled image is generic over.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod dynamics;
pub mod error;
pub mod ids;
pub mod neuron_type;
pub mod real;
pub mod stock;

pub use catalog::Catalog;
pub use dynamics::{
    Dynamics, NeuronDynamics, NeuronInit, NeuronStep, SynapseDynamics, SynapseEvent,
    SynapseKernel, MAX_EVENT_SOURCES,
};
pub use error::{ErrorKind, IrError, Result};
pub use ids::{IdRange, NeuronId};
pub use neuron_type::{NeuronType, NeuronTypeBuilder, SlotCapacity, SynapseType, VarRef, VarSpec};
pub use real::{Precision, Real};
