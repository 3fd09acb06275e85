//! Execution engine for compiled spikeforge models
//!
//! This crate instantiates a lowered model description at single or double
//! precision, advances it in global ticks with optional per-group adaptive
//! sub-stepping, delivers synaptic events through one of two concurrency
//! strategies, and feeds per-neuron recorders.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub use spikeforge_ir::{NeuronId, Precision, Real};

pub mod arena;
pub mod delivery;
pub mod error;
pub mod image;
pub mod layout;
pub mod recorder;
pub mod scheduler;

pub use arena::{Arena, Handle, ModelId};
pub use delivery::DeliveryMode;
pub use error::{Result, RuntimeError};
pub use image::{CompiledImage, Crossing, GroupImage, Image};
pub use layout::{GroupSpec, ImageSpec, Projection, SlotValue};
pub use recorder::{Recorder, RecorderBank, RecorderId, Signal};
pub use scheduler::{Phase, Simulation};
