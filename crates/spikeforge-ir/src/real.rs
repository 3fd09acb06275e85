//! Floating-point precision used by compiled images

use core::fmt;
use num_traits::{Float, FromPrimitive, ToPrimitive};

use crate::dynamics::{NeuronDynamics, NeuronInit, NeuronStep, SynapseDynamics, SynapseEvent};

/// Storage and arithmetic width of a compiled model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Precision {
    /// 32-bit floats for state, globals and arithmetic
    #[default]
    Single,
    /// 64-bit floats for state, globals and arithmetic
    Double,
}

impl Precision {
    /// Width of one scalar in bytes
    pub const fn width(self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precision::Single => write!(f, "single"),
            Precision::Double => write!(f, "double"),
        }
    }
}

/// Scalar type a compiled image is instantiated with.
///
/// Implemented for `f32` and `f64` only.
pub trait Real:
    Float + FromPrimitive + ToPrimitive + Default + fmt::Debug + Send + Sync + 'static
{
    /// Precision tag for this scalar
    const PRECISION: Precision;

    /// Convert from a host-side double
    fn from_host(value: f64) -> Self;

    /// Convert to a host-side double
    fn to_host(self) -> f64;

    /// Run a neuron step through the kernel of matching precision
    fn advance(dynamics: &dyn NeuronDynamics, step: &mut NeuronStep<'_, Self>);

    /// Run a neuron initialization hook of matching precision
    fn initialize(dynamics: &dyn NeuronDynamics, init: &mut NeuronInit<'_, Self>);

    /// Apply a synapse event through the kernel of matching precision
    fn on_event(kernel: &dyn SynapseDynamics, event: &mut SynapseEvent<'_, Self>) -> Self;
}

impl Real for f32 {
    const PRECISION: Precision = Precision::Single;

    #[inline]
    fn from_host(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_host(self) -> f64 {
        self as f64
    }

    #[inline]
    fn advance(dynamics: &dyn NeuronDynamics, step: &mut NeuronStep<'_, Self>) {
        dynamics.advance_single(step)
    }

    #[inline]
    fn initialize(dynamics: &dyn NeuronDynamics, init: &mut NeuronInit<'_, Self>) {
        dynamics.initialize_single(init)
    }

    #[inline]
    fn on_event(kernel: &dyn SynapseDynamics, event: &mut SynapseEvent<'_, Self>) -> Self {
        kernel.on_event_single(event)
    }
}

impl Real for f64 {
    const PRECISION: Precision = Precision::Double;

    #[inline]
    fn from_host(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_host(self) -> f64 {
        self
    }

    #[inline]
    fn advance(dynamics: &dyn NeuronDynamics, step: &mut NeuronStep<'_, Self>) {
        dynamics.advance_double(step)
    }

    #[inline]
    fn initialize(dynamics: &dyn NeuronDynamics, init: &mut NeuronInit<'_, Self>) {
        dynamics.initialize_double(init)
    }

    #[inline]
    fn on_event(kernel: &dyn SynapseDynamics, event: &mut SynapseEvent<'_, Self>) -> Self {
        kernel.on_event_double(event)
    }
}
