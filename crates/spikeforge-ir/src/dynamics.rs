//! Hosting traits for externally supplied neuron and synapse dynamics
//!
//! The engine never integrates equations itself. A neuron type carries a
//! [`NeuronDynamics`] object that advances one neuron by one (sub-)step, and
//! each synapse type carries a [`SynapseDynamics`] object that turns an
//! incoming event into a contribution to the destination neuron's input.
//!
//! Both object-safe traits are implemented automatically for any type that
//! implements the precision-generic [`Dynamics`] / [`SynapseKernel`] traits,
//! so a model author writes one generic `advance` and gets both single- and
//! double-precision kernels.

use core::fmt;

use crate::real::Real;

/// Largest number of event sources a neuron type may declare
pub const MAX_EVENT_SOURCES: usize = 64;

/// View of one neuron during one integration (sub-)step
#[derive(Debug)]
pub struct NeuronStep<'a, R: Real> {
    state: &'a mut [R],
    globals: &'a [R],
    constants: &'a [R],
    inputs: &'a [R],
    time: R,
    dt: R,
    substep: u32,
    emitted: u64,
    suggested_dt: Option<R>,
}

impl<'a, R: Real> NeuronStep<'a, R> {
    /// Build a step view; used by the execution engine
    pub fn new(
        state: &'a mut [R],
        globals: &'a [R],
        constants: &'a [R],
        inputs: &'a [R],
        time: R,
        dt: R,
        substep: u32,
    ) -> Self {
        Self {
            state,
            globals,
            constants,
            inputs,
            time,
            dt,
            substep,
            emitted: 0,
            suggested_dt: None,
        }
    }

    /// Value of state variable `index`
    #[inline]
    pub fn state(&self, index: usize) -> R {
        self.state[index]
    }

    /// Overwrite state variable `index`
    #[inline]
    pub fn set_state(&mut self, index: usize, value: R) {
        self.state[index] = value;
    }

    /// All state variables of this neuron
    #[inline]
    pub fn state_mut(&mut self) -> &mut [R] {
        self.state
    }

    /// Per-neuron global `index`
    #[inline]
    pub fn global(&self, index: usize) -> R {
        self.globals[index]
    }

    /// Group-wide constant `index`
    #[inline]
    pub fn constant(&self, index: usize) -> R {
        self.constants[index]
    }

    /// Input delivered to synapse type `syn_type` during the previous tick
    #[inline]
    pub fn input(&self, syn_type: usize) -> R {
        self.inputs[syn_type]
    }

    /// Sum of inputs over all synapse types
    pub fn total_input(&self) -> R {
        self.inputs.iter().fold(R::zero(), |acc, v| acc + *v)
    }

    /// Time at the start of this sub-step
    #[inline]
    pub fn time(&self) -> R {
        self.time
    }

    /// Length of this sub-step
    #[inline]
    pub fn dt(&self) -> R {
        self.dt
    }

    /// Index of this sub-step within the current global tick
    #[inline]
    pub fn substep(&self) -> u32 {
        self.substep
    }

    /// Whether this is the first sub-step of the tick.
    ///
    /// Delivered inputs are visible during every sub-step of a tick; models
    /// treating them as instantaneous pulses should consume them here.
    #[inline]
    pub fn is_first_substep(&self) -> bool {
        self.substep == 0
    }

    /// Report a threshold crossing of event source `source`.
    ///
    /// Sources at or beyond [`MAX_EVENT_SOURCES`] are ignored.
    #[inline]
    pub fn emit(&mut self, source: usize) {
        if let Some(bit) = u32::try_from(source).ok().and_then(|s| 1u64.checked_shl(s)) {
            self.emitted |= bit;
        }
    }

    /// Propose the length of the next sub-step (adaptive groups only)
    #[inline]
    pub fn suggest_dt(&mut self, dt: R) {
        self.suggested_dt = Some(dt);
    }

    /// Bit set of event sources that fired during this step
    #[inline]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Sub-step length proposed by the dynamics, if any
    #[inline]
    pub fn suggested_dt(&self) -> Option<R> {
        self.suggested_dt
    }
}

/// View of one neuron while its type's initialization hook runs
#[derive(Debug)]
pub struct NeuronInit<'a, R: Real> {
    /// Neuron index within its group
    pub index: u32,
    /// State variables, already reset to their declared initial values
    pub state: &'a mut [R],
    /// Per-neuron globals
    pub globals: &'a [R],
    /// Group constants
    pub constants: &'a [R],
}

/// View of one synaptic slot while an event is applied to it
#[derive(Debug)]
pub struct SynapseEvent<'a, R: Real> {
    /// Per-slot state variables of the synapse
    pub slot_state: &'a mut [R],
    /// Constants of the destination group
    pub constants: &'a [R],
    /// Time at which the triggering crossing happened
    pub time: R,
}

/// Precision-generic neuron dynamics, written once by the model author
pub trait Dynamics: Send + Sync + fmt::Debug {
    /// Advance one neuron by `step.dt()`
    fn advance<R: Real>(&self, step: &mut NeuronStep<'_, R>);

    /// Per-neuron initialization run by `init_run`
    fn initialize<R: Real>(&self, _init: &mut NeuronInit<'_, R>) {}
}

/// Precision-generic synapse event kernel
pub trait SynapseKernel: Send + Sync + fmt::Debug {
    /// Apply one event to a slot and return its contribution to the
    /// destination neuron's input for this synapse type
    fn on_event<R: Real>(&self, event: &mut SynapseEvent<'_, R>) -> R;
}

/// Object-safe form of [`Dynamics`] stored inside neuron types
pub trait NeuronDynamics: Send + Sync + fmt::Debug {
    /// Single-precision step
    fn advance_single(&self, step: &mut NeuronStep<'_, f32>);
    /// Double-precision step
    fn advance_double(&self, step: &mut NeuronStep<'_, f64>);
    /// Single-precision initialization
    fn initialize_single(&self, init: &mut NeuronInit<'_, f32>);
    /// Double-precision initialization
    fn initialize_double(&self, init: &mut NeuronInit<'_, f64>);
}

impl<T: Dynamics> NeuronDynamics for T {
    fn advance_single(&self, step: &mut NeuronStep<'_, f32>) {
        self.advance(step)
    }

    fn advance_double(&self, step: &mut NeuronStep<'_, f64>) {
        self.advance(step)
    }

    fn initialize_single(&self, init: &mut NeuronInit<'_, f32>) {
        self.initialize(init)
    }

    fn initialize_double(&self, init: &mut NeuronInit<'_, f64>) {
        self.initialize(init)
    }
}

/// Object-safe form of [`SynapseKernel`] stored inside synapse types
pub trait SynapseDynamics: Send + Sync + fmt::Debug {
    /// Single-precision event
    fn on_event_single(&self, event: &mut SynapseEvent<'_, f32>) -> f32;
    /// Double-precision event
    fn on_event_double(&self, event: &mut SynapseEvent<'_, f64>) -> f64;
}

impl<T: SynapseKernel> SynapseDynamics for T {
    fn on_event_single(&self, event: &mut SynapseEvent<'_, f32>) -> f32 {
        self.on_event(event)
    }

    fn on_event_double(&self, event: &mut SynapseEvent<'_, f64>) -> f64 {
        self.on_event(event)
    }
}
