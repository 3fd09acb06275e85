//! Stock neuron and synapse models
//!
//! Ready-made dynamics plus constructors for the neuron types built on them.
//! Each constructor fixes the variable layout its dynamics reads by index.

use crate::dynamics::{Dynamics, NeuronInit, NeuronStep, SynapseEvent, SynapseKernel};
use crate::error::{IrError, Result};
use crate::neuron_type::{NeuronType, SlotCapacity, SynapseType};
use crate::real::Real;

/// Parameters for leaky integrate-and-fire neurons
#[derive(Debug, Clone, PartialEq)]
pub struct LifParams {
    /// Membrane time constant (ms)
    pub tau_m: f64,
    /// Resting potential (mV)
    pub v_rest: f64,
    /// Reset potential (mV)
    pub v_reset: f64,
    /// Threshold potential (mV)
    pub v_thresh: f64,
    /// Membrane resistance (MΩ)
    pub r_m: f64,
}

impl Default for LifParams {
    fn default() -> Self {
        Self {
            tau_m: 20.0,     // 20ms membrane time constant
            v_rest: -70.0,   // -70mV resting potential
            v_reset: -70.0,  // -70mV reset potential
            v_thresh: -50.0, // -50mV threshold
            r_m: 10.0,       // 10MΩ resistance
        }
    }
}

impl LifParams {
    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if self.tau_m <= 0.0 {
            return Err(IrError::invalid_type("lif", format!("tau_m must be > 0, got {}", self.tau_m)));
        }
        if self.v_thresh <= self.v_rest {
            return Err(IrError::invalid_type(
                "lif",
                format!("v_thresh ({}) must exceed v_rest ({})", self.v_thresh, self.v_rest),
            ));
        }
        if self.r_m <= 0.0 {
            return Err(IrError::invalid_type("lif", format!("r_m must be > 0, got {}", self.r_m)));
        }
        Ok(())
    }
}

/// Leaky integrate-and-fire dynamics.
///
/// Layout: state `[V]`, globals `[I]` (external current), constants
/// `[tau_m, v_rest, v_reset, v_thresh, r_m]`. Synaptic input is a voltage
/// jump applied on the first sub-step of a tick.
#[derive(Debug, Clone, Default)]
pub struct LeakyIntegrateFire {
    /// Largest voltage change allowed per adaptive sub-step; `None` disables
    /// step-size suggestions
    pub tolerance: Option<f64>,
}

impl LeakyIntegrateFire {
    const V: usize = 0;
    const I_EXT: usize = 0;
    const TAU_M: usize = 0;
    const V_REST: usize = 1;
    const V_RESET: usize = 2;
    const V_THRESH: usize = 3;
    const R_M: usize = 4;

    /// Dynamics suggesting sub-steps that keep |ΔV| near `tolerance`
    pub fn adaptive(tolerance: f64) -> Self {
        Self {
            tolerance: Some(tolerance),
        }
    }
}

impl Dynamics for LeakyIntegrateFire {
    fn advance<R: Real>(&self, step: &mut NeuronStep<'_, R>) {
        let mut v = step.state(Self::V);
        if step.is_first_substep() {
            v = v + step.total_input();
        }

        // dV/dt = (v_rest - V + R*I) / tau_m
        let dv_dt = (step.constant(Self::V_REST) - v + step.constant(Self::R_M) * step.global(Self::I_EXT))
            / step.constant(Self::TAU_M);
        v = v + dv_dt * step.dt();

        if v >= step.constant(Self::V_THRESH) {
            v = step.constant(Self::V_RESET);
            step.emit(0);
        }
        step.set_state(Self::V, v);

        if let Some(tolerance) = self.tolerance {
            let rate = dv_dt.abs();
            if rate > R::epsilon() {
                step.suggest_dt(R::from_host(tolerance) / rate);
            }
        }
    }
}

/// Build a leaky integrate-and-fire type with one unbounded static synapse
/// type `syn` (slot variable `w`) and one event source `spike`
pub fn leaky_integrate_fire(name: &str, params: &LifParams, dynamics: LeakyIntegrateFire) -> Result<NeuronType> {
    params.validate()?;
    NeuronType::builder(name)
        .state("V", params.v_rest)
        .global("I", 0.0)
        .constant("tau_m", params.tau_m)
        .constant("v_rest", params.v_rest)
        .constant("v_reset", params.v_reset)
        .constant("v_thresh", params.v_thresh)
        .constant("r_m", params.r_m)
        .synapse(SynapseType::new("syn", SlotCapacity::Unbounded, StaticWeight).var("w", 1.0))
        .event_source("spike")
        .dynamics(dynamics)
        .build()
}

/// The `Regular` type: a fixed-step leaky integrator with default parameters
pub fn regular() -> Result<NeuronType> {
    leaky_integrate_fire("Regular", &LifParams::default(), LeakyIntegrateFire::default())
}

/// Izhikevich model parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IzhikevichParams {
    /// Recovery time scale
    pub a: f64,
    /// Recovery sensitivity
    pub b: f64,
    /// After-spike reset of v (mV)
    pub c: f64,
    /// After-spike increment of u
    pub d: f64,
}

impl IzhikevichParams {
    /// Regular spiking cortical neuron
    pub fn regular_spiking() -> Self {
        Self { a: 0.02, b: 0.2, c: -65.0, d: 8.0 }
    }

    /// Fast spiking interneuron
    pub fn fast_spiking() -> Self {
        Self { a: 0.1, b: 0.2, c: -65.0, d: 2.0 }
    }

    /// Chattering neuron
    pub fn chattering() -> Self {
        Self { a: 0.02, b: 0.2, c: -50.0, d: 2.0 }
    }
}

/// Izhikevich dynamics.
///
/// Layout: state `[v, u]`, globals `[I]`, constants `[a, b, c, d]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Izhikevich;

impl Izhikevich {
    const PEAK: f64 = 30.0;
}

impl Dynamics for Izhikevich {
    fn advance<R: Real>(&self, step: &mut NeuronStep<'_, R>) {
        let (a, b, c, d) = (step.constant(0), step.constant(1), step.constant(2), step.constant(3));
        let mut v = step.state(0);
        let mut u = step.state(1);
        if step.is_first_substep() {
            v = v + step.total_input();
        }
        let current = step.global(0);
        let half = step.dt() / R::from_host(2.0);

        // two half steps on v for numerical stability
        for _ in 0..2 {
            let dv = R::from_host(0.04) * v * v + R::from_host(5.0) * v + R::from_host(140.0) - u + current;
            v = v + half * dv;
        }
        u = u + step.dt() * a * (b * v - u);

        if v >= R::from_host(Self::PEAK) {
            v = c;
            u = u + d;
            step.emit(0);
        }
        step.set_state(0, v);
        step.set_state(1, u);
    }

    fn initialize<R: Real>(&self, init: &mut NeuronInit<'_, R>) {
        // u starts on the nullcline
        init.state[1] = init.constants[1] * init.state[0];
    }
}

/// Build an Izhikevich type with one unbounded static synapse type `syn`
pub fn izhikevich(name: &str, params: IzhikevichParams) -> Result<NeuronType> {
    NeuronType::builder(name)
        .state("v", params.c)
        .state("u", params.b * params.c)
        .global("I", 0.0)
        .constant("a", params.a)
        .constant("b", params.b)
        .constant("c", params.c)
        .constant("d", params.d)
        .synapse(SynapseType::new("syn", SlotCapacity::Unbounded, StaticWeight).var("w", 1.0))
        .event_source("spike")
        .dynamics(Izhikevich)
        .build()
}

/// Dynamics that never fire; state `[x]` sums every delivered input
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl Dynamics for Silent {
    fn advance<R: Real>(&self, step: &mut NeuronStep<'_, R>) {
        if step.is_first_substep() {
            let x = step.state(0) + step.total_input();
            step.set_state(0, x);
        }
    }
}

/// Build a silent type whose synapse type `syn` has `capacity` slots
pub fn silent(name: &str, capacity: SlotCapacity) -> Result<NeuronType> {
    NeuronType::builder(name)
        .state("x", 0.0)
        .synapse(SynapseType::new("syn", capacity, StaticWeight).var("w", 1.0))
        .event_source("spike")
        .dynamics(Silent)
        .build()
}

/// Synapse contributing its slot weight (`slot_state[0]`) per event
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticWeight;

impl SynapseKernel for StaticWeight {
    #[inline]
    fn on_event<R: Real>(&self, event: &mut SynapseEvent<'_, R>) -> R {
        event.slot_state[0]
    }
}

/// Short-term facilitating synapse.
///
/// Slot layout `[w, fac, last]`: every event contributes `w * fac`, then
/// raises `fac` by `increment`. Between events `fac` relaxes back to 1 with
/// time constant `tau`.
#[derive(Debug, Clone, Copy)]
pub struct Facilitating {
    /// Facilitation added per event
    pub increment: f64,
    /// Relaxation time constant
    pub tau: f64,
}

impl Default for Facilitating {
    fn default() -> Self {
        Self { increment: 0.2, tau: 50.0 }
    }
}

impl Facilitating {
    /// Synapse type using this kernel; slot variables are prefixed with `name`
    pub fn synapse_type(self, name: &str, capacity: SlotCapacity, weight: f64) -> SynapseType {
        SynapseType::new(name, capacity, self)
            .var(format!("{}_w", name), weight)
            .var(format!("{}_fac", name), 1.0)
            .var(format!("{}_last", name), f64::NEG_INFINITY)
    }
}

impl SynapseKernel for Facilitating {
    fn on_event<R: Real>(&self, event: &mut SynapseEvent<'_, R>) -> R {
        let one = R::one();
        let elapsed = event.time - event.slot_state[2];
        let decay = (-elapsed / R::from_host(self.tau)).exp();
        let fac = one + (event.slot_state[1] - one) * decay;

        event.slot_state[1] = fac + R::from_host(self.increment);
        event.slot_state[2] = event.time;
        event.slot_state[0] * fac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lif_reaches_threshold_and_resets() {
        let ty = regular().unwrap();
        let dynamics = ty.dynamics();
        let constants: Vec<f32> = ty.constants().iter().map(|c| c.initial as f32).collect();
        let mut state = [-70.0f32];
        let globals = [5.0f32]; // R*I = 50mV drive

        let mut fired_at = None;
        for tick in 0..200 {
            let mut step = NeuronStep::new(&mut state, &globals, &constants, &[0.0], tick as f32, 1.0, 0);
            dynamics.advance_single(&mut step);
            if step.emitted() != 0 {
                fired_at = Some(tick);
                break;
            }
        }
        assert!(fired_at.is_some());
        assert_eq!(state[0], -70.0);
    }

    #[test]
    fn test_lif_input_is_a_voltage_jump() {
        let ty = regular().unwrap();
        let constants: Vec<f64> = ty.constants().iter().map(|c| c.initial).collect();
        let mut state = [-70.0f64];
        let mut step = NeuronStep::new(&mut state, &[0.0], &constants, &[30.0], 0.0, 1.0, 0);
        ty.dynamics().advance_double(&mut step);
        assert_eq!(step.emitted(), 1);
    }

    #[test]
    fn test_adaptive_lif_suggests_dt() {
        let lif = LeakyIntegrateFire::adaptive(0.5);
        let constants = [20.0f64, -70.0, -70.0, -50.0, 10.0];
        let mut state = [-70.0f64];
        let mut step = NeuronStep::new(&mut state, &[1.0], &constants, &[0.0], 0.0, 0.1, 0);
        lif.advance(&mut step);
        // dV/dt = 10/20 at rest
        assert_eq!(step.suggested_dt(), Some(1.0));
    }

    #[test]
    fn test_invalid_lif_params() {
        let params = LifParams {
            v_thresh: -80.0,
            ..LifParams::default()
        };
        assert!(params.validate().is_err());
        assert!(leaky_integrate_fire("bad", &params, LeakyIntegrateFire::default()).is_err());
    }

    #[test]
    fn test_izhikevich_presets() {
        let rs = IzhikevichParams::regular_spiking();
        assert_eq!((rs.a, rs.b, rs.c, rs.d), (0.02, 0.2, -65.0, 8.0));
        let ty = izhikevich("RS", rs).unwrap();
        assert_eq!(ty.state_vars().len(), 2);

        let constants = [0.02f64, 0.2, -65.0, 8.0];
        let mut state = [-65.0f64, 0.0];
        let mut init = NeuronInit {
            index: 0,
            state: &mut state,
            globals: &[0.0],
            constants: &constants,
        };
        ty.dynamics().initialize_double(&mut init);
        assert!((state[1] - (-13.0)).abs() < 1e-12);
    }

    #[test]
    fn test_izhikevich_fires_under_drive() {
        let ty = izhikevich("RS", IzhikevichParams::regular_spiking()).unwrap();
        let constants = [0.02f64, 0.2, -65.0, 8.0];
        let mut state = [-65.0f64, -13.0];
        let mut spikes = 0;
        for tick in 0..1000 {
            let mut step = NeuronStep::new(&mut state, &[10.0], &constants, &[0.0], tick as f64 * 0.5, 0.5, 0);
            ty.dynamics().advance_double(&mut step);
            spikes += step.emitted().count_ones();
        }
        assert!(spikes > 0);
    }

    #[test]
    fn test_silent_never_fires() {
        let ty = silent("Quiet", SlotCapacity::Bounded(4)).unwrap();
        let mut state = [0.0f32];
        for _ in 0..10 {
            let mut step = NeuronStep::new(&mut state, &[], &[], &[1.5], 0.0, 1.0, 0);
            ty.dynamics().advance_single(&mut step);
            assert_eq!(step.emitted(), 0);
        }
        assert_eq!(state[0], 15.0);
    }

    #[test]
    fn test_facilitating_kernel() {
        let kernel = Facilitating { increment: 0.5, tau: 1e9 };
        let mut slot = [2.0f64, 1.0, f64::NEG_INFINITY];

        let first = kernel.on_event(&mut SynapseEvent { slot_state: &mut slot, constants: &[], time: 1.0 });
        assert_eq!(first, 2.0);
        let second = kernel.on_event(&mut SynapseEvent { slot_state: &mut slot, constants: &[], time: 2.0 });
        assert!((second - 3.0).abs() < 1e-6);
        assert_eq!(slot[2], 2.0);
    }
}
