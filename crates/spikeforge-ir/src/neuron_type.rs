//! Neuron type descriptions
//!
//! A [`NeuronType`] is the template every neuron of a group shares: the layout
//! of its integrated state, its per-neuron globals, group-wide constants, the
//! synapse types it accepts and the number of event sources it can emit.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::dynamics::{Dynamics, NeuronDynamics, SynapseDynamics, SynapseKernel, MAX_EVENT_SOURCES};
use crate::error::{IrError, Result};

/// Named scalar with a default value
#[derive(Debug, Clone, PartialEq)]
pub struct VarSpec {
    /// Variable name
    pub name: String,
    /// Initial (state) or default (global, constant) value
    pub initial: f64,
}

impl VarSpec {
    /// Create a new variable spec
    pub fn new(name: impl Into<String>, initial: f64) -> Self {
        Self {
            name: name.into(),
            initial,
        }
    }
}

/// Number of input slots a synapse type offers per neuron
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotCapacity {
    /// At most this many slots
    Bounded(u32),
    /// Grows with the connections made
    Unbounded,
}

impl SlotCapacity {
    /// Whether `slot` is addressable under this capacity
    pub fn admits(&self, slot: u32) -> bool {
        match self {
            SlotCapacity::Bounded(n) => slot < *n,
            SlotCapacity::Unbounded => true,
        }
    }

    /// Fixed slot count, if bounded
    pub fn bound(&self) -> Option<u32> {
        match self {
            SlotCapacity::Bounded(n) => Some(*n),
            SlotCapacity::Unbounded => None,
        }
    }
}

/// Synapse type definition: per-slot state layout, capacity and event kernel
#[derive(Clone)]
pub struct SynapseType {
    name: String,
    vars: Vec<VarSpec>,
    capacity: SlotCapacity,
    kernel: Arc<dyn SynapseDynamics>,
}

impl SynapseType {
    /// Create a synapse type with no per-slot variables
    pub fn new(name: impl Into<String>, capacity: SlotCapacity, kernel: impl SynapseKernel + 'static) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            capacity,
            kernel: Arc::new(kernel),
        }
    }

    /// Add a per-slot state variable
    pub fn var(mut self, name: impl Into<String>, initial: f64) -> Self {
        self.vars.push(VarSpec::new(name, initial));
        self
    }

    /// Synapse type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Per-slot variables, in layout order
    pub fn vars(&self) -> &[VarSpec] {
        &self.vars
    }

    /// Slot capacity
    pub fn capacity(&self) -> SlotCapacity {
        self.capacity
    }

    /// Event kernel
    pub fn kernel(&self) -> &dyn SynapseDynamics {
        self.kernel.as_ref()
    }

    /// Index of per-slot variable `name`
    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name)
    }
}

impl fmt::Debug for SynapseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynapseType")
            .field("name", &self.name)
            .field("vars", &self.vars)
            .field("capacity", &self.capacity)
            .field("kernel", &self.kernel)
            .finish()
    }
}

/// Where a per-neuron name resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarRef {
    /// Integrated state variable
    State(usize),
    /// Per-neuron global (not reset by initialization)
    Global(usize),
}

/// Immutable neuron type template
#[derive(Clone)]
pub struct NeuronType {
    name: String,
    state: Vec<VarSpec>,
    globals: Vec<VarSpec>,
    constants: Vec<VarSpec>,
    synapses: Vec<SynapseType>,
    event_sources: Vec<String>,
    dynamics: Arc<dyn NeuronDynamics>,
}

impl NeuronType {
    /// Start describing a type called `name`
    pub fn builder(name: impl Into<String>) -> NeuronTypeBuilder {
        NeuronTypeBuilder::new(name)
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Integrated state variables
    pub fn state_vars(&self) -> &[VarSpec] {
        &self.state
    }

    /// Per-neuron globals
    pub fn globals(&self) -> &[VarSpec] {
        &self.globals
    }

    /// Group-wide constants
    pub fn constants(&self) -> &[VarSpec] {
        &self.constants
    }

    /// Synapse types, indexed by synapse type id
    pub fn synapse_types(&self) -> &[SynapseType] {
        &self.synapses
    }

    /// Synapse type `index`
    pub fn synapse_type(&self, index: usize) -> Option<&SynapseType> {
        self.synapses.get(index)
    }

    /// Names of the event sources
    pub fn event_sources(&self) -> &[String] {
        &self.event_sources
    }

    /// Number of distinct event sources
    pub fn event_source_count(&self) -> usize {
        self.event_sources.len()
    }

    /// Dynamics kernel
    pub fn dynamics(&self) -> &dyn NeuronDynamics {
        self.dynamics.as_ref()
    }

    /// Resolve a per-neuron name (state variables first, then globals)
    pub fn resolve_var(&self, name: &str) -> Option<VarRef> {
        if let Some(i) = self.state.iter().position(|v| v.name == name) {
            return Some(VarRef::State(i));
        }
        self.globals
            .iter()
            .position(|v| v.name == name)
            .map(VarRef::Global)
    }

    /// Index of constant `name`
    pub fn constant_index(&self, name: &str) -> Option<usize> {
        self.constants.iter().position(|v| v.name == name)
    }

    /// Resolve a per-slot synapse variable to (synapse type, variable)
    pub fn resolve_syn_var(&self, name: &str) -> Option<(usize, usize)> {
        self.synapses
            .iter()
            .enumerate()
            .find_map(|(t, syn)| syn.var_index(name).map(|v| (t, v)))
    }

    /// Label used by recorders and logs
    pub fn var_label(&self, var: VarRef) -> &str {
        match var {
            VarRef::State(i) => &self.state[i].name,
            VarRef::Global(i) => &self.globals[i].name,
        }
    }
}

impl fmt::Debug for NeuronType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NeuronType")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("globals", &self.globals)
            .field("constants", &self.constants)
            .field("synapses", &self.synapses)
            .field("event_sources", &self.event_sources)
            .finish_non_exhaustive()
    }
}

/// Builder for [`NeuronType`]
#[derive(Debug)]
pub struct NeuronTypeBuilder {
    name: String,
    state: Vec<VarSpec>,
    globals: Vec<VarSpec>,
    constants: Vec<VarSpec>,
    synapses: Vec<SynapseType>,
    event_sources: Vec<String>,
    dynamics: Option<Arc<dyn NeuronDynamics>>,
}

impl NeuronTypeBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Vec::new(),
            globals: Vec::new(),
            constants: Vec::new(),
            synapses: Vec::new(),
            event_sources: Vec::new(),
            dynamics: None,
        }
    }

    /// Add an integrated state variable
    pub fn state(mut self, name: impl Into<String>, initial: f64) -> Self {
        self.state.push(VarSpec::new(name, initial));
        self
    }

    /// Add a per-neuron global
    pub fn global(mut self, name: impl Into<String>, default: f64) -> Self {
        self.globals.push(VarSpec::new(name, default));
        self
    }

    /// Add a group-wide constant
    pub fn constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.push(VarSpec::new(name, value));
        self
    }

    /// Add a synapse type
    pub fn synapse(mut self, synapse: SynapseType) -> Self {
        self.synapses.push(synapse);
        self
    }

    /// Add an event source
    pub fn event_source(mut self, name: impl Into<String>) -> Self {
        self.event_sources.push(name.into());
        self
    }

    /// Set the dynamics kernel
    pub fn dynamics(mut self, dynamics: impl Dynamics + 'static) -> Self {
        self.dynamics = Some(Arc::new(dynamics));
        self
    }

    /// Set an already shared dynamics kernel
    pub fn shared_dynamics(mut self, dynamics: Arc<dyn NeuronDynamics>) -> Self {
        self.dynamics = Some(dynamics);
        self
    }

    /// Validate and build the type
    pub fn build(self) -> Result<NeuronType> {
        if self.name.is_empty() {
            return Err(IrError::invalid_type("", "type name must not be empty"));
        }

        // state variables and globals share the per-neuron namespace
        let mut per_neuron = BTreeSet::new();
        for var in self.state.iter() {
            if !per_neuron.insert(var.name.as_str()) {
                return Err(IrError::duplicate_member("state variable", &var.name, &self.name));
            }
        }
        for var in self.globals.iter() {
            if !per_neuron.insert(var.name.as_str()) {
                return Err(IrError::duplicate_member("global", &var.name, &self.name));
            }
        }

        let mut constants = BTreeSet::new();
        for c in &self.constants {
            if !constants.insert(c.name.as_str()) {
                return Err(IrError::duplicate_member("constant", &c.name, &self.name));
            }
        }

        let mut syn_names = BTreeSet::new();
        let mut syn_vars = BTreeSet::new();
        for syn in &self.synapses {
            if !syn_names.insert(syn.name.as_str()) {
                return Err(IrError::duplicate_member("synapse type", &syn.name, &self.name));
            }
            for var in &syn.vars {
                if !syn_vars.insert(var.name.as_str()) {
                    return Err(IrError::duplicate_member("synapse variable", &var.name, &self.name));
                }
            }
        }

        let mut sources = BTreeSet::new();
        for source in &self.event_sources {
            if !sources.insert(source.as_str()) {
                return Err(IrError::duplicate_member("event source", source, &self.name));
            }
        }
        if self.event_sources.len() > MAX_EVENT_SOURCES {
            return Err(IrError::invalid_type(
                &self.name,
                format!(
                    "{} event sources declared, at most {} supported",
                    self.event_sources.len(),
                    MAX_EVENT_SOURCES
                ),
            ));
        }

        let dynamics = self
            .dynamics
            .ok_or_else(|| IrError::invalid_type(&self.name, "no dynamics kernel supplied"))?;

        Ok(NeuronType {
            name: self.name,
            state: self.state,
            globals: self.globals,
            constants: self.constants,
            synapses: self.synapses,
            event_sources: self.event_sources,
            dynamics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{LeakyIntegrateFire, StaticWeight};

    fn base() -> NeuronTypeBuilder {
        NeuronType::builder("Regular")
            .state("V", -65.0)
            .global("I", 0.0)
            .constant("tau", 10.0)
            .synapse(SynapseType::new("exc", SlotCapacity::Unbounded, StaticWeight).var("w", 1.0))
            .event_source("spike")
            .dynamics(LeakyIntegrateFire::default())
    }

    #[test]
    fn test_build_and_lookup() {
        let ty = base().build().unwrap();
        assert_eq!(ty.name(), "Regular");
        assert_eq!(ty.resolve_var("V"), Some(VarRef::State(0)));
        assert_eq!(ty.resolve_var("I"), Some(VarRef::Global(0)));
        assert_eq!(ty.resolve_var("nope"), None);
        assert_eq!(ty.constant_index("tau"), Some(0));
        assert_eq!(ty.resolve_syn_var("w"), Some((0, 0)));
        assert_eq!(ty.event_source_count(), 1);
        assert_eq!(ty.var_label(VarRef::Global(0)), "I");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = base().state("I", 0.0).build().unwrap_err();
        assert!(matches!(err, IrError::DuplicateMember { what: "state variable", .. }
            | IrError::DuplicateMember { what: "global", .. }));

        let err = base().constant("tau", 1.0).build().unwrap_err();
        assert!(matches!(err, IrError::DuplicateMember { what: "constant", .. }));

        let err = base()
            .synapse(SynapseType::new("inh", SlotCapacity::Bounded(2), StaticWeight).var("w", -1.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, IrError::DuplicateMember { what: "synapse variable", .. }));
    }

    #[test]
    fn test_missing_dynamics_rejected() {
        let err = NeuronType::builder("Empty").state("x", 0.0).build().unwrap_err();
        assert!(matches!(err, IrError::InvalidType { .. }));
    }

    #[test]
    fn test_slot_capacity() {
        assert!(SlotCapacity::Bounded(2).admits(1));
        assert!(!SlotCapacity::Bounded(2).admits(2));
        assert!(!SlotCapacity::Bounded(0).admits(0));
        assert!(SlotCapacity::Unbounded.admits(u32::MAX - 1));
        assert_eq!(SlotCapacity::Unbounded.bound(), None);
    }
}
