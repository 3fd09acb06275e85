//! Neuron groups and their accessors
//!
//! Before generation every value lives host-side in `f64` and becomes the
//! group's initial value in the compiled image. After generation the views
//! read and write the compiled image directly, so changes apply from the next
//! tick on.

use std::collections::BTreeMap;
use std::sync::Arc;

use spikeforge_ir::{IdRange, NeuronId, NeuronType, SlotCapacity, VarRef};
use spikeforge_runtime::{CompiledImage, DeliveryMode, GroupSpec, Handle, SlotValue};

use crate::error::{CompilerError, Result};

/// Handle to a group of a model
pub type GroupId = Handle<Group>;

/// Creation options for a group
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GroupOptions {
    /// Unique name; an internal one is assigned when `None`
    pub name: Option<String>,
    /// Sub-step adaptively within each global tick
    pub adaptive: bool,
    /// Delivery strategy for events arriving at this group
    pub delivery: DeliveryMode,
    /// Minimum sub-step; defaults to the model timestep
    pub min_dt: Option<f64>,
}

impl GroupOptions {
    /// Options with an explicit name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Enable adaptive sub-stepping
    pub fn adaptive(mut self, adaptive: bool) -> Self {
        self.adaptive = adaptive;
        self
    }

    /// Select the delivery strategy
    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Set the minimum sub-step
    pub fn with_min_dt(mut self, min_dt: f64) -> Self {
        self.min_dt = Some(min_dt);
        self
    }
}

/// Host-side group data
#[derive(Debug)]
pub struct Group {
    name: String,
    ty: Arc<NeuronType>,
    index: u32,
    ids: IdRange,
    adaptive: bool,
    delivery: DeliveryMode,
    min_dt: f64,
    state: Vec<f64>,
    globals: Vec<f64>,
    constants: Vec<f64>,
    slot_values: BTreeMap<(u32, u32, u32, u32), f64>,
}

impl Group {
    pub(crate) fn new(name: String, ty: Arc<NeuronType>, index: u32, ids: IdRange, adaptive: bool, delivery: DeliveryMode, min_dt: f64) -> Self {
        let count = ids.len as usize;
        let state = repeat_per_neuron(ty.state_vars().iter().map(|v| v.initial), count);
        let globals = repeat_per_neuron(ty.globals().iter().map(|v| v.initial), count);
        let constants = ty.constants().iter().map(|c| c.initial).collect();
        Self {
            name,
            ty,
            index,
            ids,
            adaptive,
            delivery,
            min_dt,
            state,
            globals,
            constants,
            slot_values: BTreeMap::new(),
        }
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound neuron type
    pub fn neuron_type(&self) -> &Arc<NeuronType> {
        &self.ty
    }

    /// Position in add order
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Number of neurons
    pub fn count(&self) -> u32 {
        self.ids.len
    }

    /// Global id block of the group
    pub fn ids(&self) -> IdRange {
        self.ids
    }

    pub(crate) fn check_neuron(&self, neuron: u32) -> Result<()> {
        if neuron < self.count() {
            Ok(())
        } else {
            Err(CompilerError::out_of_range("neuron", &self.name, neuron, self.count()))
        }
    }

    pub(crate) fn check_syn_type(&self, syn_type: u32) -> Result<()> {
        let len = self.ty.synapse_types().len() as u32;
        if syn_type < len {
            Ok(())
        } else {
            Err(CompilerError::out_of_range("synapse type", &self.name, syn_type, len))
        }
    }

    pub(crate) fn check_event_source(&self, source: u32) -> Result<()> {
        let len = self.ty.event_source_count() as u32;
        if source < len {
            Ok(())
        } else {
            Err(CompilerError::out_of_range("event source", &self.name, source, len))
        }
    }

    pub(crate) fn capacity(&self, syn_type: u32) -> SlotCapacity {
        self.ty
            .synapse_type(syn_type as usize)
            .map(|s| s.capacity())
            .unwrap_or(SlotCapacity::Bounded(0))
    }

    fn resolve_var(&self, name: &str) -> Result<VarRef> {
        self.ty
            .resolve_var(name)
            .ok_or_else(|| CompilerError::not_found("variable", format!("{}.{}", self.name, name)))
    }

    fn resolve_constant(&self, name: &str) -> Result<usize> {
        self.ty
            .constant_index(name)
            .ok_or_else(|| CompilerError::not_found("constant", format!("{}.{}", self.name, name)))
    }

    fn resolve_syn_var(&self, name: &str, slot: u32) -> Result<(usize, usize)> {
        let (syn_type, var) = self
            .ty
            .resolve_syn_var(name)
            .ok_or_else(|| CompilerError::not_found("synapse variable", format!("{}.{}", self.name, name)))?;
        let capacity = self.capacity(syn_type as u32);
        if !capacity.admits(slot) {
            return Err(CompilerError::out_of_range(
                "slot",
                &self.name,
                slot,
                capacity.bound().unwrap_or(u32::MAX),
            ));
        }
        Ok((syn_type, var))
    }

    fn host_value(&self, var: VarRef, neuron: u32) -> f64 {
        let neuron = neuron as usize;
        match var {
            VarRef::State(i) => self.state[neuron * self.ty.state_vars().len() + i],
            VarRef::Global(i) => self.globals[neuron * self.ty.globals().len() + i],
        }
    }

    fn set_host_value(&mut self, var: VarRef, neuron: u32, value: f64) {
        let neuron = neuron as usize;
        match var {
            VarRef::State(i) => self.state[neuron * self.ty.state_vars().len() + i] = value,
            VarRef::Global(i) => self.globals[neuron * self.ty.globals().len() + i] = value,
        }
    }

    /// Lower into a runtime group description with empty slot counts
    pub(crate) fn to_spec(&self) -> GroupSpec {
        GroupSpec {
            name: self.name.clone(),
            ty: Arc::clone(&self.ty),
            count: self.count(),
            offset: self.ids.start,
            adaptive: self.adaptive,
            min_dt: self.min_dt,
            delivery: self.delivery,
            slots: vec![0; self.ty.synapse_types().len()],
            state: self.state.clone(),
            globals: self.globals.clone(),
            constants: self.constants.clone(),
            slot_values: self
                .slot_values
                .iter()
                .map(|(&(neuron, syn_type, slot, var), &value)| SlotValue {
                    neuron,
                    syn_type,
                    slot,
                    var,
                    value,
                })
                .collect(),
        }
    }
}

fn repeat_per_neuron(values: impl Iterator<Item = f64> + Clone, count: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(count * values.clone().count());
    for _ in 0..count {
        out.extend(values.clone());
    }
    out
}

/// Read access to a group
#[derive(Debug, Clone, Copy)]
pub struct GroupView<'a> {
    pub(crate) group: &'a Group,
    pub(crate) image: Option<&'a CompiledImage>,
}

/// Read-write access to a group
#[derive(Debug)]
pub struct GroupViewMut<'a> {
    pub(crate) group: &'a mut Group,
    pub(crate) image: Option<&'a mut CompiledImage>,
}

macro_rules! read_accessors {
    () => {
        /// Group name
        pub fn name(&self) -> &str {
            self.group.name()
        }

        /// Bound neuron type
        pub fn neuron_type(&self) -> &Arc<NeuronType> {
            self.group.neuron_type()
        }

        /// Number of neurons
        pub fn count(&self) -> u32 {
            self.group.count()
        }

        /// Global id of local neuron 0
        pub fn offset(&self) -> NeuronId {
            self.group.ids.start
        }

        /// Global id of a local neuron
        pub fn neuron_id(&self, neuron: u32) -> Result<NeuronId> {
            self.group.check_neuron(neuron)?;
            Ok(self.group.ids.start.offset(neuron))
        }

        /// Whether the group sub-steps adaptively
        pub fn adaptive(&self) -> bool {
            self.group.adaptive
        }

        /// Delivery strategy of the group
        pub fn delivery_mode(&self) -> DeliveryMode {
            self.group.delivery
        }

        /// Minimum sub-step
        pub fn min_dt(&self) -> Result<f64> {
            match self.image.as_deref() {
                Some(image) => Ok(image.min_dt(self.group.index as usize)?),
                None => Ok(self.group.min_dt),
            }
        }

        /// Per-neuron global (or state variable) value
        pub fn global(&self, name: &str, neuron: u32) -> Result<f64> {
            let var = self.group.resolve_var(name)?;
            self.group.check_neuron(neuron)?;
            match self.image.as_deref() {
                Some(image) => Ok(image.value(self.group.index as usize, var, neuron as usize)?),
                None => Ok(self.group.host_value(var, neuron)),
            }
        }

        /// Per-neuron, per-slot synapse variable value
        pub fn syn_global(&self, name: &str, neuron: u32, slot: u32) -> Result<f64> {
            let (syn_type, var) = self.group.resolve_syn_var(name, slot)?;
            self.group.check_neuron(neuron)?;
            match self.image.as_deref() {
                Some(image) => Ok(image.slot_value(self.group.index as usize, neuron as usize, syn_type, slot as usize, var)?),
                None => {
                    let key = (neuron, syn_type as u32, slot, var as u32);
                    let initial = self.group.ty.synapse_types()[syn_type].vars()[var].initial;
                    Ok(self.group.slot_values.get(&key).copied().unwrap_or(initial))
                }
            }
        }

        /// Group constant
        pub fn constant(&self, name: &str) -> Result<f64> {
            let index = self.group.resolve_constant(name)?;
            match self.image.as_deref() {
                Some(image) => Ok(image.constant(self.group.index as usize, index)?),
                None => Ok(self.group.constants[index]),
            }
        }
    };
}

impl<'a> GroupView<'a> {
    read_accessors!();
}

impl<'a> GroupViewMut<'a> {
    read_accessors!();

    /// Write a per-neuron global (or state variable)
    pub fn set_global(&mut self, name: &str, neuron: u32, value: f64) -> Result<()> {
        let var = self.group.resolve_var(name)?;
        self.group.check_neuron(neuron)?;
        match self.image.as_deref_mut() {
            Some(image) => image.set_value(self.group.index as usize, var, neuron as usize, value)?,
            None => self.group.set_host_value(var, neuron, value),
        }
        Ok(())
    }

    /// Write the same global to every neuron of the group
    pub fn fill_global(&mut self, name: &str, value: f64) -> Result<()> {
        for neuron in 0..self.group.count() {
            self.set_global(name, neuron, value)?;
        }
        Ok(())
    }

    /// Write a per-neuron, per-slot synapse variable
    pub fn set_syn_global(&mut self, name: &str, neuron: u32, slot: u32, value: f64) -> Result<()> {
        let (syn_type, var) = self.group.resolve_syn_var(name, slot)?;
        self.group.check_neuron(neuron)?;
        match self.image.as_deref_mut() {
            Some(image) => {
                image.set_slot_value(self.group.index as usize, neuron as usize, syn_type, slot as usize, var, value)?
            }
            None => {
                self.group
                    .slot_values
                    .insert((neuron, syn_type as u32, slot, var as u32), value);
            }
        }
        Ok(())
    }

    /// Write a group constant
    pub fn set_constant(&mut self, name: &str, value: f64) -> Result<()> {
        let index = self.group.resolve_constant(name)?;
        match self.image.as_deref_mut() {
            Some(image) => image.set_constant(self.group.index as usize, index, value)?,
            None => self.group.constants[index] = value,
        }
        Ok(())
    }

    /// Change the minimum sub-step; only adaptive groups honor it
    pub fn set_min_dt(&mut self, min_dt: f64) -> Result<()> {
        if !(min_dt > 0.0) || !min_dt.is_finite() {
            return Err(CompilerError::invalid_parameter("min_dt", min_dt.to_string(), "finite and > 0"));
        }
        if let Some(image) = self.image.as_deref_mut() {
            image.set_min_dt(self.group.index as usize, min_dt)?;
        }
        self.group.min_dt = min_dt;
        Ok(())
    }
}
