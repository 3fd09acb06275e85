//! Executable simulation image
//!
//! An [`Image`] holds every group's state, globals, constants, synapse slot
//! state and fan-out tables at one precision. A tick runs in two separated
//! phases: every group integrates up to the new global time, then the
//! crossings found during integration are delivered into destination inputs,
//! which the next tick's integration consumes.

use std::sync::Arc;

use smallvec::SmallVec;
use spikeforge_ir::{
    NeuronDynamics, NeuronId, NeuronInit, NeuronStep, NeuronType, Precision, Real,
    SynapseDynamics, VarRef,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::delivery::{DeliveryBuffers, DeliveryMode, DeliveryTarget, Hit};
use crate::error::{Result, RuntimeError};
use crate::layout::{GroupSpec, ImageSpec, SynLayout};

/// One threshold crossing found during integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing<R> {
    /// Neuron (group local)
    pub neuron: u32,
    /// Event source that fired
    pub source: u32,
    /// End of the sub-step in which it fired
    pub time: R,
}

#[derive(Debug, Clone, Copy)]
struct FanoutTarget {
    group: u32,
    neuron: u32,
    syn_type: u32,
    slot: u32,
}

fn source_mask(sources: usize) -> u64 {
    if sources >= 64 {
        u64::MAX
    } else {
        (1u64 << sources) - 1
    }
}

fn push_crossings<R: Copy>(out: &mut SmallVec<[Crossing<R>; 2]>, neuron: u32, mut emitted: u64, time: R) {
    while emitted != 0 {
        let source = emitted.trailing_zeros();
        emitted &= emitted - 1;
        out.push(Crossing { neuron, source, time });
    }
}

/// Compiled storage of one neuron group
#[derive(Debug)]
pub struct GroupImage<R: Real> {
    name: String,
    ty: Arc<NeuronType>,
    count: usize,
    offset: NeuronId,
    adaptive: bool,
    min_dt: R,
    n_state: usize,
    state_stride: usize,
    state: Vec<R>,
    initial_state: Vec<R>,
    n_globals: usize,
    globals: Vec<R>,
    constants: Vec<R>,
    local_dt: Vec<R>,
    syn: SynLayout,
    slot_state: Vec<R>,
    initial_slot_state: Vec<R>,
    inputs: Vec<R>,
    delivery: DeliveryBuffers<R>,
    n_sources: usize,
    fanout_offsets: Vec<usize>,
    fanout: Vec<FanoutTarget>,
    crossings: Vec<Crossing<R>>,
}

impl<R: Real> GroupImage<R> {
    fn build(spec: &GroupSpec) -> Result<Self> {
        let ty = &spec.ty;
        let count = spec.count as usize;
        let n_state = ty.state_vars().len();
        let n_globals = ty.globals().len();
        let n_syn = ty.synapse_types().len();

        let check = |what: &str, got: usize, want: usize| {
            if got == want {
                Ok(())
            } else {
                Err(RuntimeError::invalid_image(format!(
                    "group '{}': {} has {} values, expected {}",
                    spec.name, what, got, want
                )))
            }
        };
        check("state", spec.state.len(), count * n_state)?;
        check("globals", spec.globals.len(), count * n_globals)?;
        check("constants", spec.constants.len(), ty.constants().len())?;
        check("slot counts", spec.slots.len(), n_syn)?;
        for (syn, &slots) in ty.synapse_types().iter().zip(&spec.slots) {
            if !syn.capacity().admits(slots.saturating_sub(1)) && slots > 0 {
                return Err(RuntimeError::invalid_image(format!(
                    "group '{}': synapse type '{}' compiled with {} slots, capacity is {:?}",
                    spec.name,
                    syn.name(),
                    slots,
                    syn.capacity()
                )));
            }
        }
        if !(spec.min_dt > 0.0) {
            return Err(RuntimeError::invalid_image(format!(
                "group '{}': min_dt must be > 0, got {}",
                spec.name, spec.min_dt
            )));
        }

        let state_stride = n_state.max(1);
        let mut state = vec![R::zero(); count * state_stride];
        for (dst, src) in state.chunks_mut(state_stride).zip(spec.state.chunks(n_state.max(1))) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = R::from_host(*s);
            }
        }

        let syn = SynLayout::new(ty, &spec.slots);
        let slot_stride = syn.stride.max(1);
        let mut block = vec![R::zero(); slot_stride];
        for (t, syn_type) in ty.synapse_types().iter().enumerate() {
            for slot in 0..syn.slots[t] {
                for (v, var) in syn_type.vars().iter().enumerate() {
                    block[syn.index(t, slot, v)] = R::from_host(var.initial);
                }
            }
        }
        let mut slot_state = Vec::with_capacity(count * slot_stride);
        for _ in 0..count {
            slot_state.extend_from_slice(&block);
        }
        for value in &spec.slot_values {
            let (t, slot, var) = (value.syn_type as usize, value.slot as usize, value.var as usize);
            let valid = (value.neuron as usize) < count
                && t < n_syn
                && slot < syn.slots[t]
                && var < syn.vars[t];
            if !valid {
                return Err(RuntimeError::invalid_image(format!(
                    "group '{}': slot value for neuron {} type {} slot {} var {} out of layout",
                    spec.name, value.neuron, value.syn_type, value.slot, value.var
                )));
            }
            slot_state[value.neuron as usize * slot_stride + syn.index(t, slot, var)] = R::from_host(value.value);
        }

        let min_dt = R::from_host(spec.min_dt);
        let delivery = DeliveryBuffers::new(spec.delivery, count, &syn);
        let n_sources = ty.event_source_count();

        Ok(Self {
            name: spec.name.clone(),
            ty: Arc::clone(ty),
            count,
            offset: spec.offset,
            adaptive: spec.adaptive,
            min_dt,
            n_state,
            state_stride,
            initial_state: state.clone(),
            state,
            n_globals,
            globals: spec.globals.iter().map(|v| R::from_host(*v)).collect(),
            constants: spec.constants.iter().map(|v| R::from_host(*v)).collect(),
            local_dt: vec![min_dt; count],
            inputs: vec![R::zero(); count * n_syn.max(1)],
            initial_slot_state: slot_state.clone(),
            slot_state,
            syn,
            delivery,
            n_sources,
            fanout_offsets: vec![0; count * n_sources + 1],
            fanout: Vec::new(),
            crossings: Vec::new(),
        })
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bound neuron type
    pub fn neuron_type(&self) -> &Arc<NeuronType> {
        &self.ty
    }

    /// Number of neurons
    pub fn count(&self) -> usize {
        self.count
    }

    /// Global id of local neuron 0
    pub fn offset(&self) -> NeuronId {
        self.offset
    }

    /// Whether the group sub-steps adaptively
    pub fn adaptive(&self) -> bool {
        self.adaptive
    }

    /// Delivery strategy for events into this group
    pub fn delivery_mode(&self) -> DeliveryMode {
        self.delivery.mode()
    }

    /// Compiled slot count of synapse type `syn_type`
    pub fn slots(&self, syn_type: usize) -> Option<usize> {
        self.syn.slots.get(syn_type).copied()
    }

    /// Crossings found during the last tick, ordered by neuron
    pub fn crossings(&self) -> &[Crossing<R>] {
        &self.crossings
    }

    /// Crossings of one neuron during the last tick
    pub fn crossings_of(&self, neuron: u32) -> &[Crossing<R>] {
        let start = self.crossings.partition_point(|c| c.neuron < neuron);
        let end = self.crossings.partition_point(|c| c.neuron <= neuron);
        &self.crossings[start..end]
    }

    fn check_neuron(&self, neuron: usize) -> Result<()> {
        if neuron < self.count {
            Ok(())
        } else {
            Err(RuntimeError::out_of_range("neuron", neuron, self.count))
        }
    }

    fn var_index(&self, var: VarRef, neuron: usize) -> Result<(bool, usize)> {
        self.check_neuron(neuron)?;
        match var {
            VarRef::State(i) if i < self.n_state => Ok((true, neuron * self.state_stride + i)),
            VarRef::Global(i) if i < self.n_globals => Ok((false, neuron * self.n_globals + i)),
            VarRef::State(i) => Err(RuntimeError::out_of_range("state variable", i, self.n_state)),
            VarRef::Global(i) => Err(RuntimeError::out_of_range("global", i, self.n_globals)),
        }
    }

    /// Current value of a per-neuron variable
    pub fn value(&self, var: VarRef, neuron: usize) -> Result<f64> {
        let (is_state, index) = self.var_index(var, neuron)?;
        let value = if is_state { self.state[index] } else { self.globals[index] };
        Ok(value.to_host())
    }

    /// Overwrite a per-neuron variable; visible from the next tick on
    pub fn set_value(&mut self, var: VarRef, neuron: usize, value: f64) -> Result<()> {
        let (is_state, index) = self.var_index(var, neuron)?;
        if is_state {
            self.state[index] = R::from_host(value);
        } else {
            self.globals[index] = R::from_host(value);
        }
        Ok(())
    }

    /// Group constant `index`
    pub fn constant(&self, index: usize) -> Result<f64> {
        self.constants
            .get(index)
            .map(|v| v.to_host())
            .ok_or_else(|| RuntimeError::out_of_range("constant", index, self.constants.len()))
    }

    /// Overwrite group constant `index`
    pub fn set_constant(&mut self, index: usize, value: f64) -> Result<()> {
        let len = self.constants.len();
        let slot = self
            .constants
            .get_mut(index)
            .ok_or_else(|| RuntimeError::out_of_range("constant", index, len))?;
        *slot = R::from_host(value);
        Ok(())
    }

    fn slot_index(&self, neuron: usize, syn_type: usize, slot: usize, var: usize) -> Result<usize> {
        self.check_neuron(neuron)?;
        let slots = self
            .slots(syn_type)
            .ok_or_else(|| RuntimeError::out_of_range("synapse type", syn_type, self.syn.types()))?;
        if slot >= slots {
            return Err(RuntimeError::out_of_range("slot", slot, slots));
        }
        if var >= self.syn.vars[syn_type] {
            return Err(RuntimeError::out_of_range("synapse variable", var, self.syn.vars[syn_type]));
        }
        Ok(neuron * self.syn.stride.max(1) + self.syn.index(syn_type, slot, var))
    }

    /// Per-slot synapse variable
    pub fn slot_value(&self, neuron: usize, syn_type: usize, slot: usize, var: usize) -> Result<f64> {
        let index = self.slot_index(neuron, syn_type, slot, var)?;
        Ok(self.slot_state[index].to_host())
    }

    /// Overwrite a per-slot synapse variable.
    ///
    /// Host writes also become the value [`reset`](Image::reset) restores.
    pub fn set_slot_value(&mut self, neuron: usize, syn_type: usize, slot: usize, var: usize, value: f64) -> Result<()> {
        let index = self.slot_index(neuron, syn_type, slot, var)?;
        self.slot_state[index] = R::from_host(value);
        self.initial_slot_state[index] = R::from_host(value);
        Ok(())
    }

    /// Minimum sub-step
    pub fn min_dt(&self) -> f64 {
        self.min_dt.to_host()
    }

    /// Change the minimum sub-step
    pub fn set_min_dt(&mut self, min_dt: f64) -> Result<()> {
        if !(min_dt > 0.0) {
            return Err(RuntimeError::invalid_parameter("min_dt", min_dt.to_string(), "> 0"));
        }
        self.min_dt = R::from_host(min_dt);
        for local in self.local_dt.iter_mut() {
            *local = local.max(self.min_dt);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state.copy_from_slice(&self.initial_state);
        self.slot_state.copy_from_slice(&self.initial_slot_state);
        self.inputs.fill(R::zero());
        self.local_dt.fill(self.min_dt);
        self.delivery.clear();
        self.crossings.clear();
    }

    fn run_initializers(&mut self) {
        let dynamics = self.ty.dynamics();
        let n_globals = self.n_globals;
        for (i, state) in self.state.chunks_mut(self.state_stride).enumerate() {
            let mut init = NeuronInit {
                index: i as u32,
                state: &mut state[..self.n_state],
                globals: &self.globals[i * n_globals..(i + 1) * n_globals],
                constants: &self.constants,
            };
            R::initialize(dynamics, &mut init);
        }
    }

    /// Phase one: advance every neuron from `t0` to `t0 + dt`
    fn integrate(&mut self, t0: R, dt: R) {
        let dynamics: &dyn NeuronDynamics = self.ty.dynamics();
        let mask = source_mask(self.n_sources);
        let n_state = self.n_state;
        let n_globals = self.n_globals;
        let n_syn = self.syn.types();
        let input_stride = n_syn.max(1);
        let adaptive = self.adaptive;
        let min_dt = self.min_dt;
        let globals = &self.globals;
        let constants = &self.constants;
        let inputs = &self.inputs;

        let advance = |(i, (state, local_dt)): (usize, (&mut [R], &mut R))| {
            let mut found: SmallVec<[Crossing<R>; 2]> = SmallVec::new();
            let globals = &globals[i * n_globals..(i + 1) * n_globals];
            let inputs = &inputs[i * input_stride..i * input_stride + n_syn];
            let state = &mut state[..n_state];

            if !adaptive {
                let mut step = NeuronStep::new(state, globals, constants, inputs, t0, dt, 0);
                R::advance(dynamics, &mut step);
                push_crossings(&mut found, i as u32, step.emitted() & mask, t0 + dt);
                return found;
            }

            let mut elapsed = R::zero();
            let mut substep = 0u32;
            loop {
                let remaining = dt - elapsed;
                let h = if remaining <= min_dt {
                    remaining
                } else {
                    local_dt.max(min_dt).min(remaining)
                };
                let next = elapsed + h;
                let last = h >= remaining || next >= dt;

                let mut step = NeuronStep::new(&mut *state, globals, constants, inputs, t0 + elapsed, h, substep);
                R::advance(dynamics, &mut step);
                if let Some(suggested) = step.suggested_dt() {
                    *local_dt = suggested.max(min_dt);
                }
                let emitted = step.emitted() & mask;

                elapsed = if last { dt } else { next };
                push_crossings(&mut found, i as u32, emitted, t0 + elapsed);
                if last {
                    break;
                }
                substep += 1;
            }
            found
        };

        #[cfg(feature = "parallel")]
        let crossings: Vec<Crossing<R>> = self
            .state
            .par_chunks_mut(self.state_stride)
            .zip(self.local_dt.par_iter_mut())
            .enumerate()
            .flat_map_iter(advance)
            .collect();

        #[cfg(not(feature = "parallel"))]
        let crossings: Vec<Crossing<R>> = self
            .state
            .chunks_mut(self.state_stride)
            .zip(self.local_dt.iter_mut())
            .enumerate()
            .flat_map(advance)
            .collect();

        self.crossings = crossings;
        // inputs of this tick are consumed
        self.inputs.fill(R::zero());
    }

    /// Phase two: apply events arriving at this group
    fn receive(&mut self, hits: &mut [Hit<R>]) {
        let kernels: SmallVec<[&dyn SynapseDynamics; 4]> =
            self.ty.synapse_types().iter().map(|s| s.kernel()).collect();
        self.delivery.deliver(
            DeliveryTarget {
                layout: &self.syn,
                kernels: &kernels,
                constants: &self.constants,
                slot_state: &mut self.slot_state,
                inputs: &mut self.inputs,
            },
            hits,
        );
    }
}

/// Executable image at precision `R`
#[derive(Debug)]
pub struct Image<R: Real> {
    groups: Vec<GroupImage<R>>,
    hits: Vec<Vec<Hit<R>>>,
    projections: usize,
}

impl<R: Real> Image<R> {
    /// Instantiate a lowered model
    pub fn build(spec: &ImageSpec) -> Result<Self> {
        let mut groups = spec
            .groups
            .iter()
            .map(GroupImage::build)
            .collect::<Result<Vec<_>>>()?;

        // per (source neuron, event source) fan-out, creation order kept
        let mut counts: Vec<Vec<usize>> = groups.iter().map(|g| vec![0; g.fanout_offsets.len()]).collect();
        for p in &spec.projections {
            let src = groups
                .get(p.src_group as usize)
                .ok_or_else(|| RuntimeError::invalid_image(format!("source group {} does not exist", p.src_group)))?;
            let dest = groups
                .get(p.dest_group as usize)
                .ok_or_else(|| RuntimeError::invalid_image(format!("destination group {} does not exist", p.dest_group)))?;
            if p.src_neuron as usize >= src.count || p.src_source as usize >= src.n_sources {
                return Err(RuntimeError::invalid_image(format!(
                    "projection source ({}, neuron {}, event source {}) outside group '{}'",
                    p.src_group,
                    p.src_neuron,
                    p.src_source,
                    src.name()
                )));
            }
            let slots = dest.slots(p.syn_type as usize).unwrap_or(0);
            if p.dest_neuron as usize >= dest.count || p.slot as usize >= slots {
                return Err(RuntimeError::invalid_image(format!(
                    "projection destination (neuron {}, synapse type {}, slot {}) outside group '{}'",
                    p.dest_neuron,
                    p.syn_type,
                    p.slot,
                    dest.name()
                )));
            }
            let key = p.src_neuron as usize * src.n_sources + p.src_source as usize;
            counts[p.src_group as usize][key + 1] += 1;
        }
        for (group, mut offsets) in groups.iter_mut().zip(counts) {
            for i in 1..offsets.len() {
                offsets[i] += offsets[i - 1];
            }
            let total = offsets.last().copied().unwrap_or(0);
            group.fanout = vec![
                FanoutTarget {
                    group: 0,
                    neuron: 0,
                    syn_type: 0,
                    slot: 0
                };
                total
            ];
            group.fanout_offsets = offsets;
        }
        let mut cursor: Vec<Vec<usize>> = groups.iter().map(|g| g.fanout_offsets.clone()).collect();
        for p in &spec.projections {
            let group = &mut groups[p.src_group as usize];
            let key = p.src_neuron as usize * group.n_sources + p.src_source as usize;
            let at = &mut cursor[p.src_group as usize][key];
            group.fanout[*at] = FanoutTarget {
                group: p.dest_group,
                neuron: p.dest_neuron,
                syn_type: p.syn_type,
                slot: p.slot,
            };
            *at += 1;
        }

        let hits = groups.iter().map(|_| Vec::new()).collect();
        Ok(Self {
            groups,
            hits,
            projections: spec.projections.len(),
        })
    }

    /// Compiled groups
    pub fn groups(&self) -> &[GroupImage<R>] {
        &self.groups
    }

    /// Group `index`
    pub fn group(&self, index: usize) -> Result<&GroupImage<R>> {
        let len = self.groups.len();
        self.groups
            .get(index)
            .ok_or_else(|| RuntimeError::out_of_range("group", index, len))
    }

    /// Group `index`, mutably
    pub fn group_mut(&mut self, index: usize) -> Result<&mut GroupImage<R>> {
        let len = self.groups.len();
        self.groups
            .get_mut(index)
            .ok_or_else(|| RuntimeError::out_of_range("group", index, len))
    }

    /// Number of compiled connections
    pub fn projection_count(&self) -> usize {
        self.projections
    }

    /// Bytes of strategy-specific delivery storage
    pub fn delivery_footprint(&self) -> usize {
        self.groups.iter().map(|g| g.delivery.footprint()).sum()
    }

    /// Restore initial state and drop pending inputs
    pub fn reset(&mut self) {
        for group in self.groups.iter_mut() {
            group.reset();
        }
        for hits in self.hits.iter_mut() {
            hits.clear();
        }
    }

    /// Run every type's initialization hook over its neurons
    pub fn run_initializers(&mut self) {
        for group in self.groups.iter_mut() {
            group.run_initializers();
        }
    }

    /// Advance one global tick starting at `time`
    pub fn tick(&mut self, time: f64, dt: f64) {
        let t0 = R::from_host(time);
        let h = R::from_host(dt);

        for group in self.groups.iter_mut() {
            group.integrate(t0, h);
        }

        for hits in self.hits.iter_mut() {
            hits.clear();
        }
        for group in self.groups.iter() {
            for crossing in &group.crossings {
                let key = crossing.neuron as usize * group.n_sources + crossing.source as usize;
                let targets = &group.fanout[group.fanout_offsets[key]..group.fanout_offsets[key + 1]];
                for target in targets {
                    self.hits[target.group as usize].push(Hit {
                        neuron: target.neuron,
                        syn_type: target.syn_type,
                        slot: target.slot,
                        time: crossing.time,
                    });
                }
            }
        }
        for (group, hits) in self.groups.iter_mut().zip(self.hits.iter_mut()) {
            group.receive(hits);
        }
    }
}

/// Image at the precision chosen at generation
#[derive(Debug)]
pub enum CompiledImage {
    /// 32-bit image
    Single(Image<f32>),
    /// 64-bit image
    Double(Image<f64>),
}

macro_rules! dispatch {
    ($image:expr, $inner:ident => $body:expr) => {
        match $image {
            CompiledImage::Single($inner) => $body,
            CompiledImage::Double($inner) => $body,
        }
    };
}

impl CompiledImage {
    /// Instantiate a lowered model at `precision`
    pub fn build(spec: &ImageSpec, precision: Precision) -> Result<Self> {
        Ok(match precision {
            Precision::Single => CompiledImage::Single(Image::build(spec)?),
            Precision::Double => CompiledImage::Double(Image::build(spec)?),
        })
    }

    /// Precision of the image
    pub fn precision(&self) -> Precision {
        match self {
            CompiledImage::Single(_) => Precision::Single,
            CompiledImage::Double(_) => Precision::Double,
        }
    }

    /// Number of compiled groups
    pub fn group_count(&self) -> usize {
        dispatch!(self, image => image.groups.len())
    }

    /// Number of compiled connections
    pub fn projection_count(&self) -> usize {
        dispatch!(self, image => image.projection_count())
    }

    /// Bytes of strategy-specific delivery storage
    pub fn delivery_footprint(&self) -> usize {
        dispatch!(self, image => image.delivery_footprint())
    }

    /// See [`Image::reset`]
    pub fn reset(&mut self) {
        dispatch!(self, image => image.reset())
    }

    /// See [`Image::run_initializers`]
    pub fn run_initializers(&mut self) {
        dispatch!(self, image => image.run_initializers())
    }

    /// See [`Image::tick`]
    pub fn tick(&mut self, time: f64, dt: f64) {
        dispatch!(self, image => image.tick(time, dt))
    }

    /// Per-neuron variable of group `group`
    pub fn value(&self, group: usize, var: VarRef, neuron: usize) -> Result<f64> {
        dispatch!(self, image => image.group(group)?.value(var, neuron))
    }

    /// Overwrite a per-neuron variable of group `group`
    pub fn set_value(&mut self, group: usize, var: VarRef, neuron: usize, value: f64) -> Result<()> {
        dispatch!(self, image => image.group_mut(group)?.set_value(var, neuron, value))
    }

    /// Constant of group `group`
    pub fn constant(&self, group: usize, index: usize) -> Result<f64> {
        dispatch!(self, image => image.group(group)?.constant(index))
    }

    /// Overwrite a constant of group `group`
    pub fn set_constant(&mut self, group: usize, index: usize, value: f64) -> Result<()> {
        dispatch!(self, image => image.group_mut(group)?.set_constant(index, value))
    }

    /// Per-slot synapse variable of group `group`
    pub fn slot_value(&self, group: usize, neuron: usize, syn_type: usize, slot: usize, var: usize) -> Result<f64> {
        dispatch!(self, image => image.group(group)?.slot_value(neuron, syn_type, slot, var))
    }

    /// Overwrite a per-slot synapse variable of group `group`
    pub fn set_slot_value(
        &mut self,
        group: usize,
        neuron: usize,
        syn_type: usize,
        slot: usize,
        var: usize,
        value: f64,
    ) -> Result<()> {
        dispatch!(self, image => image.group_mut(group)?.set_slot_value(neuron, syn_type, slot, var, value))
    }

    /// Compiled slot count of a synapse type of group `group`
    pub fn slots(&self, group: usize, syn_type: usize) -> Result<usize> {
        dispatch!(self, image => {
            let g = image.group(group)?;
            g.slots(syn_type)
                .ok_or_else(|| RuntimeError::out_of_range("synapse type", syn_type, g.syn.types()))
        })
    }

    /// Minimum sub-step of group `group`
    pub fn min_dt(&self, group: usize) -> Result<f64> {
        dispatch!(self, image => Ok(image.group(group)?.min_dt()))
    }

    /// Change the minimum sub-step of group `group`
    pub fn set_min_dt(&mut self, group: usize, min_dt: f64) -> Result<()> {
        dispatch!(self, image => image.group_mut(group)?.set_min_dt(min_dt))
    }
}
