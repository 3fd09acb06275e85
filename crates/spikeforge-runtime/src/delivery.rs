//! Synaptic event delivery strategies
//!
//! Two closed strategies apply a tick's events to destination synapses:
//!
//! - [`DeliveryMode::Parallel`] runs each event's kernel into a private
//!   per-slot accumulation cell, then combines the cells of every neuron in
//!   slot order. No locks; memory grows with in-degree.
//! - [`DeliveryMode::Atomic`] applies each event directly to the destination
//!   neuron's input under a per-neuron lock.
//!
//! With at most one event per destination neuron per tick both produce
//! identical inputs. Otherwise they may differ in summation order only.

use core::fmt;

use parking_lot::Mutex;
use spikeforge_ir::{Real, SynapseDynamics, SynapseEvent};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::layout::SynLayout;

/// Delivery strategy of a destination group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeliveryMode {
    /// Per-slot accumulation followed by a deterministic combine
    #[default]
    Parallel,
    /// Direct updates under mutual exclusion
    Atomic,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Parallel => write!(f, "parallel"),
            DeliveryMode::Atomic => write!(f, "atomic"),
        }
    }
}

/// One event arriving at one destination slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<R> {
    /// Destination neuron (group local)
    pub neuron: u32,
    /// Destination synapse type
    pub syn_type: u32,
    /// Destination slot
    pub slot: u32,
    /// Crossing time of the source
    pub time: R,
}

/// Strategy tag plus the buffers the strategy needs
#[derive(Debug)]
pub enum DeliveryBuffers<R> {
    /// Accumulation cells, `count * cell_stride`
    Parallel {
        /// One cell per (neuron, slot)
        cells: Vec<R>,
    },
    /// No extra storage
    Atomic,
}

impl<R: Real> DeliveryBuffers<R> {
    /// Allocate buffers for `count` neurons
    pub fn new(mode: DeliveryMode, count: usize, layout: &SynLayout) -> Self {
        match mode {
            DeliveryMode::Parallel => DeliveryBuffers::Parallel {
                cells: vec![R::zero(); count * layout.cell_stride.max(1)],
            },
            DeliveryMode::Atomic => DeliveryBuffers::Atomic,
        }
    }

    /// Strategy of these buffers
    pub fn mode(&self) -> DeliveryMode {
        match self {
            DeliveryBuffers::Parallel { .. } => DeliveryMode::Parallel,
            DeliveryBuffers::Atomic => DeliveryMode::Atomic,
        }
    }

    /// Bytes held by strategy-specific storage
    pub fn footprint(&self) -> usize {
        match self {
            DeliveryBuffers::Parallel { cells } => cells.len() * R::PRECISION.width(),
            DeliveryBuffers::Atomic => 0,
        }
    }

    /// Zero pending accumulation
    pub fn clear(&mut self) {
        if let DeliveryBuffers::Parallel { cells } = self {
            cells.fill(R::zero());
        }
    }

    /// Apply `hits` to the destination group
    pub fn deliver(&mut self, target: DeliveryTarget<'_, R>, hits: &mut [Hit<R>]) {
        if hits.is_empty() {
            return;
        }
        match self {
            DeliveryBuffers::Parallel { cells } => deliver_parallel(cells, target, hits),
            DeliveryBuffers::Atomic => deliver_atomic(target, hits),
        }
    }
}

/// Mutable view of the destination group used during delivery
pub struct DeliveryTarget<'a, R> {
    /// Synapse storage layout
    pub layout: &'a SynLayout,
    /// Event kernel per synapse type
    pub kernels: &'a [&'a dyn SynapseDynamics],
    /// Group constants
    pub constants: &'a [R],
    /// Slot state, `count * max(layout.stride, 1)`
    pub slot_state: &'a mut [R],
    /// Inputs, `count * max(types, 1)`
    pub inputs: &'a mut [R],
}

fn deliver_parallel<R: Real>(cells: &mut [R], target: DeliveryTarget<'_, R>, hits: &mut [Hit<R>]) {
    let DeliveryTarget {
        layout,
        kernels,
        constants,
        slot_state,
        inputs,
    } = target;
    let stride = layout.stride.max(1);
    let cell_stride = layout.cell_stride.max(1);
    let input_stride = layout.types().max(1);
    let count = inputs.len() / input_stride;

    // stable sort keeps repeated events on one slot in crossing order
    hits.sort_by_key(|h| (h.neuron, h.syn_type, h.slot));
    let mut bounds = vec![0usize; count + 1];
    for hit in hits.iter() {
        bounds[hit.neuron as usize + 1] += 1;
    }
    for i in 0..count {
        bounds[i + 1] += bounds[i];
    }
    let hits: &[Hit<R>] = hits;

    let apply = |(i, ((slots, cells), input)): (usize, ((&mut [R], &mut [R]), &mut [R]))| {
        let hits = &hits[bounds[i]..bounds[i + 1]];
        if hits.is_empty() {
            return;
        }
        for hit in hits {
            let t = hit.syn_type as usize;
            let slot = hit.slot as usize;
            let mut event = SynapseEvent {
                slot_state: &mut slots[layout.slot_range(t, slot)],
                constants,
                time: hit.time,
            };
            let contribution = R::on_event(kernels[t], &mut event);
            let cell = &mut cells[layout.cell_offsets[t] + slot];
            *cell = *cell + contribution;
        }
        for t in 0..layout.types() {
            let start = layout.cell_offsets[t];
            let type_cells = &mut cells[start..start + layout.slots[t]];
            let sum = type_cells.iter().fold(R::zero(), |acc, c| acc + *c);
            input[t] = input[t] + sum;
            type_cells.fill(R::zero());
        }
    };

    #[cfg(feature = "parallel")]
    slot_state
        .par_chunks_mut(stride)
        .zip(cells.par_chunks_mut(cell_stride))
        .zip(inputs.par_chunks_mut(input_stride))
        .enumerate()
        .for_each(apply);

    #[cfg(not(feature = "parallel"))]
    slot_state
        .chunks_mut(stride)
        .zip(cells.chunks_mut(cell_stride))
        .zip(inputs.chunks_mut(input_stride))
        .enumerate()
        .for_each(apply);
}

fn deliver_atomic<R: Real>(target: DeliveryTarget<'_, R>, hits: &[Hit<R>]) {
    let DeliveryTarget {
        layout,
        kernels,
        constants,
        slot_state,
        inputs,
    } = target;
    let stride = layout.stride.max(1);
    let input_stride = layout.types().max(1);

    let locks: Vec<Mutex<(&mut [R], &mut [R])>> = slot_state
        .chunks_mut(stride)
        .zip(inputs.chunks_mut(input_stride))
        .map(Mutex::new)
        .collect();

    let apply = |hit: &Hit<R>| {
        let t = hit.syn_type as usize;
        let mut guard = locks[hit.neuron as usize].lock();
        let (slots, input) = &mut *guard;
        let mut event = SynapseEvent {
            slot_state: &mut slots[layout.slot_range(t, hit.slot as usize)],
            constants,
            time: hit.time,
        };
        let contribution = R::on_event(kernels[t], &mut event);
        input[t] = input[t] + contribution;
    };

    #[cfg(feature = "parallel")]
    hits.par_iter().for_each(apply);

    #[cfg(not(feature = "parallel"))]
    hits.iter().for_each(apply);
}
