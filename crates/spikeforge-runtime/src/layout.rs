//! Precision-independent description of a compiled model
//!
//! The model front end lowers its groups and connections into an
//! [`ImageSpec`]; [`crate::image::Image::build`] instantiates it at a concrete
//! precision. All host values are `f64` here.

use std::sync::Arc;

use spikeforge_ir::{NeuronId, NeuronType};

use crate::delivery::DeliveryMode;

/// One group of the lowered model
#[derive(Debug, Clone)]
pub struct GroupSpec {
    /// Group name
    pub name: String,
    /// Bound neuron type
    pub ty: Arc<NeuronType>,
    /// Number of neurons
    pub count: u32,
    /// Global id of local neuron 0
    pub offset: NeuronId,
    /// Whether the group sub-steps adaptively
    pub adaptive: bool,
    /// Minimum sub-step for adaptive groups
    pub min_dt: f64,
    /// Strategy used to deliver events into this group
    pub delivery: DeliveryMode,
    /// Compiled slot count per synapse type
    pub slots: Vec<u32>,
    /// Initial state, neuron-major (`count * state vars`)
    pub state: Vec<f64>,
    /// Per-neuron globals, neuron-major (`count * globals`)
    pub globals: Vec<f64>,
    /// Group constants
    pub constants: Vec<f64>,
    /// Per-slot values differing from the synapse type defaults
    pub slot_values: Vec<SlotValue>,
}

/// Value of one per-slot synapse variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotValue {
    /// Destination neuron (group local)
    pub neuron: u32,
    /// Synapse type index
    pub syn_type: u32,
    /// Slot index
    pub slot: u32,
    /// Variable index within the synapse type
    pub var: u32,
    /// Value
    pub value: f64,
}

/// One resolved connection, in group-local indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Projection {
    /// Source group index
    pub src_group: u32,
    /// Source neuron (group local)
    pub src_neuron: u32,
    /// Source event source
    pub src_source: u32,
    /// Destination group index
    pub dest_group: u32,
    /// Destination neuron (group local)
    pub dest_neuron: u32,
    /// Destination synapse type
    pub syn_type: u32,
    /// Destination slot
    pub slot: u32,
}

/// Complete lowered model
#[derive(Debug, Clone, Default)]
pub struct ImageSpec {
    /// Groups in id-range order
    pub groups: Vec<GroupSpec>,
    /// Connections in creation order
    pub projections: Vec<Projection>,
}

impl ImageSpec {
    /// Total neurons across all groups
    pub fn neuron_count(&self) -> u64 {
        self.groups.iter().map(|g| g.count as u64).sum()
    }
}

/// Per-neuron synapse storage layout of one group.
///
/// Slot state of one neuron is a contiguous block; inside it each synapse
/// type owns `slots * vars` values starting at its offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynLayout {
    /// Slot count per synapse type
    pub slots: Vec<usize>,
    /// Variable count per synapse type
    pub vars: Vec<usize>,
    /// Start of each type's block within a neuron's slot state
    pub offsets: Vec<usize>,
    /// Start of each type's accumulation cells within a neuron's cells
    pub cell_offsets: Vec<usize>,
    /// Slot state values per neuron
    pub stride: usize,
    /// Accumulation cells per neuron (one per slot)
    pub cell_stride: usize,
}

impl SynLayout {
    /// Layout for the given type and compiled slot counts
    pub fn new(ty: &NeuronType, slots: &[u32]) -> Self {
        let mut layout = SynLayout {
            slots: Vec::with_capacity(slots.len()),
            vars: Vec::with_capacity(slots.len()),
            offsets: Vec::with_capacity(slots.len()),
            cell_offsets: Vec::with_capacity(slots.len()),
            stride: 0,
            cell_stride: 0,
        };
        for (syn, &count) in ty.synapse_types().iter().zip(slots) {
            let count = count as usize;
            layout.offsets.push(layout.stride);
            layout.cell_offsets.push(layout.cell_stride);
            layout.slots.push(count);
            layout.vars.push(syn.vars().len());
            layout.stride += count * syn.vars().len();
            layout.cell_stride += count;
        }
        layout
    }

    /// Number of synapse types
    pub fn types(&self) -> usize {
        self.slots.len()
    }

    /// Index of `(syn_type, slot, var)` inside a neuron's slot state
    #[inline]
    pub fn index(&self, syn_type: usize, slot: usize, var: usize) -> usize {
        self.offsets[syn_type] + slot * self.vars[syn_type] + var
    }

    /// Range of `(syn_type, slot)` inside a neuron's slot state
    #[inline]
    pub fn slot_range(&self, syn_type: usize, slot: usize) -> core::ops::Range<usize> {
        let start = self.index(syn_type, slot, 0);
        start..start + self.vars[syn_type]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikeforge_ir::stock::{Facilitating, StaticWeight};
    use spikeforge_ir::{stock::Silent, SlotCapacity, SynapseType};

    #[test]
    fn test_syn_layout() {
        let ty = NeuronType::builder("Mixed")
            .state("x", 0.0)
            .synapse(SynapseType::new("exc", SlotCapacity::Unbounded, StaticWeight).var("w", 1.0))
            .synapse(Facilitating::default().synapse_type("fac", SlotCapacity::Bounded(2), 0.5))
            .dynamics(Silent)
            .build()
            .unwrap();

        let layout = SynLayout::new(&ty, &[3, 2]);
        assert_eq!(layout.stride, 3 + 2 * 3);
        assert_eq!(layout.cell_stride, 5);
        assert_eq!(layout.offsets, vec![0, 3]);
        assert_eq!(layout.cell_offsets, vec![0, 3]);
        assert_eq!(layout.index(1, 1, 2), 3 + 3 + 2);
        assert_eq!(layout.slot_range(0, 2), 2..3);
    }
}
