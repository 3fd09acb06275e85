//! Identifier types shared across the workspace

use core::fmt;

/// Global neuron identifier.
///
/// Groups consume contiguous id ranges in the order they are added, so the
/// neuron at local index `i` of a group with offset `o` has id `o + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuronId(pub u32);

impl NeuronId {
    /// Create a new neuron ID
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Id of the neuron `index` positions after this one
    pub const fn offset(&self, index: u32) -> Self {
        Self(self.0 + index)
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Half-open range of global neuron ids owned by one group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdRange {
    /// First id of the range
    pub start: NeuronId,
    /// Number of ids
    pub len: u32,
}

impl IdRange {
    /// Create a range of `len` ids starting at `start`
    pub const fn new(start: NeuronId, len: u32) -> Self {
        Self { start, len }
    }

    /// One past the last id
    pub const fn end(&self) -> NeuronId {
        NeuronId(self.start.0 + self.len)
    }

    /// Whether `id` lies in the range
    pub const fn contains(&self, id: NeuronId) -> bool {
        id.0 >= self.start.0 && id.0 < self.start.0 + self.len
    }

    /// Global id of local index `index`, if in range
    pub fn global(&self, index: u32) -> Option<NeuronId> {
        (index < self.len).then(|| self.start.offset(index))
    }
}
