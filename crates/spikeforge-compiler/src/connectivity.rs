//! Connection bookkeeping: slot ownership and automatic slot assignment

use std::collections::{BTreeSet, HashMap};

use spikeforge_ir::SlotCapacity;

use crate::error::{CompilerError, Result};
use crate::group::{Group, GroupId};

/// One synaptic connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// Source group
    pub src_group: GroupId,
    /// Source neuron (group local)
    pub src_neuron: u32,
    /// Source event source
    pub src_source: u32,
    /// Destination group
    pub dest_group: GroupId,
    /// Destination neuron (group local)
    pub dest_neuron: u32,
    /// Destination synapse type
    pub syn_type: u32,
    /// Destination slot
    pub slot: u32,
}

/// Slot usage of one destination neuron and synapse type
#[derive(Debug, Default)]
struct SlotBook {
    taken: BTreeSet<u32>,
    cursor: u32,
}

impl SlotBook {
    fn next_free(&self) -> u32 {
        let mut slot = self.cursor;
        for &taken in self.taken.range(self.cursor..) {
            if taken != slot {
                break;
            }
            slot += 1;
        }
        slot
    }

    fn free_slots(&self, capacity: SlotCapacity) -> Option<u32> {
        let bound = capacity.bound()?;
        if self.cursor >= bound {
            return Some(0);
        }
        let used = self.taken.range(self.cursor..bound).count() as u32;
        Some(bound - self.cursor - used)
    }
}

type DestKey = (GroupId, u32, u32);

/// All connections of a model in creation order
#[derive(Debug, Default)]
pub struct ConnectionTable {
    connections: Vec<Connection>,
    books: HashMap<DestKey, SlotBook>,
    slot_counts: HashMap<(GroupId, u32), u32>,
}

impl ConnectionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections in creation order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Number of connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connection exists
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Slots of `syn_type` needed on every neuron of `group` (highest used slot + 1)
    pub fn slot_count(&self, group: GroupId, syn_type: u32) -> u32 {
        self.slot_counts.get(&(group, syn_type)).copied().unwrap_or(0)
    }

    /// Whether a destination slot is bound
    pub fn is_occupied(&self, group: GroupId, neuron: u32, syn_type: u32, slot: u32) -> bool {
        self.books
            .get(&(group, neuron, syn_type))
            .is_some_and(|book| book.taken.contains(&slot))
    }

    /// Slots still available to automatic assignment; `None` when unbounded
    pub fn free_slots(&self, dest: &Group, dest_id: GroupId, neuron: u32, syn_type: u32) -> Option<u32> {
        let capacity = dest.capacity(syn_type);
        match self.books.get(&(dest_id, neuron, syn_type)) {
            Some(book) => book.free_slots(capacity),
            None => capacity.bound(),
        }
    }

    /// Bind an explicit slot. Indices must already be validated.
    pub fn insert(&mut self, dest: &Group, connection: Connection) -> Result<()> {
        let capacity = dest.capacity(connection.syn_type);
        if !capacity.admits(connection.slot) {
            return Err(CompilerError::out_of_range(
                "slot",
                dest.name(),
                connection.slot,
                capacity.bound().unwrap_or(u32::MAX),
            ));
        }
        let book = self
            .books
            .entry((connection.dest_group, connection.dest_neuron, connection.syn_type))
            .or_default();
        if !book.taken.insert(connection.slot) {
            return Err(CompilerError::SlotOccupied {
                group: dest.name().to_string(),
                neuron: connection.dest_neuron,
                syn_type: connection.syn_type,
                slot: connection.slot,
            });
        }
        self.record(connection);
        Ok(())
    }

    /// Bind the next free slot; returns the assigned slot
    pub fn connect(&mut self, dest: &Group, mut connection: Connection) -> Result<u32> {
        let capacity = dest.capacity(connection.syn_type);
        let book = self
            .books
            .entry((connection.dest_group, connection.dest_neuron, connection.syn_type))
            .or_default();
        let slot = book.next_free();
        if !capacity.admits(slot) {
            return Err(CompilerError::SlotsExhausted {
                group: dest.name().to_string(),
                neuron: connection.dest_neuron,
                syn_type: connection.syn_type,
                capacity: capacity.bound().unwrap_or(u32::MAX),
            });
        }
        book.taken.insert(slot);
        book.cursor = slot + 1;
        connection.slot = slot;
        self.record(connection);
        Ok(slot)
    }

    fn record(&mut self, connection: Connection) {
        let count = self
            .slot_counts
            .entry((connection.dest_group, connection.syn_type))
            .or_insert(0);
        *count = (*count).max(connection.slot + 1);
        self.connections.push(connection);
    }
}
