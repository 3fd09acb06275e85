//! Lowering of the host-side model into a runtime image description

use spikeforge_runtime::{Arena, ImageSpec, Projection};

use crate::connectivity::ConnectionTable;
use crate::error::Result;
use crate::group::{Group, GroupId};

/// Lower groups (in add order) and connections (in creation order).
///
/// Slot counts are left at zero; [`crate::passes::SlotLayoutPass`] sizes them.
pub(crate) fn lower(groups: &Arena<Group>, order: &[GroupId], table: &ConnectionTable) -> Result<ImageSpec> {
    let groups_spec = order
        .iter()
        .map(|&id| groups.get(id).map(Group::to_spec))
        .collect::<spikeforge_runtime::Result<Vec<_>>>()?;

    let mut projections = Vec::with_capacity(table.len());
    for c in table.connections() {
        let src = groups.get(c.src_group)?;
        let dest = groups.get(c.dest_group)?;
        projections.push(Projection {
            src_group: src.index(),
            src_neuron: c.src_neuron,
            src_source: c.src_source,
            dest_group: dest.index(),
            dest_neuron: c.dest_neuron,
            syn_type: c.syn_type,
            slot: c.slot,
        });
    }

    Ok(ImageSpec {
        groups: groups_spec,
        projections,
    })
}
