//! Generation pass infrastructure

use spikeforge_ir::SlotCapacity;
use spikeforge_runtime::{DeliveryMode, ImageSpec};

use crate::config::GenerateOptions;
use crate::error::{CompilerError, Result};

/// Lowered model plus the options it is generated with
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    /// Lowered model
    pub spec: ImageSpec,
    /// Generation options
    pub options: GenerateOptions,
}

/// Pass trait for transforming or checking a generation plan
pub trait Pass {
    /// Pass name
    fn name(&self) -> &'static str;

    /// Run the pass on a plan
    fn run(&self, plan: &mut GenerationPlan) -> Result<()>;
}

/// Sizes every synapse type's slot block to the highest connected slot.
///
/// Synapse writes to slots no connection reaches are dropped here.
#[derive(Debug, Default)]
pub struct SlotLayoutPass;

impl Pass for SlotLayoutPass {
    fn name(&self) -> &'static str {
        "slot-layout"
    }

    fn run(&self, plan: &mut GenerationPlan) -> Result<()> {
        let spec = &mut plan.spec;
        for group in spec.groups.iter_mut() {
            group.slots.iter_mut().for_each(|s| *s = 0);
        }
        for p in &spec.projections {
            let group = spec
                .groups
                .get_mut(p.dest_group as usize)
                .ok_or_else(|| CompilerError::generation(format!("connection into missing group {}", p.dest_group)))?;
            let slots = group.slots.get_mut(p.syn_type as usize).ok_or_else(|| {
                CompilerError::generation(format!(
                    "connection into group '{}' uses synapse type {} which its type does not declare",
                    group.name, p.syn_type
                ))
            })?;
            *slots = (*slots).max(p.slot + 1);
        }
        for group in spec.groups.iter_mut() {
            let before = group.slot_values.len();
            let slots = &group.slots;
            group
                .slot_values
                .retain(|v| slots.get(v.syn_type as usize).is_some_and(|&n| v.slot < n));
            let dropped = before - group.slot_values.len();
            if dropped > 0 {
                log::warn!(
                    "Group '{}': dropped {} synapse writes to unconnected slots",
                    group.name,
                    dropped
                );
            }
        }
        Ok(())
    }
}

/// Rejects groups whose delivery strategy the options disable
#[derive(Debug, Default)]
pub struct DeliveryModePass;

impl Pass for DeliveryModePass {
    fn name(&self) -> &'static str {
        "delivery-mode"
    }

    fn run(&self, plan: &mut GenerationPlan) -> Result<()> {
        let options = plan.options;
        if !options.parallel_delivery && !options.atomic_delivery {
            return Err(CompilerError::generation("both parallel and atomic delivery are disabled"));
        }
        for group in &plan.spec.groups {
            let enabled = match group.delivery {
                DeliveryMode::Parallel => options.parallel_delivery,
                DeliveryMode::Atomic => options.atomic_delivery,
            };
            if !enabled {
                return Err(CompilerError::generation(format!(
                    "group '{}' uses {} delivery, which is disabled for this generation",
                    group.name, group.delivery
                )));
            }
        }
        Ok(())
    }
}

/// Checks id blocks, slot capacities and connection endpoints
#[derive(Debug, Default)]
pub struct VerifyPass;

impl Pass for VerifyPass {
    fn name(&self) -> &'static str {
        "verify"
    }

    fn run(&self, plan: &mut GenerationPlan) -> Result<()> {
        let spec = &plan.spec;
        let mut next = 0u64;
        for group in &spec.groups {
            if group.count == 0 {
                return Err(CompilerError::generation(format!("group '{}' is empty", group.name)));
            }
            if u64::from(group.offset.raw()) != next {
                return Err(CompilerError::generation(format!(
                    "group '{}' starts at id {} but the previous block ends at {}",
                    group.name,
                    group.offset.raw(),
                    next
                )));
            }
            next += u64::from(group.count);

            if group.adaptive && !(group.min_dt > 0.0) {
                return Err(CompilerError::generation(format!(
                    "adaptive group '{}' needs min_dt > 0, got {}",
                    group.name, group.min_dt
                )));
            }
            for (syn, &slots) in group.ty.synapse_types().iter().zip(&group.slots) {
                if let SlotCapacity::Bounded(bound) = syn.capacity() {
                    if slots > bound {
                        return Err(CompilerError::generation(format!(
                            "group '{}': synapse type '{}' needs {} slots, capacity is {}",
                            group.name,
                            syn.name(),
                            slots,
                            bound
                        )));
                    }
                }
            }
        }

        for p in &spec.projections {
            let (Some(src), Some(dest)) = (spec.groups.get(p.src_group as usize), spec.groups.get(p.dest_group as usize))
            else {
                return Err(CompilerError::generation(format!(
                    "connection between missing groups {} -> {}",
                    p.src_group, p.dest_group
                )));
            };
            if p.src_neuron >= src.count || p.src_source as usize >= src.ty.event_source_count() {
                return Err(CompilerError::generation(format!(
                    "connection source (neuron {}, event source {}) outside group '{}'",
                    p.src_neuron, p.src_source, src.name
                )));
            }
            if p.dest_neuron >= dest.count {
                return Err(CompilerError::generation(format!(
                    "connection destination neuron {} outside group '{}'",
                    p.dest_neuron, dest.name
                )));
            }
        }
        Ok(())
    }
}

/// Pass manager
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PassManager {
    /// Create an empty pass manager
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Passes every generation runs
    pub fn standard() -> Self {
        let mut pm = Self::new();
        pm.add(SlotLayoutPass);
        pm.add(DeliveryModePass);
        pm.add(VerifyPass);
        pm
    }

    /// Add a pass
    pub fn add<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    /// Run all passes in order
    pub fn run(&self, plan: &mut GenerationPlan) -> Result<()> {
        for pass in &self.passes {
            log::debug!("Running generation pass '{}'", pass.name());
            pass.run(plan)?;
        }
        Ok(())
    }
}
