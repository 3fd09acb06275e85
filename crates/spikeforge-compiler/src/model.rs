//! Model front end
//!
//! A [`Model`] is described incrementally (groups, connections, connector
//! applications), then generated into a compiled image at a fixed precision.
//! After generation it is structurally frozen: only globals, constants,
//! synapse slot values, recorders and scheduling may change.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use spikeforge_ir::{Catalog, IdRange, IrError, NeuronId, NeuronType, Precision};
use spikeforge_runtime::{
    Arena, CompiledImage, ModelId, Phase, Recorder, RecorderBank, RecorderId, Signal, Simulation,
};

use crate::config::{GenerateOptions, ModelConfig};
use crate::connectivity::{Connection, ConnectionTable};
use crate::connector::{check_args, Connector, ConnectorArgs, ConnectorRegistry, ConnectorRequest};
use crate::error::{CompilerError, Result};
use crate::group::{Group, GroupId, GroupOptions, GroupView, GroupViewMut};
use crate::lower::lower;
use crate::passes::{GenerationPlan, PassManager};

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Spiking network model
#[derive(Debug)]
pub struct Model {
    id: ModelId,
    config: ModelConfig,
    catalog: Catalog,
    groups: Arena<Group>,
    order: Vec<GroupId>,
    names: HashMap<String, GroupId>,
    next_id: u32,
    table: ConnectionTable,
    connectors: ConnectorRegistry,
    applications: u64,
    simulation: Option<Simulation>,
    recorders: RecorderBank,
}

impl Model {
    /// Create an empty model with an empty catalog
    pub fn new(config: ModelConfig) -> Result<Self> {
        Self::with_catalog(config, Catalog::new())
    }

    /// Create an empty model over an existing catalog
    pub fn with_catalog(config: ModelConfig, catalog: Catalog) -> Result<Self> {
        config.validate()?;
        let id = ModelId::fresh();
        log::debug!("Creating model {} ({} precision, dt={})", id.raw(), config.precision, config.timestep);
        Ok(Self {
            id,
            config,
            catalog,
            groups: Arena::new(id, "group"),
            order: Vec::new(),
            names: HashMap::new(),
            next_id: 0,
            table: ConnectionTable::new(),
            connectors: ConnectorRegistry::new(),
            applications: 0,
            simulation: None,
            recorders: RecorderBank::new(id),
        })
    }

    /// Model identity carried by every handle it issues
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Model configuration
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Compile precision
    pub fn precision(&self) -> Precision {
        self.config.precision
    }

    /// Neuron type catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Neuron type catalog, mutably
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Register a neuron type in the model's catalog
    pub fn register_type(&mut self, ty: NeuronType) -> Result<Arc<NeuronType>> {
        Ok(self.catalog.register(ty)?)
    }

    /// Lifecycle phase
    pub fn phase(&self) -> Phase {
        self.simulation.as_ref().map_or(Phase::Unbuilt, Simulation::phase)
    }

    /// Whether the model has been generated
    pub fn is_generated(&self) -> bool {
        self.simulation.is_some()
    }

    fn ensure_open(&self, operation: &'static str) -> Result<()> {
        if self.is_generated() {
            Err(CompilerError::ModelAlreadyGenerated { operation })
        } else {
            Ok(())
        }
    }

    fn simulation_mut(&mut self, operation: &'static str) -> Result<&mut Simulation> {
        self.simulation
            .as_mut()
            .ok_or(CompilerError::NotGenerated { operation })
    }

    // --- groups ---

    /// Add a group of `count` neurons of the catalog type `type_name`
    pub fn add_group(&mut self, type_name: &str, count: u32, options: GroupOptions) -> Result<GroupId> {
        self.ensure_open("add group")?;
        let ty = self.catalog.get(type_name).map_err(|e| match e {
            IrError::TypeNotFound { name } => CompilerError::UnknownType { name },
            other => other.into(),
        })?;

        let name = match options.name {
            Some(name) => {
                if self.names.contains_key(&name) {
                    return Err(CompilerError::DuplicateName { name });
                }
                name
            }
            None => self.internal_name(),
        };
        if count == 0 {
            return Err(CompilerError::InvalidCount { name, count });
        }
        let start = self.next_id;
        let end = start.checked_add(count).ok_or_else(|| CompilerError::InvalidCount {
            name: name.clone(),
            count,
        })?;

        let min_dt = options.min_dt.unwrap_or(self.config.timestep);
        if !(min_dt > 0.0) || !min_dt.is_finite() {
            return Err(CompilerError::invalid_parameter("min_dt", min_dt.to_string(), "finite and > 0"));
        }
        if options.adaptive && min_dt > self.config.timestep {
            log::warn!(
                "Group '{}': min_dt {} exceeds the timestep {}; every tick is a single sub-step",
                name,
                min_dt,
                self.config.timestep
            );
        }

        let index = self.order.len() as u32;
        let group = Group::new(
            name.clone(),
            ty,
            index,
            IdRange::new(NeuronId::new(start), count),
            options.adaptive,
            options.delivery,
            min_dt,
        );
        let id = self.groups.insert(group);
        self.order.push(id);
        self.names.insert(name.clone(), id);
        self.next_id = end;
        log::debug!(
            "Added group '{}' of {} '{}' neurons at ids {}..{}",
            name,
            count,
            type_name,
            start,
            end
        );
        Ok(id)
    }

    fn internal_name(&self) -> String {
        let mut n = self.order.len();
        loop {
            let name = format!("group{}", n);
            if !self.names.contains_key(&name) {
                return name;
            }
            n += 1;
        }
    }

    /// Look up a group by name
    pub fn group_id(&self, name: &str) -> Result<GroupId> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| CompilerError::not_found("group", name))
    }

    /// Groups in add order
    pub fn group_ids(&self) -> &[GroupId] {
        &self.order
    }

    /// Read access to a group
    pub fn group(&self, id: GroupId) -> Result<GroupView<'_>> {
        Ok(GroupView {
            group: self.groups.get(id)?,
            image: self.simulation.as_ref().map(Simulation::image),
        })
    }

    /// Read-write access to a group
    pub fn group_mut(&mut self, id: GroupId) -> Result<GroupViewMut<'_>> {
        Ok(GroupViewMut {
            group: self.groups.get_mut(id)?,
            image: self.simulation.as_mut().map(Simulation::image_mut),
        })
    }

    /// Read access to a group by name
    pub fn group_by_name(&self, name: &str) -> Result<GroupView<'_>> {
        self.group(self.group_id(name)?)
    }

    /// Total neurons across all groups
    pub fn neuron_count(&self) -> u32 {
        self.next_id
    }

    // --- connectivity ---

    fn check_endpoints(&self, src: GroupId, src_neuron: u32, src_source: u32, dest: GroupId, dest_neuron: u32, syn_type: u32) -> Result<()> {
        let src = self.groups.get(src)?;
        src.check_neuron(src_neuron)?;
        src.check_event_source(src_source)?;
        let dest = self.groups.get(dest)?;
        dest.check_neuron(dest_neuron)?;
        dest.check_syn_type(syn_type)
    }

    /// Connect into an explicit destination slot
    #[allow(clippy::too_many_arguments)]
    pub fn set_connection(
        &mut self,
        src: GroupId,
        src_neuron: u32,
        src_source: u32,
        dest: GroupId,
        dest_neuron: u32,
        syn_type: u32,
        slot: u32,
    ) -> Result<()> {
        self.ensure_open("set connection")?;
        self.check_endpoints(src, src_neuron, src_source, dest, dest_neuron, syn_type)?;
        let connection = Connection {
            src_group: src,
            src_neuron,
            src_source,
            dest_group: dest,
            dest_neuron,
            syn_type,
            slot,
        };
        self.table.insert(self.groups.get(dest)?, connection)
    }

    /// Connect into the next free destination slot; returns the slot
    pub fn connect(
        &mut self,
        src: GroupId,
        src_neuron: u32,
        src_source: u32,
        dest: GroupId,
        dest_neuron: u32,
        syn_type: u32,
    ) -> Result<u32> {
        self.ensure_open("connect")?;
        self.check_endpoints(src, src_neuron, src_source, dest, dest_neuron, syn_type)?;
        let connection = Connection {
            src_group: src,
            src_neuron,
            src_source,
            dest_group: dest,
            dest_neuron,
            syn_type,
            slot: 0,
        };
        self.table.connect(self.groups.get(dest)?, connection)
    }

    /// Register a connector under its name
    pub fn register_connector(&mut self, connector: impl Connector + 'static) -> Result<()> {
        self.connectors.register(connector)
    }

    /// Connector registry
    pub fn connectors(&self) -> &ConnectorRegistry {
        &self.connectors
    }

    /// Expand a named connector rule into connections with automatic slots.
    ///
    /// Ranges are group-local and end exclusive. Either every generated
    /// connection is added or, on error, none is. Returns the number added.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_connector(
        &mut self,
        name: &str,
        multiplier: u32,
        src: GroupId,
        src_range: Range<u32>,
        src_source: u32,
        dest: GroupId,
        dest_range: Range<u32>,
        syn_type: u32,
        args: &ConnectorArgs,
    ) -> Result<usize> {
        self.ensure_open("apply connector")?;
        let connector = self.connectors.get(name)?;
        check_args(connector.as_ref(), args)?;

        let src_group = self.groups.get(src)?;
        let dest_group = self.groups.get(dest)?;
        check_range(src_group, &src_range)?;
        check_range(dest_group, &dest_range)?;
        src_group.check_event_source(src_source)?;
        dest_group.check_syn_type(syn_type)?;
        if src_range.is_empty() || dest_range.is_empty() || multiplier == 0 {
            log::warn!(
                "Connector '{}' applied to an empty candidate set ({:?} -> {:?} x{})",
                name,
                src_range,
                dest_range,
                multiplier
            );
        }

        let seed = self.config.seed ^ self.applications.wrapping_mul(SEED_MIX);
        let request = ConnectorRequest {
            multiplier,
            src: src_range,
            dest: dest_range,
            args,
            seed,
        };
        let mut pairs = Vec::new();
        connector.expand(&request, &mut pairs)?;

        // capacity is checked up front so a failing rule leaves no partial connectivity
        let mut demand: HashMap<u32, u32> = HashMap::new();
        for &(s, d) in &pairs {
            if !request.src.contains(&s) || !request.dest.contains(&d) {
                return Err(CompilerError::generation(format!(
                    "connector '{}' produced pair ({}, {}) outside {:?} -> {:?}",
                    name, s, d, request.src, request.dest
                )));
            }
            *demand.entry(d).or_insert(0) += 1;
        }
        for (&neuron, &needed) in &demand {
            if let Some(free) = self.table.free_slots(dest_group, dest, neuron, syn_type) {
                if needed > free {
                    return Err(CompilerError::SlotsExhausted {
                        group: dest_group.name().to_string(),
                        neuron,
                        syn_type,
                        capacity: dest_group.capacity(syn_type).bound().unwrap_or(u32::MAX),
                    });
                }
            }
        }

        for &(s, d) in &pairs {
            self.table.connect(
                dest_group,
                Connection {
                    src_group: src,
                    src_neuron: s,
                    src_source,
                    dest_group: dest,
                    dest_neuron: d,
                    syn_type,
                    slot: 0,
                },
            )?;
        }
        // only committed rules advance the seed sequence
        self.applications += 1;
        log::debug!(
            "Connector '{}' added {} connections from '{}' to '{}'",
            name,
            pairs.len(),
            src_group.name(),
            dest_group.name()
        );
        Ok(pairs.len())
    }

    /// Number of connections
    pub fn connection_count(&self) -> usize {
        self.table.len()
    }

    /// Connections in creation order
    pub fn connections(&self) -> &[Connection] {
        self.table.connections()
    }

    /// Slots of `syn_type` each neuron of `group` will be compiled with
    pub fn slot_count(&self, group: GroupId, syn_type: u32) -> Result<u32> {
        self.groups.get(group)?.check_syn_type(syn_type)?;
        Ok(self.table.slot_count(group, syn_type))
    }

    // --- generation ---

    /// Compile the model; structure is frozen afterwards
    pub fn generate(&mut self, options: GenerateOptions) -> Result<()> {
        self.ensure_open("generate")?;
        if self.order.is_empty() {
            return Err(CompilerError::generation("model has no groups"));
        }

        let spec = lower(&self.groups, &self.order, &self.table)?;
        let mut plan = GenerationPlan { spec, options };
        PassManager::standard().run(&mut plan)?;

        let image = CompiledImage::build(&plan.spec, self.config.precision)?;
        let threads = self.config.target.pool_threads()?;
        let mut simulation = Simulation::new(image, self.config.timestep, threads)?;
        log::info!(
            "Generated model {}: {} groups, {} neurons, {} connections, {} precision, {} bytes of delivery buffers",
            self.id.raw(),
            self.order.len(),
            self.next_id,
            self.table.len(),
            self.config.precision,
            simulation.image().delivery_footprint()
        );
        if options.initialize {
            simulation.reset();
        }
        self.simulation = Some(simulation);
        Ok(())
    }

    /// Restore initial state and clear pending events; recorders are kept
    pub fn initialize_model(&mut self) -> Result<()> {
        self.simulation_mut("initialize model")?.reset();
        Ok(())
    }

    /// Restore initial state and zero simulated time; recorders are kept
    pub fn reset_run(&mut self) -> Result<()> {
        self.simulation_mut("reset run")?.reset();
        Ok(())
    }

    /// Run every neuron type's initialization hook
    pub fn init_run(&mut self) -> Result<()> {
        self.simulation_mut("init run")?.init_run();
        Ok(())
    }

    /// Advance `steps` global ticks
    pub fn run(&mut self, steps: u64) -> Result<()> {
        let simulation = self.simulation.as_mut().ok_or(CompilerError::NotGenerated { operation: "run" })?;
        simulation.run(steps, &mut self.recorders)?;
        Ok(())
    }

    /// Advance until the global step counter reaches `target`
    pub fn run_until(&mut self, target: u64) -> Result<()> {
        let simulation = self
            .simulation
            .as_mut()
            .ok_or(CompilerError::NotGenerated { operation: "run until" })?;
        simulation.run_until(target, &mut self.recorders)?;
        Ok(())
    }

    /// Global steps executed since the last reset
    pub fn step(&self) -> u64 {
        self.simulation.as_ref().map_or(0, Simulation::step)
    }

    /// Simulated time
    pub fn time(&self) -> f64 {
        self.simulation.as_ref().map_or(0.0, Simulation::time)
    }

    /// Global timestep
    pub fn timestep_size(&self) -> f64 {
        self.simulation
            .as_ref()
            .map_or(self.config.timestep, Simulation::timestep)
    }

    /// Change the global timestep; allowed before and after generation
    pub fn set_timestep_size(&mut self, timestep: f64) -> Result<()> {
        ModelConfig {
            timestep,
            ..self.config.clone()
        }
        .validate()?;
        if let Some(simulation) = self.simulation.as_mut() {
            simulation.set_timestep(timestep)?;
        }
        self.config.timestep = timestep;
        Ok(())
    }

    // --- recorders ---

    /// Attach a recorder for `signal` to one neuron
    pub fn record_signal(&mut self, group: GroupId, neuron: u32, signal: &Signal) -> Result<RecorderId> {
        let g = self.groups.get(group)?;
        g.check_neuron(neuron)?;
        let neuron_id = g.ids().start.offset(neuron);
        Ok(self
            .recorders
            .attach(g.neuron_type(), g.index() as usize, neuron, neuron_id, signal)?)
    }

    /// Record a state variable or global of one neuron every tick
    pub fn record(&mut self, group: GroupId, neuron: u32, var: &str) -> Result<RecorderId> {
        self.record_signal(group, neuron, &Signal::Var(var.to_string()))
    }

    /// Record the crossings of one event source of one neuron
    pub fn record_events(&mut self, group: GroupId, neuron: u32, source: usize) -> Result<RecorderId> {
        self.record_signal(group, neuron, &Signal::Event(source))
    }

    /// Look up a recorder
    pub fn recorder(&self, id: RecorderId) -> Result<&Recorder> {
        Ok(self.recorders.get(id)?)
    }

    /// Live recorders with their handles
    pub fn recorders(&self) -> impl Iterator<Item = (RecorderId, &Recorder)> {
        self.recorders.iter()
    }

    /// Detach every recorder of one neuron; returns how many were removed
    pub fn stop_recording(&mut self, group: GroupId, neuron: u32) -> Result<usize> {
        let g = self.groups.get(group)?;
        g.check_neuron(neuron)?;
        let removed = self.recorders.stop(g.index() as usize, neuron);
        log::debug!("Stopped {} recorders on neuron {} of '{}'", removed, neuron, g.name());
        Ok(removed)
    }
}

fn check_range(group: &Group, range: &Range<u32>) -> Result<()> {
    if range.start > range.end {
        return Err(CompilerError::invalid_parameter(
            "range",
            format!("{:?}", range),
            "start <= end",
        ));
    }
    if range.end > group.count() {
        return Err(CompilerError::out_of_range("neuron", group.name(), range.end - 1, group.count()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spikeforge_ir::{stock, ErrorKind, SlotCapacity};

    fn model() -> Model {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut model = Model::new(ModelConfig::default()).unwrap();
        model.register_type(stock::regular().unwrap()).unwrap();
        model
            .register_type(stock::silent("Quiet", SlotCapacity::Bounded(2)).unwrap())
            .unwrap();
        model
    }

    #[test]
    fn test_add_group() {
        let mut model = model();
        let a = model.add_group("Regular", 10, GroupOptions::named("a")).unwrap();
        let b = model.add_group("Quiet", 5, GroupOptions::default()).unwrap();
        assert_eq!(model.group(a).unwrap().offset(), NeuronId::new(0));
        assert_eq!(model.group(b).unwrap().offset(), NeuronId::new(10));
        assert_eq!(model.group(b).unwrap().name(), "group1");
        assert_eq!(model.group_id("group1").unwrap(), b);
        assert_eq!(model.neuron_count(), 15);

        let err = model.add_group("Regular", 1, GroupOptions::named("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateName);
        let err = model.add_group("Nope", 1, GroupOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownType);
        let err = model.add_group("Regular", 0, GroupOptions::named("z")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidCount);
        assert_eq!(model.group_id("z").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_type_in_use() {
        let mut model = model();
        model.add_group("Quiet", 1, GroupOptions::default()).unwrap();
        let err = model.catalog_mut().unregister("Quiet").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeInUse);
        assert!(model.catalog_mut().unregister("Regular").is_ok());
    }

    #[test]
    fn test_connector_is_all_or_nothing() {
        let mut model = model();
        let q = model.add_group("Quiet", 3, GroupOptions::default()).unwrap();
        model.connect(q, 0, 0, q, 1, 0).unwrap();

        // neuron 1 has one free slot left, AllToAll needs three
        let err = model
            .apply_connector("AllToAll", 1, q, 0..3, 0, q, 1..2, 0, &ConnectorArgs::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SlotsExhausted);
        assert_eq!(model.connection_count(), 1);

        let added = model
            .apply_connector("OneToOne", 1, q, 0..2, 0, q, 1..3, 0, &ConnectorArgs::new())
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(model.connections()[1].slot, 1);
        assert_eq!(model.connections()[2].slot, 0);
        assert_eq!(model.slot_count(q, 0).unwrap(), 2);
    }

    #[test]
    fn test_connector_argument_errors() {
        let mut model = model();
        let r = model.add_group("Regular", 4, GroupOptions::default()).unwrap();
        let err = model
            .apply_connector("Nope", 1, r, 0..4, 0, r, 0..4, 0, &ConnectorArgs::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownConnector);
        let err = model
            .apply_connector("RandConn", 1, r, 0..4, 0, r, 0..4, 0, &ConnectorArgs::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        let err = model
            .apply_connector("AllToAll", 1, r, 0..5, 0, r, 0..4, 0, &ConnectorArgs::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        let err = model
            .apply_connector("AllToAll", 1, r, 0..4, 1, r, 0..4, 0, &ConnectorArgs::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(model.connection_count(), 0);
    }

    #[test]
    fn test_lifecycle() {
        let mut model = model();
        assert_eq!(model.phase(), Phase::Unbuilt);
        assert_eq!(model.run(1).unwrap_err().kind(), ErrorKind::NotReady);
        assert_eq!(model.generate(GenerateOptions::default()).unwrap_err().kind(), ErrorKind::GenerationError);

        let r = model.add_group("Regular", 2, GroupOptions::default()).unwrap();
        model
            .generate(GenerateOptions {
                initialize: false,
                ..GenerateOptions::default()
            })
            .unwrap();
        assert_eq!(model.phase(), Phase::Generated);
        assert_eq!(model.run(1).unwrap_err().kind(), ErrorKind::NotReady);

        model.initialize_model().unwrap();
        assert_eq!(model.phase(), Phase::Initialized);
        model.run(3).unwrap();
        assert_eq!(model.phase(), Phase::Running);
        assert_eq!(model.step(), 3);

        let err = model.add_group("Regular", 1, GroupOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelAlreadyGenerated);
        let err = model.generate(GenerateOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelAlreadyGenerated);
        let err = model.connect(r, 0, 0, r, 1, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ModelAlreadyGenerated);
    }

    #[test]
    fn test_post_generation_writes() {
        let mut model = model();
        let r = model.add_group("Regular", 2, GroupOptions::default()).unwrap();
        model.group_mut(r).unwrap().set_global("I", 0, 1.5).unwrap();
        model.generate(GenerateOptions::default()).unwrap();

        assert_eq!(model.group(r).unwrap().global("I", 0).unwrap(), 1.5);
        model.group_mut(r).unwrap().set_constant("tau_m", 5.0).unwrap();
        assert_eq!(model.group(r).unwrap().constant("tau_m").unwrap(), 5.0);
        let err = model.group(r).unwrap().syn_global("w", 0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_unconnected_slot_write_is_not_compiled() {
        let mut model = model();
        let r = model.add_group("Regular", 2, GroupOptions::default()).unwrap();
        model.connect(r, 0, 0, r, 1, 0).unwrap();
        {
            let mut view = model.group_mut(r).unwrap();
            view.set_syn_global("w", 1, 0, 0.5).unwrap();
            view.set_syn_global("w", 0, 1_000_000_000, 3.0).unwrap();
        }
        model.generate(GenerateOptions::default()).unwrap();

        let view = model.group(r).unwrap();
        assert_eq!(view.syn_global("w", 1, 0).unwrap(), 0.5);
        let err = view.syn_global("w", 0, 1_000_000_000).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_handles_are_model_scoped() {
        let mut a = model();
        let mut b = model();
        let ga = a.add_group("Regular", 1, GroupOptions::default()).unwrap();
        b.add_group("Regular", 1, GroupOptions::default()).unwrap();
        assert_eq!(b.group(ga).unwrap_err().kind(), ErrorKind::StaleHandle);

        let rec = a.record(ga, 0, "V").unwrap();
        assert_eq!(a.stop_recording(ga, 0).unwrap(), 1);
        assert_eq!(a.recorder(rec).unwrap_err().kind(), ErrorKind::StaleHandle);
    }

    #[test]
    fn test_timestep_size() {
        let mut model = model();
        model.set_timestep_size(0.5).unwrap();
        assert_eq!(model.timestep_size(), 0.5);
        assert_eq!(model.set_timestep_size(0.0).unwrap_err().kind(), ErrorKind::InvalidParameter);

        model.add_group("Regular", 1, GroupOptions::default()).unwrap();
        model.generate(GenerateOptions::default()).unwrap();
        model.run(2).unwrap();
        model.set_timestep_size(0.25).unwrap();
        model.run(2).unwrap();
        assert_eq!(model.timestep_size(), 0.25);
        assert_eq!(model.time(), 1.5);
    }
}
