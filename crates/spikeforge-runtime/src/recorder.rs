//! Per-neuron trace and event recorders

use std::sync::Arc;

use spikeforge_ir::{NeuronId, NeuronType, Real, VarRef};

use crate::arena::{Arena, Handle, ModelId};
use crate::error::{Result, RuntimeError};
use crate::image::Image;

/// Handle to a recorder
pub type RecorderId = Handle<Recorder>;

/// Signal selection for a recorder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signal {
    /// Continuous channel of a named state variable or global
    Var(String),
    /// Crossings of event source `index`
    Event(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Var(VarRef),
    Event(u32),
}

#[derive(Debug, Clone, PartialEq)]
enum Trace {
    Continuous {
        times: Vec<f64>,
        values: Vec<f64>,
    },
    Events {
        times: Vec<f64>,
        tags: Vec<u32>,
        neurons: Vec<NeuronId>,
    },
}

/// Recorder bound to one neuron and one signal.
///
/// Continuous recorders hold one `(time, value)` sample per global tick;
/// event recorders hold one `(time, tag, neuron id)` entry per crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorder {
    name: String,
    group: usize,
    neuron: u32,
    neuron_id: NeuronId,
    probe: Probe,
    trace: Trace,
    stalled: bool,
}

impl Recorder {
    /// Resolve `signal` against `ty` and create an empty recorder
    pub fn new(ty: &NeuronType, group: usize, neuron: u32, neuron_id: NeuronId, signal: &Signal) -> Result<Self> {
        let (name, probe, trace) = match signal {
            Signal::Var(name) => {
                let var = ty.resolve_var(name).ok_or_else(|| {
                    RuntimeError::invalid_flags(format!("type '{}' has no variable '{}'", ty.name(), name))
                })?;
                (
                    name.clone(),
                    Probe::Var(var),
                    Trace::Continuous {
                        times: Vec::new(),
                        values: Vec::new(),
                    },
                )
            }
            Signal::Event(index) => {
                let source = ty.event_sources().get(*index).ok_or_else(|| {
                    RuntimeError::invalid_flags(format!(
                        "type '{}' has {} event sources, requested {}",
                        ty.name(),
                        ty.event_source_count(),
                        index
                    ))
                })?;
                (
                    source.clone(),
                    Probe::Event(*index as u32),
                    Trace::Events {
                        times: Vec::new(),
                        tags: Vec::new(),
                        neurons: Vec::new(),
                    },
                )
            }
        };
        Ok(Self {
            name,
            group,
            neuron,
            neuron_id,
            probe,
            trace,
            stalled: false,
        })
    }

    /// Label of the bound signal
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group index of the recorded neuron
    pub fn group(&self) -> usize {
        self.group
    }

    /// Group-local index of the recorded neuron
    pub fn neuron(&self) -> u32 {
        self.neuron
    }

    /// Global id of the recorded neuron
    pub fn neuron_id(&self) -> NeuronId {
        self.neuron_id
    }

    /// Whether this is an event recorder
    pub fn is_event(&self) -> bool {
        matches!(self.probe, Probe::Event(_))
    }

    /// Number of samples or entries
    pub fn len(&self) -> usize {
        self.times().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample or entry times
    pub fn times(&self) -> &[f64] {
        match &self.trace {
            Trace::Continuous { times, .. } | Trace::Events { times, .. } => times,
        }
    }

    /// Sampled values (continuous recorders)
    pub fn values(&self) -> Option<&[f64]> {
        match &self.trace {
            Trace::Continuous { values, .. } => Some(values),
            Trace::Events { .. } => None,
        }
    }

    /// Event source per entry (event recorders)
    pub fn tags(&self) -> Option<&[u32]> {
        match &self.trace {
            Trace::Events { tags, .. } => Some(tags),
            Trace::Continuous { .. } => None,
        }
    }

    /// Neuron id per entry (event recorders)
    pub fn neuron_ids(&self) -> Option<&[NeuronId]> {
        match &self.trace {
            Trace::Events { neurons, .. } => Some(neurons),
            Trace::Continuous { .. } => None,
        }
    }

    /// Whether sampling has failed since the recorder was attached
    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    fn sample<R: Real>(&mut self, image: &Image<R>, time: f64) {
        let Some(group) = image.groups().get(self.group) else {
            self.stall(format!("group {} is not part of the image", self.group));
            return;
        };
        let failure = match (&mut self.trace, self.probe) {
            (Trace::Continuous { times, values }, Probe::Var(var)) => match group.value(var, self.neuron as usize) {
                Ok(value) => {
                    times.push(time);
                    values.push(value);
                    None
                }
                Err(err) => Some(err.to_string()),
            },
            (Trace::Events { times, tags, neurons }, Probe::Event(source)) => {
                for crossing in group.crossings_of(self.neuron) {
                    if crossing.source == source {
                        times.push(crossing.time.to_host());
                        tags.push(crossing.source);
                        neurons.push(self.neuron_id);
                    }
                }
                None
            }
            (_, probe) => Some(format!("probe {:?} does not match the trace kind", probe)),
        };
        if let Some(reason) = failure {
            self.stall(reason);
        }
    }

    fn stall(&mut self, reason: String) {
        if !self.stalled {
            log::warn!(
                "Recorder '{}' on neuron {} of group {} stopped sampling: {}",
                self.name,
                self.neuron,
                self.group,
                reason
            );
            self.stalled = true;
        }
    }
}

/// All recorders of one model
#[derive(Debug)]
pub struct RecorderBank {
    recorders: Arena<Recorder>,
}

impl RecorderBank {
    /// Create an empty bank for `model`
    pub fn new(model: ModelId) -> Self {
        Self {
            recorders: Arena::new(model, "recorder"),
        }
    }

    /// Attach a recorder
    pub fn attach(
        &mut self,
        ty: &Arc<NeuronType>,
        group: usize,
        neuron: u32,
        neuron_id: NeuronId,
        signal: &Signal,
    ) -> Result<RecorderId> {
        let recorder = Recorder::new(ty, group, neuron, neuron_id, signal)?;
        log::debug!("Recording '{}' of neuron {}", recorder.name(), neuron_id);
        Ok(self.recorders.insert(recorder))
    }

    /// Look up a recorder
    pub fn get(&self, id: RecorderId) -> Result<&Recorder> {
        self.recorders.get(id)
    }

    /// Detach every recorder of one neuron; returns how many were removed
    pub fn stop(&mut self, group: usize, neuron: u32) -> usize {
        self.recorders
            .remove_where(|r| r.group == group && r.neuron == neuron)
    }

    /// Number of live recorders
    pub fn len(&self) -> usize {
        self.recorders.len()
    }

    /// Whether no recorder is attached
    pub fn is_empty(&self) -> bool {
        self.recorders.is_empty()
    }

    /// Live recorders with their handles
    pub fn iter(&self) -> impl Iterator<Item = (RecorderId, &Recorder)> {
        self.recorders.iter()
    }

    /// Sample every recorder after a tick ending at `time`
    pub fn sample<R: Real>(&mut self, image: &Image<R>, time: f64) {
        for recorder in self.recorders.values_mut() {
            recorder.sample(image, time);
        }
    }
}
