//! Model front end for spikeforge
//!
//! Describe a spiking network as neuron groups bound to catalog types,
//! connect them explicitly or through named connector rules, then generate
//! it into an executable image and drive it through the scheduler.
//!
//! ```no_run
//! use spikeforge_compiler::{ConnectorArgs, GenerateOptions, GroupOptions, Model, ModelConfig};
//! use spikeforge_ir::stock;
//!
//! # fn main() -> spikeforge_compiler::Result<()> {
//! let mut model = Model::new(ModelConfig::default().with_timestep(0.1))?;
//! model.register_type(stock::regular()?)?;
//! let group = model.add_group("Regular", 100, GroupOptions::named("Regular"))?;
//! model.apply_connector(
//!     "RandConn",
//!     1,
//!     group,
//!     0..100,
//!     0,
//!     group,
//!     0..100,
//!     0,
//!     &ConnectorArgs::new().with("P", 0.05),
//! )?;
//! model.generate(GenerateOptions::default())?;
//! let trace = model.record(group, 0, "V")?;
//! model.run(1000)?;
//! assert_eq!(model.recorder(trace)?.len(), 1000);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub use spikeforge_ir::{Catalog, ErrorKind, NeuronId, NeuronType, Precision};
pub use spikeforge_runtime::{DeliveryMode, Phase, Recorder, RecorderId, Signal};

pub mod config;
pub mod connectivity;
pub mod connector;
pub mod error;
pub mod group;
mod lower;
pub mod model;
pub mod passes;

pub use config::{ExecutionTarget, GenerateOptions, ModelConfig};
pub use connectivity::Connection;
pub use connector::{AllToAll, Connector, ConnectorArgs, ConnectorRegistry, ConnectorRequest, OneToOne, RandConn};
pub use error::{CompilerError, Result};
pub use group::{GroupId, GroupOptions, GroupView, GroupViewMut};
pub use model::Model;
