//! Model configuration

use spikeforge_ir::Precision;

use crate::error::{CompilerError, Result};

/// Where the compiled model executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExecutionTarget {
    /// Single worker thread
    #[default]
    Serial,
    /// Data-parallel on a worker pool; `threads == 0` uses the global pool
    Threaded {
        /// Worker count
        threads: usize,
    },
}

impl ExecutionTarget {
    /// Worker pool request passed to the scheduler
    pub(crate) fn pool_threads(self) -> Result<Option<usize>> {
        match self {
            #[cfg(feature = "parallel")]
            ExecutionTarget::Serial => Ok(Some(1)),
            #[cfg(not(feature = "parallel"))]
            ExecutionTarget::Serial => Ok(None),
            #[cfg(feature = "parallel")]
            ExecutionTarget::Threaded { threads: 0 } => Ok(None),
            #[cfg(feature = "parallel")]
            ExecutionTarget::Threaded { threads } => Ok(Some(threads)),
            #[cfg(not(feature = "parallel"))]
            ExecutionTarget::Threaded { threads } => Err(CompilerError::generation(format!(
                "threaded target with {} workers is unsupported without the parallel feature",
                threads
            ))),
        }
    }
}

/// Model-wide settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ModelConfig {
    /// Global timestep
    pub timestep: f64,
    /// Precision the model is compiled at
    pub precision: Precision,
    /// Execution target
    pub target: ExecutionTarget,
    /// Seed for randomized connectors without an explicit seed
    pub seed: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            timestep: 1.0,
            precision: Precision::Single,
            target: ExecutionTarget::Serial,
            seed: 0,
        }
    }
}

impl ModelConfig {
    /// Set the global timestep
    pub fn with_timestep(mut self, timestep: f64) -> Self {
        self.timestep = timestep;
        self
    }

    /// Set the precision
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the execution target
    pub fn with_target(mut self, target: ExecutionTarget) -> Self {
        self.target = target;
        self
    }

    /// Set the connector seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.timestep > 0.0) || !self.timestep.is_finite() {
            return Err(CompilerError::invalid_parameter(
                "timestep",
                self.timestep.to_string(),
                "finite and > 0",
            ));
        }
        Ok(())
    }

    /// Parse a TOML document; missing keys take their defaults
    #[cfg(feature = "toml")]
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ModelConfig =
            toml::from_str(contents).map_err(|e| CompilerError::config(format!("Failed to parse model config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, or defaults if it doesn't exist
    #[cfg(feature = "toml")]
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No model config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// Options fixed when a model is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerateOptions {
    /// Allow groups using parallel delivery
    pub parallel_delivery: bool,
    /// Allow groups using atomic delivery
    pub atomic_delivery: bool,
    /// Initialize state right after generation
    pub initialize: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            parallel_delivery: true,
            atomic_delivery: true,
            initialize: true,
        }
    }
}
