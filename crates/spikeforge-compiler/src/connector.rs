//! Connector rules
//!
//! A connector expands a source range and a destination range into the
//! `(src, dest)` pairs to connect. Candidates are enumerated with the
//! destination as the outer loop and the source as the inner loop, so the
//! pairs a rule emits claim destination slots in that order.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{CompilerError, Result};

/// Named numeric arguments of a connector application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectorArgs {
    values: BTreeMap<String, f64>,
}

impl ConnectorArgs {
    /// No arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Set an argument
    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// Argument value
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Argument keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for ConnectorArgs {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Everything a connector sees when it expands
#[derive(Debug, Clone)]
pub struct ConnectorRequest<'a> {
    /// Repetitions of every included candidate
    pub multiplier: u32,
    /// Source neurons (group local, end exclusive)
    pub src: Range<u32>,
    /// Destination neurons (group local, end exclusive)
    pub dest: Range<u32>,
    /// Named arguments, already checked against the connector's keys
    pub args: &'a ConnectorArgs,
    /// Seed derived from the model seed for this application
    pub seed: u64,
}

/// Connectivity generator registered under a name
pub trait Connector: Send + Sync + fmt::Debug {
    /// Registry name
    fn name(&self) -> &str;

    /// Argument keys that must be supplied
    fn required_args(&self) -> &[&'static str] {
        &[]
    }

    /// Argument keys that may be supplied
    fn optional_args(&self) -> &[&'static str] {
        &[]
    }

    /// Append the `(src, dest)` pairs to connect, destination outer
    fn expand(&self, request: &ConnectorRequest<'_>, pairs: &mut Vec<(u32, u32)>) -> Result<()>;
}

/// Check `args` against the keys a connector declares
pub fn check_args(connector: &dyn Connector, args: &ConnectorArgs) -> Result<()> {
    let required = connector.required_args();
    let optional = connector.optional_args();
    if let Some(key) = args
        .keys()
        .find(|key| !required.iter().chain(optional).any(|known| known == key))
    {
        return Err(CompilerError::UnknownArgument {
            connector: connector.name().to_string(),
            key: key.to_string(),
            reason: "unknown",
        });
    }
    if let Some(key) = required.iter().find(|key| args.get(key).is_none()) {
        return Err(CompilerError::UnknownArgument {
            connector: connector.name().to_string(),
            key: key.to_string(),
            reason: "missing required",
        });
    }
    Ok(())
}

/// Random connectivity: each candidate repetition is kept with probability `P`
#[derive(Debug, Clone, Copy, Default)]
pub struct RandConn;

impl Connector for RandConn {
    fn name(&self) -> &str {
        "RandConn"
    }

    fn required_args(&self) -> &[&'static str] {
        &["P"]
    }

    fn optional_args(&self) -> &[&'static str] {
        &["seed"]
    }

    fn expand(&self, request: &ConnectorRequest<'_>, pairs: &mut Vec<(u32, u32)>) -> Result<()> {
        let p = request.args.get("P").unwrap_or(0.0);
        if !(0.0..=1.0).contains(&p) {
            return Err(CompilerError::invalid_parameter("P", p.to_string(), "probability in [0, 1]"));
        }
        let seed = match request.args.get("seed") {
            Some(seed) if seed >= 0.0 && seed.fract() == 0.0 => seed as u64,
            Some(seed) => {
                return Err(CompilerError::invalid_parameter("seed", seed.to_string(), "non-negative integer"));
            }
            None => request.seed,
        };
        let mut rng = StdRng::seed_from_u64(seed);
        for dest in request.dest.clone() {
            for src in request.src.clone() {
                for _ in 0..request.multiplier {
                    if rng.gen_bool(p) {
                        pairs.push((src, dest));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Every source to every destination
#[derive(Debug, Clone, Copy, Default)]
pub struct AllToAll;

impl Connector for AllToAll {
    fn name(&self) -> &str {
        "AllToAll"
    }

    fn expand(&self, request: &ConnectorRequest<'_>, pairs: &mut Vec<(u32, u32)>) -> Result<()> {
        for dest in request.dest.clone() {
            for src in request.src.clone() {
                pairs.extend(std::iter::repeat((src, dest)).take(request.multiplier as usize));
            }
        }
        Ok(())
    }
}

/// The i-th source to the i-th destination
#[derive(Debug, Clone, Copy, Default)]
pub struct OneToOne;

impl Connector for OneToOne {
    fn name(&self) -> &str {
        "OneToOne"
    }

    fn expand(&self, request: &ConnectorRequest<'_>, pairs: &mut Vec<(u32, u32)>) -> Result<()> {
        if request.src.len() != request.dest.len() {
            return Err(CompilerError::invalid_parameter(
                "ranges",
                format!("{:?} -> {:?}", request.src, request.dest),
                "source and destination ranges of equal length",
            ));
        }
        for (src, dest) in request.src.clone().zip(request.dest.clone()) {
            pairs.extend(std::iter::repeat((src, dest)).take(request.multiplier as usize));
        }
        Ok(())
    }
}

/// String-keyed connector registry
#[derive(Debug, Clone)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectorRegistry {
    /// Registry holding the built-in connectors
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.insert(Arc::new(RandConn));
        registry.insert(Arc::new(AllToAll));
        registry.insert(Arc::new(OneToOne));
        registry
    }

    /// Registry without any connector
    pub fn empty() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    fn insert(&mut self, connector: Arc<dyn Connector>) {
        self.connectors.insert(connector.name().to_string(), connector);
    }

    /// Register a connector; names are unique
    pub fn register(&mut self, connector: impl Connector + 'static) -> Result<()> {
        if self.connectors.contains_key(connector.name()) {
            return Err(CompilerError::DuplicateName {
                name: connector.name().to_string(),
            });
        }
        self.insert(Arc::new(connector));
        Ok(())
    }

    /// Look up a connector
    pub fn get(&self, name: &str) -> Result<Arc<dyn Connector>> {
        self.connectors
            .get(name)
            .cloned()
            .ok_or_else(|| CompilerError::UnknownConnector { name: name.to_string() })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
