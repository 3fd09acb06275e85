//! Execution scheduler
//!
//! Owns the compiled image and advances it tick by tick. Ticks are strictly
//! sequential; within a tick integration, delivery and recorder sampling run
//! in that order.

use core::fmt;
use std::time::Instant;

use crate::error::{Result, RuntimeError};
use crate::image::CompiledImage;
use crate::recorder::RecorderBank;

/// Lifecycle phase of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Still being described; no image exists
    Unbuilt,
    /// Image compiled, state not yet initialized
    Generated,
    /// State at initial values, ready to run
    Initialized,
    /// At least one tick executed since the last reset
    Running,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Unbuilt => write!(f, "unbuilt"),
            Phase::Generated => write!(f, "generated"),
            Phase::Initialized => write!(f, "initialized"),
            Phase::Running => write!(f, "running"),
        }
    }
}

/// Global step counter and simulated time.
///
/// Time is `epoch_time + (step - epoch_step) * timestep`, so changing the
/// timestep mid-run never rewrites past times.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Clock {
    step: u64,
    epoch_step: u64,
    epoch_time: f64,
    timestep: f64,
}

impl Clock {
    fn new(timestep: f64) -> Self {
        Self {
            step: 0,
            epoch_step: 0,
            epoch_time: 0.0,
            timestep,
        }
    }

    fn time(&self) -> f64 {
        self.epoch_time + (self.step - self.epoch_step) as f64 * self.timestep
    }

    fn set_timestep(&mut self, timestep: f64) {
        self.epoch_time = self.time();
        self.epoch_step = self.step;
        self.timestep = timestep;
    }

    fn reset(&mut self) {
        *self = Self::new(self.timestep);
    }
}

fn run_ticks(image: &mut CompiledImage, recorders: &mut RecorderBank, clock: &mut Clock, steps: u64) {
    for _ in 0..steps {
        let start = clock.time();
        image.tick(start, clock.timestep);
        clock.step += 1;

        let end = clock.time();
        match image {
            CompiledImage::Single(image) => recorders.sample(image, end),
            CompiledImage::Double(image) => recorders.sample(image, end),
        }
        log::trace!("Tick {} done at t={}", clock.step, end);
    }
}

/// Runnable simulation built from a compiled image
#[derive(Debug)]
pub struct Simulation {
    image: CompiledImage,
    phase: Phase,
    clock: Clock,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl Simulation {
    /// Wrap a compiled image.
    ///
    /// `threads` requests a dedicated worker pool; `None` uses the global
    /// pool (or runs sequentially without the `parallel` feature).
    pub fn new(image: CompiledImage, timestep: f64, threads: Option<usize>) -> Result<Self> {
        if !(timestep > 0.0) {
            return Err(RuntimeError::invalid_parameter("timestep", timestep.to_string(), "> 0"));
        }

        #[cfg(feature = "parallel")]
        let pool = match threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("spikeforge-worker-{}", i))
                    .build()
                    .map_err(|e| RuntimeError::ThreadPool { reason: e.to_string() })?,
            ),
            None => None,
        };

        #[cfg(not(feature = "parallel"))]
        if let Some(threads) = threads {
            return Err(RuntimeError::ThreadPool {
                reason: format!("{} worker threads requested but built without the parallel feature", threads),
            });
        }

        Ok(Self {
            image,
            phase: Phase::Generated,
            clock: Clock::new(timestep),
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Global steps executed since the last reset
    pub fn step(&self) -> u64 {
        self.clock.step
    }

    /// Simulated time
    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    /// Global timestep
    pub fn timestep(&self) -> f64 {
        self.clock.timestep
    }

    /// Change the global timestep; takes effect on the next tick
    pub fn set_timestep(&mut self, timestep: f64) -> Result<()> {
        if !(timestep > 0.0) {
            return Err(RuntimeError::invalid_parameter("timestep", timestep.to_string(), "> 0"));
        }
        self.clock.set_timestep(timestep);
        Ok(())
    }

    /// Compiled image
    pub fn image(&self) -> &CompiledImage {
        &self.image
    }

    /// Compiled image, mutably
    pub fn image_mut(&mut self) -> &mut CompiledImage {
        &mut self.image
    }

    /// Restore initial state, clear pending events and zero time.
    ///
    /// Globals, constants, synapse slot values and recorder buffers are kept.
    pub fn reset(&mut self) {
        self.image.reset();
        self.clock.reset();
        self.phase = Phase::Initialized;
        log::debug!("Simulation reset");
    }

    /// Run every type's initialization hook and become ready to run
    pub fn init_run(&mut self) {
        self.image.run_initializers();
        self.phase = Phase::Initialized;
    }

    fn check_runnable(&self, operation: &'static str) -> Result<()> {
        match self.phase {
            Phase::Initialized | Phase::Running => Ok(()),
            phase => Err(RuntimeError::NotReady { operation, phase }),
        }
    }

    /// Advance exactly `steps` global ticks
    pub fn run(&mut self, steps: u64, recorders: &mut RecorderBank) -> Result<()> {
        self.check_runnable("run")?;
        self.advance(steps, recorders);
        Ok(())
    }

    /// Advance until the step counter reaches `target`
    pub fn run_until(&mut self, target: u64, recorders: &mut RecorderBank) -> Result<()> {
        self.check_runnable("run_until")?;
        if target <= self.clock.step {
            return Err(RuntimeError::InvalidTarget {
                target,
                current: self.clock.step,
            });
        }
        self.advance(target - self.clock.step, recorders);
        Ok(())
    }

    fn advance(&mut self, steps: u64, recorders: &mut RecorderBank) {
        if steps == 0 {
            return;
        }
        self.phase = Phase::Running;
        log::info!(
            "Running {} steps from step {} (t={}, dt={})",
            steps,
            self.clock.step,
            self.clock.time(),
            self.clock.timestep
        );
        let started = Instant::now();

        let image = &mut self.image;
        let clock = &mut self.clock;

        #[cfg(feature = "parallel")]
        match &self.pool {
            Some(pool) => pool.install(|| run_ticks(image, recorders, clock, steps)),
            None => run_ticks(image, recorders, clock, steps),
        }

        #[cfg(not(feature = "parallel"))]
        run_ticks(image, recorders, clock, steps);

        log::info!(
            "Reached step {} (t={}) in {:.3}ms",
            self.clock.step,
            self.clock.time(),
            started.elapsed().as_secs_f64() * 1e3
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ModelId;
    use crate::delivery::DeliveryMode;
    use crate::layout::{GroupSpec, ImageSpec};
    use crate::recorder::Signal;
    use spikeforge_ir::{stock, NeuronId, Precision, SlotCapacity};
    use std::sync::Arc;

    fn simulation(timestep: f64) -> (Simulation, RecorderBank, Arc<spikeforge_ir::NeuronType>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let ty = Arc::new(stock::regular().unwrap());
        let spec = ImageSpec {
            groups: vec![GroupSpec {
                name: "Regular".into(),
                ty: Arc::clone(&ty),
                count: 4,
                offset: NeuronId::new(0),
                adaptive: false,
                min_dt: timestep,
                delivery: DeliveryMode::Parallel,
                slots: vec![0],
                state: vec![-70.0; 4],
                globals: vec![3.0; 4],
                constants: ty.constants().iter().map(|c| c.initial).collect(),
                slot_values: Vec::new(),
            }],
            projections: Vec::new(),
        };
        let image = CompiledImage::build(&spec, Precision::Single).unwrap();
        let sim = Simulation::new(image, timestep, None).unwrap();
        (sim, RecorderBank::new(ModelId::fresh()), ty)
    }

    #[test]
    fn test_lifecycle() {
        let (mut sim, mut bank, _) = simulation(1.0);
        assert_eq!(sim.phase(), Phase::Generated);
        let err = sim.run(1, &mut bank).unwrap_err();
        assert_eq!(err, RuntimeError::NotReady { operation: "run", phase: Phase::Generated });

        sim.reset();
        assert_eq!(sim.phase(), Phase::Initialized);
        sim.run(3, &mut bank).unwrap();
        assert_eq!(sim.phase(), Phase::Running);
        assert_eq!(sim.step(), 3);
        assert_eq!(sim.time(), 3.0);
    }

    #[test]
    fn test_run_until_twice() {
        let (mut sim, mut bank, ty) = simulation(0.5);
        let rec = bank.attach(&ty, 0, 0, NeuronId::new(0), &Signal::Var("V".into())).unwrap();
        sim.reset();
        sim.run_until(10, &mut bank).unwrap();
        let before = bank.get(rec).unwrap().clone();

        let err = sim.run_until(10, &mut bank).unwrap_err();
        assert_eq!(err, RuntimeError::InvalidTarget { target: 10, current: 10 });
        assert_eq!(sim.step(), 10);
        assert_eq!(bank.get(rec).unwrap(), &before);
        assert_eq!(before.len(), 10);
        assert_eq!(before.times()[0], 0.5);
        assert_eq!(before.times()[9], 5.0);
    }

    #[test]
    fn test_timestep_change_keeps_past_times() {
        let (mut sim, mut bank, _) = simulation(1.0);
        sim.reset();
        sim.run(2, &mut bank).unwrap();
        sim.set_timestep(0.25).unwrap();
        sim.run(4, &mut bank).unwrap();
        assert_eq!(sim.time(), 3.0);
        assert!(sim.set_timestep(-1.0).is_err());

        sim.reset();
        assert_eq!(sim.time(), 0.0);
        assert_eq!(sim.timestep(), 0.25);
    }

    #[test]
    fn test_reset_reproduces_trace() {
        let (mut sim, mut bank, ty) = simulation(1.0);
        let a = bank.attach(&ty, 0, 1, NeuronId::new(1), &Signal::Var("V".into())).unwrap();
        sim.reset();
        sim.run(50, &mut bank).unwrap();
        let first = bank.get(a).unwrap().values().unwrap().to_vec();

        bank.stop(0, 1);
        let b = bank.attach(&ty, 0, 1, NeuronId::new(1), &Signal::Var("V".into())).unwrap();
        sim.reset();
        sim.init_run();
        sim.run(50, &mut bank).unwrap();
        assert_eq!(bank.get(b).unwrap().values().unwrap(), &first[..]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_dedicated_pool() {
        let (sim, _, _) = simulation(1.0);
        let image = sim.image;
        let mut sim = Simulation::new(image, 1.0, Some(2)).unwrap();
        let mut bank = RecorderBank::new(ModelId::fresh());
        sim.reset();
        sim.run(5, &mut bank).unwrap();
        assert_eq!(sim.step(), 5);
    }
}
