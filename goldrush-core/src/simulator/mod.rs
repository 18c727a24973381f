/*!
Module serving the [`Simulator`] with the configuration and result structures.

The [`Simulator`] owns the [`Arena`] (behind the physics lock) and the
[`SimClock`]. Its loop integrates the arena one tick at a time, waiting for
every controller thread to be blocked in a motion before each tick. The
controller threads themselves are spawned by the
[`Harness`](crate::harness::Harness).

```no_run
use std::path::Path;
use goldrush::simulator::Simulator;

let mut simulator = Simulator::from_config_path(
    Path::new("games/two_colours_assignment.yaml"),
).unwrap();

// Show the simulator loaded configuration
simulator.show();

// Run an empty arena for max_time
simulator.run().unwrap();
```
*/

mod results;
pub use results::{ControllerReport, ResultConfig, RunSummary};

mod simulator_config;
pub use simulator_config::SimulatorConfig;

pub mod clock;
use clock::SimClock;

use std::{
    io::Write,
    path::Path,
    sync::{Arc, Mutex, RwLock},
    thread::{self, ThreadId},
    time::Duration,
};

use colored::Colorize;
use log::{debug, info, warn};

use crate::{
    VERSION,
    arena::Arena,
    constants::TIME_ROUND_DECIMALS,
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    logger::{InternalLog, LoggerConfig, init_log, is_enabled},
    utils::SharedMutex,
};

static THREAD_IDS: RwLock<Vec<ThreadId>> = RwLock::new(Vec::new());
static THREAD_NAMES: RwLock<Vec<String>> = RwLock::new(Vec::new());
static TIME: RwLock<f32> = RwLock::new(0.);
static EXCLUDE_NODES: RwLock<Vec<String>> = RwLock::new(Vec::new());
static INCLUDE_NODES: RwLock<Vec<String>> = RwLock::new(Vec::new());

/// Give a name to the current thread in the log lines.
pub(crate) fn register_log_thread(name: &str) {
    let id = thread::current().id();
    let mut ids = THREAD_IDS.write().unwrap();
    let mut names = THREAD_NAMES.write().unwrap();
    if let Some(i) = ids.iter().position(|x| *x == id) {
        names[i] = name.to_string();
    } else {
        ids.push(id);
        names.push(name.to_string());
    }
}

fn current_log_thread() -> String {
    let id = thread::current().id();
    let ids = THREAD_IDS.read().unwrap();
    match ids.iter().position(|x| *x == id) {
        Some(i) => THREAD_NAMES.read().unwrap()[i].clone(),
        None => thread::current().name().unwrap_or("unknown").to_string(),
    }
}

/// How the simulation loop ended.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopEnd {
    /// Simulated time at the end of the loop.
    pub time: f32,
    /// Controllers still registered in the clock when the loop ended.
    pub still_active: Vec<usize>,
}

#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    arena: SharedMutex<Arena>,
    clock: Arc<SimClock>,
}

impl Simulator {
    /// Load the config from a file compatible with [`confy`]. Initialize the [`Simulator`].
    ///
    /// ## Arguments
    /// * `config_path` - `Path` to the config file (see `games/two_colours_assignment.yaml`).
    ///
    /// ## Return
    /// Returns a [`Simulator`] ready to be run.
    pub fn from_config_path(config_path: &Path) -> GoldrushResult<Simulator> {
        println!("Load configuration...");
        let config = SimulatorConfig::load_from_path(config_path)?;
        Self::from_config(&config)
    }

    /// Load the config from structure instance.
    pub fn from_config(config: &SimulatorConfig) -> GoldrushResult<Simulator> {
        println!("Checking configuration...");
        Self::init_log(&config.log)?;
        if let Err(e) = config.check() {
            let e = GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                format!("Error in config:\n{}", e.detailed_error()),
            );
            log::error!("{}", e.detailed_error());
            return Err(e);
        }
        println!("Config valid");
        let (major, minor) = config.version_numbers()?;
        if major.to_string() != env!("CARGO_PKG_VERSION_MAJOR")
            || minor.to_string() != env!("CARGO_PKG_VERSION_MINOR")
        {
            warn!(
                "Config major version ({}) differs from software version ({})",
                config.version, VERSION
            );
        }
        let mut config = config.clone();
        if config.random_seed.is_none() {
            config.random_seed = Some(rand::random());
        }
        let (arena, clock) = Self::build(&config)?;
        Ok(Simulator {
            config,
            arena,
            clock,
        })
    }

    fn build(config: &SimulatorConfig) -> GoldrushResult<(SharedMutex<Arena>, Arc<SimClock>)> {
        let arena = Arena::from_config(&config.arena, config.random_seed.unwrap_or_default())?;
        if is_enabled(InternalLog::SetupSteps) {
            debug!("Arena built with {} tokens", arena.tokens().len());
        }
        Ok((
            Arc::new(Mutex::new(arena)),
            Arc::new(
                SimClock::new(config.time_step)
                    .with_busy_timeout(Duration::from_secs_f32(config.controller_timeout)),
            ),
        ))
    }

    /// Put the arena and the clock back in their initial state.
    pub fn reset(&mut self) -> GoldrushResult<()> {
        info!("Reset simulator");
        let (arena, clock) = Self::build(&self.config)?;
        self.arena = arena;
        self.clock = clock;
        *TIME.write().unwrap() = 0.;
        Ok(())
    }

    pub fn config(&self) -> SimulatorConfig {
        self.config.clone()
    }

    pub fn arena(&self) -> &SharedMutex<Arena> {
        &self.arena
    }

    pub fn clock(&self) -> &Arc<SimClock> {
        &self.clock
    }

    fn init_log(log_config: &LoggerConfig) -> GoldrushResult<()> {
        init_log(log_config);
        register_log_thread("simulator");
        *TIME.write().unwrap() = 0.;
        EXCLUDE_NODES
            .write()
            .unwrap()
            .clone_from(&log_config.excluded_nodes);
        INCLUDE_NODES
            .write()
            .unwrap()
            .clone_from(&log_config.included_nodes);
        if !log_config.included_nodes.is_empty() {
            INCLUDE_NODES.write().unwrap().push("simulator".to_string());
        }

        if env_logger::builder()
            .target(env_logger::Target::Stdout)
            .format(|buf, record| {
                let thread_name = current_log_thread();
                if EXCLUDE_NODES.read().unwrap().contains(&thread_name) {
                    return Ok(());
                }

                let included_nodes = INCLUDE_NODES.read().unwrap();
                if !included_nodes.is_empty() && !included_nodes.contains(&thread_name) {
                    return Ok(());
                }
                drop(included_nodes);
                let time = *TIME.read().unwrap();
                writeln!(
                    buf,
                    "[{:5}][{:.*}, {}] {}",
                    match record.level() {
                        log::Level::Error => "ERROR".red(),
                        log::Level::Warn => "WARN".yellow(),
                        log::Level::Info => "INFO".green(),
                        log::Level::Debug => "DEBUG".blue(),
                        log::Level::Trace => "TRACE".black(),
                    },
                    TIME_ROUND_DECIMALS,
                    time,
                    &thread_name,
                    record.args()
                )
            })
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false)
            .filter_level(log_config.log_level.clone().into())
            .try_init()
            .is_err()
        {
            debug!("Logger already initialized");
        } else {
            println!("Logging initialized at level: {}", log_config.log_level);
        }
        Ok(())
    }

    /// Simply print the Simulator state, using the debug print.
    pub fn show(&self) {
        println!("Config:");
        println!("{:#?}", self.config);
        println!("Arena:");
        for token in self.arena.lock().unwrap().tokens() {
            println!("- {:?}", token);
        }
    }

    pub fn set_max_time(&mut self, max_time: f32) {
        self.config.max_time = max_time;
    }

    /// Run the simulation loop until `max_time`, or until every registered
    /// controller has ended. Pending sleeps fail afterward.
    pub fn run(&mut self) -> GoldrushResult<LoopEnd> {
        let max_ticks = self.config.max_ticks();
        let time_step = self.config.time_step;
        #[cfg(not(feature = "force_hard_determinism"))]
        let pace = self
            .config
            .real_time_factor
            .map(|factor| Duration::from_secs_f32(time_step / factor));
        #[cfg(feature = "force_hard_determinism")]
        let pace: Option<Duration> = None;

        info!("Start simulation loop for {} ticks", max_ticks);
        while self.clock.tick() < max_ticks {
            if !self.clock.wait_all_blocked() {
                if is_enabled(InternalLog::ClockSync) {
                    debug!("Every controller ended");
                }
                break;
            }
            self.arena.lock().unwrap().step(time_step);
            let time = self.clock.advance();
            *TIME.write().unwrap() = time;
            if let Some(pace) = pace {
                thread::sleep(pace);
            }
        }
        let end = LoopEnd {
            time: self.clock.time(),
            still_active: self.clock.active(),
        };
        self.clock.finish();
        info!("Simulation loop ended at {}s", end.time);
        Ok(end)
    }

    /// Save the results to the file given in the configuration.
    ///
    /// If the configuration does not contain a result path, nothing is saved.
    pub fn save_results(&self, summary: &RunSummary) -> GoldrushResult<()> {
        let Some(result_path) = self
            .config
            .results
            .as_ref()
            .and_then(|r| r.result_path.as_ref())
        else {
            return Ok(());
        };
        let filename = self.config.base_path.as_ref().join(result_path);
        results::save_results(&filename, &self.config, summary)
    }
}
