/*!
Runs a full match: one thread per controller against the shared arena.

Each controller thread builds its robot under the physics lock, builds its
controller, then calls [`Controller::step`](crate::controllers::Controller::step)
until the controller finishes or fails. The simulator loop runs on the calling
thread meanwhile. Controller threads still active at the end of the loop are
reported, never killed.
*/

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

use log::{debug, error, info, warn};

use crate::{
    controllers::{ControllerConfig, ControllerStatus, make_controller_from_config},
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    logger::{InternalLog, is_enabled},
    plugin_api::PluginAPI,
    recordable::Recordable,
    robot::SimRobot,
    simulator::{ControllerReport, RunSummary, Simulator, SimulatorConfig, clock::SimClock},
};

/// Deregisters the controller from the clock when its thread ends, even on panic.
struct ThreadGuard {
    zone: usize,
    clock: Arc<SimClock>,
    alive: Arc<AtomicBool>,
}

impl Drop for ThreadGuard {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        self.clock.deregister(self.zone);
    }
}

struct ControllerThread {
    name: String,
    zone: usize,
    alive: Arc<AtomicBool>,
    handle: JoinHandle<ControllerReport>,
}

pub struct Harness {
    simulator: Simulator,
    plugin_api: Option<Arc<dyn PluginAPI>>,
}

impl Harness {
    pub fn new(simulator: Simulator, plugin_api: Option<Arc<dyn PluginAPI>>) -> Self {
        Self {
            simulator,
            plugin_api,
        }
    }

    pub fn simulator(&self) -> &Simulator {
        &self.simulator
    }

    /// Run one controller per zone, in the order of `controllers`, until the
    /// end of the simulation.
    pub fn run(&mut self, controllers: &[ControllerConfig]) -> GoldrushResult<RunSummary> {
        let config = self.simulator.config();
        let zones = config.arena.zones.len();
        if controllers.len() > zones {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::ConfigError,
                format!(
                    "{} controllers given but the arena only has {zones} zone(s)",
                    controllers.len()
                ),
            ));
        }
        for (zone, controller_config) in controllers.iter().enumerate() {
            controller_config
                .check()
                .map_err(|e| e.chain(format!("in the controller configuration of zone {zone}")))?;
        }
        self.simulator.reset()?;

        let mut threads = Vec::with_capacity(controllers.len());
        for (zone, controller_config) in controllers.iter().enumerate() {
            threads.push(self.spawn_controller(zone, controller_config, &config)?);
        }

        let end = self.simulator.run()?;

        let mut reports = Vec::new();
        let mut stragglers = Vec::new();
        for thread in threads {
            if end.still_active.contains(&thread.zone) {
                debug!(
                    "{} still active (alive flag: {})",
                    thread.name,
                    thread.alive.load(Ordering::SeqCst)
                );
                stragglers.push(thread.name);
                continue;
            }
            match thread.handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => {
                    error!("Controller thread {} panicked", thread.name);
                    reports.push(ControllerReport {
                        name: thread.name,
                        zone: thread.zone,
                        finished: false,
                        error: Some("Thread panicked".to_string()),
                        record: None,
                    });
                }
            }
        }
        if !stragglers.is_empty() {
            warn!(
                "{} robot controller threads still active: {}",
                stragglers.len(),
                stragglers.join(", ")
            );
        }
        let summary = RunSummary {
            time: end.time,
            controllers: reports,
            arena: self.simulator.arena().lock().unwrap().record(),
            stragglers,
        };
        self.simulator.save_results(&summary)?;
        Ok(summary)
    }

    fn spawn_controller(
        &self,
        zone: usize,
        controller_config: &ControllerConfig,
        global_config: &SimulatorConfig,
    ) -> GoldrushResult<ControllerThread> {
        let name = format!("robot-{zone}");
        let arena = self.simulator.arena().clone();
        let clock = self.simulator.clock().clone();
        let alive = Arc::new(AtomicBool::new(true));
        clock.register(zone);
        let guard = ThreadGuard {
            zone,
            clock: clock.clone(),
            alive: alive.clone(),
        };
        let plugin_api = self.plugin_api.clone();
        let controller_config = controller_config.clone();
        let global_config = global_config.clone();
        let thread_name = name.clone();
        let thread_clock = clock.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let _guard = guard;
                crate::simulator::register_log_thread(&thread_name);
                let mut report = ControllerReport {
                    name: thread_name,
                    zone,
                    finished: false,
                    error: None,
                    record: None,
                };
                let mut robot = match SimRobot::new(&arena, &thread_clock, zone) {
                    Ok(robot) => robot,
                    Err(e) => {
                        error!("Cannot create the robot: {}", e.detailed_error());
                        report.error = Some(e.detailed_error());
                        return report;
                    }
                };
                let mut controller =
                    match make_controller_from_config(&controller_config, &plugin_api, &global_config) {
                        Ok(controller) => controller,
                        Err(e) => {
                            error!("Cannot create the controller: {}", e.detailed_error());
                            report.error = Some(e.detailed_error());
                            return report;
                        }
                    };
                if is_enabled(InternalLog::SetupSteps) {
                    debug!("Controller ready: {:?}", controller);
                }
                loop {
                    match controller.step(&mut robot) {
                        Ok(ControllerStatus::Running) => {}
                        Ok(ControllerStatus::Finished) => {
                            info!("Controller finished");
                            report.finished = true;
                            break;
                        }
                        Err(e) => {
                            if e.error_type() == GoldrushErrorTypes::SimulationOver {
                                info!("Simulation over before the controller finished");
                            } else {
                                error!("Controller stopped: {}", e.detailed_error());
                            }
                            report.error = Some(e.detailed_error());
                            break;
                        }
                    }
                }
                report.record = Some(controller.record());
                report
            })
            .map_err(|e| {
                GoldrushError::new(
                    GoldrushErrorTypes::InitializationError,
                    format!("Cannot spawn the thread of {name}: {e}"),
                )
            })?;
        Ok(ControllerThread {
            name,
            zone,
            alive,
            handle,
        })
    }
}
