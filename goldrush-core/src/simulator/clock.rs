/*!
Simulated time shared by the simulator loop and the controller threads.

Time advances by fixed ticks of `time_step` seconds. A controller blocked in
[`SimClock::sleep`] declares the tick at which it wants to wake up; the
simulator only advances when every registered controller is blocked on a
future tick. The interleaving of the threads therefore does not change the
result of a run.

A controller which does not sleep within the busy timeout (wall-clock) is left
behind: the simulator stops waiting for it until its next sleep. It stays
registered, so it is reported as still active at the end of the run.
*/

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Condvar, Mutex},
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use crate::{
    errors::{GoldrushError, GoldrushErrorTypes, GoldrushResult},
    logger::{InternalLog, is_enabled},
};

#[derive(Debug, Default)]
struct ClockState {
    tick: u64,
    active: BTreeSet<usize>,
    /// True once a controller registered: the run can then end when all are gone.
    registered: bool,
    wake_ticks: BTreeMap<usize, u64>,
    /// Controllers left behind after the busy timeout.
    busy: BTreeSet<usize>,
    over: bool,
}

#[derive(Debug)]
pub struct SimClock {
    time_step: f32,
    busy_timeout: Duration,
    state: Mutex<ClockState>,
    condvar: Condvar,
}

impl SimClock {
    pub fn new(time_step: f32) -> Self {
        Self {
            time_step,
            busy_timeout: Duration::from_secs(1),
            state: Mutex::new(ClockState::default()),
            condvar: Condvar::new(),
        }
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    pub fn tick(&self) -> u64 {
        self.state.lock().unwrap().tick
    }

    pub fn time(&self) -> f32 {
        self.tick() as f32 * self.time_step
    }

    pub fn is_over(&self) -> bool {
        self.state.lock().unwrap().over
    }

    /// Number of ticks needed to cover `duration` seconds, at least one for
    /// any positive duration.
    pub fn ticks_for(&self, duration: f32) -> u64 {
        if duration <= 0. {
            return 0;
        }
        ((duration / self.time_step).round() as u64).max(1)
    }

    /// Declare a controller. Must be done before its thread starts.
    pub fn register(&self, id: usize) {
        let mut state = self.state.lock().unwrap();
        state.active.insert(id);
        state.registered = true;
        if is_enabled(InternalLog::ClockSync) {
            debug!("Register controller {id}");
        }
    }

    /// Remove a controller, the simulator does not wait for it anymore.
    pub fn deregister(&self, id: usize) {
        let mut state = self.state.lock().unwrap();
        state.active.remove(&id);
        state.wake_ticks.remove(&id);
        state.busy.remove(&id);
        if is_enabled(InternalLog::ClockSync) {
            debug!("Deregister controller {id}");
        }
        self.condvar.notify_all();
    }

    /// Controllers still registered.
    pub fn active(&self) -> Vec<usize> {
        self.state.lock().unwrap().active.iter().copied().collect()
    }

    /// Block the controller `id` during `duration` seconds of simulated time.
    ///
    /// Fails with [`GoldrushErrorTypes::SimulationOver`] if the simulation ends first.
    pub fn sleep(&self, id: usize, duration: f32) -> GoldrushResult<()> {
        let ticks = self.ticks_for(duration);
        let mut state = self.state.lock().unwrap();
        if state.over {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::SimulationOver,
                format!("Controller {id} cannot sleep: the simulation is over"),
            ));
        }
        if ticks == 0 {
            return Ok(());
        }
        let wake_tick = state.tick + ticks;
        state.wake_ticks.insert(id, wake_tick);
        if state.busy.remove(&id) {
            info!("Controller {id} sleeps again, the simulator waits for it");
        }
        self.condvar.notify_all();
        while state.tick < wake_tick && !state.over {
            state = self.condvar.wait(state).unwrap();
        }
        state.wake_ticks.remove(&id);
        if state.tick < wake_tick {
            return Err(GoldrushError::new(
                GoldrushErrorTypes::SimulationOver,
                format!(
                    "Simulation ended at tick {} while controller {id} waited for tick {wake_tick}",
                    state.tick
                ),
            ));
        }
        Ok(())
    }

    fn is_blocked(state: &ClockState, id: usize) -> bool {
        state.busy.contains(&id)
            || state
                .wake_ticks
                .get(&id)
                .is_some_and(|wake| *wake > state.tick)
    }

    fn all_blocked(state: &ClockState) -> bool {
        state.active.iter().all(|id| Self::is_blocked(state, *id))
    }

    /// Wait until every registered controller sleeps. Returns false when
    /// every controller is gone and the loop should stop.
    ///
    /// Controllers still running after the busy timeout are left behind and
    /// the function returns true.
    pub fn wait_all_blocked(&self) -> bool {
        let deadline = Instant::now() + self.busy_timeout;
        let mut state = self.state.lock().unwrap();
        loop {
            if state.over || (state.registered && state.active.is_empty()) {
                return false;
            }
            if Self::all_blocked(&state) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                let late: Vec<usize> = state
                    .active
                    .iter()
                    .copied()
                    .filter(|id| !Self::is_blocked(&state, *id))
                    .collect();
                for id in late {
                    warn!(
                        "Controller {id} did not sleep within {:.3}s, the simulation goes on without it",
                        self.busy_timeout.as_secs_f32()
                    );
                    state.busy.insert(id);
                }
                return true;
            }
            state = self.condvar.wait_timeout(state, deadline - now).unwrap().0;
        }
    }

    /// Go to the next tick and wake the controllers which reached their wake tick.
    pub fn advance(&self) -> f32 {
        let mut state = self.state.lock().unwrap();
        state.tick += 1;
        self.condvar.notify_all();
        state.tick as f32 * self.time_step
    }

    /// End the simulation: every pending or future sleep fails.
    pub fn finish(&self) {
        let mut state = self.state.lock().unwrap();
        state.over = true;
        if is_enabled(InternalLog::ClockSync) {
            debug!("Clock finished at tick {}", state.tick);
        }
        self.condvar.notify_all();
    }
}
