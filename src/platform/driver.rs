//! Fixed-cadence game loop thread
//!
//! Wall-clock time feeds an accumulator that is drained in `TICK_MS` steps, at most
//! `MAX_SUBSTEPS` per wakeup. Queued commands are applied right before each step
//! on the loop thread, so a command never lands in the middle of a tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::consts::*;
use crate::sim::{Command, GameEvent, GameState, InvariantViolation, Simulation, TickOutcome, validate_invariants};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error("game loop thread panicked")]
    Panicked,
    #[error("failed to spawn game loop thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub tick_period: Duration,
    /// Stop after this many active ticks
    pub max_ticks: Option<u64>,
    /// Stop on the tick that ends the game
    pub stop_on_game_over: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(TICK_MS),
            max_ticks: None,
            stop_on_game_over: false,
        }
    }
}

/// Cloneable handle for feeding commands to a running loop
#[derive(Clone)]
pub struct GameHandle {
    tx: Sender<Command>,
    stop: Arc<AtomicBool>,
}

impl GameHandle {
    /// Queue a command; false once the loop has exited
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

pub struct GameLoop {
    handle: GameHandle,
    thread: JoinHandle<Result<Simulation, InvariantViolation>>,
}

impl GameLoop {
    /// Move `sim` onto a new thread. `observer` sees every published snapshot
    /// together with the events drained after that tick.
    pub fn spawn<F>(sim: Simulation, options: DriverOptions, observer: F) -> Result<Self, DriverError>
    where
        F: FnMut(&Arc<GameState>, &[GameEvent]) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let handle = GameHandle {
            tx,
            stop: Arc::clone(&stop),
        };

        let thread = thread::Builder::new()
            .name("game-loop".to_string())
            .spawn(move || run_loop(sim, rx, stop, options, observer))
            .map_err(DriverError::Spawn)?;

        Ok(Self { handle, thread })
    }

    pub fn handle(&self) -> GameHandle {
        self.handle.clone()
    }

    pub fn stop(&self) {
        self.handle.stop();
    }

    /// Wait for the loop to exit and take the simulation back
    pub fn join(self) -> Result<Simulation, DriverError> {
        match self.thread.join() {
            Ok(result) => result.map_err(DriverError::from),
            Err(_) => Err(DriverError::Panicked),
        }
    }
}

fn drain_commands(sim: &mut Simulation, rx: &Receiver<Command>) {
    loop {
        match rx.try_recv() {
            Ok(command) => sim.apply(command),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
        }
    }
}

fn run_loop<F>(
    mut sim: Simulation,
    rx: Receiver<Command>,
    stop: Arc<AtomicBool>,
    options: DriverOptions,
    mut observer: F,
) -> Result<Simulation, InvariantViolation>
where
    F: FnMut(&Arc<GameState>, &[GameEvent]),
{
    let period = options.tick_period.max(Duration::from_micros(100));
    let max_backlog = period * MAX_SUBSTEPS;
    let mut accumulator = Duration::ZERO;
    let mut last = Instant::now();
    let mut ticks_run: u64 = 0;
    log::info!("Game loop started ({:?} per tick)", period);

    while !stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        accumulator = (accumulator + (now - last)).min(max_backlog);
        last = now;

        let mut substeps = 0;
        while accumulator >= period && substeps < MAX_SUBSTEPS {
            accumulator -= period;
            substeps += 1;

            drain_commands(&mut sim, &rx);
            let outcome = sim.tick();
            if outcome != TickOutcome::Skipped {
                ticks_run += 1;
                let state = sim.snapshot();
                if let Err(rule) = validate_invariants(&state) {
                    log::error!("Invariant {} violated at tick {}", rule, state.tick_count);
                    stop.store(true, Ordering::SeqCst);
                    return Err(InvariantViolation {
                        tick: state.tick_count,
                        rule,
                    });
                }
            }

            let events = sim.drain_events();
            observer(&sim.snapshot(), &events);

            let finished = options.max_ticks.is_some_and(|max| ticks_run >= max)
                || (options.stop_on_game_over && sim.state().is_game_over);
            if finished {
                stop.store(true, Ordering::SeqCst);
                break;
            }
        }

        if let Some(wait) = period.checked_sub(accumulator) {
            thread::sleep(wait);
        }
    }

    log::info!("Game loop stopped after {} ticks", ticks_run);
    Ok(sim)
}
