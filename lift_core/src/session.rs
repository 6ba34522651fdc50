//! Workout session state machine.
//!
//! Drives one active workout through `Warmup → Working ⇄ Resting →
//! Finished`. The machine itself is pure: [`WorkoutSession::apply`] mutates
//! the in-memory triple and returns the side-effects as data, in the order
//! they must run. [`SessionDriver`] executes them against the injected
//! ports (snapshot store, cue player, wake lock), swallowing every
//! best-effort failure so a broken speaker or wake-lock API can never stall
//! a transition.
//!
//! Timer discipline: at most one countdown tick is ever outstanding. Every
//! transition that leaves Resting emits [`Effect::CancelTick`] ahead of its
//! other effects, so a stale tick cannot clobber a manually advanced state.

use crate::snapshot::SnapshotStore;
use crate::{Result, SessionConfig, SessionSnapshot, SessionState, WorkoutSet};

/// An input to the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Leave Warmup and begin the first set
    Start,
    /// Flip the completion flag of the named set
    ToggleSet(String),
    /// One rest-countdown time unit elapsed
    Tick,
    /// Cut the rest period short
    SkipRest,
    /// End the session and emit the set list
    Finish,
}

/// Audible cue kinds emitted during the rest countdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cue {
    /// Final-seconds countdown beep
    Countdown,
    /// Rest period over, back to work
    RestOver,
}

/// A side-effect requested by a transition, to be executed by the driver
/// in list order.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Persist the full recovery triple
    SaveSnapshot(SessionSnapshot),
    /// Delete the snapshot slot (session finished)
    ClearSnapshot,
    /// Arm the single countdown tick
    ScheduleTick,
    /// Disarm any outstanding countdown tick
    CancelTick,
    /// Best-effort audible cue
    PlayCue(Cue),
    /// Best-effort platform stay-awake acquisition
    AcquireWakeLock,
    /// Release the stay-awake resource
    ReleaseWakeLock,
    /// Hand the finished set list upstream; emitted exactly once
    EmitCompleted(Vec<WorkoutSet>),
}

/// The one active workout session.
#[derive(Clone, Debug)]
pub struct WorkoutSession {
    sets: Vec<WorkoutSet>,
    state: SessionState,
    active_set_index: usize,
    rest_remaining: u32,
    rest_duration: u32,
    cue_window: u32,
}

impl WorkoutSession {
    /// Fresh session in Warmup with the provided sets.
    pub fn new(initial_sets: Vec<WorkoutSet>, config: &SessionConfig) -> Self {
        Self {
            sets: initial_sets,
            state: SessionState::Warmup,
            active_set_index: 0,
            rest_remaining: 0,
            rest_duration: config.rest_seconds,
            cue_window: config.cue_window_seconds,
        }
    }

    /// Resume from a persisted snapshot if one exists, otherwise start
    /// fresh.
    ///
    /// A present, well-formed snapshot restores the exact
    /// sets/state/active_set_index triple that was last written; the store
    /// maps absent and corrupt content both to `None`, so a bad snapshot
    /// silently falls back to the initial sets. The rest countdown is not
    /// part of the snapshot, so a session restored into Resting holds zero
    /// remaining and the next tick normalizes it to Working.
    ///
    /// Returns the session and whether it was resumed.
    pub fn resume_or_new(
        initial_sets: Vec<WorkoutSet>,
        config: &SessionConfig,
        store: &dyn SnapshotStore,
    ) -> (Self, bool) {
        match store.load() {
            Some(snapshot) => {
                tracing::info!(
                    "Resuming session: {} sets, state {:?}, active set {}",
                    snapshot.sets.len(),
                    snapshot.state,
                    snapshot.active_set_index
                );
                let session = Self {
                    sets: snapshot.sets,
                    state: snapshot.state,
                    active_set_index: snapshot.active_set_index,
                    rest_remaining: 0,
                    rest_duration: config.rest_seconds,
                    cue_window: config.cue_window_seconds,
                };
                (session, true)
            }
            None => (Self::new(initial_sets, config), false),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn sets(&self) -> &[WorkoutSet] {
        &self.sets
    }

    pub fn active_set_index(&self) -> usize {
        self.active_set_index
    }

    pub fn rest_remaining(&self) -> u32 {
        self.rest_remaining
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            sets: self.sets.clone(),
            state: self.state,
            active_set_index: self.active_set_index,
        }
    }

    /// Apply one event and return the side-effects to execute, in order.
    ///
    /// Events with unmet preconditions are no-ops that return no effects.
    /// Finished is absorbing: nothing leaves it.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<Effect> {
        if self.state == SessionState::Finished {
            tracing::debug!("Ignoring {:?} in finished session", event);
            return Vec::new();
        }

        match event {
            SessionEvent::Start => self.on_start(),
            SessionEvent::ToggleSet(set_id) => self.on_toggle_set(&set_id),
            SessionEvent::Tick => self.on_tick(),
            SessionEvent::SkipRest => self.on_skip_rest(),
            SessionEvent::Finish => self.on_finish(),
        }
    }

    fn on_start(&mut self) -> Vec<Effect> {
        if self.state != SessionState::Warmup {
            tracing::warn!("Start ignored in state {:?}", self.state);
            return Vec::new();
        }

        self.state = SessionState::Working;
        vec![
            Effect::AcquireWakeLock,
            Effect::SaveSnapshot(self.snapshot()),
        ]
    }

    fn on_toggle_set(&mut self, set_id: &str) -> Vec<Effect> {
        let Some(idx) = self.sets.iter().position(|s| s.id == set_id) else {
            tracing::warn!("ToggleSet for unknown set id {:?}", set_id);
            return Vec::new();
        };

        let completing = !self.sets[idx].completed;
        self.sets[idx].completed = completing;

        if !completing {
            // Un-checking only flips the flag; the index never rolls back.
            return vec![Effect::SaveSnapshot(self.snapshot())];
        }

        let last_index = self.sets.len().saturating_sub(1);
        self.active_set_index = (self.active_set_index + 1).min(last_index);
        self.state = SessionState::Resting;
        self.rest_remaining = self.rest_duration;

        vec![
            Effect::CancelTick,
            Effect::ReleaseWakeLock,
            Effect::ScheduleTick,
            Effect::SaveSnapshot(self.snapshot()),
        ]
    }

    fn on_tick(&mut self) -> Vec<Effect> {
        if self.state != SessionState::Resting {
            tracing::debug!("Stale tick in state {:?}", self.state);
            return Vec::new();
        }

        if self.rest_remaining == 0 {
            // Safety catch: a restored Resting session has no countdown left.
            self.state = SessionState::Working;
            return vec![
                Effect::CancelTick,
                Effect::AcquireWakeLock,
                Effect::SaveSnapshot(self.snapshot()),
            ];
        }

        self.rest_remaining -= 1;

        if self.rest_remaining == 0 {
            self.state = SessionState::Working;
            return vec![
                Effect::CancelTick,
                Effect::PlayCue(Cue::RestOver),
                Effect::AcquireWakeLock,
                Effect::SaveSnapshot(self.snapshot()),
            ];
        }

        let mut effects = Vec::new();
        if self.rest_remaining <= self.cue_window {
            effects.push(Effect::PlayCue(Cue::Countdown));
        }
        effects.push(Effect::ScheduleTick);
        effects
    }

    fn on_skip_rest(&mut self) -> Vec<Effect> {
        if self.state != SessionState::Resting {
            tracing::warn!("SkipRest ignored in state {:?}", self.state);
            return Vec::new();
        }

        self.rest_remaining = 0;
        self.state = SessionState::Working;
        vec![
            Effect::CancelTick,
            Effect::AcquireWakeLock,
            Effect::SaveSnapshot(self.snapshot()),
        ]
    }

    fn on_finish(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.state == SessionState::Resting {
            effects.push(Effect::CancelTick);
            self.rest_remaining = 0;
        }

        self.state = SessionState::Finished;
        effects.push(Effect::ReleaseWakeLock);
        effects.push(Effect::EmitCompleted(self.sets.clone()));
        effects.push(Effect::ClearSnapshot);
        effects
    }
}

// ============================================================================
// Ports and driver
// ============================================================================

/// Audible-cue port. Implementations may fail; the driver swallows it.
pub trait CuePlayer {
    fn play(&mut self, cue: Cue) -> Result<()>;
}

/// Platform stay-awake port. Best-effort on both ends.
pub trait WakeLock {
    fn acquire(&mut self) -> Result<()>;
    fn release(&mut self) -> Result<()>;
}

/// Cue player that does nothing.
pub struct SilentCue;

impl CuePlayer for SilentCue {
    fn play(&mut self, _cue: Cue) -> Result<()> {
        Ok(())
    }
}

/// Wake lock for platforms without one.
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn acquire(&mut self) -> Result<()> {
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Executes a session's effects against the injected ports.
///
/// Single-threaded and cooperative: events are dispatched strictly in
/// arrival order, and `tick_armed` stands in for the one cancellable
/// countdown task: the caller fires [`SessionEvent::Tick`] once per time
/// unit while it is set.
pub struct SessionDriver<S, C, W>
where
    S: SnapshotStore,
    C: CuePlayer,
    W: WakeLock,
{
    session: WorkoutSession,
    store: S,
    cues: C,
    wake_lock: W,
    tick_armed: bool,
    finished_sets: Option<Vec<WorkoutSet>>,
}

impl<S, C, W> SessionDriver<S, C, W>
where
    S: SnapshotStore,
    C: CuePlayer,
    W: WakeLock,
{
    /// Build a driver around a resumed-or-fresh session.
    ///
    /// Returns the driver and whether an earlier session was resumed. A
    /// session resumed into Resting gets its tick re-armed so the
    /// countdown safety catch runs.
    pub fn resume_or_new(
        initial_sets: Vec<WorkoutSet>,
        config: &SessionConfig,
        store: S,
        cues: C,
        wake_lock: W,
    ) -> (Self, bool) {
        let (session, resumed) = WorkoutSession::resume_or_new(initial_sets, config, &store);
        let tick_armed = session.state() == SessionState::Resting;
        let driver = Self {
            session,
            store,
            cues,
            wake_lock,
            tick_armed,
            finished_sets: None,
        };
        (driver, resumed)
    }

    pub fn session(&self) -> &WorkoutSession {
        &self.session
    }

    /// Whether the countdown tick is armed (state is Resting and a tick
    /// should fire after the next time unit).
    pub fn tick_armed(&self) -> bool {
        self.tick_armed
    }

    /// The set list emitted by `Finish`, available exactly once.
    pub fn take_finished(&mut self) -> Option<Vec<WorkoutSet>> {
        self.finished_sets.take()
    }

    /// Apply one event and run its effects.
    pub fn dispatch(&mut self, event: SessionEvent) {
        let effects = self.session.apply(event);
        self.run_effects(effects);
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SaveSnapshot(snapshot) => {
                    if let Err(e) = self.store.save(&snapshot) {
                        tracing::warn!("Failed to persist session snapshot: {}", e);
                    }
                }
                Effect::ClearSnapshot => {
                    if let Err(e) = self.store.clear() {
                        tracing::warn!("Failed to clear session snapshot: {}", e);
                    }
                }
                Effect::ScheduleTick => {
                    self.tick_armed = true;
                }
                Effect::CancelTick => {
                    self.tick_armed = false;
                }
                Effect::PlayCue(cue) => {
                    if let Err(e) = self.cues.play(cue) {
                        tracing::warn!("Audio cue failed: {}", e);
                    }
                }
                Effect::AcquireWakeLock => {
                    if let Err(e) = self.wake_lock.acquire() {
                        tracing::warn!("Wake lock acquisition failed: {}", e);
                    }
                }
                Effect::ReleaseWakeLock => {
                    if let Err(e) = self.wake_lock.release() {
                        tracing::warn!("Wake lock release failed: {}", e);
                    }
                }
                Effect::EmitCompleted(sets) => {
                    self.finished_sets = Some(sets);
                }
            }
        }
    }
}

impl<S, C, W> Drop for SessionDriver<S, C, W>
where
    S: SnapshotStore,
    C: CuePlayer,
    W: WakeLock,
{
    fn drop(&mut self) {
        // Teardown must not leave the stay-awake resource held.
        if let Err(e) = self.wake_lock.release() {
            tracing::warn!("Wake lock release on teardown failed: {}", e);
        }
    }
}
