use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use tracing::{debug, info};

use crate::deck::{build_deck, Face, Pair, RandomSource};
use crate::resolver::{self, Cleanup, PendingResolution};
use crate::sound::{Silent, SoundPlayer};
use crate::timer::{ClockTick, Scheduler, SessionClock, TimerId};

pub const DEFAULT_TIME_LIMIT_SECS: u64 = 600;
pub const DEFAULT_RESOLVE_DELAY_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum_macros::Display)]
pub enum FaceStatus {
    #[default]
    Idle,
    Selected,
    Success,
    Failure,
}

/// How a session reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Finished { elapsed_ms: u64 },
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub matches: u32,
    pub mismatches: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub time_limit_secs: u64,
    pub resolve_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            resolve_delay: Duration::from_millis(DEFAULT_RESOLVE_DELAY_MS),
        }
    }
}

/// Mutable play state of one board. Faces missing from `status_by_index`
/// are idle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub faces: Vec<Face>,
    pub status_by_index: HashMap<usize, FaceStatus>,
    pub selection: Vec<usize>,
    pub running: bool,
    pub tally: Tally,
}

impl SessionState {
    pub fn new(faces: Vec<Face>) -> Self {
        Self {
            faces,
            ..Default::default()
        }
    }

    pub fn status(&self, index: usize) -> FaceStatus {
        self.status_by_index
            .get(&index)
            .copied()
            .unwrap_or_default()
    }
}

/// Read-only view handed to renderers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot<'a> {
    pub faces: &'a [Face],
    pub statuses: Vec<FaceStatus>,
    pub selection: &'a [usize],
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub running: bool,
    pub tally: Tally,
    pub ended: Option<SessionEnd>,
}

/// Completion callbacks. Each fires at most once per session.
#[derive(Default)]
pub struct SessionHooks {
    on_finish: Option<Box<dyn FnMut(u64)>>,
    on_timeout: Option<Box<dyn FnMut()>>,
}

impl SessionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_finish(mut self, f: impl FnMut(u64) + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }

    pub fn on_timeout(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_timeout = Some(Box::new(f));
        self
    }

    fn finished(&mut self, elapsed_ms: u64) {
        if let Some(f) = self.on_finish.as_mut() {
            f(elapsed_ms);
        }
    }

    fn timed_out(&mut self) {
        if let Some(f) = self.on_timeout.as_mut() {
            f();
        }
    }
}

impl fmt::Debug for SessionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHooks")
            .field("on_finish", &self.on_finish.is_some())
            .field("on_timeout", &self.on_timeout.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    Tick,
    Cleanup,
}

/// A single playthrough of one board.
///
/// Time never passes on its own: the host calls [`GameSession::advance`]
/// with the wall-clock delta (or a simulated one in tests), which fires
/// clock ticks and resolution cleanups in order.
pub struct GameSession {
    pairs: Vec<Pair>,
    config: SessionConfig,
    state: SessionState,
    clock: SessionClock,
    scheduler: Scheduler<Deferred>,
    resolution: Option<PendingResolution>,
    started: bool,
    ended: Option<SessionEnd>,
    rng: Box<dyn RandomSource>,
    sound: Box<dyn SoundPlayer>,
    hooks: SessionHooks,
}

impl GameSession {
    pub fn new(pairs: Vec<Pair>, config: SessionConfig) -> Self {
        let mut session = Self {
            pairs,
            config,
            state: SessionState::default(),
            clock: SessionClock::new(config.time_limit_secs),
            scheduler: Scheduler::new(),
            resolution: None,
            started: false,
            ended: None,
            rng: Box::new(rand::thread_rng()),
            sound: Box::new(Silent),
            hooks: SessionHooks::default(),
        };
        session.rebuild();
        session
    }

    /// Swap the shuffle source. The deck is reshuffled with it.
    pub fn with_rng(mut self, rng: impl RandomSource + 'static) -> Self {
        self.rng = Box::new(rng);
        self.rebuild();
        self
    }

    pub fn with_sound(mut self, sound: impl SoundPlayer + 'static) -> Self {
        self.sound = Box::new(sound);
        self
    }

    pub fn with_hooks(mut self, hooks: SessionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn set_hooks(&mut self, hooks: SessionHooks) {
        self.hooks = hooks;
    }

    pub fn set_sound(&mut self, sound: Box<dyn SoundPlayer>) {
        self.sound = sound;
    }

    pub fn start(&mut self) {
        if self.state.running || self.ended.is_some() {
            return;
        }
        self.state.running = true;
        self.started = true;
        self.clock.start(&mut self.scheduler, Deferred::Tick);
        info!(
            faces = self.state.faces.len(),
            elapsed = self.clock.elapsed_secs(),
            "session started"
        );
    }

    pub fn stop(&mut self) {
        if !self.state.running {
            return;
        }
        self.state.running = false;
        self.clock.stop(&mut self.scheduler);
        info!(elapsed = self.clock.elapsed_secs(), "session stopped");
    }

    pub fn toggle(&mut self) {
        if self.state.running {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Back to a freshly shuffled deck of the same board, clock at zero
    pub fn reset(&mut self) {
        self.rebuild();
        info!(faces = self.state.faces.len(), "session reset");
    }

    /// Replace the board. A board with the same pair ids keeps the current
    /// session; returns whether a new one was built.
    pub fn load_board(&mut self, pairs: Vec<Pair>) -> bool {
        let same_identity = pairs.len() == self.pairs.len()
            && pairs.iter().zip(&self.pairs).all(|(a, b)| a.id == b.id);
        if same_identity {
            return false;
        }
        self.pairs = pairs;
        self.rebuild();
        info!(pairs = self.pairs.len(), "board loaded");
        true
    }

    fn rebuild(&mut self) {
        // Drops the clock interval and any in-flight resolution cleanup
        self.clock.reset(&mut self.scheduler);
        self.resolution = None;
        self.scheduler.cancel_all();
        self.started = false;
        self.ended = None;
        self.state = SessionState::new(build_deck(&self.pairs, self.rng.as_mut()));
    }

    pub fn select(&mut self, index: usize) {
        if !self.state.running || index >= self.state.faces.len() {
            return;
        }
        if matches!(
            self.state.status(index),
            FaceStatus::Success | FaceStatus::Failure
        ) {
            return;
        }

        if let Some(pos) = self.state.selection.iter().position(|&i| i == index) {
            self.state.selection.remove(pos);
            self.state.status_by_index.remove(&index);
            debug!(index, "face deselected");
            return;
        }

        if self.state.selection.len() >= 2 {
            return;
        }
        self.state.selection.push(index);
        self.state
            .status_by_index
            .insert(index, FaceStatus::Selected);
        debug!(index, "face selected");

        if let [first, second] = self.state.selection[..] {
            self.resolve(first, second);
        }
    }

    fn resolve(&mut self, first: usize, second: usize) {
        let verdict = resolver::begin(&mut self.state, first, second, self.sound.as_mut());
        let timer = self
            .scheduler
            .once(self.config.resolve_delay, Deferred::Cleanup);
        self.resolution = Some(PendingResolution {
            timer,
            first,
            second,
            verdict,
        });
    }

    /// Move session time forward by `dt`
    pub fn advance(&mut self, dt: Duration) {
        let until = self.scheduler.now() + dt;
        while let Some((id, deferred)) = self.scheduler.pop_due(until) {
            match deferred {
                Deferred::Tick if self.clock.owns(id) => self.on_tick(),
                Deferred::Tick => {}
                Deferred::Cleanup => self.on_cleanup(id),
            }
        }
    }

    fn on_tick(&mut self) {
        if !self.state.running {
            return;
        }
        if let ClockTick::LimitReached(secs) = self.clock.on_tick() {
            self.stop();
            if self.ended.is_none() {
                self.ended = Some(SessionEnd::TimedOut);
                info!(elapsed = secs, "session timed out");
                self.hooks.timed_out();
            }
        }
    }

    fn on_cleanup(&mut self, id: TimerId) {
        let pending = match self.resolution.take() {
            Some(p) if p.timer == id => p,
            other => {
                self.resolution = other;
                return;
            }
        };

        if let Cleanup::Removed {
            board_cleared: true,
        } = resolver::finish(&mut self.state, &pending)
        {
            self.finish();
        }
    }

    fn finish(&mut self) {
        self.state.running = false;
        self.clock.stop(&mut self.scheduler);
        if self.ended.is_some() {
            return;
        }
        let elapsed_ms = self.clock.elapsed_ms();
        self.ended = Some(SessionEnd::Finished { elapsed_ms });
        info!(elapsed_ms, tally = ?self.state.tally, "board cleared");
        self.hooks.finished(elapsed_ms);
    }

    pub fn faces(&self) -> &[Face] {
        &self.state.faces
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn status(&self, index: usize) -> FaceStatus {
        self.state.status(index)
    }

    pub fn selection(&self) -> &[usize] {
        &self.state.selection
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.clock.elapsed_secs()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.clock.remaining_secs()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Whether `start` has run since the deck was last built, paused or not
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_resolving(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn ended(&self) -> Option<SessionEnd> {
        self.ended
    }

    pub fn tally(&self) -> Tally {
        self.state.tally
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            faces: &self.state.faces,
            statuses: (0..self.state.faces.len())
                .map(|i| self.state.status(i))
                .collect(),
            selection: &self.state.selection,
            elapsed_secs: self.clock.elapsed_secs(),
            remaining_secs: self.clock.remaining_secs(),
            running: self.state.running,
            tally: self.state.tally,
            ended: self.ended,
        }
    }
}

impl fmt::Debug for GameSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("pairs", &self.pairs.len())
            .field("state", &self.state)
            .field("clock", &self.clock)
            .field("resolution", &self.resolution)
            .field("started", &self.started)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}
