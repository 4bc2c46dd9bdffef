use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

pub const TICK_RATE_MS: u64 = 100;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                // Windows reports releases too; only presses drive the game
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// One turn of the event loop: what woke it and how much wall-clock time
/// passed since the previous turn. `elapsed` is what the session advances by.
#[derive(Clone, Debug)]
pub struct Step {
    pub event: AppEvent,
    pub elapsed: Duration,
}

/// Runner that advances the application one event/tick at a time and keeps
/// the game clock in step with the wall clock
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    stopwatch: Stopwatch,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
            stopwatch: Stopwatch::start(),
        }
    }

    /// Blocks up to one tick interval. Returns the next event (or Tick on
    /// timeout) together with the time measured since the last step, so
    /// keys and ticks both move the session clock.
    pub fn step(&mut self) -> Step {
        let event = match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        };
        Step {
            event,
            elapsed: self.stopwatch.lap(),
        }
    }
}

/// Measures wall-clock time between successive laps
#[derive(Debug, Clone, Copy)]
struct Stopwatch {
    last: Instant,
}

impl Stopwatch {
    fn start() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Time since the previous lap (or since start)
    fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let mut runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        match runner.step().event {
            AppEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let mut runner = Runner::new(es, ticker);

        match runner.step().event {
            AppEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn step_measures_time_waited_for_a_tick() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(20)),
        );

        let step = runner.step();
        assert!(matches!(step.event, AppEvent::Tick));
        assert!(step.elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn step_elapsed_does_not_double_count() {
        let (tx, rx) = mpsc::channel();
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(50)),
        );
        std::thread::sleep(Duration::from_millis(30));
        tx.send(AppEvent::Resize).unwrap();
        tx.send(AppEvent::Resize).unwrap();

        let first = runner.step().elapsed;
        let second = runner.step().elapsed;
        assert!(first >= Duration::from_millis(30));
        assert!(second < first);
    }
}
