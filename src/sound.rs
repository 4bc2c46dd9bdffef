use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Fire-and-forget feedback for resolved selections
pub trait SoundPlayer {
    fn play_success(&mut self);
    fn play_failure(&mut self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl SoundPlayer for Silent {
    fn play_success(&mut self) {}
    fn play_failure(&mut self) {}
}

/// Rings the terminal bell: once for a match, twice for a miss
#[derive(Debug)]
pub struct TerminalBell<W: Write> {
    out: W,
}

impl TerminalBell<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn ring(&mut self, times: usize) {
        let bells = "\x07".repeat(times);
        // A lost bell is not worth interrupting play for
        let _ = self
            .out
            .write_all(bells.as_bytes())
            .and_then(|_| self.out.flush());
    }
}

impl<W: Write> SoundPlayer for TerminalBell<W> {
    fn play_success(&mut self) {
        self.ring(1);
    }

    fn play_failure(&mut self) {
        self.ring(2);
    }
}

/// Counts calls instead of making noise
#[derive(Debug, Clone, Default)]
pub struct RecordingSound {
    pub successes: usize,
    pub failures: usize,
}

impl SoundPlayer for RecordingSound {
    fn play_success(&mut self) {
        self.successes += 1;
    }

    fn play_failure(&mut self) {
        self.failures += 1;
    }
}

// Lets a caller keep a handle on a player it hands to a session
impl<T: SoundPlayer> SoundPlayer for Rc<RefCell<T>> {
    fn play_success(&mut self) {
        self.borrow_mut().play_success();
    }

    fn play_failure(&mut self) {
        self.borrow_mut().play_failure();
    }
}
