use std::time::Duration;

pub const TICK_PERIOD: Duration = Duration::from_millis(1000);

/// Handle for a scheduled timer, used for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Entry<E> {
    id: TimerId,
    due: Duration,
    period: Option<Duration>,
    event: E,
}

/// Cooperative virtual-time timer queue.
///
/// Nothing fires on its own: the owner moves time forward with
/// [`Scheduler::pop_due`] and handles each returned event before asking for
/// the next one, so a handler may cancel timers that would otherwise fire
/// later in the same advance. Events due at the same instant fire in the
/// order they were scheduled.
#[derive(Debug, Clone)]
pub struct Scheduler<E> {
    now: Duration,
    next_id: u64,
    entries: Vec<Entry<E>>,
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            entries: Vec::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Fire `event` once after `delay`
    pub fn once(&mut self, delay: Duration, event: E) -> TimerId {
        self.insert(delay, None, event)
    }

    /// Fire `event` every `period`, first time one period from now
    pub fn every(&mut self, period: Duration, event: E) -> TimerId {
        self.insert(period, Some(period), event)
    }

    fn insert(&mut self, delay: Duration, period: Option<Duration>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due: self.now + delay,
            period,
            event,
        });
        id
    }

    /// Returns true if a timer was actually removed. Unknown ids are ignored.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Pop the earliest event due at or before `until`, moving the clock to
    /// its due time. Periodic timers are re-armed. Returns `None` (and moves
    /// the clock to `until`) once nothing else is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, E)> {
        let next = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= until)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(idx, _)| idx);

        match next {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                self.now = self.now.max(entry.due);
                let fired = (entry.id, entry.event.clone());
                match entry.period {
                    Some(period) => entry.due += period,
                    None => {
                        self.entries.remove(idx);
                    }
                }
                Some(fired)
            }
            None => {
                self.now = self.now.max(until);
                None
            }
        }
    }
}

impl<E: Clone> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    Running(u64),
    LimitReached(u64),
}

/// One-second session clock with a maximum-duration guard.
///
/// The clock only holds the id of its periodic timer; the scheduler that
/// owns the timer is passed in so a session can keep a single queue for
/// ticks and resolution delays.
#[derive(Debug, Clone)]
pub struct SessionClock {
    elapsed_secs: u64,
    limit_secs: u64,
    interval: Option<TimerId>,
}

impl SessionClock {
    pub fn new(limit_secs: u64) -> Self {
        Self {
            elapsed_secs: 0,
            limit_secs,
            interval: None,
        }
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_secs * 1000
    }

    pub fn limit_secs(&self) -> u64 {
        self.limit_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.limit_secs.saturating_sub(self.elapsed_secs)
    }

    pub fn is_ticking(&self) -> bool {
        self.interval.is_some()
    }

    pub fn owns(&self, id: TimerId) -> bool {
        self.interval == Some(id)
    }

    pub fn start<E: Clone>(&mut self, scheduler: &mut Scheduler<E>, tick: E) {
        if self.interval.is_none() {
            self.interval = Some(scheduler.every(TICK_PERIOD, tick));
        }
    }

    pub fn stop<E: Clone>(&mut self, scheduler: &mut Scheduler<E>) {
        if let Some(id) = self.interval.take() {
            scheduler.cancel(id);
        }
    }

    pub fn reset<E: Clone>(&mut self, scheduler: &mut Scheduler<E>) {
        self.stop(scheduler);
        self.elapsed_secs = 0;
    }

    pub fn on_tick(&mut self) -> ClockTick {
        self.elapsed_secs += 1;
        if self.elapsed_secs >= self.limit_secs {
            ClockTick::LimitReached(self.elapsed_secs)
        } else {
            ClockTick::Running(self.elapsed_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: Duration) -> Vec<(Duration, &'static str)> {
        let mut fired = vec![];
        while let Some((_, ev)) = s.pop_due(until) {
            fired.push((s.now(), ev));
        }
        fired
    }

    #[test]
    fn test_once_fires_after_delay() {
        let mut s = Scheduler::new();
        s.once(Duration::from_millis(500), "cleanup");

        assert!(drain(&mut s, Duration::from_millis(499)).is_empty());
        assert_eq!(
            drain(&mut s, Duration::from_millis(500)),
            vec![(Duration::from_millis(500), "cleanup")]
        );
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn test_every_rearms() {
        let mut s = Scheduler::new();
        s.every(TICK_PERIOD, "tick");

        let fired = drain(&mut s, Duration::from_millis(3500));
        assert_eq!(fired.len(), 3);
        assert_eq!(fired[2].0, Duration::from_secs(3));
        assert_eq!(s.now(), Duration::from_millis(3500));
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut s = Scheduler::new();
        let id = s.once(Duration::from_millis(10), "x");
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(drain(&mut s, Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn test_events_fire_in_time_order_then_schedule_order() {
        let mut s = Scheduler::new();
        s.once(Duration::from_millis(300), "late");
        s.once(Duration::from_millis(100), "early");
        s.once(Duration::from_millis(100), "early-second");

        let names: Vec<_> = drain(&mut s, Duration::from_secs(1))
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(names, vec!["early", "early-second", "late"]);
    }

    #[test]
    fn test_handler_can_cancel_later_event() {
        let mut s = Scheduler::new();
        s.once(Duration::from_millis(100), "first");
        let second = s.once(Duration::from_millis(200), "second");

        let (_, ev) = s.pop_due(Duration::from_secs(1)).unwrap();
        assert_eq!(ev, "first");
        s.cancel(second);
        assert!(s.pop_due(Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_clock_ticks_and_limit() {
        let mut clock = SessionClock::new(3);
        assert_eq!(clock.on_tick(), ClockTick::Running(1));
        assert_eq!(clock.on_tick(), ClockTick::Running(2));
        assert_eq!(clock.on_tick(), ClockTick::LimitReached(3));
        assert_eq!(clock.elapsed_ms(), 3000);
        assert_eq!(clock.remaining_secs(), 0);
    }

    #[test]
    fn test_clock_start_stop_idempotent() {
        let mut s: Scheduler<&str> = Scheduler::new();
        let mut clock = SessionClock::new(600);

        clock.start(&mut s, "tick");
        clock.start(&mut s, "tick");
        assert_eq!(s.pending(), 1);
        assert!(clock.is_ticking());

        clock.stop(&mut s);
        clock.stop(&mut s);
        assert_eq!(s.pending(), 0);
        assert!(!clock.is_ticking());
    }

    #[test]
    fn test_clock_reset_zeroes_elapsed() {
        let mut s: Scheduler<&str> = Scheduler::new();
        let mut clock = SessionClock::new(600);
        clock.start(&mut s, "tick");
        clock.on_tick();
        clock.on_tick();

        clock.reset(&mut s);
        assert_eq!(clock.elapsed_secs(), 0);
        assert!(!clock.is_ticking());
        assert_eq!(s.pending(), 0);
    }
}
