use std::time::{Duration, Instant};

pub const TIMER_DEC_PER_SECOND: u32 = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    pub count: u8,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self { count: init_count }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    /// one 60Hz decrement, clamped at zero
    pub fn tick(&mut self) {
        self.count = self.count.saturating_sub(1);
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}

/// The delay and sound timers. This is all the timer clock ever touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
}

impl Timers {
    pub fn tick(&mut self) {
        self.delay.tick();
        self.sound.tick();
    }
}

/// A fixed-rate clock driven by wall-clock deadlines. Each deadline is derived
/// from the previous one, never from the time it was observed, so lateness in
/// polling does not shift the schedule.
#[derive(Debug, Clone)]
pub struct Clock {
    period: Duration,
    next: Instant,
}

impl Clock {
    pub fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next: start + period,
        }
    }

    pub fn from_hz(hz: u32, start: Instant) -> Self {
        Self::new(Duration::from_secs(1) / hz.max(1), start)
    }

    pub fn next_deadline(&self) -> Instant {
        self.next
    }

    /// How many deadlines have passed by `now`; consumes them.
    pub fn due(&mut self, now: Instant) -> u32 {
        let mut fired = 0;
        while self.next <= now {
            self.next += self.period;
            fired += 1;
        }
        fired
    }

    /// drop any backlog and schedule the next firing one period after `now`
    pub fn resync(&mut self, now: Instant) {
        self.next = now + self.period;
    }
}
