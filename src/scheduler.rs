use std::time::Instant;

use log::warn;

use crate::timer::{Clock, TIMER_DEC_PER_SECOND};

/// Most instruction ticks a single poll will hand out. Anything beyond is a
/// stall (window dragged, process suspended) and is dropped.
pub const MAX_CATCH_UP: u32 = 1_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ticks {
    pub instructions: u32,
    pub timers: u32,
}

/// Interleaves the instruction clock and the 60Hz timer clock on one thread.
#[derive(Debug, Clone)]
pub struct Scheduler {
    cpu: Clock,
    timers: Clock,
}

impl Scheduler {
    pub fn new(instructions_per_second: u32, start: Instant) -> Self {
        Self {
            cpu: Clock::from_hz(instructions_per_second, start),
            timers: Clock::from_hz(TIMER_DEC_PER_SECOND, start),
        }
    }

    pub fn poll(&mut self, now: Instant) -> Ticks {
        let timers = self.timers.due(now);
        let mut instructions = self.cpu.due(now);
        if instructions > MAX_CATCH_UP {
            warn!(
                "instruction clock fell {} ticks behind, skipping",
                instructions - MAX_CATCH_UP
            );
            instructions = MAX_CATCH_UP;
            self.cpu.resync(now);
        }
        Ticks {
            instructions,
            timers,
        }
    }

    pub fn next_deadline(&self) -> Instant {
        self.cpu.next_deadline().min(self.timers.next_deadline())
    }
}
