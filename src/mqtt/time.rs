// MIT License
//
// Copyright (c) 2025 Takatoshi Kondo
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Monotonic millisecond clock and the one-shot/auto-restart timers the
//! endpoints use for keepalive and response deadlines. Timers sample the
//! clock, they never wait.

use once_cell::sync::Lazy;
use std::time::Instant;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Monotonic milliseconds since the process first sampled the clock.
///
/// Not wall-clock time; guaranteed to never decrease.
pub fn now_ms() -> u64 {
    EPOCH.elapsed().as_millis() as u64
}

/// One-shot or auto-restarting millisecond timer.
///
/// A default-constructed timer is stopped and never expires. `start` records
/// the start and expiration instants; `reset` retriggers from now without
/// changing the period; `has_expired` reports expiration and, for
/// auto-restart timers, advances the window by one period.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    start: u64,
    expiration: u64,
    auto_restart: bool,
    armed: bool,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer for `period_ms` from now.
    pub fn start(&mut self, period_ms: u64, auto_restart: bool) {
        self.start = now_ms();
        self.expiration = self.start + period_ms;
        self.auto_restart = auto_restart;
        self.armed = true;
    }

    /// Disarm; a stopped timer never expires.
    pub fn stop(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Retrigger from now, keeping the original period.
    pub fn reset(&mut self) {
        if !self.armed {
            return;
        }
        let period = self.expiration - self.start;
        self.start = now_ms();
        self.expiration = self.start + period;
    }

    /// True when now >= expiration. Auto-restart timers advance their
    /// start/expiration window by one period when they report expiry, so a
    /// periodic timer fires once per period.
    pub fn has_expired(&mut self) -> bool {
        if !self.armed {
            return false;
        }
        let now = now_ms();
        if now < self.expiration {
            return false;
        }
        if self.auto_restart {
            let period = self.expiration - self.start;
            self.start = now;
            self.expiration = now + period;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn clock_is_monotonic() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }

    #[test]
    fn unarmed_timer_never_expires() {
        let mut timer = Timer::new();
        assert!(!timer.has_expired());
        timer.start(1, false);
        timer.stop();
        sleep(Duration::from_millis(5));
        assert!(!timer.has_expired());
    }

    #[test]
    fn one_shot_expires_once_per_start() {
        let mut timer = Timer::new();
        timer.start(1, false);
        sleep(Duration::from_millis(5));
        assert!(timer.has_expired());
        // stays expired until restarted
        assert!(timer.has_expired());
    }

    #[test]
    fn auto_restart_advances_the_window() {
        let mut timer = Timer::new();
        timer.start(20, true);
        sleep(Duration::from_millis(25));
        assert!(timer.has_expired());
        // window advanced; not expired again immediately
        assert!(!timer.has_expired());
    }

    #[test]
    fn reset_retriggers_from_now() {
        let mut timer = Timer::new();
        timer.start(20, false);
        sleep(Duration::from_millis(12));
        timer.reset();
        sleep(Duration::from_millis(12));
        // 24ms elapsed but the reset pushed expiry to ~32ms
        assert!(!timer.has_expired());
        sleep(Duration::from_millis(12));
        assert!(timer.has_expired());
    }
}
