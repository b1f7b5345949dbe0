// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::time::Duration;

use alloc::boxed::Box;

/// A timer calling its callback every `period`, for spawning enemies, blinking
/// cursors and such.
///
/// The clock only knows the time it's told about in [`Clock::tick`]. It fires
/// at most once per tick, and the next period starts from the tick that fired.
pub struct Clock<'a> {
    period: Duration,
    current_time: Duration,
    last_fired: Duration,
    paused: bool,
    callback: Box<dyn FnMut() + 'a>,
}

impl<'a> Clock<'a> {
    pub fn new(period: Duration, callback: impl FnMut() + 'a) -> Clock<'a> {
        Clock {
            period,
            current_time: Duration::ZERO,
            last_fired: Duration::ZERO,
            paused: false,
            callback: Box::new(callback),
        }
    }

    /// Advances the clock by `elapsed`, calling the callback if a full period
    /// has passed since it was last called. Paused clocks ignore the time.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.paused {
            return;
        }
        self.current_time = self.current_time.saturating_add(elapsed);
        if self.current_time >= self.last_fired.saturating_add(self.period) {
            (self.callback)();
            self.last_fired = self.current_time;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resumes a paused clock. The time spent paused doesn't count towards
    /// the period.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The total time the clock has ticked while not paused.
    pub fn current_time(&self) -> Duration {
        self.current_time
    }
}
