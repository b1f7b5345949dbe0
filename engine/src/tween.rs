// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tweens: values animated from a start to an end over a duration, passed to a
//! callback every tick.

mod easing;

use core::time::Duration;

use alloc::boxed::Box;

use libm::roundf;

pub use easing::Easing;

use crate::geom::{Position, Size};

/// An RGBA color with 8 bits per channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }
}

/// The values a [`Tween`] can animate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenValue {
    Float(f32),
    Size(Size),
    Position(Position),
    Color(Color),
}

impl TweenValue {
    /// Interpolates from `self` towards `to`. `t` may go outside 0..=1 for
    /// curves that overshoot, colors are clamped to their channel range.
    fn lerp(self, to: TweenValue, t: f32) -> TweenValue {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        let mix_channel = |a: u8, b: u8| roundf(mix(a as f32, b as f32)).clamp(0.0, 255.0) as u8;
        match (self, to) {
            (TweenValue::Float(a), TweenValue::Float(b)) => TweenValue::Float(mix(a, b)),
            (TweenValue::Size(a), TweenValue::Size(b)) => TweenValue::Size(Size::new(
                mix(a.width, b.width),
                mix(a.height, b.height),
            )),
            (TweenValue::Position(a), TweenValue::Position(b)) => {
                TweenValue::Position(Position::new(mix(a.x, b.x), mix(a.y, b.y)))
            }
            (TweenValue::Color(a), TweenValue::Color(b)) => TweenValue::Color(Color::rgba(
                mix_channel(a.r, b.r),
                mix_channel(a.g, b.g),
                mix_channel(a.b, b.b),
                mix_channel(a.a, b.a),
            )),
            // Tween::start only pairs values of the same type.
            (from, _) => from,
        }
    }
}

/// Types that can be animated with a [`Tween`].
pub trait Tweenable: Copy {
    fn into_value(self) -> TweenValue;
    fn from_value(value: TweenValue) -> Option<Self>;
}

impl Tweenable for f32 {
    fn into_value(self) -> TweenValue {
        TweenValue::Float(self)
    }
    fn from_value(value: TweenValue) -> Option<Self> {
        match value {
            TweenValue::Float(value) => Some(value),
            _ => None,
        }
    }
}

impl Tweenable for Size {
    fn into_value(self) -> TweenValue {
        TweenValue::Size(self)
    }
    fn from_value(value: TweenValue) -> Option<Self> {
        match value {
            TweenValue::Size(value) => Some(value),
            _ => None,
        }
    }
}

impl Tweenable for Position {
    fn into_value(self) -> TweenValue {
        TweenValue::Position(self)
    }
    fn from_value(value: TweenValue) -> Option<Self> {
        match value {
            TweenValue::Position(value) => Some(value),
            _ => None,
        }
    }
}

impl Tweenable for Color {
    fn into_value(self) -> TweenValue {
        TweenValue::Color(self)
    }
    fn from_value(value: TweenValue) -> Option<Self> {
        match value {
            TweenValue::Color(value) => Some(value),
            _ => None,
        }
    }
}

struct Animation<'a> {
    from: TweenValue,
    to: TweenValue,
    duration: Duration,
    elapsed: Duration,
    callback: Box<dyn FnMut(TweenValue) + 'a>,
}

/// Animates a value along an [`Easing`] curve, calling back with the current
/// value on every [`Tween::tick`] until the duration has passed.
///
/// A new tween does nothing until [`Tween::start`] is called. Starting again
/// replaces the running animation.
pub struct Tween<'a> {
    easing: Easing,
    animation: Option<Animation<'a>>,
    finished: bool,
}

impl<'a> Tween<'a> {
    pub fn new(easing: Easing) -> Tween<'a> {
        Tween {
            easing,
            animation: None,
            finished: false,
        }
    }

    /// Starts animating from `from` to `to` over `duration`. `callback` gets
    /// the value after each tick, the last call getting exactly `to`.
    pub fn start<T: Tweenable + 'a>(
        &mut self,
        from: T,
        to: T,
        duration: Duration,
        mut callback: impl FnMut(T) + 'a,
    ) {
        self.finished = false;
        self.animation = Some(Animation {
            from: from.into_value(),
            to: to.into_value(),
            duration,
            elapsed: Duration::ZERO,
            callback: Box::new(move |value| {
                if let Some(value) = T::from_value(value) {
                    callback(value);
                }
            }),
        });
    }

    /// Advances the animation by `elapsed` and calls the callback with the new
    /// value. Does nothing if the tween hasn't been started or has finished.
    pub fn tick(&mut self, elapsed: Duration) {
        if self.finished {
            return;
        }
        let Some(animation) = &mut self.animation else {
            return;
        };

        animation.elapsed = animation.elapsed.saturating_add(elapsed);
        let progress = if animation.elapsed >= animation.duration {
            self.finished = true;
            1.0
        } else {
            animation.elapsed.as_secs_f32() / animation.duration.as_secs_f32()
        };

        // Curves end at 1.0 up to float error, land on the target exactly.
        let value = if self.finished {
            animation.to
        } else {
            animation.from.lerp(animation.to, self.easing.apply(progress))
        };
        (animation.callback)(value);
    }

    /// Stops the animation without calling the callback again.
    pub fn stop(&mut self) {
        self.animation = None;
        self.finished = false;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns true if the tween has been started and hasn't finished.
    pub fn is_running(&self) -> bool {
        self.animation.is_some() && !self.finished
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }
}
