// SPDX-FileCopyrightText: 2024 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use core::f32::consts::{FRAC_PI_2, PI, TAU};

use libm::{cosf, expf, powf, sinf, sqrtf};

/// Curves mapping the progress of a tween (0.0 at the start, 1.0 at the end)
/// to how far along the value should be.
///
/// Every curve starts at 0.0 and ends at 1.0, the in-out variants pass 0.5 at
/// the halfway point. Elastic and back curves overshoot in between.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuarticIn,
    QuarticOut,
    QuarticInOut,
    QuinticIn,
    QuinticOut,
    QuinticInOut,
    SineIn,
    SineOut,
    SineInOut,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
    CircleIn,
    CircleOut,
    CircleInOut,
    ElasticIn,
    ElasticOut,
    ElasticInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

impl Easing {
    /// Evaluates the curve at `t`, which should be between 0.0 and 1.0.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::QuadraticIn => power_in(t, 2),
            Easing::QuadraticOut => power_out(t, 2),
            Easing::QuadraticInOut => power_in_out(t, 2),
            Easing::CubicIn => power_in(t, 3),
            Easing::CubicOut => power_out(t, 3),
            Easing::CubicInOut => power_in_out(t, 3),
            Easing::QuarticIn => power_in(t, 4),
            Easing::QuarticOut => power_out(t, 4),
            Easing::QuarticInOut => power_in_out(t, 4),
            Easing::QuinticIn => power_in(t, 5),
            Easing::QuinticOut => power_out(t, 5),
            Easing::QuinticInOut => power_in_out(t, 5),
            Easing::SineIn => 1.0 - cosf(t * FRAC_PI_2),
            Easing::SineOut => sinf(t * FRAC_PI_2),
            Easing::SineInOut => (1.0 - cosf(t * PI)) / 2.0,
            Easing::ExponentialIn => exponential_in(t),
            Easing::ExponentialOut => mirror_out(t, exponential_in),
            Easing::ExponentialInOut => mirror_in_out(t, exponential_in),
            Easing::CircleIn => 1.0 - sqrtf(1.0 - t * t),
            Easing::CircleOut => sqrtf(1.0 - (t - 1.0) * (t - 1.0)),
            Easing::CircleInOut => {
                if t <= 0.5 {
                    (1.0 - sqrtf(1.0 - 4.0 * t * t)) / 2.0
                } else {
                    let u = 2.0 * t - 2.0;
                    (sqrtf(1.0 - u * u) + 1.0) / 2.0
                }
            }
            Easing::ElasticIn => elastic_in(t),
            Easing::ElasticOut => mirror_out(t, elastic_in),
            Easing::ElasticInOut => mirror_in_out(t, elastic_in),
            Easing::BackIn => back_in(t),
            Easing::BackOut => mirror_out(t, back_in),
            Easing::BackInOut => mirror_in_out(t, back_in),
            Easing::BounceIn => bounce_in(t),
            Easing::BounceOut => mirror_out(t, bounce_in),
            Easing::BounceInOut => mirror_in_out(t, bounce_in),
        }
    }
}

fn power_in(t: f32, power: i32) -> f32 {
    powf(t, power as f32)
}

fn power_out(t: f32, power: i32) -> f32 {
    1.0 - powf(1.0 - t, power as f32)
}

fn power_in_out(t: f32, power: i32) -> f32 {
    if t < 0.5 {
        powf(2.0 * t, power as f32) / 2.0
    } else {
        1.0 - powf(2.0 - 2.0 * t, power as f32) / 2.0
    }
}

fn mirror_out(t: f32, ease_in: fn(f32) -> f32) -> f32 {
    1.0 - ease_in(1.0 - t)
}

fn mirror_in_out(t: f32, ease_in: fn(f32) -> f32) -> f32 {
    if t < 0.5 {
        0.5 * ease_in(t * 2.0)
    } else {
        1.0 - 0.5 * ease_in(2.0 - t * 2.0)
    }
}

fn exponential_in(t: f32) -> f32 {
    // 2^-10 at zero otherwise.
    if t <= 0.0 {
        0.0
    } else {
        powf(2.0, 10.0 * (t - 1.0))
    }
}

fn elastic_in(t: f32) -> f32 {
    const OSCILLATIONS: f32 = 1.0;
    const SPRINGINESS: f32 = 3.0;
    let envelope = (expf(SPRINGINESS * t) - 1.0) / (expf(SPRINGINESS) - 1.0);
    envelope * sinf((FRAC_PI_2 + TAU * OSCILLATIONS) * t)
}

fn back_in(t: f32) -> f32 {
    const AMPLITUDE: f32 = 1.0;
    t * t * t - t * AMPLITUDE * sinf(t * PI)
}

fn bounce_in(t: f32) -> f32 {
    const B1: f32 = 2.75;
    const B2: f32 = B1 * B1;
    let x = 1.0 - t;
    if x < 1.0 / B1 {
        1.0 - B2 * x * x
    } else if x < 2.0 / B1 {
        let x = x - 1.5 / B1;
        1.0 - (B2 * x * x + 0.75)
    } else if x < 2.5 / B1 {
        let x = x - 2.25 / B1;
        1.0 - (B2 * x * x + 0.9375)
    } else {
        let x = x - 2.625 / B1;
        1.0 - (B2 * x * x + 0.984375)
    }
}
