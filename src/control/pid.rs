//! Per-channel PID update.
//!
//! All terms are in the scaled duty domain (×[`PRECISION`]); callers
//! convert to whole percent only at the actuator boundary.

use crate::config::{MS_TO_SEC, PRECISION};

/// Fixed gains, scaled by PRECISION.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gains {
    pub kp: i32,
    pub kd: i32,
    pub ki: i32,
}

pub struct Pid {
    gains: Gains,
    integral: i32,
    integral_limit: i32,
}

impl Pid {
    pub const fn new(gains: Gains, integral_limit: i32) -> Self {
        Self {
            gains,
            integral: 0,
            integral_limit,
        }
    }

    /// Clear accumulated state before arming for a new flight.
    pub fn reset(&mut self) {
        self.integral = 0;
    }

    /// `target` and `measured` are scaled values; `velocity` is the
    /// caller's finite difference of `measured` (scaled units per
    /// second). Differentiating the measurement rather than the error
    /// assumes the target is piecewise stationary between updates.
    pub fn update(&mut self, target: i32, measured: i32, velocity: i32, dt_ms: u32) -> i32 {
        let error = target - measured;

        let proportional = widen(self.gains.kp, error) / PRECISION as i64;
        let derivative = widen(self.gains.kd, -velocity) / PRECISION as i64;

        let accumulated = widen(self.gains.ki * dt_ms as i32, error)
            / (MS_TO_SEC as i64 * PRECISION as i64);
        self.integral = (self.integral + accumulated as i32)
            .clamp(-self.integral_limit, self.integral_limit);

        (proportional + derivative) as i32 + self.integral
    }

    pub fn integral(&self) -> i32 {
        self.integral
    }
}

fn widen(a: i32, b: i32) -> i64 {
    a as i64 * b as i64
}
