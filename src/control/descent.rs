//! Landing ramp controller.
//!
//! While the rig descends, the yaw target walks to the nearest full
//! rotation first, then the height target ramps to zero at a fixed rate.
//! Stability must hold for a sustained interval before the descent is
//! called done; a hard timeout forces completion so the rig can never
//! hover indefinitely near the target.

use crate::config::{
    LANDING_RATE_PCT_PER_SEC, LANDING_TIMEOUT_MS, MS_TO_SEC, PRECISION, STABILITY_TIME_MS,
    YAW_STABILITY_ERROR_DEG,
};
use crate::state::SharedState;

/// True when `yaw_deg` (scaled) sits within the tolerance band of any
/// whole multiple of 360°.
pub fn yaw_in_tolerance(yaw_deg: i32) -> bool {
    let offset = yaw_deg.abs() % (360 * PRECISION);
    offset <= YAW_STABILITY_ERROR_DEG * PRECISION
        || offset >= (360 - YAW_STABILITY_ERROR_DEG) * PRECISION
}

pub struct LandingController {
    descent_ticks: u32,
    stability_ticks: u32,
    timeout_ticks: u32,
}

impl LandingController {
    pub const fn new() -> Self {
        Self {
            descent_ticks: 0,
            stability_ticks: 0,
            timeout_ticks: 0,
        }
    }

    /// Clear all counters. Called when a new descent begins.
    pub fn reset(&mut self) {
        self.descent_ticks = 0;
        self.stability_ticks = 0;
        self.timeout_ticks = 0;
    }

    /// One descent tick. `yaw_deg` and `height_pct` are the scaled
    /// measurements. Returns true once the rig has been stable for the
    /// configured interval, or the timeout has expired.
    pub fn update(
        &mut self,
        state: &mut SharedState,
        dt_ms: u32,
        yaw_deg: i32,
        height_pct: i32,
    ) -> bool {
        self.ramp_yaw(state, yaw_deg);

        // Height only starts down once the heading has come good;
        // descending while the tail still hunts loses the reference.
        if yaw_in_tolerance(yaw_deg)
            && state.target_height != 0
            && self.descent_ticks >= ticks_between_height_steps(dt_ms)
        {
            state.target_height -= 1;
            self.descent_ticks = 0;
        }
        self.descent_ticks += 1;

        self.check_stability(state, dt_ms, yaw_deg, height_pct)
    }

    /// Walk the yaw target one degree toward the nearest multiple of
    /// 360°, choosing the shorter direction by comparing the normalized
    /// offset against half a rotation. A target already on a multiple
    /// (including 720°) is left alone rather than unwound.
    fn ramp_yaw(&self, state: &mut SharedState, yaw_deg: i32) {
        if state.target_yaw % 360 == 0 {
            return;
        }
        let offset = yaw_deg.abs() % (360 * PRECISION);
        let toward_zero = offset <= 180 * PRECISION;
        if yaw_deg > 0 {
            state.target_yaw += if toward_zero { -1 } else { 1 };
        } else if yaw_deg < 0 {
            state.target_yaw += if toward_zero { 1 } else { -1 };
        }
    }

    fn check_stability(
        &mut self,
        state: &SharedState,
        dt_ms: u32,
        yaw_deg: i32,
        height_pct: i32,
    ) -> bool {
        // Down to the last percent with the target fully ramped.
        if height_pct <= PRECISION && state.target_height == 0 {
            if yaw_in_tolerance(yaw_deg) {
                self.stability_ticks += 1;
            } else {
                self.stability_ticks = 0;
            }

            self.timeout_ticks += 1;
            if self.timeout_ticks >= LANDING_TIMEOUT_MS / dt_ms {
                #[cfg(feature = "defmt")]
                defmt::warn!("descent stability wait timed out, forcing completion");
                return true;
            }
        } else {
            self.stability_ticks = 0;
        }

        self.stability_ticks >= STABILITY_TIME_MS / dt_ms
    }
}

impl Default for LandingController {
    fn default() -> Self {
        Self::new()
    }
}

fn ticks_between_height_steps(dt_ms: u32) -> u32 {
    MS_TO_SEC as u32 / (LANDING_RATE_PCT_PER_SEC as u32 * dt_ms)
}
