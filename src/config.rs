//! Tuning constants for the rig.
//!
//! Everything here is calibrated against one specific tethered two-rotor
//! rig; none of it is meant to generalise. All scaled quantities use
//! [`PRECISION`] to keep sub-unit resolution under integer arithmetic.

use crate::control::pid::Gains;

/// Fixed-point scale for internal control math (×1000 = three decimals).
pub const PRECISION: i32 = 1000;

/// Milliseconds per second, for deltaTime conversions.
pub const MS_TO_SEC: i32 = 1000;

// ── Actuator limits ───────────────────────────────────────────────────────────

/// Lowest duty the PWM collaborator ever sees, in percent.
pub const MIN_DUTY: i32 = 5;
/// Highest duty the PWM collaborator ever sees, in percent.
pub const MAX_DUTY: i32 = 95;

// ── Scheduler rates ───────────────────────────────────────────────────────────

/// Base tick rate of the cooperative scheduler.
pub const BASE_FREQ_HZ: u32 = 100;
/// Control task rate. Runs on every base tick.
pub const CONTROL_TASK_HZ: u32 = 100;
/// Telemetry task rate; one line per invocation.
pub const TELEMETRY_TASK_HZ: u32 = 8;

// ── PID gains (scaled by PRECISION) ───────────────────────────────────────────

/// Height (main rotor) channel gains.
pub const MAIN_GAINS: Gains = Gains {
    kp: 1500,
    kd: 400,
    ki: 500,
};

/// Yaw (tail rotor) channel gains.
pub const TAIL_GAINS: Gains = Gains {
    kp: 1500,
    kd: 400,
    ki: 500,
};

/// Two-sided bound on each channel's integral accumulator, in scaled duty
/// units (20% of duty range).
pub const INTEGRAL_LIMIT: i32 = 20 * PRECISION;

// ── Main/tail mixing ──────────────────────────────────────────────────────────

/// Static main-rotor duty needed to overcome the mechanical zero bias, in
/// whole percent.
pub const MAIN_OFFSET: i32 = 40;

/// Gravity compensation: extra scaled duty per scaled percent of height.
/// Lift requirement grows with altitude on this rig's geometry.
pub const GRAV_COMP: i32 = 190;

/// Torque reaction coupling: tail duty contribution per unit of main duty,
/// scaled by PRECISION.
pub const MAIN_TORQUE_CONST: i32 = 800;

// ── Flying-mode step inputs ───────────────────────────────────────────────────

/// Height target step per Up/Down press, percent.
pub const HEIGHT_STEP: i32 = 10;
/// Yaw target step per Left/Right press, degrees.
pub const YAW_STEP: i32 = 15;
/// Height target bounds while flying, percent.
pub const HEIGHT_TARGET_MAX: i32 = 100;

// ── Landing / descent ramp ────────────────────────────────────────────────────

/// Descent rate of the height target, percent per second.
pub const LANDING_RATE_PCT_PER_SEC: i32 = 25;
/// Yaw must stay within this band of a full-rotation multiple, degrees.
pub const YAW_STABILITY_ERROR_DEG: i32 = 2;
/// Sustained in-tolerance time required to call the rig stable.
pub const STABILITY_TIME_MS: u32 = 500;
/// Hard cap on the descent wait; forces completion if never stable.
pub const LANDING_TIMEOUT_MS: u32 = 7500;

/// Main duty decrement per tick during power-down, scaled. 250 at a 10 ms
/// tick gives the same 25%/s profile as the descent ramp.
pub const POWER_DOWN_STEP: i32 = 250;

// ── Height sensor ─────────────────────────────────────────────────────────────

/// Depth of the height sample ring / convolution window.
pub const CONV_SIZE: usize = 20;
/// Per-tap weight of the uniform window.
pub const CONV_UNIFORM_WEIGHT: i32 = 100;
/// ADC counts spanning the rig's full height range (~1 V of a 3.3 V,
/// 12-bit conversion).
pub const SENSOR_RANGE: i32 = 1241;

// ── Yaw encoder ───────────────────────────────────────────────────────────────

/// Encoder slots per rotation × 4 edges per slot in quadrature.
pub const COUNTS_PER_ROTATION: i32 = 112 * 4;
