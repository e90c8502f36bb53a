//! Control engine: per-channel PID loops and the main/tail duty mixer.

pub mod descent;
pub mod flight;
pub mod pid;

use crate::config::{
    GRAV_COMP, INTEGRAL_LIMIT, MAIN_GAINS, MAIN_OFFSET, MAIN_TORQUE_CONST, MAX_DUTY, MIN_DUTY,
    MS_TO_SEC, POWER_DOWN_STEP, PRECISION, TAIL_GAINS,
};
use crate::io::{Rotor, RotorOutput};
use crate::state::SharedState;
use pid::Pid;

/// One independently enable/disable-able control loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Height,
    Yaw,
    Descent,
    PowerDown,
}

/// Enable flag plus the channel's accumulated output in scaled duty
/// units.
#[derive(Default)]
struct ControlChannel {
    enabled: bool,
    output: i32,
}

/// Owns every channel and all measurement bookkeeping; replaces the
/// channel-indexed global arrays of older controller designs with one
/// value per enum variant and exhaustive `match` dispatch.
pub struct Controller {
    height: ControlChannel,
    yaw: ControlChannel,
    descent: ControlChannel,
    power_down: ControlChannel,

    height_pid: Pid,
    yaw_pid: Pid,

    // Measurements, scaled by PRECISION.
    measured_height: i32,
    previous_height: i32,
    vertical_velocity: i32,
    measured_yaw: i32,
    previous_yaw: i32,
    angular_velocity: i32,

    // Mixed outputs, scaled by PRECISION.
    main_duty: i32,
    tail_duty: i32,
}

impl Controller {
    pub const fn new() -> Self {
        Self {
            height: ControlChannel {
                enabled: false,
                output: 0,
            },
            yaw: ControlChannel {
                enabled: false,
                output: 0,
            },
            descent: ControlChannel {
                enabled: false,
                output: 0,
            },
            power_down: ControlChannel {
                enabled: false,
                output: 0,
            },
            height_pid: Pid::new(MAIN_GAINS, INTEGRAL_LIMIT),
            yaw_pid: Pid::new(TAIL_GAINS, INTEGRAL_LIMIT),
            measured_height: 0,
            previous_height: 0,
            vertical_velocity: 0,
            measured_yaw: 0,
            previous_yaw: 0,
            angular_velocity: 0,
            main_duty: 0,
            tail_duty: 0,
        }
    }

    fn channel_mut(&mut self, channel: Channel) -> &mut ControlChannel {
        match channel {
            Channel::Height => &mut self.height,
            Channel::Yaw => &mut self.yaw,
            Channel::Descent => &mut self.descent,
            Channel::PowerDown => &mut self.power_down,
        }
    }

    /// Enable a channel, resetting it to its initial condition. The
    /// power-down channel starts its ramp from the main duty current at
    /// enable time.
    pub fn enable(&mut self, channel: Channel) {
        let start = match channel {
            Channel::PowerDown => self.main_duty,
            _ => 0,
        };
        let chan = self.channel_mut(channel);
        chan.enabled = true;
        chan.output = start;
    }

    /// Disable a channel and zero its output.
    pub fn disable(&mut self, channel: Channel) {
        let chan = self.channel_mut(channel);
        chan.enabled = false;
        chan.output = 0;
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Height => self.height.enabled,
            Channel::Yaw => self.yaw.enabled,
            Channel::Descent => self.descent.enabled,
            Channel::PowerDown => self.power_down.enabled,
        }
    }

    /// Clear PID state before arming for a new flight.
    pub fn reset_pids(&mut self) {
        self.height_pid.reset();
        self.yaw_pid.reset();
    }

    /// One control tick. `height` and `yaw` are the filtered
    /// measurements scaled by PRECISION; duty cycles are mixed, clamped
    /// and delivered to the rotors whose owning channel is enabled.
    pub fn update<O: RotorOutput>(
        &mut self,
        state: &mut SharedState,
        height: i32,
        yaw: i32,
        dt_ms: u32,
        rotors: &mut O,
    ) {
        let dt = dt_ms as i32;

        self.measured_height = height;
        self.vertical_velocity = (height - self.previous_height) * MS_TO_SEC / dt;
        self.previous_height = height;

        self.measured_yaw = yaw;
        self.angular_velocity = (yaw - self.previous_yaw) * MS_TO_SEC / dt;
        self.previous_yaw = yaw;

        if self.height.enabled {
            self.height.output = self.height_pid.update(
                state.target_height * PRECISION,
                height,
                self.vertical_velocity,
                dt_ms,
            );
        }
        if self.yaw.enabled {
            self.yaw.output = self.yaw_pid.update(
                state.target_yaw * PRECISION,
                yaw,
                self.angular_velocity,
                dt_ms,
            );
        }

        // Main rotor: either the power-down ramp owns it, or the height
        // channel plus the static offset and gravity compensation.
        let main_enabled = self.power_down.enabled || self.height.enabled;
        if self.power_down.enabled {
            self.power_down.output =
                (self.power_down.output - POWER_DOWN_STEP).max(MIN_DUTY * PRECISION);
            self.main_duty = self.power_down.output;
        } else if self.height.enabled {
            self.main_duty =
                MAIN_OFFSET * PRECISION + height * GRAV_COMP / PRECISION + self.height.output;
        } else {
            self.main_duty = 0;
        }
        if main_enabled {
            self.main_duty = clamp_duty(self.main_duty);
        }

        // Tail rotor: torque reaction coupling from the main duty mixed
        // this tick, plus the yaw channel.
        if self.yaw.enabled {
            self.tail_duty =
                clamp_duty(MAIN_TORQUE_CONST * self.main_duty / PRECISION + self.yaw.output);
        } else {
            self.tail_duty = 0;
        }

        if main_enabled {
            rotors.set_duty(Rotor::Main, (self.main_duty / PRECISION) as u32);
        }
        if self.yaw.enabled {
            rotors.set_duty(Rotor::Tail, (self.tail_duty / PRECISION) as u32);
        }

        state.main_duty = if main_enabled {
            self.main_duty / PRECISION
        } else {
            0
        };
        state.tail_duty = if self.yaw.enabled {
            self.tail_duty / PRECISION
        } else {
            0
        };
    }

    /// The power-down ramp has brought the main rotor to its floor.
    pub fn power_down_complete(&self) -> bool {
        self.power_down.enabled && self.main_duty <= MIN_DUTY * PRECISION
    }

    /// Duty currently carried by a channel, in whole percent. `None` is
    /// the sentinel for channels that own no rotor.
    pub fn duty(&self, channel: Channel) -> Option<i32> {
        match channel {
            Channel::Height => Some(if self.height.enabled {
                self.main_duty / PRECISION
            } else {
                0
            }),
            Channel::Yaw => Some(if self.yaw.enabled {
                self.tail_duty / PRECISION
            } else {
                0
            }),
            Channel::Descent | Channel::PowerDown => None,
        }
    }

    /// Last filtered height measurement, scaled by PRECISION.
    pub fn measured_height(&self) -> i32 {
        self.measured_height
    }

    /// Last yaw measurement, scaled by PRECISION.
    pub fn measured_yaw(&self) -> i32 {
        self.measured_yaw
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_duty(duty: i32) -> i32 {
    duty.clamp(MIN_DUTY * PRECISION, MAX_DUTY * PRECISION)
}
