//! Shared state passed to every scheduled task.
//!
//! One instance lives in the application context; tasks borrow it mutably
//! for the duration of a single tick and never hold it across ticks.

/// The mode of the rig. At most one is active at any instant.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlightMode {
    Landed,
    CalibrateYaw,
    Flying,
    Descending,
    PowerDown,
}

impl FlightMode {
    /// Short name for telemetry lines.
    pub fn name(self) -> &'static str {
        match self {
            FlightMode::Landed => "LANDED",
            FlightMode::CalibrateYaw => "CAL YAW",
            FlightMode::Flying => "FLYING",
            FlightMode::Descending => "DESCENDING",
            FlightMode::PowerDown => "POWER DOWN",
        }
    }
}

/// Entries which more than one task needs to know about.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SharedState {
    pub mode: FlightMode,
    /// Commanded height, whole percent of the rig's travel.
    pub target_height: i32,
    /// Commanded heading, whole degrees. Unbounded while flying; wound
    /// back to a single rotation on landing.
    pub target_yaw: i32,
    /// Last duty delivered to the main rotor, whole percent (0 = off).
    pub main_duty: i32,
    /// Last duty delivered to the tail rotor, whole percent (0 = off).
    pub tail_duty: i32,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            mode: FlightMode::Landed,
            target_height: 0,
            target_yaw: 0,
            main_duty: 0,
            tail_duty: 0,
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
