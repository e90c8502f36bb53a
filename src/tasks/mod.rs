//! Scheduler-driven tasks and the application context they share.

pub mod control;
pub mod telemetry;

use crate::config::{BASE_FREQ_HZ, CONTROL_TASK_HZ, TELEMETRY_TASK_HZ};
use crate::control::flight::FlightControl;
use crate::control::Controller;
use crate::drivers::height::HeightFilter;
use crate::drivers::yaw::YawDecoder;
use crate::io::{RotorOutput, TelemetrySink, UserInput};
use crate::scheduler::{Scheduler, Task};
use crate::state::SharedState;
use telemetry::TelemetryReporter;

/// Room for every registered task.
pub const TASK_CAPACITY: usize = 4;

/// Everything the scheduled tasks touch. The yaw decoder is shared with
/// the encoder ISRs and therefore lives in a `static` owned by the
/// firmware glue; the rest is exclusively ours.
pub struct HeliApp<O, B, T>
where
    O: RotorOutput,
    B: UserInput,
    T: TelemetrySink,
{
    pub state: SharedState,
    pub controller: Controller,
    pub flight: FlightControl,
    pub filter: HeightFilter,
    pub decoder: &'static YawDecoder,
    pub rotors: O,
    pub buttons: B,
    pub telemetry: TelemetryReporter<T>,
}

impl<O, B, T> HeliApp<O, B, T>
where
    O: RotorOutput,
    B: UserInput,
    T: TelemetrySink,
{
    pub fn new(decoder: &'static YawDecoder, rotors: O, buttons: B, sink: T) -> Self {
        Self {
            state: SharedState::new(),
            controller: Controller::new(),
            flight: FlightControl::new(),
            filter: HeightFilter::new(),
            decoder,
            rotors,
            buttons,
            telemetry: TelemetryReporter::new(sink),
        }
    }
}

/// Build the scheduler with the full task set. Registration order is
/// execution order within a tick: control before telemetry, so a
/// telemetry line always describes a finished tick.
pub fn scheduler<O, B, T>() -> Scheduler<HeliApp<O, B, T>, TASK_CAPACITY>
where
    O: RotorOutput,
    B: UserInput,
    T: TelemetrySink,
{
    let mut sched = Scheduler::new(BASE_FREQ_HZ);
    sched
        .add(Task::new(control::control_task, CONTROL_TASK_HZ))
        .ok()
        .expect("task list full");
    sched
        .add(Task::new(telemetry::telemetry_task, TELEMETRY_TASK_HZ))
        .ok()
        .expect("task list full");
    sched
}
