//! Telemetry task.
//!
//! Emits exactly one formatted line per invocation, rotating through the
//! state of interest, so a slow transport never stalls the control loop.
//! Strictly read-only: nothing here feeds back into the core.

use core::fmt::Write;

use crate::config::PRECISION;
use crate::control::Controller;
use crate::io::{RotorOutput, TelemetrySink, UserInput};
use crate::state::SharedState;
use crate::tasks::HeliApp;

const LINE_CAPACITY: usize = 64;

pub struct TelemetryReporter<T: TelemetrySink> {
    sink: T,
    tick: u32,
}

impl<T: TelemetrySink> TelemetryReporter<T> {
    pub fn new(sink: T) -> Self {
        Self { sink, tick: 0 }
    }

    pub fn sink(&self) -> &T {
        &self.sink
    }

    /// Format and ship the next line in the rotation.
    pub fn report(&mut self, state: &SharedState, controller: &Controller) {
        let mut line = heapless::String::<LINE_CAPACITY>::new();

        let _ = match self.tick % 4 {
            0 => write!(line, "mode {}", state.mode.name()),
            1 => write!(
                line,
                "height {}% -> {}%",
                controller.measured_height() / PRECISION,
                state.target_height
            ),
            2 => write!(
                line,
                "yaw {} -> {}",
                controller.measured_yaw() / PRECISION,
                state.target_yaw
            ),
            _ => write!(
                line,
                "main {}% tail {}%",
                state.main_duty, state.tail_duty
            ),
        };
        self.tick = self.tick.wrapping_add(1);

        self.sink.write_line(&line);
    }
}

pub fn telemetry_task<O, B, T>(app: &mut HeliApp<O, B, T>, _dt_ms: u32)
where
    O: RotorOutput,
    B: UserInput,
    T: TelemetrySink,
{
    app.telemetry.report(&app.state, &app.controller);
}
