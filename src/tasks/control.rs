//! The main control task.

use crate::config::PRECISION;
use crate::io::{RotorOutput, TelemetrySink, UserInput};
use crate::tasks::HeliApp;

/// One control tick: sense, then the state machine, then the PID
/// channels — in that order, so the mode logic and the controller both
/// see the same freshly sampled values.
pub fn control_task<O, B, T>(app: &mut HeliApp<O, B, T>, dt_ms: u32)
where
    O: RotorOutput,
    B: UserInput,
    T: TelemetrySink,
{
    let height_pct = app.filter.percent(PRECISION);
    let yaw_deg = app.decoder.degrees(PRECISION);

    app.flight.update(
        &mut app.state,
        &mut app.controller,
        &mut app.filter,
        app.decoder,
        &mut app.buttons,
        &mut app.rotors,
        height_pct,
        yaw_deg,
        dt_ms,
    );

    app.controller
        .update(&mut app.state, height_pct, yaw_deg, dt_ms, &mut app.rotors);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONV_SIZE;
    use crate::drivers::yaw::YawDecoder;
    use crate::io::{Button, ButtonEvent, Rotor};
    use crate::state::FlightMode;
    use crate::tasks::scheduler;

    #[derive(Default)]
    struct NullRotors;

    impl RotorOutput for NullRotors {
        fn set_duty(&mut self, _rotor: Rotor, _percent: u32) {}
        fn set_enabled(&mut self, _rotor: Rotor, _on: bool) {}
    }

    struct OneShotSwitch {
        queued: Option<ButtonEvent>,
    }

    impl UserInput for OneShotSwitch {
        fn check(&mut self, button: Button) -> ButtonEvent {
            if button == Button::Switch {
                self.queued.take().unwrap_or(ButtonEvent::NoChange)
            } else {
                ButtonEvent::NoChange
            }
        }

        fn ignore(&mut self, _button: Button) {
            self.queued = None;
        }
    }

    struct LineCount(usize);

    impl TelemetrySink for LineCount {
        fn write_line(&mut self, _line: &str) {
            self.0 += 1;
        }
    }

    fn app() -> HeliApp<NullRotors, OneShotSwitch, LineCount> {
        let decoder: &'static YawDecoder = Box::leak(Box::new(YawDecoder::new()));
        HeliApp::new(decoder, NullRotors, OneShotSwitch { queued: None }, LineCount(0))
    }

    #[test]
    fn landed_ticks_keep_recalibrating_the_baseline() {
        let mut app = app();
        for _ in 0..CONV_SIZE {
            app.filter.push_sample(2000);
        }
        control_task(&mut app, 10);

        // Baseline now 2000: a step change reads as a height.
        for _ in 0..CONV_SIZE {
            app.filter.push_sample(1800);
        }
        assert!(app.filter.percent(PRECISION) > 0);

        // But while still landed the next tick re-zeroes it.
        control_task(&mut app, 10);
        assert_eq!(app.filter.percent(PRECISION), 0);
    }

    #[test]
    fn scheduler_paces_telemetry_below_the_control_rate() {
        let mut sched = scheduler::<NullRotors, OneShotSwitch, LineCount>();
        let mut app = app();

        for _ in 0..100 {
            sched.tick(&mut app);
        }
        let lines = app.telemetry.sink().0;
        assert!(lines > 0);
        assert!(lines < 100 / 4);
    }

    #[test]
    fn start_toggle_takes_off_through_the_scheduler() {
        let mut sched = scheduler::<NullRotors, OneShotSwitch, LineCount>();
        let mut app = app();
        for _ in 0..CONV_SIZE {
            app.filter.push_sample(2000);
        }

        sched.tick(&mut app);
        assert_eq!(app.state.mode, FlightMode::Landed);

        app.buttons.queued = Some(ButtonEvent::Pushed);
        sched.tick(&mut app);
        assert_eq!(app.state.mode, FlightMode::CalibrateYaw);

        app.decoder.on_reference_edge();
        sched.tick(&mut app);
        assert_eq!(app.state.mode, FlightMode::Flying);
    }
}
