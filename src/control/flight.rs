//! Flight-mode state machine.
//!
//! Owns the mode transitions and the session bookkeeping around them:
//! which channels are live, when the yaw decoder hunts its reference
//! notch, and when the landing ramp runs. Runs once per control tick,
//! after sensing and before the PID channels.

use crate::config::{HEIGHT_STEP, HEIGHT_TARGET_MAX, YAW_STEP};
use crate::control::descent::LandingController;
use crate::control::{Channel, Controller};
use crate::drivers::height::HeightFilter;
use crate::drivers::yaw::YawDecoder;
use crate::io::{Button, ButtonEvent, Rotor, RotorOutput, UserInput};
use crate::state::{FlightMode, SharedState};

pub struct FlightControl {
    landing: LandingController,
    /// The reference notch only has to be found once per session; later
    /// flights go straight to flying.
    yaw_calibrated_once: bool,
}

impl FlightControl {
    pub const fn new() -> Self {
        Self {
            landing: LandingController::new(),
            yaw_calibrated_once: false,
        }
    }

    /// One state-machine tick. `height_pct` and `yaw_deg` are the same
    /// scaled measurements handed to the controller afterwards, so the
    /// whole tick sees one consistent sample.
    #[allow(clippy::too_many_arguments)]
    pub fn update<B, O>(
        &mut self,
        state: &mut SharedState,
        controller: &mut Controller,
        filter: &mut HeightFilter,
        decoder: &YawDecoder,
        buttons: &mut B,
        rotors: &mut O,
        height_pct: i32,
        yaw_deg: i32,
        dt_ms: u32,
    ) where
        B: UserInput,
        O: RotorOutput,
    {
        match state.mode {
            FlightMode::Landed => {
                // The rig truly rests at zero height here, so the
                // baseline tracks sensor drift for free.
                filter.calibrate();

                if buttons.check(Button::Switch) == ButtonEvent::Pushed {
                    buttons.ignore(Button::Switch);
                    state.target_height = 0;
                    state.target_yaw = 0;
                    controller.reset_pids();
                    controller.enable(Channel::Height);
                    controller.enable(Channel::Yaw);
                    rotors.set_enabled(Rotor::Main, true);
                    rotors.set_enabled(Rotor::Tail, true);

                    if self.yaw_calibrated_once {
                        enter(state, FlightMode::Flying);
                    } else {
                        decoder.start_calibration();
                        enter(state, FlightMode::CalibrateYaw);
                    }
                }
            }

            FlightMode::CalibrateYaw => {
                if decoder.is_calibrated() {
                    self.yaw_calibrated_once = true;
                    state.target_yaw = 0;
                    #[cfg(feature = "defmt")]
                    defmt::info!("yaw reference found");
                    enter(state, FlightMode::Flying);
                } else {
                    // Keep the tail seeking until the notch interrupt
                    // fires.
                    state.target_yaw += 1;
                }
            }

            FlightMode::Flying => {
                if buttons.check(Button::Up) == ButtonEvent::Pushed {
                    state.target_height =
                        (state.target_height + HEIGHT_STEP).min(HEIGHT_TARGET_MAX);
                }
                if buttons.check(Button::Down) == ButtonEvent::Pushed {
                    state.target_height = (state.target_height - HEIGHT_STEP).max(0);
                }
                if buttons.check(Button::Left) == ButtonEvent::Pushed {
                    state.target_yaw -= YAW_STEP;
                }
                if buttons.check(Button::Right) == ButtonEvent::Pushed {
                    state.target_yaw += YAW_STEP;
                }

                if buttons.check(Button::Switch) == ButtonEvent::Released {
                    buttons.ignore(Button::Switch);
                    self.landing.reset();
                    controller.enable(Channel::Descent);
                    enter(state, FlightMode::Descending);
                }
            }

            FlightMode::Descending => {
                if self.landing.update(state, dt_ms, yaw_deg, height_pct) {
                    controller.disable(Channel::Height);
                    controller.disable(Channel::Descent);
                    controller.enable(Channel::PowerDown);
                    enter(state, FlightMode::PowerDown);
                }
            }

            FlightMode::PowerDown => {
                if controller.power_down_complete() {
                    controller.disable(Channel::Yaw);
                    controller.disable(Channel::PowerDown);
                    state.target_height = 0;
                    state.target_yaw = 0;
                    decoder.clip_to_360();
                    rotors.set_enabled(Rotor::Main, false);
                    rotors.set_enabled(Rotor::Tail, false);
                    enter(state, FlightMode::Landed);
                }
            }
        }
    }
}

impl Default for FlightControl {
    fn default() -> Self {
        Self::new()
    }
}

fn enter(state: &mut SharedState, mode: FlightMode) {
    #[cfg(feature = "defmt")]
    defmt::info!("mode {} -> {}", state.mode, mode);
    state.mode = mode;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_DUTY;
    use crate::drivers::yaw::{EncoderChannel, QuadratureEdge};

    fn button_slot(button: Button) -> usize {
        match button {
            Button::Up => 0,
            Button::Down => 1,
            Button::Left => 2,
            Button::Right => 3,
            Button::Switch => 4,
        }
    }

    struct MockButtons {
        pending: [ButtonEvent; 5],
        ignored: std::vec::Vec<Button>,
    }

    impl MockButtons {
        fn new() -> Self {
            Self {
                pending: [ButtonEvent::NoChange; 5],
                ignored: std::vec::Vec::new(),
            }
        }

        fn queue(&mut self, button: Button, event: ButtonEvent) {
            self.pending[button_slot(button)] = event;
        }
    }

    impl UserInput for MockButtons {
        fn check(&mut self, button: Button) -> ButtonEvent {
            let event = self.pending[button_slot(button)];
            self.pending[button_slot(button)] = ButtonEvent::NoChange;
            event
        }

        fn ignore(&mut self, button: Button) {
            self.ignored.push(button);
            self.pending[button_slot(button)] = ButtonEvent::NoChange;
        }
    }

    #[derive(Default)]
    struct MockRotors {
        main_on: bool,
        tail_on: bool,
    }

    impl RotorOutput for MockRotors {
        fn set_duty(&mut self, _rotor: Rotor, _percent: u32) {}

        fn set_enabled(&mut self, rotor: Rotor, on: bool) {
            match rotor {
                Rotor::Main => self.main_on = on,
                Rotor::Tail => self.tail_on = on,
            }
        }
    }

    /// The same wiring the control task uses: state machine first, then
    /// the controller, against one consistent measurement pair.
    struct Rig {
        state: SharedState,
        controller: Controller,
        flight: FlightControl,
        filter: HeightFilter,
        decoder: YawDecoder,
        buttons: MockButtons,
        rotors: MockRotors,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                state: SharedState::new(),
                controller: Controller::new(),
                flight: FlightControl::new(),
                filter: HeightFilter::new(),
                decoder: YawDecoder::new(),
                buttons: MockButtons::new(),
                rotors: MockRotors::default(),
            }
        }

        fn tick(&mut self, height_pct: i32, yaw_deg: i32) {
            self.flight.update(
                &mut self.state,
                &mut self.controller,
                &mut self.filter,
                &self.decoder,
                &mut self.buttons,
                &mut self.rotors,
                height_pct,
                yaw_deg,
                10,
            );
            self.controller
                .update(&mut self.state, height_pct, yaw_deg, 10, &mut self.rotors);
        }

        fn start(&mut self) {
            self.buttons.queue(Button::Switch, ButtonEvent::Pushed);
            self.tick(0, 0);
        }

        /// One clockwise quadrature cycle = 4 counts.
        fn turn_clockwise_cycle(&self) {
            let edges = [
                (EncoderChannel::A, true, false),
                (EncoderChannel::B, true, true),
                (EncoderChannel::A, false, true),
                (EncoderChannel::B, false, false),
            ];
            for (channel, a_high, b_high) in edges {
                self.decoder.on_quadrature_edge(QuadratureEdge {
                    channel,
                    a_high,
                    b_high,
                });
            }
        }

        /// Run until landed again, failing the test if the descent and
        /// power-down never finish.
        fn land(&mut self) {
            self.buttons.queue(Button::Switch, ButtonEvent::Released);
            self.tick(0, 0);
            assert_eq!(self.state.mode, FlightMode::Descending);
            let mut ticks = 0;
            while self.state.mode != FlightMode::Landed {
                self.tick(0, 0);
                ticks += 1;
                assert!(ticks < 5000, "landing sequence never completed");
            }
        }
    }

    #[test]
    fn first_start_enters_yaw_calibration() {
        let mut rig = Rig::new();
        rig.start();

        assert_eq!(rig.state.mode, FlightMode::CalibrateYaw);
        assert!(rig.controller.is_enabled(Channel::Height));
        assert!(rig.controller.is_enabled(Channel::Yaw));
        assert!(rig.rotors.main_on && rig.rotors.tail_on);
        // The consumed toggle is explicitly acknowledged.
        assert_eq!(rig.buttons.ignored, [Button::Switch]);
    }

    #[test]
    fn calibration_seeks_until_the_notch_fires() {
        let mut rig = Rig::new();
        rig.start();

        for _ in 0..5 {
            rig.tick(0, 0);
        }
        assert_eq!(rig.state.target_yaw, 5);

        rig.decoder.on_reference_edge();
        rig.tick(0, 0);
        assert_eq!(rig.state.mode, FlightMode::Flying);
        assert_eq!(rig.state.target_yaw, 0);
    }

    #[test]
    fn flying_steps_clamp_height_and_leave_yaw_unbounded() {
        let mut rig = Rig::new();
        rig.start();
        rig.decoder.on_reference_edge();
        rig.tick(0, 0);

        for _ in 0..15 {
            rig.buttons.queue(Button::Up, ButtonEvent::Pushed);
            rig.tick(0, 0);
        }
        assert_eq!(rig.state.target_height, HEIGHT_TARGET_MAX);

        for _ in 0..15 {
            rig.buttons.queue(Button::Down, ButtonEvent::Pushed);
            rig.tick(0, 0);
        }
        assert_eq!(rig.state.target_height, 0);

        for _ in 0..30 {
            rig.buttons.queue(Button::Right, ButtonEvent::Pushed);
            rig.tick(0, 0);
        }
        assert_eq!(rig.state.target_yaw, 30 * YAW_STEP);

        for _ in 0..60 {
            rig.buttons.queue(Button::Left, ButtonEvent::Pushed);
            rig.tick(0, 0);
        }
        assert_eq!(rig.state.target_yaw, -30 * YAW_STEP);
    }

    #[test]
    fn full_cycle_returns_to_landed_with_everything_released() {
        let mut rig = Rig::new();
        rig.start();
        rig.decoder.on_reference_edge();
        rig.tick(0, 0);
        assert_eq!(rig.state.mode, FlightMode::Flying);

        // 75 clockwise cycles: 300 counts on the encoder.
        for _ in 0..75 {
            rig.turn_clockwise_cycle();
        }

        rig.land();

        assert_eq!(rig.state.mode, FlightMode::Landed);
        assert!(!rig.controller.is_enabled(Channel::Height));
        assert!(!rig.controller.is_enabled(Channel::Yaw));
        assert!(!rig.controller.is_enabled(Channel::Descent));
        assert!(!rig.controller.is_enabled(Channel::PowerDown));
        assert!(!rig.rotors.main_on && !rig.rotors.tail_on);
        assert_eq!(rig.state.target_height, 0);
        assert_eq!(rig.state.target_yaw, 0);
        assert_eq!(rig.state.main_duty, 0);
        assert_eq!(rig.state.tail_duty, 0);

        // 300 counts wound back to the shortest signed path.
        assert_eq!(rig.decoder.count(), 300 - crate::config::COUNTS_PER_ROTATION);
    }

    #[test]
    fn second_flight_skips_yaw_calibration() {
        let mut rig = Rig::new();
        rig.start();
        rig.decoder.on_reference_edge();
        rig.tick(0, 0);
        rig.land();

        rig.start();
        assert_eq!(rig.state.mode, FlightMode::Flying);
    }

    #[test]
    fn power_down_ramps_the_main_rotor_to_its_floor() {
        let mut rig = Rig::new();
        rig.start();
        rig.decoder.on_reference_edge();
        rig.tick(0, 0);

        rig.buttons.queue(Button::Switch, ButtonEvent::Released);
        rig.tick(0, 0);
        let mut seen_power_down = false;
        let mut ticks = 0;
        while rig.state.mode != FlightMode::Landed {
            rig.tick(0, 0);
            if rig.state.mode == FlightMode::PowerDown {
                seen_power_down = true;
                assert!(rig.state.main_duty >= MIN_DUTY);
            }
            ticks += 1;
            assert!(ticks < 5000);
        }
        assert!(seen_power_down);
    }
}
