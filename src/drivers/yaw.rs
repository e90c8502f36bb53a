//! Quadrature yaw decoder.
//!
//! The rotation count is advanced from the encoder edge ISRs and read
//! from the control loop, so every field is an atomic and the one
//! foreground read-modify-write (the 360° wraparound clip) runs under a
//! critical section. An interior-atomic decoder can live in a `static`
//! and be handed to both interrupt handlers and the scheduler context.

use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, Ordering};

use crate::config::COUNTS_PER_ROTATION;

const CW: i32 = 1;
const CCW: i32 = -1;

const EDGE_NONE: u8 = 0xff;
const EDGE_A: u8 = 0;
const EDGE_B: u8 = 1;

/// Which encoder channel produced an edge.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncoderChannel {
    A,
    B,
}

/// One quadrature edge: the channel that changed plus both pin levels
/// sampled at interrupt time.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureEdge {
    pub channel: EncoderChannel,
    pub a_high: bool,
    pub b_high: bool,
}

pub struct YawDecoder {
    count: AtomicI32,
    direction: AtomicI32,
    last_edge: AtomicU8,
    calibration_armed: AtomicBool,
    calibrated: AtomicBool,
}

impl YawDecoder {
    pub const fn new() -> Self {
        Self {
            count: AtomicI32::new(0),
            direction: AtomicI32::new(CW),
            last_edge: AtomicU8::new(EDGE_NONE),
            calibration_armed: AtomicBool::new(false),
            calibrated: AtomicBool::new(false),
        }
    }

    /// Quadrature edge ISR. Direction is inferred from the pin phase on
    /// the first edge after reset; afterwards a clean rotation alternates
    /// channels, so the same channel edging twice in a row means the
    /// rotation reversed, not that two counts accrued one way.
    pub fn on_quadrature_edge(&self, edge: QuadratureEdge) {
        let this_edge = match edge.channel {
            EncoderChannel::A => EDGE_A,
            EncoderChannel::B => EDGE_B,
        };
        let last = self.last_edge.load(Ordering::Relaxed);

        if last == EDGE_NONE {
            let cw = match edge.channel {
                // A leads B clockwise: on an A edge the two levels
                // disagree, on a B edge they agree.
                EncoderChannel::A => edge.a_high != edge.b_high,
                EncoderChannel::B => edge.a_high == edge.b_high,
            };
            self.direction
                .store(if cw { CW } else { CCW }, Ordering::Relaxed);
        } else if last == this_edge {
            let flipped = -self.direction.load(Ordering::Relaxed);
            self.direction.store(flipped, Ordering::Relaxed);
        }

        let direction = self.direction.load(Ordering::Relaxed);
        self.count.fetch_add(direction, Ordering::Relaxed);
        self.last_edge.store(this_edge, Ordering::Relaxed);
    }

    /// Reference-notch ISR. Zeroes the count and latches "calibrated"
    /// once per armed calibration pass; stray notch edges outside a pass
    /// are ignored.
    pub fn on_reference_edge(&self) {
        if self.calibration_armed.swap(false, Ordering::Relaxed) {
            self.count.store(0, Ordering::Relaxed);
            self.calibrated.store(true, Ordering::Relaxed);
        }
    }

    /// Arm a one-shot calibration pass against the reference notch.
    pub fn start_calibration(&self) {
        self.calibrated.store(false, Ordering::Relaxed);
        self.calibration_armed.store(true, Ordering::Relaxed);
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated.load(Ordering::Relaxed)
    }

    pub fn count(&self) -> i32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Raw count scaled to degrees.
    pub fn degrees(&self, precision: i32) -> i32 {
        self.count() * (precision * 360) / COUNTS_PER_ROTATION
    }

    /// Reduce the stored count to the shortest signed path to zero, an
    /// angle in (-180°, +180°]. Runs as one read-modify-write with the
    /// edge ISRs masked: splitting the read and write would let an
    /// intervening increment be overwritten and lost.
    pub fn clip_to_360(&self) {
        critical_section::with(|_| {
            let mut count = self.count.load(Ordering::Relaxed) % COUNTS_PER_ROTATION;
            if count > COUNTS_PER_ROTATION / 2 {
                count -= COUNTS_PER_ROTATION;
            } else if count <= -(COUNTS_PER_ROTATION / 2) {
                count += COUNTS_PER_ROTATION;
            }
            self.count.store(count, Ordering::Relaxed);
        });
    }
}

impl Default for YawDecoder {
    fn default() -> Self {
        Self::new()
    }
}
