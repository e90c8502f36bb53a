//! Height measurement filter.
//!
//! The sensor ISR pushes raw ADC samples into a fixed-depth ring; the
//! control loop reads a smoothed value out as a full-window convolution.
//! Reading never dequeues, so the window is always the latest N samples.

use crate::config::{CONV_SIZE, CONV_UNIFORM_WEIGHT, SENSOR_RANGE};

/// Fixed-capacity ring of raw samples. The write position advances on
/// each push and the oldest slot is overwritten.
pub struct SampleRing<const N: usize> {
    samples: [u16; N],
    write: usize,
}

impl<const N: usize> SampleRing<N> {
    pub const fn new() -> Self {
        Self {
            samples: [0; N],
            write: 0,
        }
    }

    pub fn push(&mut self, raw: u16) {
        self.samples[self.write] = raw;
        self.write = (self.write + 1) % N;
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.samples.iter().copied()
    }
}

impl<const N: usize> Default for SampleRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Smooths the raw height stream and scales it against a calibrated
/// zero-height baseline.
pub struct HeightFilter {
    ring: SampleRing<CONV_SIZE>,
    weights: [i32; CONV_SIZE],
    weight_total: i32,
    baseline: i32,
}

impl HeightFilter {
    /// Uniform moving-average window.
    pub const fn new() -> Self {
        Self::with_weights([CONV_UNIFORM_WEIGHT; CONV_SIZE])
    }

    /// Substitute another window shape. The weight table is the only
    /// thing that changes between shapes.
    pub const fn with_weights(weights: [i32; CONV_SIZE]) -> Self {
        let mut total = 0;
        let mut i = 0;
        while i < CONV_SIZE {
            total += weights[i];
            i += 1;
        }
        Self {
            ring: SampleRing::new(),
            weights,
            weight_total: total,
            baseline: 0,
        }
    }

    /// ISR entry point: store one conversion result. O(1).
    pub fn push_sample(&mut self, raw: u16) {
        self.ring.push(raw);
    }

    /// Convolve the window: weighted sum over total weight, in raw ADC
    /// units.
    pub fn filtered(&self) -> i32 {
        let mut sum: i32 = 0;
        for (sample, weight) in self.ring.iter().zip(self.weights.iter()) {
            sum += sample as i32 * weight;
        }
        sum / self.weight_total
    }

    /// Record the current smoothed reading as the zero-height baseline.
    /// Called every tick while the rig rests on the ground.
    pub fn calibrate(&mut self) {
        self.baseline = self.filtered();
    }

    /// Height as a percentage of the rig's travel, scaled by `precision`.
    /// The sense is inverted: the sensor voltage falls as the rig rises.
    pub fn percent(&self, precision: i32) -> i32 {
        precision * 100 * (self.baseline - self.filtered()) / SENSOR_RANGE
    }
}

impl Default for HeightFilter {
    fn default() -> Self {
        Self::new()
    }
}
