//! Pressure fields on a receiver grid.
//!
//! A [`Field`] holds one complex value per `(bearing, depth, range)`
//! receiver for one source. Beams deposit into it through
//! [`BeamInfluence`]; after every beam is in, [`Field::finalize`] applies
//! the spreading scale and, for incoherent runs, converts summed intensity
//! back to a magnitude.
//!
//! Field runs trace rays in fixed-size chunks in launch order. Each chunk
//! fills its own partial field and the partials are summed in chunk order,
//! so the result does not depend on how many threads did the work.

pub mod influence;

pub use influence::{BeamInfluence, BeamSettings};

use crate::error::ConfigError;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Rays per partial field.
pub const FIELD_CHUNK: usize = 64;

/// Bearings closer than this many degrees name the same receiver slice.
const BEARING_MATCH_DEG: f64 = 1.0e-9;

/// Beam shape used when depositing into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BeamType {
    /// Triangular weight falling to zero at the beam radius.
    #[default]
    GeometricHat,
    /// Gaussian weight with a frequency-dependent minimum width.
    GeometricGaussian,
}

/// How arrivals combine at a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldMode {
    /// Sum complex pressure.
    Coherent,
    /// Sum intensity, ignoring phase.
    Incoherent,
}

/// Receiver positions relative to each source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverGrid {
    /// Horizontal ranges in meters.
    pub ranges: Vec<f64>,
    /// Depths in meters.
    pub depths: Vec<f64>,
    /// Bearings in degrees; ignored by range/depth runs.
    #[serde(default = "default_bearings")]
    pub bearings: Vec<f64>,
}

fn default_bearings() -> Vec<f64> {
    vec![0.0]
}

impl Default for ReceiverGrid {
    fn default() -> Self {
        Self {
            ranges: vec![1000.0],
            depths: vec![50.0],
            bearings: default_bearings(),
        }
    }
}

impl ReceiverGrid {
    /// Check that every list is non-empty and finite and ranges are not negative.
    ///
    /// # Errors
    ///
    /// Returns the first offending list or value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (what, values) in [
            ("receiver ranges", &self.ranges),
            ("receiver depths", &self.depths),
            ("receiver bearings", &self.bearings),
        ] {
            if values.is_empty() {
                return Err(ConfigError::Empty { what });
            }
            for v in values {
                ConfigError::check_finite(what, *v)?;
            }
        }
        if let Some(r) = self.ranges.iter().find(|r| **r < 0.0) {
            return Err(ConfigError::invalid("receiver ranges", format!("negative range {r}")));
        }
        Ok(())
    }

    /// Farthest receiver range.
    pub fn max_range(&self) -> f64 {
        self.ranges.iter().copied().fold(0.0, f64::max)
    }

    /// Slot of the bearing matching `bearing` degrees.
    pub fn bearing_slot(&self, bearing: f64) -> Option<usize> {
        self.bearings
            .iter()
            .position(|b| (b - bearing).abs() <= BEARING_MATCH_DEG)
    }

    /// Same ranges and depths with a single zero bearing.
    #[must_use]
    pub fn planar(&self) -> Self {
        Self {
            ranges: self.ranges.clone(),
            depths: self.depths.clone(),
            bearings: default_bearings(),
        }
    }
}

/// Complex pressure for one source over a receiver grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    source_index: usize,
    mode: FieldMode,
    grid: ReceiverGrid,
    values: Vec<Complex64>,
    finalized: bool,
}

impl Field {
    /// Zero field over `grid`.
    pub fn new(source_index: usize, grid: ReceiverGrid, mode: FieldMode) -> Self {
        let len = grid.bearings.len() * grid.depths.len() * grid.ranges.len();
        Self {
            source_index,
            mode,
            grid,
            values: vec![Complex64::new(0.0, 0.0); len],
            finalized: false,
        }
    }

    /// Zero field with the same grid and mode.
    #[must_use]
    pub fn zeros_like(&self) -> Self {
        Self::new(self.source_index, self.grid.clone(), self.mode)
    }

    /// Clear every value so the field can be filled again.
    pub fn reset(&mut self) {
        self.values.fill(Complex64::new(0.0, 0.0));
        self.finalized = false;
    }

    /// Index of the source this field belongs to.
    pub fn source_index(&self) -> usize {
        self.source_index
    }

    /// Coherent or incoherent.
    pub fn mode(&self) -> FieldMode {
        self.mode
    }

    /// Receiver grid.
    pub fn grid(&self) -> &ReceiverGrid {
        &self.grid
    }

    /// `(bearings, depths, ranges)`.
    pub fn dims(&self) -> (usize, usize, usize) {
        (
            self.grid.bearings.len(),
            self.grid.depths.len(),
            self.grid.ranges.len(),
        )
    }

    /// All values, bearing-major then depth then range.
    pub fn values(&self) -> &[Complex64] {
        &self.values
    }

    /// Whether [`Field::finalize`] has run.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    #[inline]
    fn index(&self, bearing: usize, depth: usize, range: usize) -> usize {
        (bearing * self.grid.depths.len() + depth) * self.grid.ranges.len() + range
    }

    /// Pressure at one receiver.
    pub fn pressure(&self, bearing: usize, depth: usize, range: usize) -> Option<Complex64> {
        let (nb, nd, nr) = self.dims();
        if bearing >= nb || depth >= nd || range >= nr {
            return None;
        }
        Some(self.values[self.index(bearing, depth, range)])
    }

    /// Transmission loss `-20 log10 |p|` in dB at one receiver.
    pub fn transmission_loss(&self, bearing: usize, depth: usize, range: usize) -> Option<f64> {
        self.pressure(bearing, depth, range)
            .map(|p| -20.0 * p.norm().log10())
    }

    /// Slot of the receiver bearing matching `bearing` degrees.
    pub fn bearing_slot(&self, bearing: f64) -> Option<usize> {
        self.grid.bearing_slot(bearing)
    }

    /// Add one arrival of real `amplitude`, complex `delay` and `phase`.
    pub(crate) fn deposit(
        &mut self,
        slot: (usize, usize, usize),
        amplitude: f64,
        delay: Complex64,
        phase: f64,
        omega: f64,
    ) {
        let i = self.index(slot.0, slot.1, slot.2);
        let arrival = amplitude * (-Complex64::i() * (delay * omega - phase)).exp();
        match self.mode {
            FieldMode::Coherent => self.values[i] += arrival,
            FieldMode::Incoherent => self.values[i] += arrival.norm_sqr(),
        }
    }

    /// Add a partial field over the same grid.
    pub fn add(&mut self, other: &Field) {
        debug_assert_eq!(self.values.len(), other.values.len());
        for (a, b) in self.values.iter_mut().zip(&other.values) {
            *a += *b;
        }
    }

    /// Apply the spreading scale of ray space `S`. Runs once; later calls
    /// do nothing.
    pub fn finalize<S: BeamInfluence>(&mut self) {
        if self.finalized {
            return;
        }
        let nr = self.grid.ranges.len();
        for (i, value) in self.values.iter_mut().enumerate() {
            if self.mode == FieldMode::Incoherent {
                *value = Complex64::new(value.re.max(0.0).sqrt(), 0.0);
            }
            *value *= S::range_scale(self.grid.ranges[i % nr]);
        }
        self.finalized = true;
    }
}
