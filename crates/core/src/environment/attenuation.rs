//! Attenuation unit conversion.
//!
//! Losses in the water column and in the half-spaces are carried as a small
//! imaginary part of the sound speed. A ray integrating `1/c̃` along its
//! path then picks up a negative imaginary travel time, which decays the
//! beam through `exp(-iωτ)`.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// dB per neper, scaled to kilometers.
const DB_PER_NEPER_KM: f64 = 8685.8896;

/// dB per neper.
const DB_PER_NEPER: f64 = 8.6858896;

/// Units in which attenuation values are given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttenuationUnits {
    /// Nepers per meter.
    NepersPerMeter,
    /// dB per meter.
    DecibelsPerMeter,
    /// dB per (meter · kHz).
    DecibelsPerMeterKhz,
    /// dB per wavelength.
    #[default]
    DecibelsPerWavelength,
    /// Quality factor Q.
    QualityFactor,
    /// Loss parameter (imaginary part over real part of the wavenumber).
    LossParameter,
}

/// Frequency-dependent conversion context for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttenuationModel {
    /// Acoustic frequency in Hz.
    pub frequency: f64,
    /// Units of the tabulated attenuation values.
    pub units: AttenuationUnits,
    /// Add Thorp volume attenuation to every water-column sample.
    pub thorp: bool,
}

impl AttenuationModel {
    /// Angular frequency in rad/s.
    #[inline]
    pub fn omega(&self) -> f64 {
        2.0 * PI * self.frequency
    }

    /// Complex sound speed for a real speed `c` and an attenuation value
    /// expressed in `self.units`.
    pub fn complex_speed(&self, c: f64, attenuation: f64) -> Complex64 {
        self.with_loss(c, self.nepers_per_meter(c, attenuation))
    }

    /// Complex water-column speed, including Thorp loss when enabled.
    pub fn water_speed(&self, c: f64, attenuation: f64) -> Complex64 {
        let mut alpha = self.nepers_per_meter(c, attenuation);
        if self.thorp {
            alpha += thorp_nepers_per_meter(self.frequency);
        }
        self.with_loss(c, alpha)
    }

    fn nepers_per_meter(&self, c: f64, attenuation: f64) -> f64 {
        if attenuation == 0.0 {
            return 0.0;
        }
        let omega = self.omega();
        match self.units {
            AttenuationUnits::NepersPerMeter => attenuation,
            AttenuationUnits::DecibelsPerMeter => attenuation / DB_PER_NEPER,
            AttenuationUnits::DecibelsPerMeterKhz => attenuation * self.frequency / DB_PER_NEPER_KM,
            AttenuationUnits::DecibelsPerWavelength => {
                attenuation * self.frequency / (DB_PER_NEPER * c)
            }
            AttenuationUnits::QualityFactor => omega / (2.0 * c * attenuation),
            AttenuationUnits::LossParameter => attenuation * omega / c,
        }
    }

    fn with_loss(&self, c: f64, alpha: f64) -> Complex64 {
        let omega = self.omega();
        if alpha == 0.0 || omega == 0.0 {
            return Complex64::new(c, 0.0);
        }
        Complex64::new(c, alpha * c * c / omega)
    }
}

/// Thorp volume attenuation in nepers per meter for a frequency in Hz.
pub fn thorp_nepers_per_meter(frequency: f64) -> f64 {
    let f2 = (frequency / 1000.0).powi(2);
    let db_per_km = 3.3e-3 + 0.11 * f2 / (1.0 + f2) + 44.0 * f2 / (4100.0 + f2) + 3.0e-4 * f2;
    db_per_km / DB_PER_NEPER_KM
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model(units: AttenuationUnits) -> AttenuationModel {
        AttenuationModel {
            frequency: 1000.0,
            units,
            thorp: false,
        }
    }

    #[test]
    fn test_zero_attenuation_is_real() {
        let c = model(AttenuationUnits::DecibelsPerWavelength).complex_speed(1500.0, 0.0);
        assert_eq!(c, Complex64::new(1500.0, 0.0));
    }

    #[test]
    fn test_db_per_wavelength_matches_nepers() {
        // 1 dB/λ at 1 kHz and 1500 m/s is (1/8.686) Np per 1.5 m
        let alpha = 1000.0 / (DB_PER_NEPER * 1500.0);
        let a = model(AttenuationUnits::DecibelsPerWavelength).complex_speed(1500.0, 1.0);
        let b = model(AttenuationUnits::NepersPerMeter).complex_speed(1500.0, alpha);
        assert_relative_eq!(a.im, b.im, max_relative = 1e-12);
        assert!(a.im > 0.0);
    }

    #[test]
    fn test_db_per_meter_khz_scales_with_frequency() {
        let low = AttenuationModel {
            frequency: 500.0,
            units: AttenuationUnits::DecibelsPerMeterKhz,
            thorp: false,
        };
        let high = AttenuationModel {
            frequency: 1000.0,
            ..low
        };
        // alpha doubles, omega doubles: imaginary speed is unchanged
        assert_relative_eq!(
            low.complex_speed(1600.0, 0.5).im,
            high.complex_speed(1600.0, 0.5).im,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_thorp_increases_with_frequency() {
        assert!(thorp_nepers_per_meter(10_000.0) > thorp_nepers_per_meter(1_000.0));
        let with = AttenuationModel {
            thorp: true,
            ..model(AttenuationUnits::NepersPerMeter)
        };
        assert!(with.water_speed(1500.0, 0.0).im > 0.0);
    }
}
