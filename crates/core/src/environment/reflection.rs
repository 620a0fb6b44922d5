//! Boundary conditions and plane-wave reflection coefficients.

use super::attenuation::AttenuationModel;
use crate::error::ConfigError;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Acoustic properties of a homogeneous half-space beyond a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfSpace {
    /// Compressional speed in m/s.
    pub compressional_speed: f64,
    /// Shear speed in m/s, zero for a fluid.
    #[serde(default)]
    pub shear_speed: f64,
    /// Density in g/cm³.
    pub density: f64,
    /// Compressional attenuation in the run's units.
    #[serde(default)]
    pub compressional_attenuation: f64,
    /// Shear attenuation in the run's units.
    #[serde(default)]
    pub shear_attenuation: f64,
}

impl HalfSpace {
    /// Lossless fluid half-space.
    pub const fn fluid(compressional_speed: f64, density: f64) -> Self {
        Self {
            compressional_speed,
            shear_speed: 0.0,
            density,
            compressional_attenuation: 0.0,
            shear_attenuation: 0.0,
        }
    }
}

/// What happens to a ray that meets a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum BoundaryCondition {
    /// Pressure-release surface: R = -1.
    #[default]
    PressureRelease,
    /// Perfectly rigid boundary: R = +1.
    Rigid,
    /// Fluid or elastic half-space.
    HalfSpace(HalfSpace),
}

/// Slowness components of an incident ray at a boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incidence {
    /// Slowness component along the boundary (s/m).
    pub tangential: f64,
    /// Slowness component along the outward normal (s/m), positive.
    pub normal: f64,
    /// Water density at the boundary in g/cm³.
    pub water_density: f64,
}

impl BoundaryCondition {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            BoundaryCondition::PressureRelease => "pressure-release",
            BoundaryCondition::Rigid => "rigid",
            BoundaryCondition::HalfSpace(hs) if hs.shear_speed > 0.0 => "elastic half-space",
            BoundaryCondition::HalfSpace(_) => "fluid half-space",
        }
    }

    /// Check the half-space parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for non-positive speed or density, or negative
    /// shear speed or attenuation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let BoundaryCondition::HalfSpace(hs) = self {
            ConfigError::check_positive("half-space compressional speed", hs.compressional_speed)?;
            ConfigError::check_positive("half-space density", hs.density)?;
            for (what, value) in [
                ("half-space shear speed", hs.shear_speed),
                ("half-space compressional attenuation", hs.compressional_attenuation),
                ("half-space shear attenuation", hs.shear_attenuation),
            ] {
                ConfigError::check_finite(what, value)?;
                if value < 0.0 {
                    return Err(ConfigError::invalid(what, format!("negative value {value}")));
                }
            }
        }
        Ok(())
    }

    /// Complex plane-wave reflection coefficient.
    pub fn coefficient(&self, incidence: &Incidence, model: &AttenuationModel) -> Complex64 {
        match self {
            BoundaryCondition::PressureRelease => Complex64::new(-1.0, 0.0),
            BoundaryCondition::Rigid => Complex64::new(1.0, 0.0),
            BoundaryCondition::HalfSpace(hs) => half_space_coefficient(hs, incidence, model),
        }
    }
}

fn half_space_coefficient(hs: &HalfSpace, incidence: &Incidence, model: &AttenuationModel) -> Complex64 {
    let omega = model.omega();
    let kx = omega * incidence.tangential;
    let kz = omega * incidence.normal;
    let kx2 = Complex64::new(kx * kx, 0.0);
    let cp = model.complex_speed(hs.compressional_speed, hs.compressional_attenuation);

    let kz_p2 = kx2 - (omega / cp).powi(2);
    let kz_p = kz_p2.sqrt();

    let (f, g) = if hs.shear_speed > 0.0 {
        let cs = model.complex_speed(hs.shear_speed, hs.shear_attenuation);
        let kz_s2 = kx2 - (omega / cs).powi(2);
        let kz_s = kz_s2.sqrt();
        let mu = hs.density * cs * cs;
        let y2 = ((kz_s2 + kx2).powi(2) - 4.0 * kz_s * kz_p * kx2) * mu;
        let y4 = kz_p * (kx2 - kz_s2);
        (omega * omega * y4, y2)
    } else {
        (kz_p, Complex64::new(hs.density, 0.0))
    };

    let i_kz_g = Complex64::i() * kz * g;
    let rho_f = incidence.water_density * f;
    -(rho_f - i_kz_g) / (rho_f + i_kz_g)
}
