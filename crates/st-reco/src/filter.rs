//! One predict/update step of the z-projection Kalman filter.
//!
//! The state is `(z, dz/dx)` at the current plane. Only positions are
//! measured, so the update is written in information form with the singular
//! measurement weight `diag(1/res^2, 0)`:
//!
//! `C_new = (C'^-1 + M^-1)^-1`, `z_new = C_new (C'^-1 z' + M^-1 m)`
//!
//! where `z' = F z` and `C' = F C F^T + Q` are the prediction.

use nalgebra::{Matrix2, Vector2};
use st_core::{Error, Geometry, PhysicsConfig, Result};

use crate::matrices::{measurement_weight, propagator, scattering_noise};

/// Track state in the z-projection and its covariance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    /// `(z, dz/dx)`.
    pub state: Vector2<f64>,
    /// 2x2 covariance.
    pub covariance: Matrix2<f64>,
}

/// Result of extending a candidate by one plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterStep {
    /// `(m - z'_0)^2 / (res^2 + C'_00)`, one degree of freedom.
    pub chi2: f64,
    /// Predicted state before the update.
    pub predicted: Vector2<f64>,
    /// Updated state and covariance after including the hit.
    pub updated: FilterState,
}

#[inline]
fn symmetrize(p: &Matrix2<f64>) -> Matrix2<f64> {
    0.5 * (p + p.transpose())
}

/// Pre-built matrices for stepping from one plane to the next.
#[derive(Debug, Clone)]
pub struct KalmanStepper {
    f: Matrix2<f64>,
    q: Matrix2<f64>,
    m_inv: Matrix2<f64>,
    s2: f64,
}

impl KalmanStepper {
    /// Stepper for plane spacing `d`, hit resolution and per-plane scattering angle `theta`.
    pub fn new(d: f64, resolution: f64, theta: f64) -> Self {
        Self {
            f: propagator(d),
            q: scattering_noise(theta, d),
            m_inv: measurement_weight(resolution),
            s2: resolution * resolution,
        }
    }

    /// Stepper for a geometry, with the scattering angle evaluated at the beam momentum.
    pub fn from_config(geometry: &Geometry, physics: &PhysicsConfig) -> Self {
        Self::new(
            geometry.dist_between_planes(),
            physics.resolution,
            physics.scattering_angle(1.0 / physics.beam_momentum),
        )
    }

    /// Propagate `prior` to the next plane and update it with the measured `z`.
    ///
    /// `prior` is left untouched, so sibling hits are all tried from the same
    /// parent state.
    pub fn step(&self, prior: &FilterState, z_measured: f64) -> Result<FilterStep> {
        let c_pred = symmetrize(&(self.f * prior.covariance * self.f.transpose() + self.q));
        let z_pred = self.f * prior.state;

        let c_pred_inv = c_pred.try_inverse().ok_or_else(|| {
            Error::Computation("filter step: predicted covariance is singular".to_string())
        })?;
        let c_new = (c_pred_inv + self.m_inv).try_inverse().ok_or_else(|| {
            Error::Computation("filter step: updated weight matrix is singular".to_string())
        })?;
        let c_new = symmetrize(&c_new);

        let weighted_hit = Vector2::new(z_measured / self.s2, 0.0);
        let z_new = c_new * (c_pred_inv * z_pred + weighted_hit);

        let r = z_measured - z_pred[0];
        let chi2 = r * r / (self.s2 + c_pred[(0, 0)]);

        Ok(FilterStep { chi2, predicted: z_pred, updated: FilterState { state: z_new, covariance: c_new } })
    }
}
