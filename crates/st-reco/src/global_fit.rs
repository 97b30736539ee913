//! Linear least-squares fit of all hits of a candidate with the full
//! multiple-scattering covariance.
//!
//! Measurements are stacked as `(z_0..z_{n-1}, y_0..y_{n-1})`. The fit
//! minimises `(m - Hx)^T V^-1 (m - Hx)`, so
//! `C = (H^T V^-1 H)^-1`, `x = C H^T V^-1 m`.
//! Everything except `m` depends only on the configuration and is built once.

use nalgebra::{DMatrix, DVector, Matrix5, Vector5};
use st_core::config::BEND_CONSTANT;
use st_core::{Error, EventHits, Geometry, PhysicsConfig, Result, TrackState};

use crate::matrices::{global_measurement_covariance, global_projection};

/// Result of one global fit.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalFitResult {
    /// `r^T V^-1 r` at the minimum.
    pub chi2: f64,
    /// `2 * n_planes - n_params`.
    pub ndf: usize,
    /// Fitted state at plane 0.
    pub state: TrackState,
}

/// Pre-computed global fit for one geometry and one scattering hypothesis.
#[derive(Debug, Clone)]
pub struct GlobalFitter {
    n_planes: usize,
    n_params: usize,
    fixed_inv_p: f64,
    v_inv: DMatrix<f64>,
    h: DMatrix<f64>,
    covariance: DMatrix<f64>,
    gain: DMatrix<f64>,
    /// Known magnet deflection subtracted from y when 1/p is not fitted.
    bend_offset: DVector<f64>,
}

impl GlobalFitter {
    /// Build the fit matrices, evaluating the scattering angle at `inv_p`.
    pub fn new(geometry: &Geometry, physics: &PhysicsConfig, inv_p: f64) -> Result<Self> {
        if !inv_p.is_finite() {
            return Err(Error::Validation(format!("global fit: invalid 1/p {inv_p}")));
        }
        let n = geometry.n_planes();
        let n_params = physics.n_fit_parameters();
        if 2 * n <= n_params {
            return Err(Error::Validation(format!(
                "global fit: {n} planes cannot constrain {n_params} parameters"
            )));
        }

        let d = geometry.dist_between_planes();
        let s2 = physics.resolution * physics.resolution;
        let theta = physics.scattering_angle(inv_p.abs());
        let v = global_measurement_covariance(n, s2, theta * theta, d * d);

        let chol = v.cholesky().ok_or_else(|| {
            Error::Computation("global fit: measurement covariance not SPD".to_string())
        })?;
        let v_inv = chol.inverse();

        let dpdt = BEND_CONSTANT * physics.integral_bdl;
        let h = global_projection(geometry, dpdt, n_params);
        let ht_vinv = h.transpose() * &v_inv;
        let weight = &ht_vinv * &h;
        let covariance = weight.cholesky().map(|c| c.inverse()).ok_or_else(|| {
            Error::Computation("global fit: normal matrix H^T V^-1 H is singular".to_string())
        })?;
        let gain = &covariance * ht_vinv;

        let fixed_inv_p = 1.0 / physics.beam_momentum;
        let mut bend_offset = DVector::zeros(2 * n);
        if n_params < 5 {
            for i in 0..n {
                bend_offset[n + i] = dpdt * geometry.bend_lever_arm(i) * fixed_inv_p;
            }
        }

        Ok(Self { n_planes: n, n_params, fixed_inv_p, v_inv, h, covariance, gain, bend_offset })
    }

    /// Degrees of freedom of every fit.
    pub fn ndf(&self) -> usize {
        2 * self.n_planes - self.n_params
    }

    /// Number of fitted parameters (4 or 5).
    pub fn n_params(&self) -> usize {
        self.n_params
    }

    /// Fit a measurement vector laid out as z of all planes, then y of all planes.
    pub fn fit(&self, measurements: &DVector<f64>) -> Result<GlobalFitResult> {
        if measurements.len() != 2 * self.n_planes {
            return Err(Error::Validation(format!(
                "global fit: expected {} measurements, got {}",
                2 * self.n_planes,
                measurements.len()
            )));
        }
        let m = measurements - &self.bend_offset;
        let x = &self.gain * &m;
        let r = &m - &self.h * &x;
        let chi2 = r.dot(&(&self.v_inv * &r));

        let mut params = Vector5::zeros();
        let mut covariance = Matrix5::zeros();
        for i in 0..self.n_params {
            params[i] = x[i];
            for j in 0..self.n_params {
                covariance[(i, j)] = self.covariance[(i, j)];
            }
        }
        if self.n_params < 5 {
            params[4] = self.fixed_inv_p;
        }

        Ok(GlobalFitResult { chi2, ndf: self.ndf(), state: TrackState::new(params, covariance) })
    }

    /// Fit the hits selected by `indices` (one hit index per plane).
    pub fn fit_hits(&self, hits: &EventHits, indices: &[usize]) -> Result<GlobalFitResult> {
        if indices.len() != self.n_planes || hits.n_planes() != self.n_planes {
            return Err(Error::Validation(format!(
                "global fit: need one hit in each of {} planes",
                self.n_planes
            )));
        }
        let n = self.n_planes;
        let mut m = DVector::zeros(2 * n);
        for (p, &i) in indices.iter().enumerate() {
            let hit = hits.hit(p, i);
            m[p] = hit.z;
            m[n + p] = hit.y;
        }
        self.fit(&m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use st_core::{GeometryConfig, Hit, TrackParameter};

    fn geometry() -> Geometry {
        Geometry::from_config(&GeometryConfig::default()).unwrap()
    }

    /// Hits of a noiseless track with the given parameters.
    fn ideal_hits(g: &Geometry, physics: &PhysicsConfig, z0: f64, tz: f64, y0: f64, ty: f64) -> EventHits {
        let dpdt = BEND_CONSTANT * physics.integral_bdl;
        let planes = (0..g.n_planes())
            .map(|i| {
                let x = i as f64 * g.dist_between_planes();
                let y = y0 + ty * x + dpdt * g.bend_lever_arm(i) / physics.beam_momentum;
                vec![Hit::signal(y, z0 + tz * x)]
            })
            .collect();
        EventHits::from_planes(planes)
    }

    #[test]
    fn test_exact_track_fits_with_zero_chi2() {
        let g = geometry();
        let physics = PhysicsConfig::default();
        let fitter = GlobalFitter::new(&g, &physics, 1.0 / physics.beam_momentum).unwrap();
        let hits = ideal_hits(&g, &physics, 0.01, 0.002, -0.02, 0.001);
        let fit = fitter.fit_hits(&hits, &[0, 0, 0, 0]).unwrap();

        assert_eq!(fit.ndf, 3);
        assert!(fit.chi2 < 1e-12, "chi2={}", fit.chi2);
        assert_relative_eq!(fit.state.value(TrackParameter::Z0), 0.01, epsilon = 1e-10);
        assert_relative_eq!(fit.state.value(TrackParameter::DzDx), 0.002, epsilon = 1e-10);
        assert_relative_eq!(fit.state.value(TrackParameter::Y0), -0.02, epsilon = 1e-10);
        assert_relative_eq!(fit.state.value(TrackParameter::DyDx), 0.001, epsilon = 1e-10);
        assert_relative_eq!(fit.state.value(TrackParameter::InvP), 20.0, epsilon = 1e-6);
    }

    #[test]
    fn test_covariance_is_symmetric_positive() {
        let g = geometry();
        let physics = PhysicsConfig::default();
        let fitter = GlobalFitter::new(&g, &physics, 20.0).unwrap();
        let fit = fitter.fit_hits(&ideal_hits(&g, &physics, 0.0, 0.0, 0.0, 0.0), &[0; 4]).unwrap();
        let c = fit.state.covariance;
        for i in 0..5 {
            assert!(c[(i, i)] > 0.0);
            for j in 0..5 {
                assert_relative_eq!(c[(i, j)], c[(j, i)], epsilon = 1e-18, max_relative = 1e-9);
            }
        }
        // z and y projections do not talk to each other.
        assert_relative_eq!(c[(0, 2)], 0.0, epsilon = 1e-20);
    }

    #[test]
    fn test_offset_hit_raises_chi2() {
        let g = geometry();
        let physics = PhysicsConfig { mult_scatt_angle: 0.0, ..PhysicsConfig::default() };
        let fitter = GlobalFitter::new(&g, &physics, 20.0).unwrap();
        let mut hits = ideal_hits(&g, &physics, 0.0, 0.0, 0.0, 0.0);
        hits.planes[1].hits[0].z += 10.0 * physics.resolution;
        let fit = fitter.fit_hits(&hits, &[0; 4]).unwrap();

        // 10 sigma on a point with straight-line leverage 0.3 at x = 10 cm
        assert_relative_eq!(fit.chi2, 70.0, max_relative = 1e-6);
    }

    #[test]
    fn test_four_parameter_fit_reports_fixed_momentum() {
        let g = geometry();
        let physics = PhysicsConfig { fit_momentum: false, ..PhysicsConfig::default() };
        let fitter = GlobalFitter::new(&g, &physics, 20.0).unwrap();
        assert_eq!(fitter.n_params(), 4);
        assert_eq!(fitter.ndf(), 4);

        let hits = ideal_hits(&g, &physics, 0.0, 0.001, 0.005, 0.0);
        let fit = fitter.fit_hits(&hits, &[0; 4]).unwrap();
        assert!(fit.chi2 < 1e-12);
        assert_relative_eq!(fit.state.value(TrackParameter::InvP), 20.0);
        assert_eq!(fit.state.uncertainty(TrackParameter::InvP), 0.0);
        assert_relative_eq!(fit.state.value(TrackParameter::Y0), 0.005, epsilon = 1e-10);
    }

    #[test]
    fn test_wrong_measurement_count_is_rejected() {
        let g = geometry();
        let fitter = GlobalFitter::new(&g, &PhysicsConfig::default(), 20.0).unwrap();
        let err = fitter.fit(&DVector::zeros(6)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
