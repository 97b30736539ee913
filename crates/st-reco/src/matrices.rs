//! Constructors for the fixed matrices of the track model.
//!
//! Filter matrices act on the z-projection state `(z, dz/dx)`. Global-fit
//! matrices act on the measurement vector `(z_0..z_{n-1}, y_0..y_{n-1})` and
//! the track state `(z0, dz/dx, y0, dy/dx, 1/p)` at plane 0.

use nalgebra::{DMatrix, Matrix2};
use st_core::Geometry;

/// Straight-line propagator over a distance `d`: `[[1, d], [0, 1]]`.
pub fn propagator(d: f64) -> Matrix2<f64> {
    Matrix2::new(1.0, d, 0.0, 1.0)
}

/// Multiple-scattering process noise for one gap: `theta^2 [[d^2, d], [d, 1]]`.
pub fn scattering_noise(theta: f64, d: f64) -> Matrix2<f64> {
    let t2 = theta * theta;
    Matrix2::new(t2 * d * d, t2 * d, t2 * d, t2)
}

/// Weight (inverse covariance) of a position-only measurement: `diag(1/res^2, 0)`.
pub fn measurement_weight(resolution: f64) -> Matrix2<f64> {
    Matrix2::new(1.0 / (resolution * resolution), 0.0, 0.0, 0.0)
}

/// Covariance of the two-hit seed `(z1, (z1 - z0)/d)`.
pub fn seed_covariance(resolution: f64, d: f64) -> Matrix2<f64> {
    let s2 = resolution * resolution;
    Matrix2::new(s2, s2 / d, s2 / d, 2.0 * s2 / (d * d))
}

/// Covariance of the stacked z and y measurements of `n_planes` planes.
///
/// Both projections share the same `n x n` block: `s2` on the first diagonal
/// element and `V[i][j] = V[i-1][j-1] + i*j*t2*d2` for `1 <= i <= j`, which
/// sums the scattering kicks in all upstream planes. z and y are uncorrelated.
pub fn global_measurement_covariance(n_planes: usize, s2: f64, t2: f64, d2: f64) -> DMatrix<f64> {
    let n = n_planes;
    if n == 0 {
        return DMatrix::zeros(0, 0);
    }
    let mut block = DMatrix::<f64>::zeros(n, n);
    block[(0, 0)] = s2;
    for i in 1..n {
        for j in i..n {
            let v = block[(i - 1, j - 1)] + (i * j) as f64 * t2 * d2;
            block[(i, j)] = v;
            block[(j, i)] = v;
        }
    }

    let mut v = DMatrix::<f64>::zeros(2 * n, 2 * n);
    v.view_mut((0, 0), (n, n)).copy_from(&block);
    v.view_mut((n, n), (n, n)).copy_from(&block);
    v
}

/// Projection of the track state on the measurements.
///
/// Rows `0..n` are z: `z0 + i*d*dz/dx`; rows `n..2n` are y:
/// `y0 + i*d*dy/dx + dpdt * lever_arm(i) * 1/p` where the last term only
/// exists downstream of the magnet and only with `n_params == 5`.
pub fn global_projection(geometry: &Geometry, dpdt: f64, n_params: usize) -> DMatrix<f64> {
    let n = geometry.n_planes();
    let d = geometry.dist_between_planes();
    let mut h = DMatrix::<f64>::zeros(2 * n, n_params);
    for i in 0..n {
        let j = i + n;
        h[(i, 0)] = 1.0;
        h[(i, 1)] = i as f64 * d;
        h[(j, 2)] = 1.0;
        h[(j, 3)] = i as f64 * d;
        if n_params > 4 && geometry.is_after_magnet(i) {
            h[(j, 4)] = dpdt * geometry.bend_lever_arm(i);
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;
    use st_core::GeometryConfig;

    #[test]
    fn test_propagator_moves_position_by_slope() {
        let f = propagator(10.0);
        let x = f * Vector2::new(0.1, 0.01);
        assert_relative_eq!(x[0], 0.2);
        assert_relative_eq!(x[1], 0.01);
    }

    #[test]
    fn test_scattering_noise_is_rank_one() {
        let q = scattering_noise(0.004, 10.0);
        assert_relative_eq!(q[(0, 0)], 0.0016, epsilon = 1e-15);
        assert_relative_eq!(q[(0, 1)], q[(1, 0)]);
        assert!(q.determinant().abs() < 1e-20);
    }

    #[test]
    fn test_seed_covariance_matches_two_point_line() {
        // z1 and (z1 - z0)/d with independent z0, z1 of variance s2
        let c = seed_covariance(0.0006, 10.0);
        let s2 = 0.0006f64.powi(2);
        assert_relative_eq!(c[(0, 0)], s2);
        assert_relative_eq!(c[(0, 1)], s2 / 10.0);
        assert_relative_eq!(c[(1, 1)], 2.0 * s2 / 100.0);
    }

    #[test]
    fn test_measurement_covariance_structure() {
        let v = global_measurement_covariance(4, 1.0, 0.5, 2.0);
        // diag: s2 + sum_k (i-k)^2 * t2*d2
        assert_relative_eq!(v[(0, 0)], 1.0);
        assert_relative_eq!(v[(1, 1)], 2.0);
        assert_relative_eq!(v[(2, 2)], 1.0 + 4.0 + 1.0);
        assert_relative_eq!(v[(1, 2)], 2.0);
        assert_relative_eq!(v[(2, 3)], 8.0);
        assert_relative_eq!(v[(0, 3)], 0.0);
        // y block is a copy, no z-y correlation
        assert_relative_eq!(v[(6, 7)], v[(2, 3)]);
        assert_relative_eq!(v[(1, 5)], 0.0);
        assert_eq!(v, v.transpose());
    }

    #[test]
    fn test_projection_layout() {
        let g = st_core::Geometry::from_config(&GeometryConfig::default()).unwrap();
        let h = global_projection(&g, 0.0015, 5);
        assert_eq!(h.shape(), (8, 5));
        assert_relative_eq!(h[(3, 1)], 30.0);
        assert_relative_eq!(h[(7, 3)], 30.0);
        assert_relative_eq!(h[(5, 4)], 0.0);
        assert_relative_eq!(h[(6, 4)], 0.0015 * 5.0);
        assert_relative_eq!(h[(7, 4)], 0.0015 * 15.0);

        let h4 = global_projection(&g, 0.0015, 4);
        assert_eq!(h4.shape(), (8, 4));
    }
}
