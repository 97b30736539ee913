//! Two-hit seeds for the z-projection filter.

use nalgebra::Vector2;
use st_core::Hit;

use crate::filter::FilterState;
use crate::matrices::seed_covariance;

/// Filter state at plane 1 built from the z coordinates of the hits in planes 0 and 1.
pub fn seed_state(z0: f64, z1: f64, d: f64, resolution: f64) -> FilterState {
    FilterState { state: Vector2::new(z1, (z1 - z0) / d), covariance: seed_covariance(resolution, d) }
}

/// Whether a plane-0 hit may start a track: not yet used and within
/// `n_pixels` pixels of the nominal beam axis in y.
pub fn passes_beam_profile(hit: &Hit, pixel_size: f64, n_pixels: f64) -> bool {
    !hit.used && hit.y.abs() < n_pixels * pixel_size
}
