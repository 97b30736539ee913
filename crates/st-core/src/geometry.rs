//! Telescope geometry.
//!
//! Planes are numbered along the beam (x); plane 0 sits at x = 0 and the
//! magnet is midway between planes `planes_per_side - 1` and `planes_per_side`.
//!
//! ```text
//!  I             I    magnet   I             I
//! 0cm--------- 10cm-----------20cm----------30cm---------->x
//! ```

use serde::Serialize;

use crate::config::GeometryConfig;
use crate::{Error, Result};

/// One pixel plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Plane {
    /// Position along the beam, 0-based.
    pub index: usize,
    /// Longitudinal position (cm).
    pub x: f64,
    /// Half height of the chip (cm), bending direction.
    pub half_height: f64,
    /// Half width of the chip (cm), non-bending direction.
    pub half_width: f64,
}

impl Plane {
    /// Whether a crossing at `(y, z)` lies on the sensitive area.
    pub fn contains(&self, y: f64, z: f64) -> bool {
        y.abs() < self.half_height && z.abs() < self.half_width
    }
}

/// Immutable plane layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    planes: Vec<Plane>,
    planes_per_side: usize,
    dist_between_planes: f64,
    pixel_size: f64,
    noise_window_pixels: f64,
}

impl Geometry {
    /// Build the layout from its configuration.
    pub fn from_config(cfg: &GeometryConfig) -> Result<Self> {
        if cfg.planes_per_side == 0 {
            return Err(Error::Validation("geometry needs at least one plane per side".to_string()));
        }
        let d = cfg.dist_between_planes();
        if !d.is_finite() || d <= 0.0 {
            return Err(Error::Validation(format!("invalid plane spacing {d}")));
        }

        let planes = (0..cfg.n_planes())
            .map(|i| Plane {
                index: i,
                x: d * i as f64,
                half_height: if i < cfg.planes_per_side {
                    cfg.half_height_before
                } else {
                    cfg.half_height_after
                },
                half_width: cfg.half_width,
            })
            .collect();

        Ok(Self {
            planes,
            planes_per_side: cfg.planes_per_side,
            dist_between_planes: d,
            pixel_size: cfg.pixel_size,
            noise_window_pixels: cfg.noise_window_pixels,
        })
    }

    /// All planes in beam order.
    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    /// Plane `i`.
    pub fn plane(&self, i: usize) -> &Plane {
        &self.planes[i]
    }

    /// Total number of planes.
    pub fn n_planes(&self) -> usize {
        self.planes.len()
    }

    /// Planes on each side of the magnet.
    pub fn planes_per_side(&self) -> usize {
        self.planes_per_side
    }

    /// Spacing between consecutive planes (cm).
    pub fn dist_between_planes(&self) -> f64 {
        self.dist_between_planes
    }

    /// Pixel pitch (cm).
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Noise window side in pixels.
    pub fn noise_window_pixels(&self) -> f64 {
        self.noise_window_pixels
    }

    /// Noise window side length (cm).
    pub fn noise_window(&self) -> f64 {
        self.noise_window_pixels * self.pixel_size
    }

    /// Whether plane `i` is downstream of the magnet.
    pub fn is_after_magnet(&self, i: usize) -> bool {
        i >= self.planes_per_side
    }

    /// Lever arm (cm) from the magnet centre to plane `i`; zero upstream.
    pub fn bend_lever_arm(&self, i: usize) -> f64 {
        if self.is_after_magnet(i) {
            self.dist_between_planes * (0.5 + i as f64 - self.planes_per_side as f64)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_layout() {
        let g = Geometry::from_config(&GeometryConfig::default()).unwrap();
        assert_eq!(g.n_planes(), 4);
        let xs: Vec<f64> = g.planes().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 10.0, 20.0, 30.0]);
        assert_eq!(g.plane(1).half_height, 1.0);
        assert_eq!(g.plane(2).half_height, 2.0);
        assert!(!g.is_after_magnet(1));
        assert!(g.is_after_magnet(2));
        assert_eq!(g.bend_lever_arm(1), 0.0);
        assert_eq!(g.bend_lever_arm(2), 5.0);
        assert_eq!(g.bend_lever_arm(3), 15.0);
        assert!((g.noise_window() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_plane_contains() {
        let g = Geometry::from_config(&GeometryConfig::default()).unwrap();
        assert!(g.plane(0).contains(0.5, -0.5));
        assert!(!g.plane(0).contains(1.5, 0.0));
        assert!(g.plane(3).contains(1.5, 0.0));
    }
}
