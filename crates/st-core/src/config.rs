//! Run configuration.
//!
//! Every field has a default equal to the reference spectrometer setup
//! (two planes on each side of the magnet, 30 cm long telescope, 50 MeV beam),
//! so an empty config file is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// `dp / d(tan(dtheta))` per unit field integral: GeV per (T*cm).
pub const BEND_CONSTANT: f64 = 0.003;

/// Full run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RunConfig {
    /// Telescope layout.
    #[serde(default)]
    pub geometry: GeometryConfig,
    /// Beam, material and detector response.
    #[serde(default)]
    pub physics: PhysicsConfig,
    /// Chi-square quality cuts.
    #[serde(default)]
    pub cuts: CutConfig,
    /// Event count, seed and threading.
    #[serde(default)]
    pub run: RunSettings,
}

/// Telescope layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Number of tracking planes on each side of the magnet.
    #[serde(default = "default_planes_per_side")]
    pub planes_per_side: usize,
    /// Distance between the first and the last plane (cm).
    #[serde(default = "default_spectrometer_length")]
    pub spectrometer_length: f64,
    /// Pixel pitch (cm).
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f64,
    /// Half height of the chips before the magnet (cm).
    #[serde(default = "default_half_height_before")]
    pub half_height_before: f64,
    /// Half height of the chips after the magnet (cm).
    #[serde(default = "default_half_height_after")]
    pub half_height_after: f64,
    /// Half width of all chips (cm).
    #[serde(default = "default_half_width")]
    pub half_width: f64,
    /// Side of the square pixel window (in pixels) around the true impact
    /// in which noise hits are generated.
    #[serde(default = "default_noise_window_pixels")]
    pub noise_window_pixels: f64,
}

fn default_planes_per_side() -> usize {
    2
}

fn default_spectrometer_length() -> f64 {
    30.0
}

fn default_pixel_size() -> f64 {
    0.002
}

fn default_half_height_before() -> f64 {
    1.0
}

fn default_half_height_after() -> f64 {
    2.0
}

fn default_half_width() -> f64 {
    1.0
}

fn default_noise_window_pixels() -> f64 {
    500.0
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            planes_per_side: default_planes_per_side(),
            spectrometer_length: default_spectrometer_length(),
            pixel_size: default_pixel_size(),
            half_height_before: default_half_height_before(),
            half_height_after: default_half_height_after(),
            half_width: default_half_width(),
            noise_window_pixels: default_noise_window_pixels(),
        }
    }
}

impl GeometryConfig {
    /// Total number of planes (both arms).
    pub fn n_planes(&self) -> usize {
        2 * self.planes_per_side
    }

    /// Equal spacing between consecutive planes (cm).
    pub fn dist_between_planes(&self) -> f64 {
        self.spectrometer_length / (self.n_planes() as f64 - 1.0)
    }
}

/// Beam, material and detector response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsConfig {
    /// Beam momentum (GeV).
    #[serde(default = "default_beam_momentum")]
    pub beam_momentum: f64,
    /// Effective multiple-scattering angle times momentum per plane (rad*GeV).
    #[serde(default = "default_mult_scatt_angle")]
    pub mult_scatt_angle: f64,
    /// Incident track angle in the x-z plane (rad).
    #[serde(default)]
    pub theta_xz: f64,
    /// Nominal single-hit resolution (cm).
    #[serde(default = "default_resolution")]
    pub resolution: f64,
    /// Probability of an additional wide smearing of a coordinate.
    #[serde(default = "default_tail_amplitude")]
    pub tail_amplitude: f64,
    /// Width of the wide smearing component (cm).
    #[serde(default = "default_tail_width")]
    pub tail_width: f64,
    /// Probability that a crossing produces a hit.
    #[serde(default = "default_hit_efficiency")]
    pub hit_efficiency: f64,
    /// Noise probability per pixel in the readout window.
    #[serde(default = "default_noise_occupancy")]
    pub noise_occupancy: f64,
    /// Magnet field integral (T*cm).
    #[serde(default = "default_integral_bdl")]
    pub integral_bdl: f64,
    /// Fit 1/p (5 parameters). `false` is the field-off 4-parameter fit.
    #[serde(default = "default_fit_momentum")]
    pub fit_momentum: bool,
}

fn default_beam_momentum() -> f64 {
    0.05
}

fn default_mult_scatt_angle() -> f64 {
    0.0002
}

fn default_resolution() -> f64 {
    0.0006
}

fn default_tail_amplitude() -> f64 {
    0.1
}

fn default_tail_width() -> f64 {
    0.0018
}

fn default_hit_efficiency() -> f64 {
    0.97
}

fn default_noise_occupancy() -> f64 {
    0.00001
}

fn default_integral_bdl() -> f64 {
    0.5
}

fn default_fit_momentum() -> bool {
    true
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            beam_momentum: default_beam_momentum(),
            mult_scatt_angle: default_mult_scatt_angle(),
            theta_xz: 0.0,
            resolution: default_resolution(),
            tail_amplitude: default_tail_amplitude(),
            tail_width: default_tail_width(),
            hit_efficiency: default_hit_efficiency(),
            noise_occupancy: default_noise_occupancy(),
            integral_bdl: default_integral_bdl(),
            fit_momentum: default_fit_momentum(),
        }
    }
}

impl PhysicsConfig {
    /// Thin-lens deflection of a beam-momentum particle in the magnet (rad).
    pub fn bend_angle(&self) -> f64 {
        BEND_CONSTANT * self.integral_bdl / self.beam_momentum
    }

    /// Per-plane scattering angle for a particle with inverse momentum `inv_p`.
    pub fn scattering_angle(&self, inv_p: f64) -> f64 {
        self.mult_scatt_angle * inv_p
    }

    /// Number of fitted track parameters.
    pub fn n_fit_parameters(&self) -> usize {
        if self.fit_momentum { 5 } else { 4 }
    }
}

/// Chi-square quality cuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutConfig {
    /// Cut on the filter chi-square at the third plane.
    #[serde(default = "default_stage_cut")]
    pub cut1: f64,
    /// Cut on the filter chi-square at every later plane.
    #[serde(default = "default_stage_cut")]
    pub cut2: f64,
    /// Cut on the global chi-square. `None` derives it from the geometry.
    #[serde(default)]
    pub cut3: Option<f64>,
    /// Beam-profile cut on seed hits in plane 0, in pixels.
    #[serde(default = "default_beam_profile_pixels")]
    pub beam_profile_pixels: f64,
}

fn default_stage_cut() -> f64 {
    8.0
}

fn default_beam_profile_pixels() -> f64 {
    4.0
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            cut1: default_stage_cut(),
            cut2: default_stage_cut(),
            cut3: None,
            beam_profile_pixels: default_beam_profile_pixels(),
        }
    }
}

impl CutConfig {
    /// Effective global chi-square cut: `(4 * planes_per_side - 5) * 2.5` unless overridden.
    pub fn global_cut(&self, planes_per_side: usize) -> f64 {
        self.cut3.unwrap_or((4.0 * planes_per_side as f64 - 5.0) * 2.5)
    }
}

/// Event count, seed and threading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Number of events to simulate.
    #[serde(default = "default_events")]
    pub events: u64,
    /// Base RNG seed; event `i` is simulated with seed `seed + i`.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Threads (0 = auto). Results do not depend on this value.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

fn default_events() -> u64 {
    5000
}

fn default_seed() -> u64 {
    42
}

fn default_threads() -> usize {
    1
}

impl Default for RunSettings {
    fn default() -> Self {
        Self { events: default_events(), seed: default_seed(), threads: default_threads() }
    }
}

fn check_positive(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v <= 0.0 {
        return Err(Error::Validation(format!("{name} must be finite and > 0, got {v}")));
    }
    Ok(())
}

fn check_non_negative(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(Error::Validation(format!("{name} must be finite and >= 0, got {v}")));
    }
    Ok(())
}

fn check_probability(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(Error::Validation(format!("{name} must be in [0, 1], got {v}")));
    }
    Ok(())
}

impl RunConfig {
    /// Validate ranges of all physical constants.
    pub fn validate(&self) -> Result<()> {
        let g = &self.geometry;
        if g.planes_per_side == 0 {
            return Err(Error::Validation("planes_per_side must be >= 1".to_string()));
        }
        check_positive("spectrometer_length", g.spectrometer_length)?;
        check_positive("pixel_size", g.pixel_size)?;
        check_positive("half_height_before", g.half_height_before)?;
        check_positive("half_height_after", g.half_height_after)?;
        check_positive("half_width", g.half_width)?;
        check_non_negative("noise_window_pixels", g.noise_window_pixels)?;

        let p = &self.physics;
        check_positive("beam_momentum", p.beam_momentum)?;
        check_non_negative("mult_scatt_angle", p.mult_scatt_angle)?;
        if !p.theta_xz.is_finite() {
            return Err(Error::Validation("theta_xz must be finite".to_string()));
        }
        check_positive("resolution", p.resolution)?;
        check_probability("tail_amplitude", p.tail_amplitude)?;
        check_non_negative("tail_width", p.tail_width)?;
        check_probability("hit_efficiency", p.hit_efficiency)?;
        check_probability("noise_occupancy", p.noise_occupancy)?;
        if !p.integral_bdl.is_finite() {
            return Err(Error::Validation("integral_bdl must be finite".to_string()));
        }

        let c = &self.cuts;
        check_non_negative("cut1", c.cut1)?;
        check_non_negative("cut2", c.cut2)?;
        if let Some(cut3) = c.cut3 {
            check_non_negative("cut3", cut3)?;
        }
        check_positive("beam_profile_pixels", c.beam_profile_pixels)?;
        Ok(())
    }

    /// Read a YAML or JSON config file (YAML parser also reads JSON) and validate it.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let cfg: RunConfig = serde_yaml_ng::from_slice(&bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }
}
