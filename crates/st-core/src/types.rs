//! Track parameters and fitted track states.

use nalgebra::{Matrix5, Vector5};
use serde::{Deserialize, Serialize};

use crate::config::PhysicsConfig;

/// The five track parameters, all given at plane 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackParameter {
    /// z intercept (cm)
    Z0,
    /// dz/dx
    DzDx,
    /// y intercept (cm)
    Y0,
    /// dy/dx
    DyDx,
    /// 1/p (1/GeV)
    InvP,
}

impl TrackParameter {
    /// All parameters in state-vector order.
    pub const ALL: [TrackParameter; 5] = [
        TrackParameter::Z0,
        TrackParameter::DzDx,
        TrackParameter::Y0,
        TrackParameter::DyDx,
        TrackParameter::InvP,
    ];

    /// Index into the state vector.
    pub fn index(self) -> usize {
        match self {
            TrackParameter::Z0 => 0,
            TrackParameter::DzDx => 1,
            TrackParameter::Y0 => 2,
            TrackParameter::DyDx => 3,
            TrackParameter::InvP => 4,
        }
    }

    /// Short name used in histogram names and artifacts.
    pub fn name(self) -> &'static str {
        match self {
            TrackParameter::Z0 => "z0",
            TrackParameter::DzDx => "tz",
            TrackParameter::Y0 => "y0",
            TrackParameter::DyDx => "ty",
            TrackParameter::InvP => "inv_p",
        }
    }

    /// Unit of the parameter.
    pub fn unit(self) -> &'static str {
        match self {
            TrackParameter::Z0 | TrackParameter::Y0 => "cm",
            TrackParameter::DzDx | TrackParameter::DyDx => "",
            TrackParameter::InvP => "1/GeV",
        }
    }
}

/// Fitted 5-parameter track state `(z0, dz/dx, y0, dy/dx, 1/p)` and its covariance.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    /// Parameter vector.
    pub params: Vector5<f64>,
    /// Covariance matrix.
    pub covariance: Matrix5<f64>,
}

impl TrackState {
    /// Create a new state.
    pub fn new(params: Vector5<f64>, covariance: Matrix5<f64>) -> Self {
        Self { params, covariance }
    }

    /// Value of parameter `p`.
    pub fn value(&self, p: TrackParameter) -> f64 {
        self.params[p.index()]
    }

    /// Uncertainty (sqrt of covariance diagonal) of parameter `p`.
    pub fn uncertainty(&self, p: TrackParameter) -> f64 {
        let i = p.index();
        self.covariance[(i, i)].max(0.0).sqrt()
    }

    /// `fitted - true` for parameter `p`.
    pub fn residual(&self, truth: &TrueTrack, p: TrackParameter) -> f64 {
        self.value(p) - truth.value(p)
    }

    /// `(fitted - true) / uncertainty` for parameter `p`. `None` for a
    /// parameter that was not fitted (zero variance).
    pub fn pull(&self, truth: &TrueTrack, p: TrackParameter) -> Option<f64> {
        let sigma = self.uncertainty(p);
        if sigma > 0.0 { Some(self.residual(truth, p) / sigma) } else { None }
    }

    /// Correlation coefficient between parameters `a` and `b`.
    pub fn correlation(&self, a: TrackParameter, b: TrackParameter) -> Option<f64> {
        let sa = self.uncertainty(a);
        let sb = self.uncertainty(b);
        if sa <= 0.0 || sb <= 0.0 {
            return None;
        }
        Some(self.covariance[(a.index(), b.index())] / (sa * sb))
    }
}

/// Generated track parameters at plane 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrueTrack {
    /// z intercept (cm)
    pub z0: f64,
    /// dz/dx
    pub dz_dx: f64,
    /// y intercept (cm)
    pub y0: f64,
    /// dy/dx
    pub dy_dx: f64,
    /// 1/p (1/GeV)
    pub inv_p: f64,
}

impl TrueTrack {
    /// The beam track every simulated event starts from.
    pub fn from_physics(physics: &PhysicsConfig) -> Self {
        Self { z0: 0.0, dz_dx: physics.theta_xz, y0: 0.0, dy_dx: 0.0, inv_p: 1.0 / physics.beam_momentum }
    }

    /// Value of parameter `p`.
    pub fn value(&self, p: TrackParameter) -> f64 {
        match p {
            TrackParameter::Z0 => self.z0,
            TrackParameter::DzDx => self.dz_dx,
            TrackParameter::Y0 => self.y0,
            TrackParameter::DyDx => self.dy_dx,
            TrackParameter::InvP => self.inv_p,
        }
    }
}
