//! The standard set of reconstruction-quality histograms.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use st_core::{Error, Result, RunConfig, TrackParameter, TrueTrack};
use st_reco::{AcceptedTrack, StageChi2};

use crate::histogram::Histogram1D;

const RESIDUAL_BINS: usize = 100;
const PULL_BINS: usize = 100;
const PULL_RANGE: f64 = 10.0;
const CHI2_BINS: usize = 80;
const CHI2_MAX: f64 = 24.0;
const PROBABILITY_BINS: usize = 50;

/// Residual histogram half range for a track parameter.
fn residual_range(p: TrackParameter, inv_p_beam: f64) -> f64 {
    match p {
        TrackParameter::Z0 | TrackParameter::Y0 => 0.005,
        TrackParameter::DzDx | TrackParameter::DyDx => 0.025,
        TrackParameter::InvP => inv_p_beam,
    }
}

fn residual_title(p: TrackParameter) -> String {
    match p.unit() {
        "" => format!("{} residuals", p.name()),
        unit => format!("{} residuals ({unit})", p.name()),
    }
}

/// Residuals, pulls and chi-square distributions of a run.
///
/// Residual and pull histograms are indexed like [`TrackParameter::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackHistograms {
    /// `fitted - true` per parameter.
    pub residuals: Vec<Histogram1D>,
    /// `(fitted - true) / sigma` per parameter.
    pub pulls: Vec<Histogram1D>,
    /// Filter chi-square per plane from plane 2 on, all-signal candidates only.
    pub stage_chi2: Vec<Histogram1D>,
    /// Global chi-square, scattering error at the beam momentum.
    pub chi2_fixed_ms: Histogram1D,
    /// Global chi-square, scattering error at the fitted momentum.
    pub chi2_variable_ms: Histogram1D,
    /// Upper-tail probability of the fixed-error global chi-square.
    pub chi2_probability: Histogram1D,
    #[serde(skip)]
    chi2_law: ChiSquared,
}

impl TrackHistograms {
    /// Book all histograms for a run configuration.
    pub fn book(config: &RunConfig) -> Result<Self> {
        let inv_p_beam = 1.0 / config.physics.beam_momentum;

        let mut residuals = Vec::with_capacity(TrackParameter::ALL.len());
        let mut pulls = Vec::with_capacity(TrackParameter::ALL.len());
        for p in TrackParameter::ALL {
            let r = residual_range(p, inv_p_beam);
            residuals.push(Histogram1D::new(
                &format!("residual_{}", p.name()),
                &residual_title(p),
                RESIDUAL_BINS,
                -r,
                r,
            )?);
            pulls.push(Histogram1D::new(
                &format!("pull_{}", p.name()),
                &format!("{} pull", p.name()),
                PULL_BINS,
                -PULL_RANGE,
                PULL_RANGE,
            )?);
        }

        let n_planes = config.geometry.n_planes();
        let stage_chi2 = (2..n_planes)
            .map(|plane| {
                Histogram1D::new(
                    &format!("chi2_plane_{plane}"),
                    &format!("z chisquared at plane {plane}"),
                    CHI2_BINS,
                    0.0,
                    CHI2_MAX,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let ndf = (2 * n_planes).saturating_sub(config.physics.n_fit_parameters());
        let chi2_law = ChiSquared::new(ndf as f64)
            .map_err(|e| Error::Validation(format!("chi-square law with {ndf} dof: {e}")))?;

        Ok(Self {
            residuals,
            pulls,
            stage_chi2,
            chi2_fixed_ms: Histogram1D::new(
                "chi2_fixed_ms",
                "total chisquared, fixed MS error",
                CHI2_BINS,
                0.0,
                CHI2_MAX,
            )?,
            chi2_variable_ms: Histogram1D::new(
                "chi2_variable_ms",
                "total chisquared, variable MS error",
                CHI2_BINS,
                0.0,
                CHI2_MAX,
            )?,
            chi2_probability: Histogram1D::new(
                "chi2_probability",
                "total chisquared probability",
                PROBABILITY_BINS,
                0.0,
                1.0,
            )?,
            chi2_law,
        })
    }

    /// Fill residuals, pulls and global chi-squares of an accepted track.
    pub fn fill_accepted(&mut self, track: &AcceptedTrack, truth: &TrueTrack) {
        let state = &track.fit.state;
        for (k, p) in TrackParameter::ALL.into_iter().enumerate() {
            self.residuals[k].fill(state.residual(truth, p));
            if let Some(pull) = state.pull(truth, p) {
                self.pulls[k].fill(pull);
            }
        }
        self.chi2_fixed_ms.fill(track.fit.chi2);
        self.chi2_variable_ms.fill(track.refit.chi2);
        self.chi2_probability.fill(1.0 - self.chi2_law.cdf(track.fit.chi2.max(0.0)));
    }

    /// Fill the per-plane filter chi-squares of one search.
    pub fn fill_stage_chi2(&mut self, stages: &[StageChi2]) {
        for s in stages {
            if let Some(h) = s.plane.checked_sub(2).and_then(|i| self.stage_chi2.get_mut(i)) {
                h.fill(s.chi2);
            }
        }
    }

    /// Every histogram, in booking order.
    pub fn all(&self) -> Vec<&Histogram1D> {
        let mut out: Vec<&Histogram1D> = Vec::new();
        out.extend(&self.residuals);
        out.extend(&self.pulls);
        out.extend(&self.stage_chi2);
        out.push(&self.chi2_fixed_ms);
        out.push(&self.chi2_variable_ms);
        out.push(&self.chi2_probability);
        out
    }

    /// Pull histogram of parameter `p`.
    pub fn pull(&self, p: TrackParameter) -> &Histogram1D {
        &self.pulls[p.index()]
    }

    /// Add the contents of histograms booked with the same configuration.
    pub fn merge(&mut self, other: &TrackHistograms) -> Result<()> {
        if self.stage_chi2.len() != other.stage_chi2.len() {
            return Err(Error::Validation("cannot merge histograms of different geometries".into()));
        }
        let pairs = self
            .residuals
            .iter_mut()
            .chain(self.pulls.iter_mut())
            .chain(self.stage_chi2.iter_mut())
            .zip(other.residuals.iter().chain(&other.pulls).chain(&other.stage_chi2));
        for (a, b) in pairs {
            a.merge(b)?;
        }
        self.chi2_fixed_ms.merge(&other.chi2_fixed_ms)?;
        self.chi2_variable_ms.merge(&other.chi2_variable_ms)?;
        self.chi2_probability.merge(&other.chi2_probability)?;
        Ok(())
    }
}
