//! Combinatorial track search over the hits of a 4-plane telescope.
//!
//! Every plane-0 hit inside the beam profile is paired with every plane-1 hit
//! to seed the z-projection filter, which is then extended through planes 2
//! and 3 with a chi-square cut at each step. Surviving combinations are
//! fitted globally and the one with the lowest global chi-square wins.

use st_core::{CutConfig, Error, EventHits, Geometry, PhysicsConfig, Result, RunConfig};

use crate::filter::{FilterState, KalmanStepper};
use crate::global_fit::{GlobalFitResult, GlobalFitter};
use crate::seed::{passes_beam_profile, seed_state};

/// Planes per side handled by the finder loops.
pub const SUPPORTED_PLANES_PER_SIDE: usize = 2;

/// Filter chi-square of one step on a candidate made only of signal hits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageChi2 {
    /// Plane the candidate was extended to.
    pub plane: usize,
    /// One-degree-of-freedom chi-square of that step.
    pub chi2: f64,
}

/// A fully extended hit combination and its global fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Selected hit index in each plane.
    pub hits: Vec<usize>,
    /// Global fit with the scattering error at the beam momentum.
    pub fit: GlobalFitResult,
}

/// Result of searching one event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchOutcome {
    /// Lowest global chi-square candidate, if any combination survived the filter cuts.
    pub best: Option<Candidate>,
    /// Filter chi-squares of all-signal partial candidates, in search order.
    pub stage_chi2: Vec<StageChi2>,
    /// Number of combinations that reached the global fit.
    pub n_candidates: usize,
}

impl SearchOutcome {
    /// Global chi-square of the best candidate.
    pub fn best_chi2(&self) -> Option<f64> {
        self.best.as_ref().map(|c| c.fit.chi2)
    }
}

/// Track finder configured for one run.
#[derive(Debug, Clone)]
pub struct TrackFinder {
    geometry: Geometry,
    physics: PhysicsConfig,
    cuts: CutConfig,
    global_cut: f64,
    stepper: KalmanStepper,
    fitter: GlobalFitter,
}

impl TrackFinder {
    /// Build the finder. Only two planes per side are supported.
    pub fn new(config: &RunConfig) -> Result<Self> {
        let nps = config.geometry.planes_per_side;
        if nps != SUPPORTED_PLANES_PER_SIDE {
            return Err(Error::Unsupported(format!(
                "track finder handles {SUPPORTED_PLANES_PER_SIDE} planes per side, got {nps}"
            )));
        }
        let geometry = Geometry::from_config(&config.geometry)?;
        let physics = config.physics.clone();
        let stepper = KalmanStepper::from_config(&geometry, &physics);
        let fitter = GlobalFitter::new(&geometry, &physics, 1.0 / physics.beam_momentum)?;
        let global_cut = config.cuts.global_cut(nps);

        tracing::debug!(
            d = geometry.dist_between_planes(),
            n_params = fitter.n_params(),
            global_cut,
            "track finder ready"
        );

        Ok(Self { geometry, physics, cuts: config.cuts.clone(), global_cut, stepper, fitter })
    }

    /// Telescope layout.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Physics constants.
    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Effective cut on the global chi-square.
    pub fn global_cut(&self) -> f64 {
        self.global_cut
    }

    /// Global fitter with the scattering error at the beam momentum.
    pub fn fitter(&self) -> &GlobalFitter {
        &self.fitter
    }

    /// Refit a hit combination with the scattering error evaluated at `inv_p`.
    pub fn refit(&self, hits: &EventHits, indices: &[usize], inv_p: f64) -> Result<GlobalFitResult> {
        GlobalFitter::new(&self.geometry, &self.physics, inv_p)?.fit_hits(hits, indices)
    }

    /// Search all hit combinations of one event.
    pub fn find_best_track(&self, hits: &EventHits) -> Result<SearchOutcome> {
        let n = self.geometry.n_planes();
        if hits.n_planes() != n {
            return Err(Error::Validation(format!(
                "event has {} planes, geometry has {n}",
                hits.n_planes()
            )));
        }

        let d = self.geometry.dist_between_planes();
        let pixel = self.geometry.pixel_size();
        let resolution = self.physics.resolution;
        let mut out = SearchOutcome::default();

        let (p0, p1, p2, p3) = (hits.plane(0), hits.plane(1), hits.plane(2), hits.plane(3));

        for (i0, h0) in p0.hits.iter().enumerate() {
            if !passes_beam_profile(h0, pixel, self.cuts.beam_profile_pixels) {
                continue;
            }
            for (i1, h1) in p1.hits.iter().enumerate() {
                if h1.used {
                    continue;
                }
                let signal01 = !h0.is_noise && !h1.is_noise;
                let seed: FilterState = seed_state(h0.z, h1.z, d, resolution);

                for (i2, h2) in p2.hits.iter().enumerate() {
                    if h2.used {
                        continue;
                    }
                    let step2 = self.stepper.step(&seed, h2.z)?;
                    let signal012 = signal01 && !h2.is_noise;
                    if signal012 {
                        out.stage_chi2.push(StageChi2 { plane: 2, chi2: step2.chi2 });
                    }
                    if step2.chi2 > self.cuts.cut1 {
                        continue;
                    }

                    for (i3, h3) in p3.hits.iter().enumerate() {
                        if h3.used {
                            continue;
                        }
                        let step3 = self.stepper.step(&step2.updated, h3.z)?;
                        if signal012 && !h3.is_noise {
                            out.stage_chi2.push(StageChi2 { plane: 3, chi2: step3.chi2 });
                        }
                        if step3.chi2 > self.cuts.cut2 {
                            continue;
                        }

                        let indices = [i0, i1, i2, i3];
                        let fit = self.fitter.fit_hits(hits, &indices)?;
                        out.n_candidates += 1;
                        tracing::trace!(?indices, chi2 = fit.chi2, "candidate");

                        let better = out.best.as_ref().is_none_or(|b| fit.chi2 < b.fit.chi2);
                        if better {
                            out.best = Some(Candidate { hits: indices.to_vec(), fit });
                        }
                    }
                }
            }
        }

        Ok(out)
    }
}
