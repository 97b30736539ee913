//! JSON run artifact (numbers-first, plot-friendly arrays).

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use st_core::{Error, Result, RunConfig, TrackParameter};

use crate::histogram::Histogram1D;
use crate::results::RunResults;
use crate::summary::RunSummary;

/// Schema tag of [`RunArtifact`].
pub const SCHEMA_VERSION: &str = "spectrack_run_v1";

/// Complete output of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunArtifact {
    /// Schema tag.
    pub schema_version: String,
    /// Provenance.
    pub meta: RunMeta,
    /// Configuration the run used, defaults filled in.
    pub config: RunConfig,
    /// Event and hit counters.
    pub summary: RunSummary,
    /// All histograms in booking order.
    pub histograms: Vec<HistogramArtifact>,
    /// Mean and width of each pull distribution.
    pub pull_summary: Vec<PullSummary>,
}

/// Provenance of a run artifact.
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation time.
    pub created_unix_ms: u128,
    /// Base RNG seed.
    pub seed: u64,
    /// Number of simulated events.
    pub events: u64,
    /// Worker threads used.
    pub threads: usize,
}

/// One histogram as flat arrays.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramArtifact {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Bin edges (length = contents + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents.
    pub bin_content: Vec<f64>,
    /// Underflow count.
    pub underflow: f64,
    /// Overflow count.
    pub overflow: f64,
    /// Number of fills.
    pub entries: u64,
    /// Mean of filled values.
    pub mean: f64,
    /// Standard deviation of filled values.
    pub std_dev: f64,
}

impl From<&Histogram1D> for HistogramArtifact {
    fn from(h: &Histogram1D) -> Self {
        Self {
            name: h.name.clone(),
            title: h.title.clone(),
            bin_edges: h.bin_edges(),
            bin_content: h.bin_content.clone(),
            underflow: h.underflow,
            overflow: h.overflow,
            entries: h.entries,
            mean: h.mean(),
            std_dev: h.std_dev(),
        }
    }
}

/// Pull distribution statistics of one parameter.
#[derive(Debug, Clone, Serialize)]
pub struct PullSummary {
    /// Parameter name.
    pub parameter: String,
    /// Number of pulls.
    pub entries: u64,
    /// Pull mean (0 for an unbiased fit).
    pub mean: f64,
    /// Pull width (1 for correct errors).
    pub std_dev: f64,
}

fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Computation(format!("system time error: {e}")))?;
    Ok(d.as_millis())
}

/// Build the artifact of a finished run. `threads` is the number of worker
/// threads the run actually used, not the requested setting.
pub fn run_artifact(config: &RunConfig, results: &RunResults, threads: usize) -> Result<RunArtifact> {
    let pull_summary = TrackParameter::ALL
        .into_iter()
        .map(|p| {
            let h = results.histograms.pull(p);
            PullSummary {
                parameter: p.name().to_string(),
                entries: h.entries,
                mean: h.mean(),
                std_dev: h.std_dev(),
            }
        })
        .collect::<Vec<_>>();

    for s in &pull_summary {
        tracing::debug!(parameter = %s.parameter, entries = s.entries, mean = s.mean, width = s.std_dev, "pull summary");
    }

    Ok(RunArtifact {
        schema_version: SCHEMA_VERSION.to_string(),
        meta: RunMeta {
            tool: "spectrack".to_string(),
            tool_version: st_core::VERSION.to_string(),
            created_unix_ms: now_unix_ms()?,
            seed: config.run.seed,
            events: config.run.events,
            threads,
        },
        config: config.clone(),
        summary: results.summary.clone(),
        histograms: results.histograms.all().into_iter().map(HistogramArtifact::from).collect(),
        pull_summary,
    })
}
