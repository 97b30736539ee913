//! Simulate-and-reconstruct event loop.

use anyhow::Result;
use rayon::prelude::*;
use st_core::{EventHits, EventSource, RunConfig, SourceEvent, TrueTrack};
use st_hist::RunResults;
use st_reco::{EventReconstruction, TrackFinder, reconstruct_event};
use st_sim::Simulator;

/// Events reconstructed in parallel before their results are accumulated.
const CHUNK_EVENTS: u64 = 4096;

/// Accumulated results and the number of worker threads that produced them.
#[derive(Debug)]
pub struct RunOutput {
    pub results: RunResults,
    pub threads: usize,
}

/// One processed event, kept until accumulation.
struct EventRecord {
    reco: EventReconstruction,
    hits: EventHits,
    truth: TrueTrack,
}

impl EventRecord {
    fn accumulate(&self, results: &mut RunResults) {
        results.record(&self.reco, &self.hits, &self.truth);
    }
}

fn process_event<S: EventSource + ?Sized>(
    finder: &TrackFinder,
    source: &S,
    index: u64,
) -> st_core::Result<EventRecord> {
    let SourceEvent { mut hits, truth } = source.generate(index)?;
    let reco = reconstruct_event(finder, &mut hits)?;
    tracing::debug!(
        event = index,
        n_hits = hits.n_hits(),
        n_candidates = reco.n_candidates,
        accepted = reco.outcome.accepted().is_some(),
        "event done"
    );
    Ok(EventRecord { reco, hits, truth })
}

/// Run `config.run.events` simulated events with `threads` workers (0 = auto).
pub fn run_events(config: &RunConfig, threads: usize) -> Result<RunOutput> {
    config.validate()?;
    let finder = TrackFinder::new(config)?;
    let sim = Simulator::new(finder.geometry().clone(), config.physics.clone(), config.run.seed);
    run_source(config, &finder, &sim, threads)
}

/// Reconstruct every event of `source`.
///
/// Events are independent and addressed by index. The parallel path works
/// through fixed-size chunks, collects each chunk in index order and
/// accumulates it before starting the next, so memory stays bounded and the
/// results are identical for any thread count.
pub fn run_source<S: EventSource + ?Sized>(
    config: &RunConfig,
    finder: &TrackFinder,
    source: &S,
    threads: usize,
) -> Result<RunOutput> {
    let n_events = config.run.events;
    let mut results = RunResults::new(config)?;

    tracing::info!(events = n_events, seed = config.run.seed, threads, source = source.name(), "starting run");

    let used_threads = if threads == 1 {
        for i in 0..n_events {
            process_event(finder, source, i)?.accumulate(&mut results);
        }
        1
    } else {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        let mut first = 0;
        while first < n_events {
            let last = (first + CHUNK_EVENTS).min(n_events);
            let chunk: Vec<EventRecord> = pool.install(|| {
                (first..last)
                    .into_par_iter()
                    .map(|i| process_event(finder, source, i))
                    .collect::<st_core::Result<_>>()
            })?;
            for record in &chunk {
                record.accumulate(&mut results);
            }
            first = last;
        }
        pool.current_num_threads()
    };

    tracing::info!(
        reconstructed = results.summary.reconstructed,
        efficiency = results.summary.efficiency(),
        threads = used_threads,
        "run finished"
    );
    Ok(RunOutput { results, threads: used_threads })
}
