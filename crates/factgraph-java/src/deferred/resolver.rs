//! The post-traversal resolution pass.

use super::cascade::MethodIndex;
use super::record::{link_record, LinkOutcome, ResolutionState, UnresolvedMethodInvocation};
use factgraph::FactModel;
use factgraph_parser_api::{ExtractorConfig, ResolutionSummary};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::time::Instant;

/// Resolve every record still in the `Created` state, then link the outcomes.
///
/// Records that were resolved by an earlier pass are left alone. Resolution
/// only reads the model; linking runs afterwards on a single thread.
pub fn resolve_and_link(
    model: &mut FactModel,
    records: &mut [UnresolvedMethodInvocation],
    config: &ExtractorConfig,
) -> factgraph::Result<ResolutionSummary> {
    let start = Instant::now();
    let pending: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.state == ResolutionState::Created)
        .map(|(i, _)| i)
        .collect();

    resolve_all(model, records, config);

    let mut outcome = LinkOutcome::default();
    for &index in &pending {
        link_record(
            model,
            &records[index],
            config.link_resolved_invocations,
            config.link_ambiguous_to_first,
            &mut outcome,
        )?;
    }

    let summary = ResolutionSummary {
        attempted: pending.len(),
        unique: outcome.unique,
        ambiguous: outcome.ambiguous,
        unresolved: outcome.unresolved,
        linked: outcome.linked,
    };
    info!(
        "Resolved {} deferred invocations in {:?}: {} unique, {} ambiguous, {} unresolved, {} linked",
        summary.attempted,
        start.elapsed(),
        summary.unique,
        summary.ambiguous,
        summary.unresolved,
        summary.linked
    );
    Ok(summary)
}

/// Run the resolution procedure on every pending record.
///
/// Runs on a rayon pool when the configuration asks for parallelism.
pub fn resolve_all(
    model: &FactModel,
    records: &mut [UnresolvedMethodInvocation],
    config: &ExtractorConfig,
) {
    let index = MethodIndex::build(model);
    debug!(
        "Method index holds {} names for {} records",
        index.len(),
        records.len()
    );

    let resolve = |record: &mut UnresolvedMethodInvocation| {
        if record.state == ResolutionState::Created {
            record.resolve(model, &index);
        }
    };

    if !config.parallel {
        records.iter_mut().for_each(resolve);
        return;
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(num_threads) = config.parallel_workers {
        builder = builder.num_threads(num_threads);
    }
    match builder.build() {
        Ok(pool) => pool.install(|| records.par_iter_mut().for_each(resolve)),
        Err(e) => {
            warn!("Failed to create thread pool, resolving sequentially: {e}");
            records.iter_mut().for_each(resolve);
        }
    }
}
