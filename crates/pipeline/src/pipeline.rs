use crate::enrich::Enricher;
use crate::job::{BlockPricingJob, RollupJob};
use crate::run::{run_merged, RunReport, Runner};
use crate::sync::{discover, synchronize, PairingPolicy};
use crate::writer::Commit;
use std::path::Path;
use tracing::warn;


/// Pairs transaction and block partitions and writes one enriched partition per pair.
///
/// Fails before any work is scheduled when the input domains cannot be paired.
pub fn process_rollups(
    runner: &Runner,
    enricher: Enricher,
    transactions_dir: &Path,
    blocks_dir: &Path,
    policy: PairingPolicy
) -> anyhow::Result<RunReport>
{
    let pairing = synchronize(transactions_dir, blocks_dir, policy)?;
    if !pairing.unmatched_transactions.is_empty() || !pairing.unmatched_blocks.is_empty() {
        warn!(
            unmatched_transactions = pairing.unmatched_transactions.len(),
            unmatched_blocks = pairing.unmatched_blocks.len(),
            "some partitions have no counterpart and will not be processed"
        );
    }
    Ok(runner.run(&RollupJob::new(enricher), &pairing.pairs))
}


pub fn process_block_pricing(runner: &Runner, blocks_dir: &Path) -> anyhow::Result<RunReport> {
    let blocks = discover(blocks_dir)?;
    Ok(runner.run(&BlockPricingJob, &blocks))
}


pub fn process_merged(
    enricher: &Enricher,
    transactions_dir: &Path,
    blocks_dir: &Path,
    policy: PairingPolicy,
    dest: &Path
) -> anyhow::Result<Commit>
{
    let pairing = synchronize(transactions_dir, blocks_dir, policy)?;
    run_merged(enricher, &pairing.pairs, dest)
}
