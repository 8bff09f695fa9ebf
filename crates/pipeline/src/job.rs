use crate::enrich::{priced_blocks, Enricher};
use crate::scan::{PartitionScan, BLOCK_COLUMNS};
use crate::sync::{Partition, PartitionPair};
use rollup_polars::prelude::LazyFrame;
use rollup_primitives::PartitionKey;
use std::path::Path;


/// Unit of work producing exactly one output partition
pub trait PartitionTask {
    fn key(&self) -> PartitionKey;

    fn sources(&self) -> Vec<&Path>;
}


impl PartitionTask for Partition {
    fn key(&self) -> PartitionKey {
        self.key
    }

    fn sources(&self) -> Vec<&Path> {
        vec![self.path.as_path()]
    }
}


impl PartitionTask for PartitionPair {
    fn key(&self) -> PartitionKey {
        self.key
    }

    fn sources(&self) -> Vec<&Path> {
        vec![self.transactions.as_path(), self.blocks.as_path()]
    }
}


pub trait Job: Sync {
    type Task: PartitionTask + Sync;

    fn name(&self) -> &'static str;

    /// Deferred plan for a single task, nothing is materialized here
    fn plan(&self, task: &Self::Task) -> anyhow::Result<LazyFrame>;
}


/// Transactions of known sequencers, enriched with block data
pub struct RollupJob {
    enricher: Enricher
}


impl RollupJob {
    pub fn new(enricher: Enricher) -> Self {
        Self { enricher }
    }
}


impl Job for RollupJob {
    type Task = PartitionPair;

    fn name(&self) -> &'static str {
        "rollups"
    }

    fn plan(&self, task: &PartitionPair) -> anyhow::Result<LazyFrame> {
        self.enricher.plan(task)
    }
}


/// Full block partitions with trailing base fee averages appended
pub struct BlockPricingJob;


impl Job for BlockPricingJob {
    type Task = Partition;

    fn name(&self) -> &'static str {
        "block-pricing"
    }

    fn plan(&self, task: &Partition) -> anyhow::Result<LazyFrame> {
        let scan = PartitionScan::open(&task.path)?.require(BLOCK_COLUMNS)?;
        Ok(priced_blocks(scan.to_lazy_df()?))
    }
}
