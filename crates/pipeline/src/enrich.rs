use crate::registry::{SequencerRegistry, ADDRESS_COLUMN, NAME_COLUMN};
use crate::scan::{PartitionScan, BLOCK_COLUMNS, TRANSACTION_COLUMNS};
use crate::sync::PartitionPair;
use anyhow::ensure;
use rollup_polars::prelude::*;
use std::sync::Arc;


/// ~1 day of 12s blocks
pub const DAILY_WINDOW: usize = 7200;

/// ~1 minute of 12s blocks
pub const MINUTE_WINDOW: usize = 5;

pub const AVG_BASE_FEE_DAILY: &str = "avg_base_fee_daily";
pub const AVG_BASE_FEE_MINUTE: &str = "avg_base_fee_minute";

/// Appended to block columns whose name clashes with a transaction column
const JOIN_SUFFIX: &str = "_right";

/// Block columns carried into the enriched transactions, in output order
pub const BLOCK_PAYLOAD: &[&str] = &[
    "author",
    "gas_used",
    "base_fee_per_gas",
    AVG_BASE_FEE_DAILY,
    AVG_BASE_FEE_MINUTE,
];


/// Projects the block partition and adds trailing base fee averages.
///
/// Rows are sorted by block number first, the averages are computed over the
/// current row and the preceding ones, with partial windows at the start of
/// the series.
pub fn block_fees(blocks: LazyFrame) -> LazyFrame {
    with_fee_averages(project_blocks(blocks))
}


/// Same as [`block_fees`], but keeps every column of the block partition.
pub fn priced_blocks(blocks: LazyFrame) -> LazyFrame {
    with_fee_averages(
        blocks.with_column(col("block_number").cast(DataType::UInt64))
    )
}


fn with_fee_averages(blocks: LazyFrame) -> LazyFrame {
    blocks
        .sort_by_exprs([col("block_number")], SortMultipleOptions::default())
        .with_columns([
            trailing_mean("base_fee_per_gas", DAILY_WINDOW).alias(AVG_BASE_FEE_DAILY),
            trailing_mean("base_fee_per_gas", MINUTE_WINDOW).alias(AVG_BASE_FEE_MINUTE),
        ])
}


fn project_blocks(blocks: LazyFrame) -> LazyFrame {
    blocks.select(
        BLOCK_COLUMNS.iter().map(|required| {
            if required.name == "block_number" {
                col(required.name).cast(DataType::UInt64)
            } else {
                col(required.name)
            }
        }).collect::<Vec<_>>()
    )
}


fn trailing_mean(column: &str, window_size: usize) -> Expr {
    col(column).cast(DataType::Float64).rolling_mean(RollingOptionsFixedWindow {
        window_size,
        min_periods: 1,
        ..Default::default()
    })
}


fn project_transactions(txs: LazyFrame, tx_columns: &[String]) -> LazyFrame {
    txs.select(
        tx_columns.iter().map(|name| {
            if name == "block_number" {
                col(name.as_str()).cast(DataType::UInt64)
            } else {
                col(name.as_str())
            }
        }).collect::<Vec<_>>()
    )
}


/// Names of the columns produced by [`join_blocks`] for the given transaction schema.
///
/// Transaction columns come first. A block payload column that clashes with a
/// transaction column keeps the join suffix, e.g. `gas_used_right`.
pub fn joined_columns(tx_columns: &[String]) -> Vec<String> {
    let mut columns: Vec<String> = tx_columns.iter()
        .filter(|name| name.as_str() != NAME_COLUMN)
        .cloned()
        .collect();
    for name in BLOCK_PAYLOAD {
        if tx_columns.iter().any(|c| c == name) {
            columns.push(format!("{name}{JOIN_SUFFIX}"))
        } else {
            columns.push(name.to_string())
        }
    }
    columns
}


/// Left joins transactions with the output of [`block_fees`] on `block_number`.
pub fn join_blocks(txs: LazyFrame, tx_columns: &[String], block_fees: LazyFrame) -> LazyFrame {
    let columns = joined_columns(tx_columns);
    project_transactions(txs, tx_columns)
        .join(
            block_fees,
            [col("block_number")],
            [col("block_number")],
            JoinArgs::new(JoinType::Left)
                .with_coalesce(JoinCoalesce::CoalesceColumns)
                .with_suffix(Some(JOIN_SUFFIX.into()))
        )
        .select(columns.iter().map(|c| col(c.as_str())).collect::<Vec<_>>())
}


/// Builds the enrichment plan for partition pairs.
///
/// The registry is shared, the engine itself holds no mutable state.
#[derive(Clone)]
pub struct Enricher {
    registry: Arc<SequencerRegistry>,
    registry_df: DataFrame
}


impl Enricher {
    pub fn new(registry: Arc<SequencerRegistry>) -> anyhow::Result<Self> {
        let registry_df = registry.to_df()?;
        Ok(Self {
            registry,
            registry_df
        })
    }

    /// Scans both partitions of the pair and returns the deferred enrichment plan.
    pub fn plan(&self, pair: &PartitionPair) -> anyhow::Result<LazyFrame> {
        let txs = PartitionScan::open(&pair.transactions)?.require(TRANSACTION_COLUMNS)?;
        let blocks = PartitionScan::open(&pair.blocks)?.require(BLOCK_COLUMNS)?;
        Ok(self.enrich(
            txs.to_lazy_df()?,
            &txs.column_names(),
            blocks.to_lazy_df()?
        ))
    }

    /// Plan over all pairs at once, the fee averages span the whole block series.
    pub fn plan_merged(&self, pairs: &[PartitionPair]) -> anyhow::Result<LazyFrame> {
        ensure!(!pairs.is_empty(), "nothing to merge");

        let mut tx_columns: Option<Vec<String>> = None;
        let mut txs = Vec::with_capacity(pairs.len());
        let mut blocks = Vec::with_capacity(pairs.len());

        for pair in pairs {
            let tx_scan = PartitionScan::open(&pair.transactions)?.require(TRANSACTION_COLUMNS)?;
            let columns = tx_scan.column_names();
            match tx_columns.as_ref() {
                Some(expected) => ensure!(
                    expected == &columns,
                    "{} has columns {:?}, other transaction partitions have {:?}",
                    pair.transactions.display(),
                    columns,
                    expected
                ),
                None => tx_columns = Some(columns.clone())
            }
            txs.push(project_transactions(tx_scan.to_lazy_df()?, &columns));

            let block_scan = PartitionScan::open(&pair.blocks)?.require(BLOCK_COLUMNS)?;
            blocks.push(project_blocks(block_scan.to_lazy_df()?));
        }

        let tx_columns = tx_columns.unwrap_or_default();
        let txs = concat(txs, UnionArgs::default())?;
        let blocks = concat(blocks, UnionArgs::default())?;

        Ok(self.enrich(txs, &tx_columns, blocks))
    }

    pub fn enrich(&self, txs: LazyFrame, tx_columns: &[String], blocks: LazyFrame) -> LazyFrame {
        let joined = join_blocks(txs, tx_columns, block_fees(blocks));
        self.retain_sequencers(self.label(joined))
    }

    /// Attaches `sequencer_names`, null where `from_address` is not a known sequencer.
    pub fn label(&self, joined: LazyFrame) -> LazyFrame {
        joined.join(
            self.registry_df.clone().lazy(),
            [col("from_address")],
            [col(ADDRESS_COLUMN)],
            JoinArgs::new(JoinType::Left).with_coalesce(JoinCoalesce::CoalesceColumns)
        )
    }

    pub fn retain_sequencers(&self, labeled: LazyFrame) -> LazyFrame {
        labeled.filter(
            col(NAME_COLUMN).is_in(lit(self.registry.names_series()))
        )
    }
}
