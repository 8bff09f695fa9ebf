use clap::{Args, Parser, Subcommand, ValueEnum};
use rollup_pipeline::{PairingPolicy, SequencerRegistry};
use std::path::PathBuf;


#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Number of partitions processed in parallel (defaults to the number of CPUs)
    #[arg(long, value_name = "N", global = true)]
    pub workers: Option<usize>,

    /// Max number of threads polars may use for a single query
    #[arg(long, value_name = "N", global = true)]
    pub polars_threads: Option<usize>,

    /// Whether the logs should be structured in JSON format
    #[arg(long, global = true)]
    pub json_log: bool,

    #[command(subcommand)]
    pub command: Command,
}


#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write sequencer transactions enriched with block data, one file per partition
    Rollups {
        #[command(flatten)]
        inputs: Inputs,

        /// Directory to write enriched partitions to
        #[arg(short, long, value_name = "DIR", default_value = "data/rollups")]
        dest: PathBuf,
    },

    /// Write block partitions with trailing base fee averages
    BlockPricing {
        /// Directory with block partitions
        #[arg(long, value_name = "DIR", default_value = "data/raw/blocks")]
        blocks: PathBuf,

        /// Directory to write priced block partitions to
        #[arg(short, long, value_name = "DIR", default_value = "data/blocks_pricing")]
        dest: PathBuf,
    },

    /// Enrich all partitions as a single dataset and write it to one file
    Merge {
        #[command(flatten)]
        inputs: Inputs,

        /// Parquet file to write
        #[arg(short, long, value_name = "FILE")]
        dest: PathBuf,
    },
}


#[derive(Args, Debug)]
pub struct Inputs {
    /// Directory with transaction partitions
    #[arg(long, value_name = "DIR", default_value = "data/raw/transactions")]
    pub transactions: PathBuf,

    /// Directory with block partitions
    #[arg(long, value_name = "DIR", default_value = "data/raw/blocks")]
    pub blocks: PathBuf,

    /// JSON file with `sequencer_addresses` and `sequencer_names` lists
    /// (defaults to the built-in L2 sequencers)
    #[arg(long, value_name = "FILE")]
    pub registry: Option<PathBuf>,

    /// How transaction and block partitions are matched
    #[arg(long, value_enum, default_value_t = Pairing::ByKey)]
    pub pairing: Pairing,
}


#[derive(ValueEnum, Copy, Clone, Debug)]
pub enum Pairing {
    /// Match partitions by the block range in their file names
    ByKey,
    /// Match partitions by position in lexically sorted listings
    Positional,
}


impl From<Pairing> for PairingPolicy {
    fn from(value: Pairing) -> Self {
        match value {
            Pairing::ByKey => PairingPolicy::ByKey,
            Pairing::Positional => PairingPolicy::Positional,
        }
    }
}


impl Inputs {
    pub fn registry(&self) -> anyhow::Result<SequencerRegistry> {
        match self.registry.as_ref() {
            Some(file) => SequencerRegistry::read(file),
            None => Ok(SequencerRegistry::l2_sequencers()),
        }
    }
}
