#![allow(dead_code)]
use arrow::array::{ArrayRef, RecordBatch, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use rollup_pipeline::registry::RegistryConfig;
use rollup_pipeline::{Enricher, SequencerRegistry};
use rollup_polars::arrow::record_batch_to_polars_df;
use rollup_polars::prelude::DataFrame;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;


pub const SEQUENCER: &str = "0xaa";
pub const OTHER: &str = "0xbb";


pub struct Dataset {
    pub dir: tempfile::TempDir
}


impl Dataset {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        std::fs::create_dir_all(dir.path().join("raw/transactions"))?;
        std::fs::create_dir_all(dir.path().join("raw/blocks"))?;
        Ok(Self { dir })
    }

    pub fn transactions_dir(&self) -> PathBuf {
        self.dir.path().join("raw/transactions")
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.dir.path().join("raw/blocks")
    }

    pub fn dest(&self) -> PathBuf {
        self.dir.path().join("rollups")
    }

    pub fn transactions_file(&self, start: u64, end: u64) -> PathBuf {
        self.transactions_dir().join(format!("ethereum__transactions__{start}_to_{end}.parquet"))
    }

    pub fn blocks_file(&self, start: u64, end: u64) -> PathBuf {
        self.blocks_dir().join(format!("ethereum__blocks__{start}_to_{end}.parquet"))
    }

    /// Two transactions per block, one from the sequencer and one from elsewhere
    pub fn add_transactions(&self, start: u64, end: u64) -> anyhow::Result<()> {
        let mut hashes = Vec::new();
        let mut numbers = Vec::new();
        let mut senders = Vec::new();
        for block in start..end {
            for sender in [SEQUENCER, OTHER] {
                hashes.push(format!("0x{block:x}{}", &sender[2..]));
                numbers.push(block as u32);
                senders.push(sender);
            }
        }
        let n = hashes.len();
        write_parquet(&self.transactions_file(start, end), vec![
            ("transaction_hash", DataType::Utf8, Arc::new(StringArray::from(hashes)) as ArrayRef),
            ("block_number", DataType::UInt32, Arc::new(UInt32Array::from(numbers)) as ArrayRef),
            ("from_address", DataType::Utf8, Arc::new(StringArray::from(senders)) as ArrayRef),
            ("to_address", DataType::Utf8, Arc::new(StringArray::from(vec!["0xcc"; n])) as ArrayRef),
            ("gas_price", DataType::UInt64, Arc::new(UInt64Array::from(vec![7u64; n])) as ArrayRef),
        ])
    }

    pub fn add_blocks(&self, start: u64, end: u64) -> anyhow::Result<()> {
        let numbers: Vec<u32> = (start..end).map(|b| b as u32).collect();
        write_parquet(&self.blocks_file(start, end), vec![
            ("block_hash", DataType::Utf8, Arc::new(StringArray::from(
                numbers.iter().map(|b| format!("0xhash{b}")).collect::<Vec<_>>()
            )) as ArrayRef),
            ("author", DataType::Utf8, Arc::new(StringArray::from(
                numbers.iter().map(|b| format!("0xauthor{b}")).collect::<Vec<_>>()
            )) as ArrayRef),
            ("block_number", DataType::UInt32, Arc::new(UInt32Array::from(numbers.clone())) as ArrayRef),
            ("timestamp", DataType::UInt32, Arc::new(UInt32Array::from(
                numbers.iter().map(|b| b * 12).collect::<Vec<_>>()
            )) as ArrayRef),
            ("gas_used", DataType::UInt64, Arc::new(UInt64Array::from(
                numbers.iter().map(|b| *b as u64 * 100).collect::<Vec<_>>()
            )) as ArrayRef),
            ("base_fee_per_gas", DataType::UInt64, Arc::new(UInt64Array::from(
                numbers.iter().map(|b| *b as u64 * 10).collect::<Vec<_>>()
            )) as ArrayRef),
        ])
    }

    pub fn add_pair(&self, start: u64, end: u64) -> anyhow::Result<()> {
        self.add_transactions(start, end)?;
        self.add_blocks(start, end)
    }
}


pub fn write_parquet(path: &Path, columns: Vec<(&str, DataType, ArrayRef)>) -> anyhow::Result<()> {
    let schema = Arc::new(Schema::new(
        columns.iter()
            .map(|(name, data_type, _)| Field::new(*name, data_type.clone(), true))
            .collect::<Vec<_>>()
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, _, array)| array).collect()
    )?;
    let mut writer = ArrowWriter::try_new(File::create(path)?, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}


pub fn read_parquet(path: &Path) -> anyhow::Result<DataFrame> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?.build()?;
    let mut result: Option<DataFrame> = None;
    for batch in reader {
        let df = record_batch_to_polars_df(&batch?)?;
        match result.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&df)?;
            },
            None => result = Some(df)
        }
    }
    Ok(result.unwrap_or_default())
}


pub fn list_dir(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = std::fs::read_dir(dir)?
        .map(|e| Ok(e?.file_name().to_string_lossy().to_string()))
        .collect::<anyhow::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}


pub fn enricher() -> Enricher {
    let registry = SequencerRegistry::new(RegistryConfig {
        sequencer_addresses: vec![SEQUENCER.to_string()],
        sequencer_names: vec!["rollupA".to_string()]
    }).unwrap();
    Enricher::new(Arc::new(registry)).unwrap()
}
