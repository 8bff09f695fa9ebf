mod common;


use common::{enricher, list_dir, read_parquet, Dataset, SEQUENCER};
use rollup_pipeline::errors::{FailureKind, MismatchedPartitionCount};
use rollup_pipeline::writer::Commit;
use rollup_pipeline::{process_block_pricing, process_merged, process_rollups, PairingPolicy, Runner};
use rollup_primitives::PartitionKey;


#[test]
fn writes_one_file_per_partition() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    ds.add_pair(100, 110)?;
    ds.add_pair(110, 120)?;

    let runner = Runner::new(ds.dest(), Some(2))?;
    let report = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey)?;

    assert!(report.is_success());
    assert_eq!(report.written.len(), 2);
    assert_eq!(list_dir(&ds.dest())?, vec!["100_to_110.parquet", "110_to_120.parquet"]);

    let df = read_parquet(&ds.dest().join("100_to_110.parquet"))?;
    assert_eq!(df.height(), 10);
    let senders = df.column("from_address")?.str()?;
    assert!(senders.into_iter().all(|s| s == Some(SEQUENCER)));
    let names = df.column("sequencer_names")?.str()?;
    assert!(names.into_iter().all(|s| s == Some("rollupA")));
    assert_eq!(df.column("author")?.null_count(), 0);
    assert!(df.column("timestamp").is_err());
    assert!(df.column("block_hash").is_err());
    assert!(df.column("gas_price").is_ok());
    Ok(())
}


#[test]
fn second_run_writes_nothing() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    for start in [0, 10, 20] {
        ds.add_pair(start, start + 10)?;
    }

    let runner = Runner::new(ds.dest(), None)?;
    let first = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey)?;
    assert_eq!(first.written.len(), 3);

    let snapshot: Vec<Vec<u8>> = list_dir(&ds.dest())?.iter()
        .map(|name| std::fs::read(ds.dest().join(name)))
        .collect::<Result<_, _>>()?;

    let second = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey)?;
    assert!(second.written.is_empty());
    assert_eq!(second.skipped.len(), 3);

    let after: Vec<Vec<u8>> = list_dir(&ds.dest())?.iter()
        .map(|name| std::fs::read(ds.dest().join(name)))
        .collect::<Result<_, _>>()?;
    assert_eq!(snapshot, after);
    Ok(())
}


#[test]
fn mismatched_counts_write_nothing() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    ds.add_transactions(0, 10)?;
    ds.add_transactions(10, 20)?;
    ds.add_transactions(20, 30)?;
    ds.add_blocks(0, 10)?;
    ds.add_blocks(10, 20)?;

    for policy in [PairingPolicy::ByKey, PairingPolicy::Positional] {
        let runner = Runner::new(ds.dest(), None)?;
        let err = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), policy)
            .unwrap_err();
        let mismatch = err.downcast_ref::<MismatchedPartitionCount>().unwrap();
        assert_eq!((mismatch.transactions, mismatch.blocks), (3, 2));
        assert!(!ds.dest().exists());
    }
    Ok(())
}


#[test]
fn failed_partition_does_not_stop_the_others() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    ds.add_pair(0, 10)?;
    ds.add_pair(20, 30)?;
    ds.add_transactions(10, 20)?;
    std::fs::write(ds.blocks_file(10, 20), b"PAR1 truncated")?;

    let runner = Runner::new(ds.dest(), Some(3))?;
    let report = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey)?;

    assert!(!report.is_success());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].key, PartitionKey::new(10, 20));
    assert_eq!(report.failed[0].kind(), FailureKind::PartitionRead);

    let mut written = report.written.clone();
    written.sort();
    assert_eq!(written, vec![PartitionKey::new(0, 10), PartitionKey::new(20, 30)]);
    assert_eq!(list_dir(&ds.dest())?, vec!["0_to_10.parquet", "20_to_30.parquet"]);

    // once the input is fixed, a re-run only processes the missing partition
    ds.add_blocks(10, 20)?;
    let report = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey)?;
    assert_eq!(report.written, vec![PartitionKey::new(10, 20)]);
    assert_eq!(report.skipped.len(), 2);
    Ok(())
}


#[test]
fn schema_violation_is_task_local() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    ds.add_pair(0, 10)?;
    ds.add_transactions(10, 20)?;
    common::write_parquet(&ds.blocks_file(10, 20), vec![(
        "block_number",
        arrow::datatypes::DataType::UInt32,
        std::sync::Arc::new(arrow::array::UInt32Array::from(vec![10u32, 11])) as arrow::array::ArrayRef
    )])?;

    let runner = Runner::new(ds.dest(), None)?;
    let report = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey)?;
    assert_eq!(report.written, vec![PartitionKey::new(0, 10)]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].kind(), FailureKind::SchemaViolation);
    Ok(())
}


#[test]
fn existing_output_is_not_recomputed() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    ds.add_pair(0, 10)?;
    std::fs::create_dir_all(ds.dest())?;
    std::fs::write(ds.dest().join("0_to_10.parquet"), b"produced elsewhere")?;

    let runner = Runner::new(ds.dest(), None)?;
    let report = process_rollups(&runner, enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey)?;
    assert_eq!(report.skipped, vec![PartitionKey::new(0, 10)]);
    assert_eq!(std::fs::read(ds.dest().join("0_to_10.parquet"))?, b"produced elsewhere");
    Ok(())
}


#[test]
fn block_pricing_pass() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    ds.add_blocks(0, 10)?;
    ds.add_blocks(10, 20)?;

    let dest = ds.dir.path().join("blocks_pricing");
    let runner = Runner::new(&dest, None)?;
    let report = process_block_pricing(&runner, &ds.blocks_dir())?;
    assert_eq!(report.written.len(), 2);

    let df = read_parquet(&dest.join("10_to_20.parquet"))?;
    assert_eq!(df.height(), 10);
    let minute = df.column("avg_base_fee_minute")?.f64()?;
    // base fee is 10 * block number, the window restarts with each partition
    assert_eq!(minute.get(0), Some(100.0));
    assert_eq!(minute.get(4), Some(120.0));
    assert_eq!(minute.get(9), Some(170.0));
    // block columns outside the fee computation are carried as well
    assert_eq!(df.column("block_hash")?.str()?.get(0), Some("0xhash10"));
    assert_eq!(df.column("timestamp")?.u32()?.get(0), Some(120));

    let report = process_block_pricing(&runner, &ds.blocks_dir())?;
    assert_eq!(report.skipped.len(), 2);
    Ok(())
}


#[test]
fn merged_mode_writes_single_file() -> anyhow::Result<()> {
    let ds = Dataset::new()?;
    ds.add_pair(0, 10)?;
    ds.add_pair(10, 20)?;

    let dest = ds.dir.path().join("rollup_blobs.parquet");
    let commit = process_merged(&enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey, &dest)?;
    assert_eq!(commit, Commit::Written);

    let df = read_parquet(&dest)?;
    assert_eq!(df.height(), 20);

    // the daily window spans both partitions: block 19 sees blocks 0..=19
    let row = df.column("block_number")?.u64()?
        .into_iter()
        .position(|b| b == Some(19))
        .unwrap();
    assert_eq!(df.column("avg_base_fee_daily")?.f64()?.get(row), Some(95.0));

    let commit = process_merged(&enricher(), &ds.transactions_dir(), &ds.blocks_dir(), PairingPolicy::ByKey, &dest)?;
    assert_eq!(commit, Commit::AlreadyExists);
    Ok(())
}
