mod cli;


use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use rollup_pipeline::writer::Commit;
use rollup_pipeline::{Enricher, RunReport, Runner};
use std::sync::Arc;
use tracing::info;


fn init_tracing(json: bool) {
    use std::io::IsTerminal;

    let env_filter = tracing_subscriber::EnvFilter::builder().parse_lossy(
        std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV)
            .unwrap_or("info".to_string()),
    );

    if !json && std::io::stdout().is_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .with_current_span(false)
            .init();
    }
}


fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    if let Some(n_threads) = args.polars_threads {
        unsafe {
            rollup_polars::set_polars_thread_pool_size(n_threads);
        }
    }

    init_tracing(args.json_log);

    match &args.command {
        Command::Rollups { inputs, dest } => {
            let registry = inputs.registry().context("failed to load sequencer registry")?;
            let enricher = Enricher::new(Arc::new(registry))?;
            let runner = Runner::new(dest, args.workers)?;
            let report = rollup_pipeline::process_rollups(
                &runner,
                enricher,
                &inputs.transactions,
                &inputs.blocks,
                inputs.pairing.into()
            )?;
            check(report)
        }
        Command::BlockPricing { blocks, dest } => {
            let runner = Runner::new(dest, args.workers)?;
            let report = rollup_pipeline::process_block_pricing(&runner, blocks)?;
            check(report)
        }
        Command::Merge { inputs, dest } => {
            let registry = inputs.registry().context("failed to load sequencer registry")?;
            let enricher = Enricher::new(Arc::new(registry))?;
            let commit = rollup_pipeline::process_merged(
                &enricher,
                &inputs.transactions,
                &inputs.blocks,
                inputs.pairing.into(),
                dest
            )?;
            if commit == Commit::AlreadyExists {
                println!("nothing to do");
            }
            Ok(())
        }
    }
}


fn check(report: RunReport) -> anyhow::Result<()> {
    if report.total() == 0 {
        println!("nothing to do");
        return Ok(())
    }
    if report.is_success() {
        info!(written = report.written.len(), skipped = report.skipped.len(), "all partitions processed");
        Ok(())
    } else {
        let failed: Vec<String> = report.failed.iter()
            .map(|f| format!("{} ({})", f.key, f.kind()))
            .collect();
        anyhow::bail!(
            "{} of {} partitions failed, re-run to retry them: {}",
            report.failed.len(),
            report.total(),
            failed.join(", ")
        )
    }
}
