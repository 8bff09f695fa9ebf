use crate::enrich::Enricher;
use crate::errors::{FailureKind, OutputWriteError, PartitionReadError};
use crate::job::{Job, PartitionTask};
use crate::sync::PartitionPair;
use crate::writer::{write_parquet_once, Commit, OutputDir};
use anyhow::Context;
use rayon::prelude::*;
use rollup_polars::prelude::{DataFrame, LazyFrame};
use rollup_primitives::PartitionKey;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, info_span};


#[derive(Debug)]
pub struct TaskFailure {
    pub key: PartitionKey,
    pub error: anyhow::Error
}


impl TaskFailure {
    pub fn kind(&self) -> FailureKind {
        FailureKind::of(&self.error)
    }
}


#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<PartitionKey>,
    pub skipped: Vec<PartitionKey>,
    pub failed: Vec<TaskFailure>
}


impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len() + self.failed.len()
    }
}


enum Outcome {
    Written,
    Skipped
}


/// Executes jobs on a fixed size worker pool, one task per output partition.
pub struct Runner {
    pool: rayon::ThreadPool,
    output: OutputDir
}


impl Runner {
    /// `workers = None` sizes the pool to the available parallelism
    pub fn new(dest: impl Into<PathBuf>, workers: Option<usize>) -> anyhow::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.unwrap_or(0))
            .thread_name(|i| format!("partition-worker-{}", i))
            .build()
            .context("failed to start partition workers")?;
        Ok(Self {
            pool,
            output: OutputDir::new(dest)
        })
    }

    pub fn output(&self) -> &OutputDir {
        &self.output
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn run<J: Job>(&self, job: &J, tasks: &[J::Task]) -> RunReport {
        let started = Instant::now();
        info!(
            job = job.name(),
            tasks = tasks.len(),
            workers = self.num_workers(),
            dest = %self.output.root().display(),
            "starting run"
        );

        let outcomes: Vec<(PartitionKey, anyhow::Result<Outcome>)> = self.pool.install(|| {
            tasks.par_iter()
                .map(|task| (task.key(), self.execute(job, task)))
                .collect()
        });

        let mut report = RunReport::default();
        for (key, outcome) in outcomes {
            match outcome {
                Ok(Outcome::Written) => report.written.push(key),
                Ok(Outcome::Skipped) => report.skipped.push(key),
                Err(error) => report.failed.push(TaskFailure { key, error })
            }
        }

        info!(
            job = job.name(),
            written = report.written.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "run finished"
        );
        report
    }

    fn execute<J: Job>(&self, job: &J, task: &J::Task) -> anyhow::Result<Outcome> {
        let key = task.key();
        let _span = info_span!("partition", job = job.name(), %key).entered();

        let result = self.process(job, task, &key);
        match &result {
            Ok(Outcome::Written) => info!(file = %self.output.path_for(&key).display(), "file written"),
            Ok(Outcome::Skipped) => info!("output exists, skipping"),
            Err(err) => error!(kind = %FailureKind::of(err), "{:#}", err)
        }
        result
    }

    fn process<J: Job>(&self, job: &J, task: &J::Task, key: &PartitionKey) -> anyhow::Result<Outcome> {
        if self.output.exists(key) {
            return Ok(Outcome::Skipped)
        }

        let plan = job.plan(task)?;
        let df = materialize(plan, &task.sources())?;

        match self.output.commit(key, &df)? {
            Commit::Written => Ok(Outcome::Written),
            Commit::AlreadyExists => Ok(Outcome::Skipped)
        }
    }
}


fn materialize(plan: LazyFrame, sources: &[&Path]) -> anyhow::Result<DataFrame> {
    plan.with_streaming(true).collect().with_context(|| PartitionReadError {
        paths: sources.iter().map(|p| p.to_path_buf()).collect()
    })
}


/// Enriches all pairs as a single dataset and writes it to `dest`.
///
/// Does nothing when `dest` already exists.
pub fn run_merged(enricher: &Enricher, pairs: &[PartitionPair], dest: &Path) -> anyhow::Result<Commit> {
    if dest.exists() {
        info!(file = %dest.display(), "output exists, skipping");
        return Ok(Commit::AlreadyExists)
    }

    let started = Instant::now();
    info!(partitions = pairs.len(), dest = %dest.display(), "merging partitions");

    let plan = enricher.plan_merged(pairs)?;
    let sources: Vec<&Path> = pairs.iter()
        .flat_map(|p| p.sources())
        .collect();
    let df = materialize(plan, &sources)?;

    if let Some(dir) = dest.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| OutputWriteError {
            path: dir.to_path_buf()
        })?;
    }

    let commit = write_parquet_once(dest, &df)?;
    match commit {
        Commit::Written => info!(
            rows = df.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "merged file written"
        ),
        Commit::AlreadyExists => info!(file = %dest.display(), "output appeared concurrently, skipping")
    }
    Ok(commit)
}
