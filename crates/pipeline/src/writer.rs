use crate::errors::OutputWriteError;
use anyhow::Context;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use rollup_polars::arrow::polars_df_to_record_batches;
use rollup_polars::prelude::DataFrame;
use rollup_primitives::PartitionKey;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;


const BATCH_SIZE: usize = 64 * 1024;
const ROW_GROUP_SIZE: usize = 256 * 1024;


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Commit {
    Written,
    AlreadyExists
}


/// Destination directory for derived partitions.
///
/// The directory is created on the first write, runs that only skip
/// partitions leave the file system untouched.
pub struct OutputDir {
    root: PathBuf,
    created: OnceLock<()>
}


impl OutputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created: OnceLock::new()
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &PartitionKey) -> PathBuf {
        self.root.join(key.file_name("parquet"))
    }

    pub fn exists(&self, key: &PartitionKey) -> bool {
        self.path_for(key).exists()
    }

    fn ensure_created(&self) -> anyhow::Result<()> {
        if self.created.get().is_some() {
            return Ok(())
        }
        std::fs::create_dir_all(&self.root).with_context(|| OutputWriteError {
            path: self.root.clone()
        })?;
        let _ = self.created.set(());
        Ok(())
    }

    pub fn commit(&self, key: &PartitionKey, df: &DataFrame) -> anyhow::Result<Commit> {
        self.ensure_created()?;
        write_parquet_once(&self.path_for(key), df)
    }
}


/// Writes `df` to `dest` unless the file is already there.
///
/// Data goes to a hidden temporary file next to `dest` first and is moved into
/// place without replacing an existing file, so a partially written output is
/// never observed under the final name.
pub fn write_parquet_once(dest: &Path, df: &DataFrame) -> anyhow::Result<Commit> {
    let write_error = || OutputWriteError {
        path: dest.to_path_buf()
    };

    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new(".")
    };

    let file = tempfile::Builder::new()
        .prefix(".")
        .suffix(".parquet.tmp")
        .tempfile_in(dir)
        .with_context(write_error)?;

    write_parquet(&file, df).with_context(write_error)?;

    match file.persist_noclobber(dest) {
        Ok(_) => Ok(Commit::Written),
        Err(err) if err.error.kind() == ErrorKind::AlreadyExists => Ok(Commit::AlreadyExists),
        Err(err) => Err(err.error).with_context(write_error)
    }
}


fn write_parquet(file: &tempfile::NamedTempFile, df: &DataFrame) -> anyhow::Result<()> {
    let (schema, batches) = polars_df_to_record_batches(df, BATCH_SIZE)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::try_new(3)?))
        .set_max_row_group_size(ROW_GROUP_SIZE)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    for batch in batches.iter() {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(())
}
