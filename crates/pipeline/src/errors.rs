use rollup_primitives::PartitionKey;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;


#[derive(Debug)]
pub struct MismatchedPartitionCount {
    pub transactions: usize,
    pub blocks: usize
}


impl Display for MismatchedPartitionCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "found {} transaction partitions, but {} block partitions",
            self.transactions,
            self.blocks
        )
    }
}


impl std::error::Error for MismatchedPartitionCount {}


#[derive(Debug)]
pub struct DuplicatePartitionKey {
    pub key: PartitionKey,
    pub first: PathBuf,
    pub second: PathBuf
}


impl Display for DuplicatePartitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "partition {} is claimed by both {} and {}",
            self.key,
            self.first.display(),
            self.second.display()
        )
    }
}


impl std::error::Error for DuplicatePartitionKey {}


#[derive(Debug)]
pub struct PartitionReadError {
    pub paths: Vec<PathBuf>
}


impl Display for PartitionReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to read partition data from ")?;
        for (i, path) in self.paths.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}


impl std::error::Error for PartitionReadError {}


#[derive(Debug)]
pub struct SchemaViolation {
    pub path: PathBuf,
    pub column: String,
    pub message: String
}


impl Display for SchemaViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: column {}: {}", self.path.display(), self.column, self.message)
    }
}


impl std::error::Error for SchemaViolation {}


#[derive(Debug)]
pub struct OutputWriteError {
    pub path: PathBuf
}


impl Display for OutputWriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to write {}", self.path.display())
    }
}


impl std::error::Error for OutputWriteError {}


/// Coarse classification of a failed partition task
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailureKind {
    PartitionRead,
    SchemaViolation,
    OutputWrite,
    Other
}


impl FailureKind {
    pub fn of(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<SchemaViolation>().is_some() {
            Self::SchemaViolation
        } else if err.downcast_ref::<PartitionReadError>().is_some() {
            Self::PartitionRead
        } else if err.downcast_ref::<OutputWriteError>().is_some() {
            Self::OutputWrite
        } else {
            Self::Other
        }
    }
}


impl Display for FailureKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PartitionRead => "PartitionReadError",
            Self::SchemaViolation => "SchemaViolation",
            Self::OutputWrite => "OutputWriteError",
            Self::Other => "Other"
        };
        f.write_str(name)
    }
}
