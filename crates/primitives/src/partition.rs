use crate::BlockNumber;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;


/// Block range `[start, end)` identifying a partition file.
///
/// Partition files carry their key in the name, e.g.
/// `ethereum__transactions__18000000_to_18000999.parquet`.
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct PartitionKey {
    pub start: BlockNumber,
    pub end: BlockNumber
}


impl PartitionKey {
    pub fn new(start: BlockNumber, end: BlockNumber) -> Self {
        Self { start, end }
    }

    /// Extracts the first `__{start}_to_{end}` occurrence from a file name.
    pub fn find_in(file_name: &str) -> Option<Self> {
        static RE: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"__(\d+)_to_(\d+)").unwrap()
        });

        let caps = RE.captures(file_name)?;
        let start = caps[1].parse().ok()?;
        let end = caps[2].parse().ok()?;
        Some(Self { start, end })
    }

    /// Name of the derived file holding this partition, e.g. `100_to_200.parquet`
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self, extension)
    }
}


impl Display for PartitionKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_to_{}", self.start, self.end)
    }
}
