use crate::errors::{PartitionReadError, SchemaViolation};
use anyhow::Context;
use arrow::datatypes::{DataType, SchemaRef};
use parquet::arrow::arrow_reader::{ArrowReaderMetadata, ArrowReaderOptions};
use rollup_polars::prelude::{LazyFrame, ScanArgsParquet};
use rollup_primitives::Name;
use std::fs::File;
use std::path::PathBuf;


#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ColumnKind {
    Integer,
    Numeric,
    String,
    StringOrBinary
}


impl ColumnKind {
    pub fn accepts(&self, data_type: &DataType) -> bool {
        let integer = data_type.is_integer();
        let string = matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View);
        match self {
            Self::Integer => integer,
            Self::Numeric => integer || data_type.is_floating(),
            Self::String => string,
            Self::StringOrBinary => string || matches!(
                data_type,
                DataType::Binary | DataType::LargeBinary | DataType::BinaryView | DataType::FixedSizeBinary(_)
            )
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Integer => "an integer",
            Self::Numeric => "a number",
            Self::String => "a string",
            Self::StringOrBinary => "a string or binary"
        }
    }
}


#[derive(Debug, Copy, Clone)]
pub struct ColumnSpec {
    pub name: Name,
    pub kind: ColumnKind
}


const fn column(name: Name, kind: ColumnKind) -> ColumnSpec {
    ColumnSpec { name, kind }
}


pub const TRANSACTION_COLUMNS: &[ColumnSpec] = &[
    column("block_number", ColumnKind::Integer),
    column("from_address", ColumnKind::String),
];


pub const BLOCK_COLUMNS: &[ColumnSpec] = &[
    column("author", ColumnKind::StringOrBinary),
    column("block_number", ColumnKind::Integer),
    column("timestamp", ColumnKind::Integer),
    column("gas_used", ColumnKind::Numeric),
    column("base_fee_per_gas", ColumnKind::Numeric),
];


/// Parquet partition whose footer was read and checked.
///
/// Row data is only touched once the plan built from [`PartitionScan::to_lazy_df`]
/// is collected.
#[derive(Debug, Clone)]
pub struct PartitionScan {
    path: PathBuf,
    schema: SchemaRef
}


impl PartitionScan {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let read_error = || PartitionReadError {
            paths: vec![path.clone()]
        };

        let file = File::open(&path).with_context(read_error)?;
        let metadata = ArrowReaderMetadata::load(&file, ArrowReaderOptions::new())
            .with_context(read_error)?;

        Ok(Self {
            schema: metadata.schema().clone(),
            path
        })
    }

    pub fn require(self, columns: &[ColumnSpec]) -> anyhow::Result<Self> {
        for required in columns {
            let violation = |message: String| SchemaViolation {
                path: self.path.clone(),
                column: required.name.to_string(),
                message
            };
            let field = self.schema.field_with_name(required.name)
                .map_err(|_| violation("is missing".to_string()))?;
            if !required.kind.accepts(field.data_type()) {
                return Err(violation(format!(
                    "has type {}, expected {}",
                    field.data_type(),
                    required.kind.describe()
                )).into())
            }
        }
        Ok(self)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema.fields().iter().map(|f| f.name().clone()).collect()
    }

    pub fn to_lazy_df(&self) -> anyhow::Result<LazyFrame> {
        LazyFrame::scan_parquet(&self.path, ScanArgsParquet::default()).with_context(|| {
            PartitionReadError {
                paths: vec![self.path.clone()]
            }
        })
    }
}
