use anyhow::ensure;
use arrow::array::{Array, ArrayRef, RecordBatch};
use arrow::datatypes::{Field, Schema, SchemaRef};
use polars::prelude::{DataFrame, Series};
use polars_core::prelude::CompatLevel;
use std::sync::Arc;


pub fn array_series(name: &str, arr: &dyn Array) -> anyhow::Result<Series> {
    let s = Series::from_arrow(
        name.into(),
        Box::<dyn polars_arrow::array::Array>::from(arr),
    )?;
    Ok(s)
}


pub fn record_batch_to_polars_df(batch: &RecordBatch) -> anyhow::Result<DataFrame> {
    let schema = batch.schema();
    let mut columns = Vec::with_capacity(batch.num_columns());
    for (field, column) in schema.fields().iter().zip(batch.columns()) {
        columns.push(array_series(field.name(), column)?);
    }
    Ok(DataFrame::from_iter(columns))
}


pub fn polars_series_to_arrow_array(series: &Series) -> anyhow::Result<ArrayRef> {
    let series = series.rechunk();
    ensure!(
        series.n_chunks() == 1,
        "series {} has {} chunks after rechunk",
        series.name(),
        series.n_chunks()
    );
    let polars_array = series.to_arrow(0, CompatLevel::oldest());
    Ok(ArrayRef::from(polars_array))
}


/// Converts the whole frame into a single record batch.
///
/// Column names and order are preserved, every field is nullable.
pub fn polars_df_to_record_batch(df: &DataFrame) -> anyhow::Result<RecordBatch> {
    let columns = df.iter()
        .map(polars_series_to_arrow_array)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let fields: Vec<Field> = df.iter()
        .zip(columns.iter())
        .map(|(series, array)| {
            Field::new(series.name().as_str(), array.data_type().clone(), true)
        })
        .collect();

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(batch)
}


/// Splits the frame into record batches of at most `batch_size` rows.
///
/// Yields at least one (possibly empty) batch, so that the schema of an empty
/// frame is still known to the consumer.
pub fn polars_df_to_record_batches(
    df: &DataFrame,
    batch_size: usize
) -> anyhow::Result<(SchemaRef, Vec<RecordBatch>)>
{
    ensure!(batch_size > 0, "batch size must be positive");
    let height = df.height();
    let mut batches = Vec::with_capacity(height / batch_size + 1);
    let mut offset = 0;
    loop {
        let len = std::cmp::min(height - offset, batch_size);
        let slice = df.slice(offset as i64, len);
        batches.push(polars_df_to_record_batch(&slice)?);
        offset += len;
        if offset >= height {
            break
        }
    }
    let schema = batches[0].schema();
    Ok((schema, batches))
}
