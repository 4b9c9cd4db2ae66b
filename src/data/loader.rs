use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{AttrValue, Dataset, RawTable};
use crate::error::DataLoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a listings dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` – first worksheet, header in the first row
/// * `.csv`           – header row with column names
/// * `.json`          – `[{ "url": ..., "city": ..., ... }, ...]`
/// * `.parquet`       – one column per attribute
///
/// Extra columns are ignored; every schema column must be present.
pub fn load_file(path: &Path) -> Result<Dataset, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" => read_spreadsheet(path)?,
        "csv" => read_csv(path)?,
        "json" => read_json(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => return Err(DataLoadError::UnsupportedFormat(other.to_string())),
    };

    let dataset = Dataset::from_table(table)?;
    log::info!("Loaded {} listings from {}", dataset.len(), path.display());
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

fn read_spreadsheet(path: &Path) -> Result<RawTable, DataLoadError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DataLoadError::Malformed("workbook has no worksheets".into()))??;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| DataLoadError::Malformed("worksheet is empty".into()))?;
    let columns = header.iter().map(|c| c.to_string()).collect();
    let rows = rows.map(|r| r.iter().map(spreadsheet_cell).collect()).collect();

    Ok(RawTable { columns, rows })
}

fn spreadsheet_cell(cell: &Data) -> AttrValue {
    match cell {
        Data::Empty => AttrValue::Null,
        Data::Int(v) => AttrValue::Number(*v as f64),
        Data::Float(v) => AttrValue::Number(*v),
        Data::String(s) => AttrValue::Text(s.clone()),
        Data::Bool(b) => AttrValue::Text(b.to_string()),
        Data::Error(_) => AttrValue::Null,
        Data::DateTime(v) => AttrValue::Number(v.as_f64()),
        other => AttrValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Cells are kept as text; the schema decides how each column is typed.
fn read_csv(path: &Path) -> Result<RawTable, DataLoadError> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|s| if s.is_empty() { AttrValue::Null } else { AttrValue::Text(s.to_string()) })
                .collect(),
        );
    }

    Ok(RawTable { columns, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// The column set is the union of keys, in first-seen order.
fn read_json(path: &Path) -> Result<RawTable, DataLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text)?;
    let records = root
        .as_array()
        .ok_or_else(|| DataLoadError::Malformed("expected top-level JSON array".into()))?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| DataLoadError::Malformed(format!("row {i} is not a JSON object")))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(JsonValue::as_object)
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_cell).unwrap_or(AttrValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_cell(val: &JsonValue) -> AttrValue {
    match val {
        JsonValue::String(s) => AttrValue::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map(AttrValue::Number).unwrap_or(AttrValue::Null),
        JsonValue::Bool(b) => AttrValue::Text(b.to_string()),
        JsonValue::Null => AttrValue::Null,
        other => AttrValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by Pandas (`df.to_parquet()`), Polars, and the
/// bundled `generate_sample` binary.
fn read_parquet(path: &Path) -> Result<RawTable, DataLoadError> {
    let file = std::fs::File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut columns: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let schema = batch.schema();
        let names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
        match &columns {
            None => columns = Some(names),
            Some(existing) if *existing != names => {
                return Err(DataLoadError::Malformed("record batches disagree on schema".into()));
            }
            Some(_) => {}
        }

        let decoded = batch
            .columns()
            .iter()
            .map(decode_column)
            .collect::<Result<Vec<_>, _>>()?;
        for row in 0..batch.num_rows() {
            rows.push(decoded.iter().map(|col| arrow_cell(col, row)).collect());
        }
    }

    Ok(RawTable {
        columns: columns.unwrap_or_default(),
        rows,
    })
}

/// Flatten dictionary-encoded (Pandas categoricals) and view string columns
/// into the plain layouts `arrow_cell` reads.
fn decode_column(col: &ArrayRef) -> Result<ArrayRef, DataLoadError> {
    let target = match col.data_type() {
        DataType::Dictionary(_, value) if **value == DataType::Utf8View => DataType::Utf8,
        DataType::Dictionary(_, value) => value.as_ref().clone(),
        DataType::Utf8View => DataType::Utf8,
        _ => return Ok(Arc::clone(col)),
    };
    Ok(cast(col, &target)?)
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> AttrValue {
    if col.is_null(row) {
        return AttrValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => Some(AttrValue::Text(col.as_string::<i32>().value(row).to_string())),
        DataType::LargeUtf8 => Some(AttrValue::Text(col.as_string::<i64>().value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| AttrValue::Number(a.value(row) as f64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| AttrValue::Number(a.value(row) as f64)),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| AttrValue::Number(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| AttrValue::Number(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| AttrValue::Text(a.value(row).to_string())),
        other => {
            log::warn!("unsupported Parquet column type {other:?}; cell treated as missing");
            None
        }
    };
    value.unwrap_or(AttrValue::Null)
}
