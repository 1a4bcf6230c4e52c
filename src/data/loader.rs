use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, GraduateDataset, RawTable};

// ---------------------------------------------------------------------------
// RecordSource – where the survey table comes from
// ---------------------------------------------------------------------------

/// A tabular source of survey rows.
///
/// Fetching and parsing stay behind this trait; the pipeline only sees the
/// resulting [`GraduateDataset`].
pub trait RecordSource {
    /// Stable identity of the source, used as the cache key.
    fn identity(&self) -> String;

    /// Read the raw header and rows.
    fn load_table(&self) -> Result<RawTable>;

    /// Read and normalize into a dataset. Schema problems abort loading.
    fn load_dataset(&self) -> Result<GraduateDataset> {
        let table = self.load_table()?;
        GraduateDataset::from_raw_table(table)
            .with_context(|| format!("building dataset from {}", self.identity()))
    }
}

/// A survey table on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for FileSource {
    fn identity(&self) -> String {
        let path = std::fs::canonicalize(&self.path).unwrap_or_else(|_| self.path.clone());
        format!("file:{}", path.display())
    }

    fn load_table(&self) -> Result<RawTable> {
        load_file(&self.path)
    }
}

/// An in-memory table, for tests and demos.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    name: String,
    table: RawTable,
}

impl FixtureSource {
    pub fn new(name: impl Into<String>, table: RawTable) -> Self {
        Self {
            name: name.into(),
            table,
        }
    }
}

impl RecordSource for FixtureSource {
    fn identity(&self) -> String {
        format!("fixture:{}", self.name)
    }

    fn load_table(&self) -> Result<RawTable> {
        Ok(self.table.clone())
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a raw survey table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one row per (major, year)
/// * `.json`    – `[{ "Year": 2015, "Education.Major": "...", ... }, ...]`
/// * `.parquet` – flat scalar columns
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Read {} rows x {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut table = RawTable::new(headers);
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        table.push_row(record.iter().map(guess_cell_type).collect());
    }
    Ok(table)
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// The header is the union of keys in first-seen order; a key missing
/// from a row reads as null.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut objects = Vec::with_capacity(records.len());
    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let mut table = RawTable::new(headers);
    for obj in objects {
        let row = table
            .headers
            .iter()
            .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
            .collect();
        table.push_row(row);
    }
    Ok(table)
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of scalar columns, as written by Pandas
/// (`df.to_parquet()`) or Polars (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut table = RawTable::new(headers);
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| extract_cell(col, row))
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("parquet row {}", table.rows.len()))?;
            table.push_row(cells);
        }
    }
    Ok(table)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let cell = match col.data_type() {
        DataType::Utf8 => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(i64::from(col.as_primitive::<Int32Type>().value(row))),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(f64::from(col.as_primitive::<Float32Type>().value(row))),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_cells_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grads.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "Year,Education.Major,Demographics.Total,Salaries.Mean").unwrap();
        writeln!(f, "2015,\"Sales, Marketing\",1200,61000.5").unwrap();
        writeln!(f, "2013,Art,,").unwrap();
        drop(f);

        let table = load_file(&path).unwrap();
        assert_eq!(table.headers[1], "Education.Major");
        assert_eq!(
            table.rows[0],
            vec![
                CellValue::Integer(2015),
                CellValue::Text("Sales, Marketing".into()),
                CellValue::Integer(1200),
                CellValue::Float(61000.5),
            ]
        );
        assert_eq!(table.rows[1][2], CellValue::Null);
    }

    #[test]
    fn json_rows_share_one_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grads.json");
        std::fs::write(
            &path,
            r#"[{"Year": 2015, "Education.Major": "CS"}, {"Year": 2013, "Salaries.Mean": 1.5}]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.headers.len(), 3);
        let mean_idx = table.headers.iter().position(|h| h == "Salaries.Mean").unwrap();
        assert_eq!(table.rows[0][mean_idx], CellValue::Null);
        assert_eq!(table.rows[1][mean_idx], CellValue::Float(1.5));
    }

    #[test]
    fn json_must_be_an_array_of_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"Year": 2015}"#).unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_file(Path::new("grads.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn missing_file_propagates_io_error() {
        let source = FileSource::new("/definitely/not/here.csv");
        let err = source.load_dataset().unwrap_err();
        assert!(format!("{err:#}").contains("opening CSV"));
    }

    #[test]
    fn fixture_identity_is_stable() {
        let source = FixtureSource::new("tiny", RawTable::default());
        assert_eq!(source.identity(), "fixture:tiny");
        assert_eq!(source.identity(), source.identity());
    }
}
