use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::catalog::{MetricCatalog, MetricKey};
use super::normalize::{canonical_name, normalize_columns, ColumnMapping};
use crate::error::{PipelineError, PipelineResult, SchemaError};

/// Canonical names of the columns every dataset must carry.
pub const YEAR_COLUMN: &str = "Year";
pub const MAJOR_COLUMN: &str = "Education_Major";
pub const TOTAL_COLUMN: &str = "Demographics_Total";
pub const SALARY_MEAN_COLUMN: &str = "Salaries_Mean";
pub const SALARY_STD_DEV_COLUMN: &str = "Salaries_Standard Deviation";

const REQUIRED_COLUMNS: [&str; 5] = [
    YEAR_COLUMN,
    MAJOR_COLUMN,
    TOTAL_COLUMN,
    SALARY_MEAN_COLUMN,
    SALARY_STD_DEV_COLUMN,
];

// ---------------------------------------------------------------------------
// CellValue – a single cell of the raw source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as produced by the file readers.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64`. Text is parsed; `Null` yields `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Text(s) => s.trim().parse().ok(),
            CellValue::Null => None,
        }
    }

    /// Interpret the value as a calendar year. Floats must be integral.
    pub fn as_year(&self) -> Option<i32> {
        match self {
            CellValue::Integer(i) => i32::try_from(*i).ok(),
            CellValue::Float(v)
                if v.is_finite()
                    && v.fract() == 0.0
                    && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(v) =>
            {
                Some(*v as i32)
            }
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<String> {
        match self {
            CellValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            CellValue::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// RawTable – header + rows straight from a source, before normalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }
}

// ---------------------------------------------------------------------------
// YearRange – inclusive interval of calendar years
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawYearRange")]
pub struct YearRange {
    min: i32,
    max: i32,
}

/// Wire form of [`YearRange`]; deserialization goes through [`YearRange::new`].
#[derive(Deserialize)]
struct RawYearRange {
    min: i32,
    max: i32,
}

impl TryFrom<RawYearRange> for YearRange {
    type Error = PipelineError;

    fn try_from(raw: RawYearRange) -> PipelineResult<Self> {
        YearRange::new(raw.min, raw.max)
    }
}

impl YearRange {
    /// Build an inclusive range. Bounds are never swapped.
    pub fn new(min: i32, max: i32) -> PipelineResult<Self> {
        if min > max {
            return Err(PipelineError::InvalidYearRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn single(year: i32) -> Self {
        Self {
            min: year,
            max: year,
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, year: i32) -> bool {
        self.min <= year && year <= self.max
    }

    /// Whether `self` lies entirely inside `outer`.
    pub fn within(&self, outer: &YearRange) -> bool {
        outer.min <= self.min && self.max <= outer.max
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// GraduateRecord – one (major, year) row
// ---------------------------------------------------------------------------

/// One survey row. Immutable once the dataset is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraduateRecord {
    pub year: i32,
    pub major: String,
    pub total_population: f64,
    pub salary_mean: f64,
    pub salary_std_dev: f64,
    /// Every numeric column by canonical name, including the ones above.
    pub metrics: BTreeMap<String, f64>,
}

impl GraduateRecord {
    /// A bare record with no salary information and no extra metrics.
    pub fn new(major: impl Into<String>, year: i32, total_population: f64) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert(TOTAL_COLUMN.to_string(), total_population);
        Self {
            year,
            major: major.into(),
            total_population,
            salary_mean: 0.0,
            salary_std_dev: 0.0,
            metrics,
        }
    }

    pub fn with_salary(mut self, mean: f64, std_dev: f64) -> Self {
        self.salary_mean = mean;
        self.salary_std_dev = std_dev;
        self.metrics.insert(SALARY_MEAN_COLUMN.to_string(), mean);
        self.metrics.insert(SALARY_STD_DEV_COLUMN.to_string(), std_dev);
        self
    }

    pub fn with_metric(mut self, canonical: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(canonical.into(), value);
        self
    }

    /// Value of a numeric column by canonical name.
    pub fn metric(&self, canonical: &str) -> Option<f64> {
        self.metrics.get(canonical).copied()
    }

    /// Passes the validity gate: the population was surveyed that year.
    pub fn is_valid(&self) -> bool {
        self.total_population > 0.0
    }
}

// ---------------------------------------------------------------------------
// GraduateDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The parsed dataset with its column mapping, metric catalog and indices.
#[derive(Debug, Clone)]
pub struct GraduateDataset {
    pub records: Vec<GraduateRecord>,
    pub columns: ColumnMapping,
    pub catalog: MetricCatalog,
    /// Sorted majors appearing in at least one valid row.
    pub majors: Vec<String>,
    /// Observed years over valid rows.
    pub year_bounds: Option<YearRange>,
}

impl GraduateDataset {
    /// Normalize the header, check required columns and parse every row.
    ///
    /// Empty numeric cells read as "not tracked": `0` for the total and
    /// salary columns, absent for the other metrics.
    pub fn from_raw_table(table: RawTable) -> Result<Self, SchemaError> {
        let columns = normalize_columns(&table.headers)?;

        let require = |name: &str| {
            columns
                .index_of(name)
                .ok_or_else(|| SchemaError::MissingColumn(name.to_string()))
        };
        for name in REQUIRED_COLUMNS {
            require(name)?;
        }
        let year_idx = require(YEAR_COLUMN)?;
        let major_idx = require(MAJOR_COLUMN)?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (row_no, row) in table.rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SchemaError::RowWidth {
                    row: row_no,
                    expected: columns.len(),
                    found: row.len(),
                });
            }

            let invalid = |idx: usize, expected: &'static str| SchemaError::InvalidCell {
                row: row_no,
                column: columns.columns()[idx].raw.clone(),
                value: row[idx].to_string(),
                expected,
            };

            let year = row[year_idx]
                .as_year()
                .ok_or_else(|| invalid(year_idx, "a year"))?;
            let major = row[major_idx]
                .as_label()
                .ok_or_else(|| invalid(major_idx, "a major label"))?;

            let mut metrics = BTreeMap::new();
            for (idx, cell) in row.iter().enumerate() {
                if idx == year_idx || idx == major_idx || cell.is_null() {
                    continue;
                }
                let value = cell.as_f64().ok_or_else(|| invalid(idx, "a number"))?;
                metrics.insert(columns.columns()[idx].canonical.clone(), value);
            }

            let numeric = |name: &str| metrics.get(name).copied().unwrap_or(0.0);
            let total_population = numeric(TOTAL_COLUMN);
            let salary_mean = numeric(SALARY_MEAN_COLUMN);
            let salary_std_dev = numeric(SALARY_STD_DEV_COLUMN);
            records.push(GraduateRecord {
                year,
                major,
                total_population,
                salary_mean,
                salary_std_dev,
                metrics,
            });
        }

        let catalog = MetricCatalog::from_mapping(&columns);
        Ok(Self::assemble(records, columns, catalog))
    }

    /// Build a dataset directly from records, e.g. for fixtures. The column
    /// mapping and catalog are derived from the metric names present, and
    /// dotted metric names are rewritten to their canonical form.
    pub fn from_records(records: Vec<GraduateRecord>) -> Result<Self, SchemaError> {
        let mut names: BTreeSet<String> = BTreeSet::new();
        for record in &records {
            names.extend(record.metrics.keys().cloned());
        }
        let mut headers = vec![YEAR_COLUMN.to_string(), MAJOR_COLUMN.to_string()];
        headers.extend(names);
        let columns = normalize_columns(&headers)?;

        let records = records
            .into_iter()
            .map(|mut record| {
                record.metrics = std::mem::take(&mut record.metrics)
                    .into_iter()
                    .map(|(name, value)| (canonical_name(&name), value))
                    .collect();
                record
            })
            .collect();

        let catalog = MetricCatalog::from_mapping(&columns);
        Ok(Self::assemble(records, columns, catalog))
    }

    fn assemble(records: Vec<GraduateRecord>, columns: ColumnMapping, catalog: MetricCatalog) -> Self {
        let majors: BTreeSet<&str> = records
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| r.major.as_str())
            .collect();
        let majors = majors.into_iter().map(str::to_string).collect();

        let year_bounds = records
            .iter()
            .filter(|r| r.is_valid())
            .fold(None, |bounds: Option<YearRange>, r| match bounds {
                None => Some(YearRange::single(r.year)),
                Some(b) => Some(YearRange {
                    min: b.min.min(r.year),
                    max: b.max.max(r.year),
                }),
            });

        GraduateDataset {
            records,
            columns,
            catalog,
            majors,
            year_bounds,
        }
    }

    /// Value of a semantic metric for one record.
    pub fn value(&self, record: &GraduateRecord, key: &MetricKey) -> Option<f64> {
        self.catalog
            .column(key)
            .and_then(|column| record.metric(column))
    }

    pub fn has_major(&self, major: &str) -> bool {
        self.majors.binary_search_by(|m| m.as_str().cmp(major)).is_ok()
    }

    /// Sorted distinct years among valid rows.
    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .records
            .iter()
            .filter(|r| r.is_valid())
            .map(|r| r.year)
            .collect();
        years.into_iter().collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::MetricGroup;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn survey_table() -> RawTable {
        let mut table = RawTable::new(
            [
                "Year",
                "Education.Major",
                "Demographics.Total",
                "Employment.Employer Type.Government",
                "Salaries.Mean",
                "Salaries.Standard Deviation",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        );
        table.push_row(vec![
            CellValue::Integer(2012),
            text("Statistics"),
            CellValue::Integer(1200),
            CellValue::Integer(300),
            CellValue::Float(61000.0),
            CellValue::Float(9000.0),
        ]);
        table.push_row(vec![
            text("2015"),
            text("Oceanography"),
            CellValue::Integer(0),
            CellValue::Null,
            CellValue::Integer(0),
            CellValue::Integer(0),
        ]);
        table.push_row(vec![
            CellValue::Float(2015.0),
            text("Economics"),
            text("800"),
            text("120.5"),
            CellValue::Float(58000.0),
            CellValue::Null,
        ]);
        table
    }

    #[test]
    fn builds_records_from_raw_table() {
        let ds = GraduateDataset::from_raw_table(survey_table()).unwrap();
        assert_eq!(ds.len(), 3);

        let stats = &ds.records[0];
        assert_eq!(stats.year, 2012);
        assert_eq!(stats.major, "Statistics");
        assert_eq!(stats.total_population, 1200.0);
        assert_eq!(stats.salary_mean, 61000.0);
        assert_eq!(stats.salary_std_dev, 9000.0);

        let econ = &ds.records[2];
        assert_eq!(econ.year, 2015);
        assert_eq!(econ.total_population, 800.0);
        assert_eq!(econ.salary_std_dev, 0.0);

        let gov = MetricKey::new(MetricGroup::EmployerType, "Government");
        assert_eq!(ds.value(econ, &gov), Some(120.5));
        assert_eq!(ds.value(&ds.records[1], &gov), None);
    }

    #[test]
    fn majors_and_bounds_cover_valid_rows_only() {
        let ds = GraduateDataset::from_raw_table(survey_table()).unwrap();
        assert_eq!(ds.majors, vec!["Economics", "Statistics"]);
        assert!(!ds.has_major("Oceanography"));
        assert_eq!(ds.year_bounds, Some(YearRange::new(2012, 2015).unwrap()));
        assert_eq!(ds.years(), vec![2012, 2015]);
    }

    #[test]
    fn missing_required_column_is_a_schema_error() {
        let mut table = survey_table();
        table.headers[4] = "Salaries.Median".to_string();
        let err = GraduateDataset::from_raw_table(table).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn(SALARY_MEAN_COLUMN.to_string()));
    }

    #[test]
    fn collision_aborts_loading() {
        let mut table = survey_table();
        table.headers[3] = "Demographics_Total".to_string();
        assert!(matches!(
            GraduateDataset::from_raw_table(table),
            Err(SchemaError::Collision { .. })
        ));
    }

    #[test]
    fn unparsable_cells_are_reported() {
        let mut table = survey_table();
        table.rows[0][2] = text("lots");
        let err = GraduateDataset::from_raw_table(table).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidCell { row: 0, .. }), "{err}");

        let mut table = survey_table();
        table.rows[1].pop();
        assert!(matches!(
            GraduateDataset::from_raw_table(table),
            Err(SchemaError::RowWidth { row: 1, expected: 6, found: 5 })
        ));
    }

    #[test]
    fn year_range_rejects_inverted_bounds() {
        assert_eq!(
            YearRange::new(2015, 2010),
            Err(PipelineError::InvalidYearRange { min: 2015, max: 2010 })
        );
        let range = YearRange::new(2010, 2014).unwrap();
        assert!(range.contains(2010) && range.contains(2014));
        assert!(!range.contains(2015));
        assert!(YearRange::single(2012).within(&range));
    }

    #[test]
    fn fixture_dataset_from_records() {
        let ds = GraduateDataset::from_records(vec![
            GraduateRecord::new("CS", 2012, 100.0).with_salary(50000.0, 0.0),
            GraduateRecord::new("Art", 2013, 0.0),
        ])
        .unwrap();
        assert_eq!(ds.majors, vec!["CS"]);
        assert_eq!(ds.year_bounds, Some(YearRange::single(2012)));
        let mean = MetricKey::new(MetricGroup::Salaries, "Mean");
        assert_eq!(ds.value(&ds.records[0], &mean), Some(50000.0));
    }

    #[test]
    fn year_range_deserializes_through_the_constructor() {
        let range: YearRange = serde_json::from_str(r#"{"min":2010,"max":2014}"#).unwrap();
        assert_eq!(range, YearRange::new(2010, 2014).unwrap());

        let err = serde_json::from_str::<YearRange>(r#"{"min":2015,"max":2010}"#).unwrap_err();
        assert!(err.to_string().contains("invalid year range"), "{err}");
    }

    #[test]
    fn out_of_range_float_years_are_invalid_cells() {
        assert_eq!(CellValue::Float(2013.0).as_year(), Some(2013));
        assert_eq!(CellValue::Float(1e12).as_year(), None);
        assert_eq!(CellValue::Float(-1e12).as_year(), None);

        let mut table = survey_table();
        table.rows[0][0] = CellValue::Float(1e12);
        assert!(matches!(
            GraduateDataset::from_raw_table(table),
            Err(SchemaError::InvalidCell { row: 0, expected: "a year", .. })
        ));
    }

    #[test]
    fn dotted_metric_names_are_canonicalized_in_fixtures() {
        let ds = GraduateDataset::from_records(vec![GraduateRecord::new("CS", 2012, 100.0)
            .with_metric("Employment.Employer Type.Government", 5.0)])
        .unwrap();
        let gov = MetricKey::new(MetricGroup::EmployerType, "Government");
        assert_eq!(ds.catalog.column(&gov), Some("Employment_Employer Type_Government"));
        assert_eq!(ds.value(&ds.records[0], &gov), Some(5.0));
        assert!(ds.records[0].metrics.keys().all(|k| !k.contains('.')));
    }

    #[test]
    fn fixture_metrics_collapsing_to_one_name_collide() {
        let result = GraduateDataset::from_records(vec![
            GraduateRecord::new("CS", 2012, 100.0).with_metric("Employment.Status.Employed", 80.0),
            GraduateRecord::new("Art", 2012, 50.0).with_metric("Employment_Status_Employed", 40.0),
        ]);
        assert!(matches!(
            result,
            Err(SchemaError::Collision { canonical, .. }) if canonical == "Employment_Status_Employed"
        ));
    }
}
