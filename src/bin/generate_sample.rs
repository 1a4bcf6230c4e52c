use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const SEED: u64 = 42;

/// Survey years of the graduate survey.
const YEARS: [i64; 5] = [2010, 2013, 2015, 2017, 2019];

const MAJORS: [(&str, f64); 14] = [
    ("Biological Sciences", 52000.0),
    ("Chemical Engineering", 88000.0),
    ("Computer Science and Math", 84000.0),
    ("Economics", 71000.0),
    ("Management & Administration", 63000.0),
    ("Mechanical Engineering", 86000.0),
    ("Information Services and Systems", 74000.0),
    ("Oceanography", 58000.0),
    ("Political Science and Government", 60000.0),
    ("Public Policy Studies", 57000.0),
    ("Statistics", 79000.0),
    ("Art and Humanities", 44000.0),
    ("Psychology", 47000.0),
    ("Physics and Astronomy", 76000.0),
];

const EMPLOYER_TYPES: [&str; 3] = ["Business/Industry", "Educational Institution", "Government"];

const WORK_ACTIVITIES: [&str; 8] = [
    "Accounting/Finance/Contracts",
    "Applied Research",
    "Basic Research",
    "Computer Applications",
    "Design",
    "Human Resources",
    "Managing/Supervising People/Projects",
    "Sales, Purchasing, Marketing",
];

const ETHNICITIES: [&str; 4] = ["Asians", "Blacks", "Hispanics", "Whites"];

/// One generated survey row. `values` is aligned with [`metric_columns`].
struct SampleRow {
    year: i64,
    major: &'static str,
    total: i64,
    values: Vec<f64>,
    salary_mean: f64,
    salary_std_dev: f64,
}

/// Raw ('.'-separated) names of the metric columns between the total and the
/// salary columns.
fn metric_columns() -> Vec<String> {
    let mut cols = vec![
        "Demographics.Gender.Males".to_string(),
        "Demographics.Gender.Females".to_string(),
    ];
    cols.extend(ETHNICITIES.iter().map(|e| format!("Demographics.Ethnicity.{e}")));
    cols.push("Education.Degrees.Bachelors".into());
    cols.push("Education.Degrees.Masters".into());
    cols.extend(EMPLOYER_TYPES.iter().map(|t| format!("Employment.Employer Type.{t}")));
    cols.extend(WORK_ACTIVITIES.iter().map(|a| format!("Employment.Work Activity.{a}")));
    cols.push("Employment.Status.Employed".into());
    cols.push("Employment.Status.Unemployed".into());
    cols
}

/// Split `total` into `parts` random shares that sum to it.
fn split(total: i64, parts: usize, rng: &mut StdRng) -> Vec<f64> {
    let weights: Vec<f64> = (0..parts).map(|_| rng.random_range(0.2..1.0)).collect();
    let sum: f64 = weights.iter().sum();
    weights.iter().map(|w| (total as f64 * w / sum).round()).collect()
}

fn generate_rows(rng: &mut StdRng) -> Result<Vec<SampleRow>> {
    let jitter = Normal::new(1.0, 0.04).context("salary jitter distribution")?;
    let n_metrics = metric_columns().len();
    let mut rows = Vec::new();

    for &(major, base_salary) in &MAJORS {
        let base_population: i64 = rng.random_range(50..5000);
        for (i, &year) in YEARS.iter().enumerate() {
            // A few majors are missing from some surveys; those rows keep a
            // zero total and must be dropped by the validity gate.
            if rng.random_bool(0.06) {
                rows.push(SampleRow {
                    year,
                    major,
                    total: 0,
                    values: vec![0.0; n_metrics],
                    salary_mean: 0.0,
                    salary_std_dev: 0.0,
                });
                continue;
            }

            let growth = 1.0 + 0.05 * i as f64;
            let total = (base_population as f64 * growth * jitter.sample(rng)).round().max(1.0) as i64;

            let mut values = split(total, 2, rng);
            values.extend(split(total, ETHNICITIES.len(), rng));
            let masters = (total as f64 * rng.random_range(0.1..0.4)).round();
            values.push(total as f64 - masters);
            values.push(masters);
            let employed = (total as f64 * rng.random_range(0.85..0.97)).round();
            values.extend(split(employed as i64, EMPLOYER_TYPES.len(), rng));
            values.extend(split(employed as i64, WORK_ACTIVITIES.len(), rng));
            values.push(employed);
            values.push(total as f64 - employed);

            let salary_mean = (base_salary * (1.0 + 0.02 * i as f64) * jitter.sample(rng)).round();
            rows.push(SampleRow {
                year,
                major,
                total,
                values,
                salary_mean,
                salary_std_dev: (salary_mean * rng.random_range(0.12..0.25)).round(),
            });
        }
    }
    Ok(rows)
}

fn build_batch(rows: &[SampleRow]) -> Result<RecordBatch> {
    let metrics = metric_columns();

    let mut fields = vec![
        Field::new("Year", DataType::Int64, false),
        Field::new("Education.Major", DataType::Utf8, false),
        Field::new("Demographics.Total", DataType::Int64, false),
    ];
    fields.extend(metrics.iter().map(|name| Field::new(name, DataType::Float64, false)));
    fields.push(Field::new("Salaries.Mean", DataType::Float64, false));
    fields.push(Field::new("Salaries.Standard Deviation", DataType::Float64, false));

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.year))),
        Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.major))),
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.total))),
    ];
    for idx in 0..metrics.len() {
        columns.push(Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.values[idx]),
        )));
    }
    columns.push(Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.salary_mean))));
    columns.push(Arc::new(Float64Array::from_iter_values(
        rows.iter().map(|r| r.salary_std_dev),
    )));

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context("building record batch")
}

fn write_csv(batch: &RecordBatch, rows: &[SampleRow], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(batch.schema().fields().iter().map(|f| f.name().as_str()))?;
    for row in rows {
        let mut record = vec![row.year.to_string(), row.major.to_string(), row.total.to_string()];
        record.extend(row.values.iter().map(|v| v.to_string()));
        record.push(row.salary_mean.to_string());
        record.push(row.salary_std_dev.to_string());
        writer.write_record(&record)?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
    writer.write(batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

/// Write a synthetic graduates survey table as CSV and Parquet.
///
/// Usage: `generate_sample [OUTPUT_DIR]`
fn main() -> Result<()> {
    env_logger::init();

    let out_dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let mut rng = StdRng::seed_from_u64(SEED);

    let rows = generate_rows(&mut rng)?;
    let batch = build_batch(&rows)?;

    let csv_path = out_dir.join("graduates.csv");
    let parquet_path = out_dir.join("graduates.parquet");
    write_csv(&batch, &rows, &csv_path)?;
    write_parquet(&batch, &parquet_path)?;

    let preview = arrow::util::pretty::pretty_format_batches(&[batch.slice(0, 5.min(batch.num_rows()))])
        .context("formatting preview")?;
    log::debug!("first rows:\n{preview}");

    println!(
        "Wrote {} rows ({} majors, {} columns) to {} and {}",
        rows.len(),
        MAJORS.len(),
        batch.num_columns(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
