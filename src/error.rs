use thiserror::Error;

// ---------------------------------------------------------------------------
// Schema errors – raised while turning a raw table into a dataset
// ---------------------------------------------------------------------------

/// The raw table cannot be turned into a [`GraduateDataset`](crate::data::model::GraduateDataset).
/// Always fatal to loading.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Two distinct raw column names map to the same canonical name.
    #[error("columns '{first}' and '{second}' both normalize to '{canonical}'")]
    Collision {
        canonical: String,
        first: String,
        second: String,
    },

    /// A column the pipeline relies on is absent.
    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    /// A row is shorter or longer than the header.
    #[error("row {row}: expected {expected} cells, found {found}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A cell could not be read as the type its column requires.
    #[error("row {row}, column '{column}': cannot read '{value}' as {expected}")]
    InvalidCell {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Pipeline errors – rejected inputs at the core boundary
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid year range: min {min} is greater than max {max}")]
    InvalidYearRange { min: i32, max: i32 },

    #[error("year range {min}..={max} lies outside the observed years {lo}..={hi}")]
    YearRangeOutOfBounds { min: i32, max: i32, lo: i32, hi: i32 },

    #[error("major '{major}': standard deviation {std_dev} must be finite and non-negative")]
    InvalidStdDev { major: String, std_dev: f64 },

    #[error("major '{major}': mean {mean} is not finite")]
    InvalidMean { major: String, mean: f64 },

    #[error("sample size must be greater than zero")]
    ZeroSampleSize,

    #[error("dataset has no rows with a positive total population")]
    EmptyDataset,

    #[error("no valid rows for year {0}")]
    NoDataForYear(i32),

    #[error("unknown major '{0}'")]
    UnknownMajor(String),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
