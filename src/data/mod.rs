/// Data layer: survey tables, column normalization, and row selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  RecordSource → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize  │  '.' → '_', collision check
///   └───────────┘
///        │
///        ▼
///   ┌─────────────────┐
///   │ GraduateDataset  │  Vec<GraduateRecord>, MetricCatalog
///   └─────────────────┘   (shared through the DatasetCache)
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  validity gate ∧ year range ∧ majors → RowMask
///   └──────────┘
/// ```

pub mod cache;
pub mod catalog;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
