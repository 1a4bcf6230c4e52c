use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{GraduateDataset, GraduateRecord, YearRange};
use crate::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// SelectionCriteria – what the user asked for
// ---------------------------------------------------------------------------

/// Year interval and major set chosen by the user.
/// `None` / an empty set means "no constraint" for that predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    pub year_range: Option<YearRange>,
    pub selected_majors: BTreeSet<String>,
}

impl SelectionCriteria {
    pub fn new(year_range: Option<YearRange>, selected_majors: BTreeSet<String>) -> Self {
        Self {
            year_range,
            selected_majors,
        }
    }

    /// Reject a year range that falls outside the dataset's observed years.
    /// Nothing is clamped.
    pub fn validate_against(&self, dataset: &GraduateDataset) -> PipelineResult<()> {
        if let (Some(range), Some(bounds)) = (self.year_range, dataset.year_bounds) {
            if !range.within(&bounds) {
                return Err(PipelineError::YearRangeOutOfBounds {
                    min: range.min(),
                    max: range.max(),
                    lo: bounds.min(),
                    hi: bounds.max(),
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RowMask – boolean selection aligned with the record sequence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowMask(Vec<bool>);

impl RowMask {
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of rows marked `true`.
    pub fn count_selected(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    /// Element-wise AND. Both masks must describe the same records.
    pub fn and(&self, other: &RowMask) -> RowMask {
        debug_assert_eq!(self.len(), other.len());
        RowMask(self.0.iter().zip(&other.0).map(|(a, b)| *a && *b).collect())
    }

    /// Indices of selected rows, in order.
    pub fn indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Borrow the selected records, preserving order.
    pub fn apply<'a, T>(&self, records: &'a [T]) -> Vec<&'a T> {
        records
            .iter()
            .zip(&self.0)
            .filter(|&(_, &b)| b)
            .map(|(r, _)| r)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Mark rows whose total population was actually surveyed (`> 0`).
pub fn validity_gate(records: &[GraduateRecord]) -> RowMask {
    RowMask(records.iter().map(GraduateRecord::is_valid).collect())
}

/// Year-range and major-set mask.
///
/// A record passes when:
/// * `year_range` is `None`, or its year lies in the inclusive range, and
/// * `selected_majors` is empty, or contains the record's major.
///
/// The validity gate is not applied here; see [`select_rows`].
pub fn filter(
    records: &[GraduateRecord],
    year_range: Option<&YearRange>,
    selected_majors: &BTreeSet<String>,
) -> RowMask {
    RowMask(
        records
            .iter()
            .map(|r| {
                year_range.map_or(true, |range| range.contains(r.year))
                    && (selected_majors.is_empty() || selected_majors.contains(&r.major))
            })
            .collect(),
    )
}

/// Validity gate AND user criteria: the rows every chart is built from.
pub fn select_rows(records: &[GraduateRecord], criteria: &SelectionCriteria) -> RowMask {
    validity_gate(records).and(&filter(
        records,
        criteria.year_range.as_ref(),
        &criteria.selected_majors,
    ))
}
