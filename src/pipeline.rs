//! One recomputation pass, from selection criteria to chart views.
//!
//! ```text
//!  RecordSource ──► normalize ──► GraduateDataset (cached, immutable)
//!                                       │
//!                          validity gate ∧ year range ∧ majors
//!                                       │
//!                  ┌────────────────────┼─────────────────────┐
//!                  ▼                    ▼                     ▼
//!            line series        year snapshot ──►     salary samples
//!                               bar charts,           (all valid majors
//!                               gender split           of the year)
//! ```

use std::sync::Arc;

use rand::Rng;

use crate::color::MajorColors;
use crate::config::ExplorerConfig;
use crate::data::catalog::MetricGroup;
use crate::data::filter::{select_rows, RowMask, SelectionCriteria};
use crate::data::model::{GraduateDataset, GraduateRecord};
use crate::error::{PipelineError, PipelineResult};
use crate::selection::ActiveSelection;
use crate::synth::{self, SalarySamples};
use crate::views::{self, AxisScale, DashboardViews};

/// Everything the user has picked for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewRequest {
    pub criteria: SelectionCriteria,
    /// Year shown by the bar, gender and salary charts.
    pub year: i32,
    pub selection: ActiveSelection,
    pub scale: AxisScale,
}

pub struct Pipeline {
    dataset: Arc<GraduateDataset>,
    colors: MajorColors,
    sample_size: usize,
    histogram_bins: usize,
}

impl Pipeline {
    pub fn new(dataset: Arc<GraduateDataset>, config: &ExplorerConfig) -> Self {
        let colors = MajorColors::new(&dataset.majors);
        Self {
            dataset,
            colors,
            sample_size: config.sample_size,
            histogram_bins: config.histogram_bins,
        }
    }

    pub fn dataset(&self) -> &GraduateDataset {
        &self.dataset
    }

    pub fn colors(&self) -> &MajorColors {
        &self.colors
    }

    /// Validate the criteria against the dataset and compute the row mask.
    pub fn select(&self, criteria: &SelectionCriteria) -> PipelineResult<RowMask> {
        criteria.validate_against(&self.dataset)?;
        Ok(select_rows(&self.dataset.records, criteria))
    }

    /// All valid rows of `year`, regardless of the user's major filter.
    ///
    /// Fails with [`PipelineError::NoDataForYear`] when the validity gate
    /// leaves nothing for that year.
    pub fn valid_rows_for_year(&self, year: i32) -> PipelineResult<Vec<&GraduateRecord>> {
        let rows: Vec<&GraduateRecord> = self
            .dataset
            .records
            .iter()
            .filter(|r| r.year == year && r.is_valid())
            .collect();
        if rows.is_empty() {
            return Err(PipelineError::NoDataForYear(year));
        }
        Ok(rows)
    }

    /// Salary samples for every major surveyed in `year`.
    pub fn synthesize_salaries<R: Rng + ?Sized>(&self, year: i32, rng: &mut R) -> PipelineResult<SalarySamples> {
        let snapshot = self.valid_rows_for_year(year)?;
        let stats = views::salary_stats(&snapshot);
        synth::synthesize(&stats, self.sample_size, rng)
    }

    /// Build every view from already-synthesized salary samples.
    pub fn views(&self, request: &ViewRequest, samples: &SalarySamples) -> PipelineResult<DashboardViews> {
        self.valid_rows_for_year(request.year)?;

        let mask = self.select(&request.criteria)?;
        let rows = mask.apply(&self.dataset.records);
        let snapshot = views::year_snapshot(&rows, request.year);
        let selection = &request.selection;

        log::debug!(
            "recomputed views: {} of {} rows selected, {} in {}",
            rows.len(),
            self.dataset.len(),
            snapshot.len(),
            request.year
        );

        Ok(DashboardViews {
            year_range: request.criteria.year_range,
            year: request.year,
            scale: request.scale,
            selection: selection.clone(),
            selected_rows: rows.len(),
            lines: views::line_series(&rows, &self.colors, selection),
            employer_type: views::bar_chart(&self.dataset, &rows, MetricGroup::EmployerType, selection),
            work_activity: views::bar_chart(&self.dataset, &rows, MetricGroup::WorkActivity, selection),
            employment_status: views::bar_chart(
                &self.dataset,
                &rows,
                MetricGroup::EmploymentStatus,
                selection,
            ),
            employer_type_snapshot: views::snapshot_bars(
                &self.dataset,
                &snapshot,
                MetricGroup::EmployerType,
                selection,
            ),
            gender: views::gender_comparison(&self.dataset, &snapshot, selection),
            salaries: views::salary_distributions(
                samples,
                &snapshot,
                &self.colors,
                selection,
                self.histogram_bins,
            ),
        })
    }

    /// Full pass: synthesize salaries for the requested year, then build views.
    pub fn run<R: Rng + ?Sized>(&self, request: &ViewRequest, rng: &mut R) -> PipelineResult<DashboardViews> {
        let samples = self.synthesize_salaries(request.year, rng)?;
        self.views(request, &samples)
    }
}
