use std::collections::BTreeSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::ExplorerConfig;
use crate::data::filter::SelectionCriteria;
use crate::data::model::{GraduateDataset, YearRange};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{Pipeline, ViewRequest};
use crate::selection::{ActiveSelection, Interaction};
use crate::synth::SalarySamples;
use crate::views::{AxisScale, DashboardViews};

// ---------------------------------------------------------------------------
// Dashboard session state
// ---------------------------------------------------------------------------

/// The full dashboard state, independent of rendering.
///
/// The rendering surface owns one of these, mutates it from user input and
/// asks it for [`DashboardViews`].
pub struct DashboardSession {
    pipeline: Pipeline,

    /// Year range and majors picked in the filter widgets.
    pub criteria: SelectionCriteria,

    /// Year picked for the single-year charts.
    year: i32,

    /// Major highlighted from the line chart.
    pub selection: ActiveSelection,

    pub scale: AxisScale,

    rng: StdRng,

    /// Salary samples of the year they were drawn for.
    salary_cache: Option<(i32, SalarySamples)>,
}

impl DashboardSession {
    /// Open a session with the dashboard defaults: the full observed year
    /// range, the configured default majors that exist in the data, and the
    /// latest observed year.
    pub fn new(dataset: Arc<GraduateDataset>, config: &ExplorerConfig) -> PipelineResult<Self> {
        let bounds = dataset.year_bounds.ok_or(PipelineError::EmptyDataset)?;

        let mut majors = BTreeSet::new();
        for major in &config.default_majors {
            if dataset.has_major(major) {
                majors.insert(major.clone());
            } else {
                log::warn!("default major '{major}' is not in the dataset, skipping");
            }
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            pipeline: Pipeline::new(dataset, config),
            criteria: SelectionCriteria::new(Some(bounds), majors),
            year: bounds.max(),
            selection: ActiveSelection::Unselected,
            scale: AxisScale::Linear,
            rng,
            salary_cache: None,
        })
    }

    pub fn dataset(&self) -> &GraduateDataset {
        self.pipeline.dataset()
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Change the year range. Out-of-bounds or inverted ranges are rejected
    /// and the previous range is kept.
    pub fn set_year_range(&mut self, min: i32, max: i32) -> PipelineResult<()> {
        let candidate = SelectionCriteria::new(
            Some(YearRange::new(min, max)?),
            self.criteria.selected_majors.clone(),
        );
        candidate.validate_against(self.dataset())?;
        self.criteria = candidate;
        Ok(())
    }

    pub fn clear_year_range(&mut self) {
        self.criteria.year_range = None;
    }

    /// Toggle a single major in the multi-select.
    pub fn toggle_major(&mut self, major: &str) -> PipelineResult<()> {
        if !self.dataset().has_major(major) {
            return Err(PipelineError::UnknownMajor(major.to_string()));
        }
        let selected = &mut self.criteria.selected_majors;
        if !selected.remove(major) {
            selected.insert(major.to_string());
        }
        Ok(())
    }

    /// Explicitly list every major.
    pub fn select_all_majors(&mut self) {
        self.criteria.selected_majors = self.dataset().majors.iter().cloned().collect();
    }

    /// Empty the multi-select, which lifts the major constraint.
    pub fn select_no_majors(&mut self) {
        self.criteria.selected_majors.clear();
    }

    /// Pick the year for the single-year charts. Salary samples are drawn
    /// again only when the year actually changes.
    pub fn set_year(&mut self, year: i32) -> PipelineResult<()> {
        self.pipeline.valid_rows_for_year(year)?;
        self.year = year;
        Ok(())
    }

    pub fn interact(&mut self, interaction: Interaction) {
        self.selection = std::mem::take(&mut self.selection).apply(interaction);
    }

    pub fn hover(&mut self, major: &str) {
        self.interact(Interaction::Hover(major.to_string()));
    }

    pub fn click(&mut self, major: &str) {
        self.interact(Interaction::Click(major.to_string()));
    }

    pub fn deselect(&mut self) {
        self.interact(Interaction::Deselect);
    }

    pub fn set_scale(&mut self, scale: AxisScale) {
        self.scale = scale;
    }

    /// Salary samples for the current year, drawn on first use.
    pub fn salary_samples(&mut self) -> PipelineResult<&SalarySamples> {
        let stale = !matches!(&self.salary_cache, Some((year, _)) if *year == self.year);
        if stale {
            let samples = self.pipeline.synthesize_salaries(self.year, &mut self.rng)?;
            log::debug!("drew salary samples for {}", self.year);
            self.salary_cache = Some((self.year, samples));
        }
        match &self.salary_cache {
            Some((_, samples)) => Ok(samples),
            None => Err(PipelineError::NoDataForYear(self.year)),
        }
    }

    /// Recompute every view for the current state.
    pub fn views(&mut self) -> PipelineResult<DashboardViews> {
        self.salary_samples()?;
        let request = ViewRequest {
            criteria: self.criteria.clone(),
            year: self.year,
            selection: self.selection.clone(),
            scale: self.scale,
        };
        match &self.salary_cache {
            Some((_, samples)) => self.pipeline.views(&request, samples),
            None => Err(PipelineError::NoDataForYear(self.year)),
        }
    }
}
