//! Chart-ready view models derived from the selected rows.
//!
//! Every function here is a pure read over borrowed records; the
//! [`ActiveSelection`] is passed in explicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{Highlight, MajorColors};
use crate::data::catalog::{MetricGroup, MetricKey};
use crate::data::model::{GraduateDataset, GraduateRecord, YearRange};
use crate::selection::ActiveSelection;
use crate::synth::{MajorSalaryStats, SalaryHistogram, SalarySamples};

/// Axis scale picked by the user. Only the renderer acts on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

// ---------------------------------------------------------------------------
// Line chart: graduates per major over time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinePoint {
    pub year: i32,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub major: String,
    pub points: Vec<LinePoint>,
    pub highlight: Highlight,
}

/// One series per major, points in year order. Every major stays in the
/// chart; the selection only changes its highlight.
pub fn line_series(
    rows: &[&GraduateRecord],
    colors: &MajorColors,
    selection: &ActiveSelection,
) -> Vec<LineSeries> {
    let mut by_major: BTreeMap<&str, Vec<LinePoint>> = BTreeMap::new();
    for r in rows {
        by_major.entry(r.major.as_str()).or_default().push(LinePoint {
            year: r.year,
            total: r.total_population,
        });
    }

    by_major
        .into_iter()
        .map(|(major, mut points)| {
            points.sort_by_key(|p| p.year);
            LineSeries {
                major: major.to_string(),
                points,
                highlight: colors.highlight(major, selection),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Year snapshot
// ---------------------------------------------------------------------------

/// Rows of a single year, order preserved.
pub fn year_snapshot<'a>(rows: &[&'a GraduateRecord], year: i32) -> Vec<&'a GraduateRecord> {
    rows.iter().copied().filter(|r| r.year == year).collect()
}

// ---------------------------------------------------------------------------
// Bar charts: employer type, work activity, employment status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub key: MetricKey,
    pub points: Vec<BarPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub group: MetricGroup,
    pub series: Vec<BarSeries>,
}

impl BarChart {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

/// Per metric of `group`, the yearly total over the rows the selection admits.
pub fn bar_chart(
    dataset: &GraduateDataset,
    rows: &[&GraduateRecord],
    group: MetricGroup,
    selection: &ActiveSelection,
) -> BarChart {
    let admitted = selection.restrict(rows, |r| r.major.as_str());

    let series = dataset
        .catalog
        .group(group)
        .iter()
        .map(|key| {
            let mut per_year: BTreeMap<i32, f64> = BTreeMap::new();
            for r in &admitted {
                if let Some(v) = dataset.value(r, key) {
                    *per_year.entry(r.year).or_insert(0.0) += v;
                }
            }
            BarSeries {
                key: key.clone(),
                points: per_year
                    .into_iter()
                    .map(|(year, value)| BarPoint { year, value })
                    .collect(),
            }
        })
        .collect();

    BarChart { group, series }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarValue {
    pub key: MetricKey,
    pub value: f64,
}

/// One bar per metric of `group`, summed over a single-year snapshot.
pub fn snapshot_bars(
    dataset: &GraduateDataset,
    snapshot: &[&GraduateRecord],
    group: MetricGroup,
    selection: &ActiveSelection,
) -> Vec<BarValue> {
    let admitted = selection.restrict(snapshot, |r| r.major.as_str());
    dataset
        .catalog
        .group(group)
        .iter()
        .map(|key| BarValue {
            key: key.clone(),
            value: admitted.iter().filter_map(|r| dataset.value(r, key)).sum(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Gender comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderRow {
    pub major: String,
    pub males: f64,
    pub females: f64,
    /// `None` when neither count is positive.
    pub female_share: Option<f64>,
}

pub fn gender_comparison(
    dataset: &GraduateDataset,
    snapshot: &[&GraduateRecord],
    selection: &ActiveSelection,
) -> Vec<GenderRow> {
    let males_key = MetricKey::new(MetricGroup::Gender, "Males");
    let females_key = MetricKey::new(MetricGroup::Gender, "Females");

    let mut rows: Vec<GenderRow> = selection
        .restrict(snapshot, |r| r.major.as_str())
        .into_iter()
        .map(|r| {
            let males = dataset.value(r, &males_key).unwrap_or(0.0);
            let females = dataset.value(r, &females_key).unwrap_or(0.0);
            let total = males + females;
            GenderRow {
                major: r.major.clone(),
                males,
                females,
                female_share: (total > 0.0).then(|| females / total),
            }
        })
        .collect();
    rows.sort_by(|a, b| a.major.cmp(&b.major));
    rows
}

// ---------------------------------------------------------------------------
// Salary distribution
// ---------------------------------------------------------------------------

/// `(major, mean, std_dev)` triples of a snapshot, in major order.
pub fn salary_stats(snapshot: &[&GraduateRecord]) -> Vec<MajorSalaryStats> {
    let mut stats: Vec<MajorSalaryStats> = snapshot
        .iter()
        .map(|r| MajorSalaryStats::new(r.major.clone(), r.salary_mean, r.salary_std_dev))
        .collect();
    stats.sort_by(|a, b| a.major.cmp(&b.major));
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryDistribution {
    pub major: String,
    pub highlight: Highlight,
    pub histogram: SalaryHistogram,
}

/// Binned samples for the majors in `visible`, with their highlight.
pub fn salary_distributions(
    samples: &SalarySamples,
    visible: &[&GraduateRecord],
    colors: &MajorColors,
    selection: &ActiveSelection,
    bins: usize,
) -> Vec<SalaryDistribution> {
    samples
        .iter()
        .filter(|(major, _)| visible.iter().any(|r| r.major == *major))
        .map(|(major, values)| SalaryDistribution {
            major: major.to_string(),
            highlight: colors.highlight(major, selection),
            histogram: crate::synth::histogram(values, bins),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Everything the dashboard draws for one interaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViews {
    pub year_range: Option<YearRange>,
    pub year: i32,
    pub scale: AxisScale,
    pub selection: ActiveSelection,
    /// Rows passing the validity gate and the user's criteria.
    pub selected_rows: usize,
    pub lines: Vec<LineSeries>,
    pub employer_type: BarChart,
    pub work_activity: BarChart,
    pub employment_status: BarChart,
    pub employer_type_snapshot: Vec<BarValue>,
    pub gender: Vec<GenderRow>,
    pub salaries: Vec<SalaryDistribution>,
}

impl DashboardViews {
    /// Nothing to draw: the renderer should show its "no data" state.
    pub fn is_empty(&self) -> bool {
        self.selected_rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::synthesize_seeded;

    const BUSINESS: &str = "Employment_Employer Type_Business/Industry";
    const GOVERNMENT: &str = "Employment_Employer Type_Government";

    fn dataset() -> GraduateDataset {
        GraduateDataset::from_records(vec![
            GraduateRecord::new("CS", 2013, 120.0)
                .with_salary(70000.0, 9000.0)
                .with_metric(BUSINESS, 80.0)
                .with_metric(GOVERNMENT, 10.0)
                .with_metric("Demographics_Gender_Males", 90.0)
                .with_metric("Demographics_Gender_Females", 30.0),
            GraduateRecord::new("CS", 2010, 100.0)
                .with_salary(65000.0, 8000.0)
                .with_metric(BUSINESS, 60.0)
                .with_metric(GOVERNMENT, 15.0),
            GraduateRecord::new("Art", 2013, 50.0)
                .with_salary(40000.0, 0.0)
                .with_metric(BUSINESS, 20.0)
                .with_metric("Demographics_Gender_Females", 35.0),
        ])
        .unwrap()
    }

    #[test]
    fn line_series_group_and_sort_by_year() {
        let ds = dataset();
        let rows: Vec<&GraduateRecord> = ds.records.iter().collect();
        let colors = MajorColors::new(&ds.majors);
        let lines = line_series(&rows, &colors, &ActiveSelection::Selected("Art".into()));

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].major, "Art");
        assert_eq!(lines[0].highlight.opacity, 1.0);
        let cs = &lines[1];
        assert_eq!(cs.points.iter().map(|p| p.year).collect::<Vec<_>>(), vec![2010, 2013]);
        assert!(cs.highlight.opacity < 1.0);
    }

    #[test]
    fn bar_chart_sums_per_year_within_selection() {
        let ds = dataset();
        let rows: Vec<&GraduateRecord> = ds.records.iter().collect();

        let all = bar_chart(&ds, &rows, MetricGroup::EmployerType, &ActiveSelection::Unselected);
        assert_eq!(all.series.len(), 2);
        let business = &all.series[0];
        assert_eq!(business.key, MetricKey::new(MetricGroup::EmployerType, "Business/Industry"));
        assert_eq!(
            business.points,
            vec![BarPoint { year: 2010, value: 60.0 }, BarPoint { year: 2013, value: 100.0 }]
        );

        let art = bar_chart(&ds, &rows, MetricGroup::EmployerType, &ActiveSelection::Selected("Art".into()));
        assert_eq!(art.series[0].points, vec![BarPoint { year: 2013, value: 20.0 }]);
        assert!(art.series[1].points.is_empty());
    }

    #[test]
    fn empty_rows_give_empty_charts() {
        let ds = dataset();
        let chart = bar_chart(&ds, &[], MetricGroup::EmployerType, &ActiveSelection::Unselected);
        assert!(chart.is_empty());
        let missing = bar_chart(&ds, &[], MetricGroup::WorkActivity, &ActiveSelection::Unselected);
        assert!(missing.series.is_empty());
    }

    #[test]
    fn snapshot_views() {
        let ds = dataset();
        let rows: Vec<&GraduateRecord> = ds.records.iter().collect();
        let snapshot = year_snapshot(&rows, 2013);
        assert_eq!(snapshot.len(), 2);

        let bars = snapshot_bars(&ds, &snapshot, MetricGroup::EmployerType, &ActiveSelection::Unselected);
        assert_eq!(bars[0].value, 100.0);
        assert_eq!(bars[1].value, 10.0);

        let gender = gender_comparison(&ds, &snapshot, &ActiveSelection::Unselected);
        assert_eq!(gender[0].major, "Art");
        assert_eq!(gender[0].female_share, Some(1.0));
        assert_eq!(gender[1].female_share, Some(0.25));

        let stats = salary_stats(&snapshot);
        assert_eq!(
            stats,
            vec![
                MajorSalaryStats::new("Art", 40000.0, 0.0),
                MajorSalaryStats::new("CS", 70000.0, 9000.0),
            ]
        );
    }

    #[test]
    fn salary_distributions_follow_visible_rows() {
        let ds = dataset();
        let rows: Vec<&GraduateRecord> = ds.records.iter().collect();
        let snapshot = year_snapshot(&rows, 2013);
        let samples = synthesize_seeded(&salary_stats(&snapshot), 50, Some(3)).unwrap();
        let colors = MajorColors::new(&ds.majors);

        let only_art: Vec<&GraduateRecord> = snapshot.iter().copied().filter(|r| r.major == "Art").collect();
        let dists = salary_distributions(&samples, &only_art, &colors, &ActiveSelection::Unselected, 10);
        assert_eq!(dists.len(), 1);
        assert_eq!(dists[0].histogram.counts, vec![50]);
    }
}
