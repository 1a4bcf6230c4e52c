//! Synthetic salary distributions.
//!
//! The survey only publishes a mean and a standard deviation per major and
//! year. The salary chart needs something to bin, so each major gets a
//! fixed-size sample drawn from `N(mean, std_dev)`. Every column of the
//! resulting table has the same length.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Samples drawn per major unless configured otherwise.
pub const DEFAULT_SAMPLE_SIZE: usize = 7000;

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// Salary summary of one major in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorSalaryStats {
    pub major: String,
    pub mean: f64,
    pub std_dev: f64,
}

impl MajorSalaryStats {
    pub fn new(major: impl Into<String>, mean: f64, std_dev: f64) -> Self {
        Self {
            major: major.into(),
            mean,
            std_dev,
        }
    }

    fn validate(&self) -> PipelineResult<()> {
        if !self.mean.is_finite() {
            return Err(PipelineError::InvalidMean {
                major: self.major.clone(),
                mean: self.mean,
            });
        }
        if !(self.std_dev.is_finite() && self.std_dev >= 0.0) {
            return Err(PipelineError::InvalidStdDev {
                major: self.major.clone(),
                std_dev: self.std_dev,
            });
        }
        Ok(())
    }
}

/// Rectangular table: major → `sample_size` salary values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalarySamples {
    sample_size: usize,
    columns: BTreeMap<String, Vec<f64>>,
}

impl SalarySamples {
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn get(&self, major: &str) -> Option<&[f64]> {
        self.columns.get(major).map(Vec::as_slice)
    }

    pub fn majors(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(major, values)| (major.as_str(), values.as_slice()))
    }

    /// Number of majors.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Bin every column with the same bin count.
    pub fn histograms(&self, bins: usize) -> BTreeMap<String, SalaryHistogram> {
        self.columns
            .iter()
            .map(|(major, values)| (major.clone(), histogram(values, bins)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Draw `sample_size` values per major from `rng`.
///
/// All inputs are validated before any entropy is consumed. A standard
/// deviation of exactly zero yields `sample_size` copies of the mean. If a
/// major appears twice, the later statistics replace the earlier ones.
pub fn synthesize<R: Rng + ?Sized>(
    stats: &[MajorSalaryStats],
    sample_size: usize,
    rng: &mut R,
) -> PipelineResult<SalarySamples> {
    if sample_size == 0 {
        return Err(PipelineError::ZeroSampleSize);
    }
    for s in stats {
        s.validate()?;
    }

    let mut columns = BTreeMap::new();
    for s in stats {
        let values = if s.std_dev == 0.0 {
            vec![s.mean; sample_size]
        } else {
            let normal = Normal::new(s.mean, s.std_dev).map_err(|_| PipelineError::InvalidStdDev {
                major: s.major.clone(),
                std_dev: s.std_dev,
            })?;
            (0..sample_size).map(|_| normal.sample(rng)).collect()
        };
        columns.insert(s.major.clone(), values);
    }

    log::debug!(
        "synthesized {} salary columns of {} samples",
        columns.len(),
        sample_size
    );

    Ok(SalarySamples {
        sample_size,
        columns,
    })
}

/// [`synthesize`] with a reproducible generator when `seed` is given,
/// the thread-local entropy source otherwise.
pub fn synthesize_seeded(
    stats: &[MajorSalaryStats],
    sample_size: usize,
    seed: Option<u64>,
) -> PipelineResult<SalarySamples> {
    match seed {
        Some(seed) => synthesize(stats, sample_size, &mut StdRng::seed_from_u64(seed)),
        None => synthesize(stats, sample_size, &mut rand::rng()),
    }
}

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Equal-width histogram. `edges` has `counts.len() + 1` entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryHistogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl SalaryHistogram {
    fn empty() -> Self {
        Self {
            edges: Vec::new(),
            counts: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Bin finite values into `bins` equal-width buckets over their range.
/// A degenerate range collapses into a single bucket.
pub fn histogram(values: &[f64], bins: usize) -> SalaryHistogram {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return SalaryHistogram::empty();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if min >= max {
        return SalaryHistogram {
            edges: vec![min, max],
            counts: vec![finite.len()],
        };
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let edges = (0..=bins).map(|i| min + i as f64 * width).collect();

    SalaryHistogram { edges, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_std_dev_repeats_the_mean() {
        let stats = [
            MajorSalaryStats::new("CS", 50000.0, 0.0),
            MajorSalaryStats::new("Art", 40000.0, 5000.0),
        ];
        let samples = synthesize_seeded(&stats, 3, Some(7)).unwrap();

        assert_eq!(samples.majors().collect::<Vec<_>>(), vec!["Art", "CS"]);
        assert_eq!(samples.get("CS").unwrap(), &[50000.0, 50000.0, 50000.0]);
        let art = samples.get("Art").unwrap();
        assert_eq!(art.len(), 3);
        assert!(art.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let stats = [MajorSalaryStats::new("Economics", 58000.0, 12000.0)];
        let a = synthesize_seeded(&stats, 100, Some(42)).unwrap();
        let b = synthesize_seeded(&stats, 100, Some(42)).unwrap();
        let c = synthesize_seeded(&stats, 100, Some(43)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sample_moments_track_the_inputs() {
        let stats = [MajorSalaryStats::new("Statistics", 60000.0, 8000.0)];
        let samples = synthesize_seeded(&stats, DEFAULT_SAMPLE_SIZE, Some(1)).unwrap();
        let values = samples.get("Statistics").unwrap();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        assert!((mean - 60000.0).abs() < 500.0, "mean {mean}");
        assert!((var.sqrt() - 8000.0).abs() < 500.0, "sd {}", var.sqrt());
    }

    #[test]
    fn rejects_invalid_inputs_before_sampling() {
        let negative = [MajorSalaryStats::new("Art", 40000.0, -1.0)];
        assert_eq!(
            synthesize_seeded(&negative, 10, Some(0)),
            Err(PipelineError::InvalidStdDev {
                major: "Art".into(),
                std_dev: -1.0
            })
        );

        let nan_mean = [MajorSalaryStats::new("Art", f64::NAN, 1.0)];
        assert!(matches!(
            synthesize_seeded(&nan_mean, 10, Some(0)),
            Err(PipelineError::InvalidMean { .. })
        ));

        let ok = [MajorSalaryStats::new("Art", 40000.0, 1.0)];
        assert_eq!(synthesize_seeded(&ok, 0, Some(0)), Err(PipelineError::ZeroSampleSize));
    }

    #[test]
    fn empty_stats_give_an_empty_table() {
        let samples = synthesize_seeded(&[], 10, None).unwrap();
        assert!(samples.is_empty());
        assert_eq!(samples.sample_size(), 10);
    }

    #[test]
    fn histogram_bins_cover_all_values() {
        let h = histogram(&[1.0, 2.0, 3.0, 4.0, f64::NAN], 3);
        assert_eq!(h.counts, vec![1, 1, 2]);
        assert_eq!(h.edges.len(), 4);
        assert_eq!(h.edges[0], 1.0);
        assert_eq!(h.edges[3], 4.0);

        let flat = histogram(&[5.0, 5.0], 10);
        assert_eq!(flat.counts, vec![2]);
        assert!(histogram(&[], 4).counts.is_empty());
    }

    proptest! {
        #[test]
        fn tables_are_rectangular(
            rows in proptest::collection::vec((0.0f64..200_000.0, 0.0f64..30_000.0), 1..8),
            n in 1usize..64,
            seed in any::<u64>(),
        ) {
            let stats: Vec<MajorSalaryStats> = rows
                .iter()
                .enumerate()
                .map(|(i, (mean, sd))| MajorSalaryStats::new(format!("major-{i}"), *mean, *sd))
                .collect();
            let samples = synthesize_seeded(&stats, n, Some(seed)).unwrap();
            prop_assert_eq!(samples.len(), stats.len());
            for (_, values) in samples.iter() {
                prop_assert_eq!(values.len(), n);
            }
        }

        #[test]
        fn degenerate_std_dev_is_exact(mean in -1e6f64..1e6, n in 1usize..50) {
            let samples = synthesize_seeded(&[MajorSalaryStats::new("m", mean, 0.0)], n, None).unwrap();
            prop_assert!(samples.get("m").unwrap().iter().all(|v| *v == mean));
        }
    }
}
