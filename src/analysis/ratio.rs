//! Category-over-baseline ratio series.

use crate::analysis::error::AnalysisError;
use crate::analysis::grouping::category_sums;
use std::fmt::Display;

/// Ratios of one target category, index-aligned with `RatioSeries::time_buckets`.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub category: String,
    pub values: Vec<f64>,
}

impl CategorySeries {
    /// First and last values, used for endpoint labels.
    pub fn endpoints(&self) -> Option<(f64, f64)> {
        Some((*self.values.first()?, *self.values.last()?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatioSeries<T> {
    pub baseline: String,
    pub time_buckets: Vec<T>,
    pub series: Vec<CategorySeries>,
}

impl<T> RatioSeries<T> {
    pub fn get(&self, category: &str) -> Option<&CategorySeries> {
        self.series.iter().find(|s| s.category == category)
    }
}

/// Round half away from zero to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Divide each target category's value by the baseline category's value in
/// the same time bucket.
///
/// Every bucket of the table must carry the baseline (`BaselineMissing`
/// otherwise) with a non-zero value (`DivisionUndefined`), and every target
/// must have a value in every bucket (`MisalignedSeries`).
pub fn ratio_series<R, T, S>(
    rows: &[R],
    time: impl Fn(&R) -> T,
    category: impl Fn(&R) -> &str,
    value: impl Fn(&R) -> f64,
    baseline: &str,
    targets: &[S],
    precision: u32,
) -> Result<RatioSeries<T>, AnalysisError>
where
    T: Ord + Clone + Display,
    S: AsRef<str>,
{
    let buckets = category_sums(rows, time, category, value);

    let mut series: Vec<CategorySeries> = targets
        .iter()
        .map(|t| CategorySeries {
            category: t.as_ref().to_string(),
            values: Vec::with_capacity(buckets.len()),
        })
        .collect();

    for (t, sums) in &buckets {
        let lookup = |name: &str| sums.iter().find(|(c, _)| c == name).map(|(_, v)| *v);

        let base = lookup(baseline).ok_or_else(|| AnalysisError::BaselineMissing {
            baseline: baseline.to_string(),
            time_bucket: t.to_string(),
        })?;
        if base == 0.0 {
            return Err(AnalysisError::DivisionUndefined {
                time_bucket: t.to_string(),
            });
        }

        for target in &mut series {
            let v = lookup(target.category.as_str()).ok_or_else(|| AnalysisError::MisalignedSeries {
                category: target.category.clone(),
                time_bucket: t.to_string(),
            })?;
            target.values.push(round_to(v / base, precision));
        }
    }

    Ok(RatioSeries {
        baseline: baseline.to_string(),
        time_buckets: buckets.into_keys().collect(),
        series,
    })
}
