//! Weighted averages per time bucket.

use crate::analysis::error::AnalysisError;
use crate::analysis::grouping::frames_by_time;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// What to do with a bucket whose denominator sums to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZeroTotalPolicy {
    /// Drop the point and keep the rest of the series.
    #[default]
    Omit,
    /// Fail the whole series.
    Abort,
}

/// Per-bucket outcome of `weighted_average`, ascending by bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedAverage<T> {
    pub points: Vec<(T, Result<f64, AnalysisError>)>,
}

impl<T: Clone> WeightedAverage<T> {
    /// Apply `policy` to the undefined buckets.
    pub fn resolve(&self, policy: ZeroTotalPolicy) -> Result<Vec<(T, f64)>, AnalysisError> {
        let mut series = Vec::with_capacity(self.points.len());
        for (t, outcome) in &self.points {
            match (outcome, policy) {
                (Ok(v), _) => series.push((t.clone(), *v)),
                (Err(e), ZeroTotalPolicy::Abort) => return Err(e.clone()),
                (Err(e), ZeroTotalPolicy::Omit) => warn!("Omitting point: {e}"),
            }
        }
        Ok(series)
    }

    pub fn undefined_count(&self) -> usize {
        self.points.iter().filter(|(_, v)| v.is_err()).count()
    }
}

/// Sum `weight_sum` and `total` per bucket and divide.
///
/// A bucket whose `total` sums to zero yields `DivisionUndefined` while the
/// other buckets compute normally.
pub fn weighted_average<R, T: Ord + Clone + Display>(
    rows: &[R],
    time: impl Fn(&R) -> T,
    weight_sum: impl Fn(&R) -> f64,
    total: impl Fn(&R) -> f64,
) -> WeightedAverage<T> {
    let points = frames_by_time(rows, time)
        .into_iter()
        .map(|frame| {
            let weights: f64 = frame.rows.iter().map(|&r| weight_sum(r)).sum();
            let totals: f64 = frame.rows.iter().map(|&r| total(r)).sum();
            let outcome = if totals == 0.0 {
                Err(AnalysisError::DivisionUndefined {
                    time_bucket: frame.time_bucket.to_string(),
                })
            } else {
                Ok(weights / totals)
            };
            (frame.time_bucket, outcome)
        })
        .collect();

    WeightedAverage { points }
}
