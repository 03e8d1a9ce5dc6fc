//! Failures of the derived-series computations.
//! Each one invalidates a single chart, never the whole page.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Denominator sums to zero at {time_bucket}; value is undefined")]
    DivisionUndefined { time_bucket: String },
    #[error("Baseline category '{baseline}' is absent at {time_bucket}")]
    BaselineMissing {
        baseline: String,
        time_bucket: String,
    },
    #[error("Series '{category}' has no value at {time_bucket}; series are not aligned")]
    MisalignedSeries {
        category: String,
        time_bucket: String,
    },
}
