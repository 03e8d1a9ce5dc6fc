//! Analysis module - ranked frames, weighted averages and ratio series

mod averaging;
mod error;
mod grouping;
mod ranking;
mod ratio;

pub use averaging::{weighted_average, ZeroTotalPolicy};
pub use error::AnalysisError;
pub use grouping::frames_by_time;
pub use ranking::{rank_by_time, RankedEntry, RankedFrame};
pub use ratio::{ratio_series, RatioSeries};
