//! Quarter time buckets.
//! Parses the period notations found in the source datasets.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Offset between the ROC (Minguo) calendar and the Gregorian year.
const ROC_YEAR_OFFSET: i32 = 1911;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized period '{0}'")]
pub struct PeriodParseError(pub String);

/// A calendar quarter, ordered by (year, quarter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quarter {
    pub year: i32,
    pub quarter: u8,
}

impl Quarter {
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }

    fn from_month(year: i32, month: u32) -> Option<Self> {
        if !(1..=12).contains(&month) {
            return None;
        }
        Self::new(year, ((month - 1) / 3 + 1) as u8)
    }

    /// Position on a continuous axis: 2011Q1 -> 2011.0, 2011Q3 -> 2011.5.
    pub fn as_axis_value(&self) -> f64 {
        self.year as f64 + (self.quarter as f64 - 1.0) / 4.0
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Quarter {
    type Err = PeriodParseError;

    /// Accepts `2011Q1`, `2011-Q1`, `2011-03-31`, `2011/03/31`, `20110331`
    /// and ROC `10001` (year 100, quarter 01).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().trim_matches('"');
        let err = || PeriodParseError(s.to_string());

        if raw.chars().all(|c| c.is_ascii_digit()) {
            return match raw.len() {
                5 => {
                    let roc: i32 = raw[..3].parse().map_err(|_| err())?;
                    let q: u8 = raw[3..].parse().map_err(|_| err())?;
                    Quarter::new(roc + ROC_YEAR_OFFSET, q).ok_or_else(err)
                }
                8 => {
                    let year: i32 = raw[..4].parse().map_err(|_| err())?;
                    let month: u32 = raw[4..6].parse().map_err(|_| err())?;
                    Quarter::from_month(year, month).ok_or_else(err)
                }
                _ => Err(err()),
            };
        }

        if let Some(pos) = raw.find(['Q', 'q']) {
            let year: i32 = raw[..pos]
                .trim_end_matches(['-', ' '])
                .parse()
                .map_err(|_| err())?;
            let q: u8 = raw[pos + 1..].trim().parse().map_err(|_| err())?;
            return Quarter::new(year, q).ok_or_else(err);
        }

        // ISO-like date, possibly followed by a time component
        let date = raw.split([' ', 'T']).next().unwrap_or(raw);
        let mut parts = date.split(['-', '/']);
        let year: i32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        let month: u32 = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(err)?;
        Quarter::from_month(year, month).ok_or_else(err)
    }
}
