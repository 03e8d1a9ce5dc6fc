//! Ranked frames for the bar-race animation.

use crate::analysis::grouping::category_sums;
use std::cmp::Ordering;

/// One bar of a ranked frame. `rank` 1 is the largest value.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub category: String,
    pub value: f64,
    pub rank: usize,
}

/// Top-N categories of a single time bucket, descending by value.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFrame<T> {
    pub time_bucket: T,
    pub entries: Vec<RankedEntry>,
}

/// Grouped observations waiting to be ranked.
///
/// Ranking happens while iterating; `iter()` can be called any number of
/// times and always yields the same frames in ascending time order.
#[derive(Debug, Clone)]
pub struct RankedFrames<T> {
    groups: Vec<(T, Vec<(String, f64)>)>,
    top_n: usize,
}

impl<T: Clone> RankedFrames<T> {
    pub fn iter(&self) -> RankedFramesIter<'_, T> {
        RankedFramesIter {
            inner: self.groups.iter(),
            top_n: self.top_n,
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn time_buckets(&self) -> impl Iterator<Item = &T> {
        self.groups.iter().map(|(t, _)| t)
    }

    /// Rank a single bucket by position.
    pub fn frame(&self, index: usize) -> Option<RankedFrame<T>> {
        self.groups
            .get(index)
            .map(|(t, entries)| rank_bucket(t, entries, self.top_n))
    }
}

impl<'a, T: Clone> IntoIterator for &'a RankedFrames<T> {
    type Item = RankedFrame<T>;
    type IntoIter = RankedFramesIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct RankedFramesIter<'a, T> {
    inner: std::slice::Iter<'a, (T, Vec<(String, f64)>)>,
    top_n: usize,
}

impl<T: Clone> Iterator for RankedFramesIter<'_, T> {
    type Item = RankedFrame<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(t, entries)| rank_bucket(t, entries, self.top_n))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Clone> ExactSizeIterator for RankedFramesIter<'_, T> {}

fn rank_bucket<T: Clone>(time_bucket: &T, entries: &[(String, f64)], top_n: usize) -> RankedFrame<T> {
    let mut sorted: Vec<&(String, f64)> = entries.iter().collect();
    // sort_by is stable: equal values keep input order
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    RankedFrame {
        time_bucket: time_bucket.clone(),
        entries: sorted
            .into_iter()
            .take(top_n)
            .enumerate()
            .map(|(i, (category, value))| RankedEntry {
                category: category.clone(),
                value: *value,
                rank: i + 1,
            })
            .collect(),
    }
}

/// Group rows by time bucket and rank categories by value within each bucket.
///
/// Categories beyond `top_n` are dropped from that bucket. A category with no
/// row in a bucket is absent from that frame rather than ranked as zero.
pub fn rank_by_time<R, T: Ord + Clone>(
    rows: &[R],
    time: impl Fn(&R) -> T,
    category: impl Fn(&R) -> &str,
    value: impl Fn(&R) -> f64,
    top_n: usize,
) -> RankedFrames<T> {
    RankedFrames {
        groups: category_sums(rows, time, category, value)
            .into_iter()
            .collect(),
        top_n,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Obs {
        quarter: &'static str,
        category: &'static str,
        cnt: f64,
    }

    fn obs(quarter: &'static str, category: &'static str, cnt: f64) -> Obs {
        Obs {
            quarter,
            category,
            cnt,
        }
    }

    fn pairs<'a>(frame: &'a RankedFrame<&'static str>) -> Vec<(&'a str, f64)> {
        frame
            .entries
            .iter()
            .map(|e| (e.category.as_str(), e.value))
            .collect()
    }

    fn rank(rows: &[Obs], top_n: usize) -> RankedFrames<&'static str> {
        rank_by_time(rows, |r| r.quarter, |r| r.category, |r| r.cnt, top_n)
    }

    #[test]
    fn ranks_each_quarter_descending() {
        let rows = [
            obs("Q1", "A", 10.0),
            obs("Q1", "B", 20.0),
            obs("Q2", "A", 30.0),
            obs("Q2", "B", 5.0),
        ];
        let frames: Vec<_> = rank(&rows, 2).iter().collect();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].time_bucket, "Q1");
        assert_eq!(pairs(&frames[0]), [("B", 20.0), ("A", 10.0)]);
        assert_eq!(frames[1].time_bucket, "Q2");
        assert_eq!(pairs(&frames[1]), [("A", 30.0), ("B", 5.0)]);
        assert_eq!(frames[0].entries[0].rank, 1);
        assert_eq!(frames[0].entries[1].rank, 2);
    }

    #[test]
    fn ties_keep_input_order() {
        let rows = [
            obs("Q1", "C", 7.0),
            obs("Q1", "A", 7.0),
            obs("Q1", "B", 9.0),
            obs("Q1", "D", 7.0),
        ];
        let frame = rank(&rows, 10).frame(0).unwrap();
        assert_eq!(
            pairs(&frame),
            [("B", 9.0), ("C", 7.0), ("A", 7.0), ("D", 7.0)]
        );
    }

    #[test]
    fn truncates_to_top_n_without_other_bucket() {
        let rows = [
            obs("Q1", "A", 1.0),
            obs("Q1", "B", 2.0),
            obs("Q1", "C", 3.0),
        ];
        let frames = rank(&rows, 2);
        let frame = frames.frame(0).unwrap();
        assert_eq!(pairs(&frame), [("C", 3.0), ("B", 2.0)]);
        assert!(frame.entries.iter().all(|e| e.category != "A"));
        assert!(rank(&rows, 0).frame(0).unwrap().entries.is_empty());
    }

    #[test]
    fn absent_category_is_not_zero_filled() {
        let rows = [
            obs("Q2", "A", 3.0),
            obs("Q1", "A", 1.0),
            obs("Q1", "B", 2.0),
        ];
        let frames: Vec<_> = rank(&rows, 5).iter().collect();
        assert_eq!(frames[0].time_bucket, "Q1");
        assert_eq!(pairs(&frames[1]), [("A", 3.0)]);
    }

    #[test]
    fn iteration_is_restartable_and_deterministic() {
        let rows = [
            obs("Q1", "A", 4.0),
            obs("Q1", "B", 4.0),
            obs("Q2", "B", 1.0),
            obs("Q3", "C", 8.0),
        ];
        let frames = rank(&rows, 3);
        let first: Vec<_> = frames.iter().collect();
        let second: Vec<_> = (&frames).into_iter().collect();
        let again: Vec<_> = rank(&rows, 3).iter().collect();

        assert_eq!(first, second);
        assert_eq!(first, again);
        assert_eq!(frames.iter().len(), 3);
    }

    #[test]
    fn every_frame_respects_top_n_and_order() {
        let rows: Vec<Obs> = (0..40)
            .map(|i| {
                let quarter = ["Q1", "Q2", "Q3"][i % 3];
                let category = ["A", "B", "C", "D", "E", "F", "G"][i % 7];
                obs(quarter, category, ((i * 37) % 11) as f64)
            })
            .collect();

        for frame in &rank(&rows, 4) {
            assert!(frame.entries.len() <= 4);
            assert!(frame.entries.windows(2).all(|w| w[0].value >= w[1].value));
        }
    }
}
