//! Time-bucket grouping shared by every derived series.

use std::collections::BTreeMap;

/// Rows of one time bucket, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrame<'a, T, R> {
    pub time_bucket: T,
    pub rows: Vec<&'a R>,
}

/// Group rows by time bucket, ascending, preserving row order inside a bucket.
pub fn frames_by_time<'a, R, T: Ord>(
    rows: &'a [R],
    time: impl Fn(&R) -> T,
) -> Vec<TimeFrame<'a, T, R>> {
    let mut groups: BTreeMap<T, Vec<&'a R>> = BTreeMap::new();
    for row in rows {
        groups.entry(time(row)).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(time_bucket, rows)| TimeFrame { time_bucket, rows })
        .collect()
}

/// Per-bucket category sums, ascending by bucket. Categories keep the order
/// of their first appearance within the bucket; repeated rows are summed.
pub(crate) fn category_sums<R, T: Ord>(
    rows: &[R],
    time: impl Fn(&R) -> T,
    category: impl Fn(&R) -> &str,
    value: impl Fn(&R) -> f64,
) -> BTreeMap<T, Vec<(String, f64)>> {
    let mut groups: BTreeMap<T, Vec<(String, f64)>> = BTreeMap::new();
    for row in rows {
        let name = category(row);
        let bucket = groups.entry(time(row)).or_default();
        match bucket.iter_mut().find(|(c, _)| c == name) {
            Some((_, total)) => *total += value(row),
            None => bucket.push((name.to_string(), value(row))),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_ascending_and_keep_row_order() {
        let rows = [(2, "b"), (1, "x"), (2, "a"), (1, "y")];
        let frames = frames_by_time(&rows, |r| r.0);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].time_bucket, 1);
        assert_eq!(
            frames[0].rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            ["x", "y"]
        );
        assert_eq!(
            frames[1].rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            ["b", "a"]
        );
    }

    #[test]
    fn repeated_categories_are_summed_in_place() {
        let rows = [(1, "a", 1.0), (1, "b", 2.0), (1, "a", 4.0)];
        let sums = category_sums(&rows, |r| r.0, |r| r.1, |r| r.2);
        assert_eq!(
            sums[&1],
            vec![("a".to_string(), 5.0), ("b".to_string(), 2.0)]
        );
    }
}
