/*! Lazy merging of ascending sequences.

The candidate check-points of the demand analyses are infinite
sequences, one per task. They are combined lazily: [merge_by] keeps
exactly one buffered head per live input in a binary heap and advances
only the input whose head was just consumed, and [uniq] collapses
consecutive repetitions. Neither ever materializes an input beyond its
current head. */

use itertools::Itertools;

/// Merge any number of individually non-decreasing (w.r.t. `less`)
/// sequences into one non-decreasing sequence containing every
/// element of every input.
///
/// Inputs that are empty from the start are ignored; the merged
/// sequence ends once all inputs have ended (i.e., never, if any
/// input is infinite). When the heads of two inputs compare equal,
/// the order in which they are emitted is unspecified (but
/// deterministic).
pub fn merge_by<I, F>(
    inputs: I,
    less: F,
) -> impl Iterator<Item = <I::Item as IntoIterator>::Item>
where
    I: IntoIterator,
    I::Item: IntoIterator,
    F: FnMut(&<I::Item as IntoIterator>::Item, &<I::Item as IntoIterator>::Item) -> bool,
{
    inputs.into_iter().kmerge_by(less)
}

/// [merge_by] using the natural order of the elements.
pub fn merge<I>(inputs: I) -> impl Iterator<Item = <I::Item as IntoIterator>::Item>
where
    I: IntoIterator,
    I::Item: IntoIterator,
    <I::Item as IntoIterator>::Item: PartialOrd,
{
    merge_by(inputs, |a, b| a < b)
}

/// Collapse runs of equal consecutive elements into a single
/// occurrence. The first element is always emitted.
///
/// Panics if `seq` is empty: every sequence this is applied to is
/// non-empty by construction, so an empty one is a caller bug.
pub fn uniq<S>(seq: S) -> impl Iterator<Item = S::Item>
where
    S: IntoIterator,
    S::Item: PartialEq,
{
    let mut seq = seq.into_iter().peekable();
    assert!(
        seq.peek().is_some(),
        "cannot deduplicate an empty sequence"
    );
    seq.dedup()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiples(k: u64) -> impl Iterator<Item = u64> {
        (1..).map(move |i| i * k)
    }

    #[test]
    fn merge_is_sorted_union() {
        let inputs = vec![vec![1, 4, 4, 9], vec![], vec![2, 3, 4], vec![0, 10]];
        let merged: Vec<u32> = merge(inputs.clone()).collect();
        let mut expected: Vec<u32> = inputs.into_iter().flatten().collect();
        expected.sort_unstable();
        assert_eq!(merged, expected);
    }

    #[test]
    fn merge_infinite_inputs_lazily() {
        let merged: Vec<u64> = merge(vec![multiples(3), multiples(5), multiples(7)])
            .take(10)
            .collect();
        assert_eq!(merged, vec![3, 5, 6, 7, 9, 10, 12, 14, 15, 15]);
    }

    #[test]
    fn merge_with_custom_order() {
        // descending inputs merged under the reversed order
        let merged: Vec<i32> =
            merge_by(vec![vec![9, 5, 1], vec![8, 2], vec![7]], |a, b| a > b).collect();
        assert_eq!(merged, vec![9, 8, 7, 5, 2, 1]);
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        let inputs: Vec<Vec<u64>> = vec![vec![], vec![]];
        assert_eq!(merge(inputs).next(), None);
    }

    #[test]
    fn uniq_collapses_repetitions() {
        let out: Vec<u32> = uniq(vec![1, 1, 2, 3, 3, 3, 4, 1, 1]).collect();
        assert_eq!(out, vec![1, 2, 3, 4, 1]);
        let single: Vec<u32> = uniq(vec![7]).collect();
        assert_eq!(single, vec![7]);
    }

    #[test]
    fn uniq_of_merged_infinite_inputs() {
        let out: Vec<u64> = uniq(merge(vec![multiples(2), multiples(3)]))
            .take(8)
            .collect();
        assert_eq!(out, vec![2, 3, 4, 6, 8, 9, 10, 12]);
    }

    #[test]
    #[should_panic(expected = "empty sequence")]
    fn uniq_rejects_empty_input() {
        let _ = uniq(Vec::<u64>::new());
    }
}
