//! Property tests for the reshaping and selection units
use nutflow::prelude::*;
use proptest::prelude::*;
use std::collections::HashSet;

fn sorted(mut values: Vec<i32>) -> Vec<i32> {
    values.sort_unstable();
    values
}

proptest! {
    #[test]
    fn prop_chunks_concatenate_to_input(
        values in prop::collection::vec(any::<i32>(), 0..200),
        n in 1usize..20,
    ) {
        let chunks: Vec<Vec<i32>> = values.clone().then(Chunk::new(n).unwrap()).collect();

        let count = chunks.len();
        for (i, chunk) in chunks.iter().enumerate() {
            if i + 1 < count {
                prop_assert_eq!(chunk.len(), n);
            } else {
                prop_assert!(!chunk.is_empty() && chunk.len() <= n);
            }
        }
        prop_assert_eq!(chunks.concat(), values);
    }

    #[test]
    fn prop_windows_are_contiguous(
        values in prop::collection::vec(any::<i32>(), 0..100),
        n in 1usize..10,
    ) {
        let windows: Vec<Vec<i32>> = values.clone().then(Window::new(n).unwrap()).collect();

        let expected = (values.len() + 1).saturating_sub(n);
        prop_assert_eq!(windows.len(), expected);
        for (i, window) in windows.iter().enumerate() {
            prop_assert_eq!(window.as_slice(), &values[i..i + n]);
        }
    }

    #[test]
    fn prop_shuffle_keeps_multiset(
        values in prop::collection::vec(any::<i32>(), 0..200),
        k in 1usize..50,
        seed in any::<u64>(),
    ) {
        let shuffled: Vec<i32> = values
            .clone()
            .then(Shuffle::new(k).unwrap().with_seed(seed))
            .collect();
        prop_assert_eq!(sorted(shuffled), sorted(values));
    }

    #[test]
    fn prop_shuffle_of_one_keeps_order(values in prop::collection::vec(any::<i32>(), 0..100)) {
        let out: Vec<i32> = values.clone().then(Shuffle::new(1).unwrap()).collect();
        prop_assert_eq!(out, values);
    }

    #[test]
    fn prop_seeded_shuffle_repeats(seed in any::<u64>()) {
        let shuffle = Shuffle::new(16).unwrap().with_seed(seed);
        let first: Vec<i64> = Range::new(100).then(&shuffle).collect();
        let second: Vec<i64> = Range::new(100).then(&shuffle).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_dedupe_keeps_first_occurrences(values in prop::collection::vec(0u8..16, 0..100)) {
        let out: Vec<u8> = values.clone().then(Dedupe::new()).collect();

        let mut seen = HashSet::new();
        let expected: Vec<u8> = values.into_iter().filter(|v| seen.insert(*v)).collect();
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn prop_partition_splits_without_loss(values in prop::collection::vec(-50i32..50, 0..100)) {
        let (small, large) = values.clone().then(Partition::new(|x: &i32| *x < 0));
        let small: Vec<i32> = small.collect();
        let large: Vec<i32> = large.collect();

        prop_assert!(small.iter().all(|x| *x < 0));
        prop_assert!(large.iter().all(|x| *x >= 0));
        prop_assert_eq!(small.len() + large.len(), values.len());
    }
}

#[test]
fn test_interleave_drops_exhausted_lanes() {
    let out: Vec<&str> = vec!["1", "2"]
        .then(Interleave::new([vec!["a", "b", "c"]]))
        .collect();
    assert_eq!(out, vec!["1", "a", "2", "b", "c"]);
}

#[test]
fn test_partition_by_threshold() {
    let (below, rest) = Range::new(5).then(Partition::new(|x: &i64| *x < 3));
    assert_eq!(below.collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(rest.collect::<Vec<_>>(), vec![3, 4]);
}

#[test]
fn test_try_skips_failed_elements() {
    let invert = Try::new(|x: &i32| {
        if *x == 0 {
            Err("division by zero")
        } else {
            Ok(10 / x)
        }
    })
    .on_error(OnError::Skip);

    let out: Vec<i32> = vec![10, 0, 1].then(invert).collect();
    assert_eq!(out, vec![1, 10]);
}

#[test]
fn test_sources_restart_on_every_pass() {
    let evens = Range::new(10);
    let filter = nut_filter(|x: &i64| x % 2 == 0);

    let first: Vec<i64> = evens.then(&filter).then(Collect::new());
    let second: Vec<i64> = evens.then(&filter).then(Collect::new());
    assert_eq!(first, vec![0, 2, 4, 6, 8]);
    assert_eq!(first, second);
}

#[test]
fn test_long_pipeline() {
    let out: Vec<Vec<i64>> = Range::new(20)
        .then(nut_filter(|x: &i64| x % 3 != 0))
        .then(Square)
        .then(Take::new(6))
        .then(Chunk::new(4).unwrap())
        .collect();
    assert_eq!(out, vec![vec![1, 4, 16, 25], vec![49, 64]]);
}

fn far_beyond() -> impl Strategy<Value = usize> {
    prop_oneof![Just(usize::MAX), Just(usize::MAX - 1), 1_000usize..=usize::MAX]
}

proptest! {
    #[test]
    fn prop_oversized_parameters_keep_input(
        values in prop::collection::vec(any::<i32>(), 0..50),
        n in far_beyond(),
        seed in any::<u64>(),
    ) {
        let shuffled: Vec<i32> = values
            .clone()
            .then(Shuffle::new(n).unwrap().with_seed(seed))
            .collect();
        prop_assert_eq!(sorted(shuffled), sorted(values.clone()));

        let windows: Vec<Vec<i32>> = values.clone().then(Window::new(n).unwrap()).collect();
        prop_assert!(windows.is_empty());

        let taken: Vec<i32> = values.clone().then(Take::new(n)).collect();
        prop_assert_eq!(&taken, &values);

        let last: Vec<i32> = values.clone().then(Tail::new(n));
        prop_assert_eq!(last, values);
    }
}
