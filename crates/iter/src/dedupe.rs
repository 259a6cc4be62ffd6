//! Streaming removal of repeated keys.

use std::collections::HashSet;
use std::hash::Hash;

/// Yields an element only the first time its key is seen. The set of seen
/// keys grows without bound.
pub struct Dedupe<I, F, K> {
    iter: I,
    key: F,
    seen: HashSet<K>,
}

pub fn dedupe_by<I, F, K>(iterable: I, key: F) -> Dedupe<I::IntoIter, F, K>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> K,
    K: Hash + Eq,
{
    Dedupe {
        iter: iterable.into_iter(),
        key,
        seen: HashSet::new(),
    }
}

impl<I, F, K> Iterator for Dedupe<I, F, K>
where
    I: Iterator,
    F: FnMut(&I::Item) -> K,
    K: Hash + Eq,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        loop {
            let element = self.iter.next()?;
            if self.seen.insert((self.key)(&element)) {
                return Some(element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let out: Vec<i32> = dedupe_by(vec![2, 3, 1, 1, 2, 4], |x| *x).collect();
        assert_eq!(out, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_dedupe_with_key() {
        let data = vec![(1, 'a'), (2, 'a'), (3, 'b')];
        let out: Vec<(i32, char)> = dedupe_by(data, |(_, c)| *c).collect();
        assert_eq!(out, vec![(1, 'a'), (3, 'b')]);
    }

    proptest! {
        #[test]
        fn prop_dedupe_unique_and_ordered(data in prop::collection::vec(0u8..20, 0..200)) {
            let out: Vec<u8> = dedupe_by(data.clone(), |x| *x).collect();
            let unique: HashSet<u8> = out.iter().copied().collect();
            prop_assert_eq!(unique.len(), out.len());

            let mut expected = Vec::new();
            for x in data {
                if !expected.contains(&x) {
                    expected.push(x);
                }
            }
            prop_assert_eq!(out, expected);
        }
    }
}
