//! Grouping by key: an eager hash grouping and a lazy grouping over input
//! that is already sorted by the key.

use indexmap::IndexMap;
use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

/// Group all elements by key.
///
/// Materializes the whole input. Groups come out in order of the first
/// occurrence of their key, and each group keeps input order.
pub fn group_by<I, F, K>(iterable: I, key: F) -> indexmap::map::IntoIter<K, Vec<I::Item>>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> K,
    K: Hash + Eq,
{
    group_map(iterable, key).into_iter()
}

/// [`group_by`] without the iterator wrapper
pub fn group_map<I, F, K>(iterable: I, mut key: F) -> IndexMap<K, Vec<I::Item>>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> K,
    K: Hash + Eq,
{
    let mut groups: IndexMap<K, Vec<I::Item>> = IndexMap::new();
    for element in iterable {
        groups.entry(key(&element)).or_default().push(element);
    }
    groups
}

struct GroupState<I: Iterator, F, K> {
    iter: I,
    key: F,
    current: Option<K>,
    pending: Option<(K, I::Item)>,
    generation: usize,
}

/// Lazy `(key, group)` pairs over input sorted by key.
///
/// Groups share the upstream with their parent. A group must be consumed
/// before the parent is advanced: advancing skips whatever is left of the
/// previous group, and a group held past that point yields nothing more.
pub struct SortedGroups<I: Iterator, F, K> {
    state: Rc<RefCell<GroupState<I, F, K>>>,
}

/// One group handed out by [`SortedGroups`]
pub struct Group<I: Iterator, F, K> {
    state: Rc<RefCell<GroupState<I, F, K>>>,
    generation: usize,
    first: Option<I::Item>,
}

pub fn group_by_sorted<I, F, K>(iterable: I, key: F) -> SortedGroups<I::IntoIter, F, K>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> K,
    K: PartialEq + Clone,
{
    SortedGroups {
        state: Rc::new(RefCell::new(GroupState {
            iter: iterable.into_iter(),
            key,
            current: None,
            pending: None,
            generation: 0,
        })),
    }
}

impl<I, F, K> Iterator for SortedGroups<I, F, K>
where
    I: Iterator,
    F: FnMut(&I::Item) -> K,
    K: PartialEq + Clone,
{
    type Item = (K, Group<I, F, K>);

    fn next(&mut self) -> Option<Self::Item> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.generation += 1;

        let (key, first) = match state.pending.take() {
            Some(pending) => pending,
            None => loop {
                let element = state.iter.next()?;
                let key = (state.key)(&element);
                if state.current.as_ref() != Some(&key) {
                    break (key, element);
                }
            },
        };

        state.current = Some(key.clone());
        let generation = state.generation;
        drop(guard);

        Some((
            key,
            Group {
                state: Rc::clone(&self.state),
                generation,
                first: Some(first),
            },
        ))
    }
}

impl<I, F, K> Iterator for Group<I, F, K>
where
    I: Iterator,
    F: FnMut(&I::Item) -> K,
    K: PartialEq,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }

        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.generation != self.generation || state.pending.is_some() {
            return None;
        }

        let element = state.iter.next()?;
        let key = (state.key)(&element);
        if state.current.as_ref() == Some(&key) {
            Some(element)
        } else {
            state.pending = Some((key, element));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_by_first_occurrence_order() {
        let groups: Vec<(bool, Vec<i32>)> = group_by(vec![1, 2, 3, 4, 5], |x| x % 2 == 0).collect();
        assert_eq!(groups, vec![(false, vec![1, 3, 5]), (true, vec![2, 4])]);
    }

    #[test]
    fn test_group_by_non_adjacent_keys_merge() {
        let groups: Vec<(char, Vec<&str>)> =
            group_by(vec!["ab", "cd", "ae"], |s| s.chars().next().unwrap_or(' ')).collect();
        assert_eq!(groups, vec![('a', vec!["ab", "ae"]), ('c', vec!["cd"])]);
    }

    #[test]
    fn test_group_by_sorted_fully_drained() {
        let groups: Vec<(i32, Vec<i32>)> = group_by_sorted(vec![1, 1, 2, 3, 3, 3], |x| *x)
            .map(|(k, g)| (k, g.collect()))
            .collect();
        assert_eq!(groups, vec![(1, vec![1, 1]), (2, vec![2]), (3, vec![3, 3, 3])]);
    }

    #[test]
    fn test_group_by_sorted_skips_undrained_remainder() {
        let mut groups = group_by_sorted(vec![(1, 'a'), (1, 'b'), (2, 'c')], |x| x.0);
        let (key, mut first) = groups.next().unwrap();
        assert_eq!(key, 1);
        assert_eq!(first.next(), Some((1, 'a')));

        let (key, second) = groups.next().unwrap();
        assert_eq!(key, 2);
        // the stale group no longer yields once the parent has moved on
        assert_eq!(first.next(), None);
        assert_eq!(second.collect::<Vec<_>>(), vec![(2, 'c')]);
        assert!(groups.next().is_none());
    }

    #[test]
    fn test_group_by_sorted_buffered_group_is_empty_after_advance() {
        let mut groups = group_by_sorted(vec![1, 1, 2, 2], |x| *x);
        let (_, first) = groups.next().unwrap();
        let (_, second) = groups.next().unwrap();
        // only the element captured when the group was opened survives
        assert_eq!(first.collect::<Vec<_>>(), vec![1]);
        assert_eq!(second.collect::<Vec<_>>(), vec![2, 2]);
    }

    #[test]
    fn test_group_by_sorted_empty() {
        assert!(group_by_sorted(Vec::<i32>::new(), |x| *x).next().is_none());
    }
}
