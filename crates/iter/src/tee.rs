//! Splitting one upstream into several independently consumable branches.
//!
//! Branches share the upstream and buffer whatever one branch has pulled
//! but another has not consumed yet, so memory grows with the skew between
//! the fastest and the slowest branch. Branches are single-threaded.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

struct TeeShared<I: Iterator> {
    iter: I,
    // `None` once the branch has been dropped, so nothing is buffered for it
    buffers: Vec<Option<VecDeque<I::Item>>>,
}

/// One branch of a [`tee`]
pub struct Tee<I: Iterator> {
    shared: Rc<RefCell<TeeShared<I>>>,
    index: usize,
}

/// Split `iterable` into `n` branches that each yield every element
pub fn tee<I>(iterable: I, n: usize) -> Vec<Tee<I::IntoIter>>
where
    I: IntoIterator,
    I::Item: Clone,
{
    let shared = Rc::new(RefCell::new(TeeShared {
        iter: iterable.into_iter(),
        buffers: (0..n).map(|_| Some(VecDeque::new())).collect(),
    }));
    (0..n)
        .map(|index| Tee {
            shared: Rc::clone(&shared),
            index,
        })
        .collect()
}

impl<I> Iterator for Tee<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let mut guard = self.shared.borrow_mut();
        let shared = &mut *guard;

        if let Some(Some(buffer)) = shared.buffers.get_mut(self.index) {
            if let Some(element) = buffer.pop_front() {
                return Some(element);
            }
        }

        let element = shared.iter.next()?;
        for (i, buffer) in shared.buffers.iter_mut().enumerate() {
            if i == self.index {
                continue;
            }
            if let Some(buffer) = buffer {
                buffer.push_back(element.clone());
            }
        }
        Some(element)
    }
}

impl<I: Iterator> Drop for Tee<I> {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.try_borrow_mut() {
            if let Some(slot) = shared.buffers.get_mut(self.index) {
                *slot = None;
            }
        }
    }
}

struct PartitionShared<I: Iterator, P> {
    iter: I,
    pred: P,
    // index 0 holds elements for the true branch, 1 for the false branch
    queues: [VecDeque<I::Item>; 2],
}

/// One side of a [`partition`]
pub struct Partition<I: Iterator, P> {
    shared: Rc<RefCell<PartitionShared<I, P>>>,
    side: usize,
}

/// Split `iterable` into the elements satisfying `pred` and the rest.
///
/// Each element is tested once and routed to the branch it belongs to, so
/// the two branches may be consumed in any order.
pub fn partition<I, P>(iterable: I, pred: P) -> (Partition<I::IntoIter, P>, Partition<I::IntoIter, P>)
where
    I: IntoIterator,
    P: FnMut(&I::Item) -> bool,
{
    let shared = Rc::new(RefCell::new(PartitionShared {
        iter: iterable.into_iter(),
        pred,
        queues: [VecDeque::new(), VecDeque::new()],
    }));
    (
        Partition {
            shared: Rc::clone(&shared),
            side: 0,
        },
        Partition { shared, side: 1 },
    )
}

impl<I, P> Iterator for Partition<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let mut guard = self.shared.borrow_mut();
        let shared = &mut *guard;

        if let Some(element) = shared.queues[self.side].pop_front() {
            return Some(element);
        }

        loop {
            let element = shared.iter.next()?;
            let side = if (shared.pred)(&element) { 0 } else { 1 };
            if side == self.side {
                return Some(element);
            }
            // Only buffer for the other branch while it is still alive
            if Rc::strong_count(&self.shared) > 1 {
                shared.queues[side].push_back(element);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tee_branches_see_everything() {
        let mut branches = tee(1..=3, 2);
        let second = branches.pop().unwrap();
        let first = branches.pop().unwrap();
        assert_eq!(first.collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(second.collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_tee_interleaved_consumption() {
        let mut branches = tee(vec!['a', 'b', 'c'], 3);
        assert_eq!(branches[0].next(), Some('a'));
        assert_eq!(branches[0].next(), Some('b'));
        assert_eq!(branches[2].next(), Some('a'));
        assert_eq!(branches[1].next(), Some('a'));
        assert_eq!(branches[0].next(), Some('c'));
        assert_eq!(branches[1].by_ref().collect::<String>(), "bc");
        assert_eq!(branches[2].by_ref().collect::<String>(), "bc");
    }

    #[test]
    fn test_tee_dropped_branch_stops_buffering() {
        let mut branches = tee(0..100, 2);
        let dropped = branches.pop().unwrap();
        drop(dropped);
        let first = branches.pop().unwrap();
        assert_eq!(first.count(), 100);
    }

    #[test]
    fn test_partition_splits_by_predicate() {
        let (small, large) = partition(vec![0, 1, 2, 3, 4], |x| *x < 3);
        assert_eq!(large.collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(small.collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_partition_out_of_lockstep() {
        let (mut even, mut odd) = partition(0..10, |x| x % 2 == 0);
        assert_eq!(odd.next(), Some(1));
        assert_eq!(odd.next(), Some(3));
        assert_eq!(even.next(), Some(0));
        let rest_even: Vec<i32> = even.collect();
        let rest_odd: Vec<i32> = odd.collect();
        assert_eq!(rest_even, vec![2, 4, 6, 8]);
        assert_eq!(rest_odd, vec![5, 7, 9]);
    }

    #[test]
    fn test_partition_union_is_input() {
        let data: Vec<i32> = (0..50).map(|x| (x * 37) % 11).collect();
        let (a, b) = partition(data.clone(), |x| *x > 5);
        let mut union: Vec<i32> = a.chain(b).collect();
        let mut expected = data;
        union.sort_unstable();
        expected.sort_unstable();
        assert_eq!(union, expected);
    }
}
