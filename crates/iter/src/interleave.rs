//! Round-robin interleaving that keeps going after shorter inputs run out.

use std::collections::VecDeque;

/// Takes one element from each live iterator in turn; an exhausted iterator
/// leaves the rotation and the others continue.
#[derive(Debug, Clone)]
pub struct Interleave<I> {
    live: VecDeque<I>,
}

pub fn interleave<I, It>(iterables: I) -> Interleave<It::IntoIter>
where
    I: IntoIterator<Item = It>,
    It: IntoIterator,
{
    Interleave {
        live: iterables.into_iter().map(IntoIterator::into_iter).collect(),
    }
}

impl<I: Iterator> Iterator for Interleave<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        while let Some(mut iter) = self.live.pop_front() {
            if let Some(element) = iter.next() {
                self.live.push_back(iter);
                return Some(element);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.live.iter().fold((0, Some(0)), |(lo, hi), iter| {
            let (l, h) = iter.size_hint();
            (
                lo.saturating_add(l),
                hi.and_then(|hi| h.and_then(|h| hi.checked_add(h))),
            )
        })
    }
}
