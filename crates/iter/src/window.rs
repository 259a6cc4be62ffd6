//! Sliding windows with stride one.

use std::collections::VecDeque;
use std::iter::FusedIterator;
use std::num::NonZeroUsize;

/// Each output holds the last `size` elements seen, oldest first
pub struct Windows<I: Iterator> {
    iter: I,
    size: usize,
    window: VecDeque<I::Item>,
    exhausted: bool,
}

pub fn windowed<I>(iterable: I, size: NonZeroUsize) -> Windows<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Clone,
{
    Windows {
        iter: iterable.into_iter(),
        size: size.get(),
        window: VecDeque::new(),
        exhausted: false,
    }
}

impl<I> Iterator for Windows<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.window.len() == self.size {
            self.window.pop_front();
        }
        while self.window.len() < self.size {
            match self.iter.next() {
                Some(element) => self.window.push_back(element),
                None => {
                    self.exhausted = true;
                    self.window.clear();
                    return None;
                }
            }
        }
        Some(self.window.iter().cloned().collect())
    }
}

impl<I> FusedIterator for Windows<I>
where
    I: Iterator,
    I::Item: Clone,
{
}
