//! Bounded-memory partial shuffle.

use rand::seq::SliceRandom;
use rand::Rng;
use std::num::NonZeroUsize;

/// Where a [`Shuffled`] iterator is in its life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShufflePhase {
    /// Buffer not loaded yet
    Filling,
    /// Each upstream element replaces a randomly chosen buffered one
    Steady,
    /// Upstream exhausted, emptying the buffer
    Draining,
    Done,
}

/// Reservoir-style shuffle over a buffer of `capacity` elements.
///
/// The buffer is loaded and shuffled, then every further upstream element
/// evicts a uniformly chosen buffered element, which is yielded. Once the
/// upstream runs dry the remaining buffer is yielded in buffer order. With a
/// capacity of one the output order equals the input order; with a capacity
/// of at least the input length the output is a full random permutation.
pub struct Shuffled<I: Iterator, R> {
    iter: I,
    rng: R,
    capacity: usize,
    buffer: Vec<I::Item>,
    drain: std::vec::IntoIter<I::Item>,
    phase: ShufflePhase,
}

pub fn shuffled<I, R>(iterable: I, capacity: NonZeroUsize, rng: R) -> Shuffled<I::IntoIter, R>
where
    I: IntoIterator,
    R: Rng,
{
    Shuffled {
        iter: iterable.into_iter(),
        rng,
        capacity: capacity.get(),
        buffer: Vec::new(),
        drain: Vec::new().into_iter(),
        phase: ShufflePhase::Filling,
    }
}

impl<I: Iterator, R> Shuffled<I, R> {
    pub fn phase(&self) -> ShufflePhase {
        self.phase
    }

    /// Elements currently held back in the buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len() + self.drain.len()
    }
}

impl<I, R> Iterator for Shuffled<I, R>
where
    I: Iterator,
    R: Rng,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        loop {
            match self.phase {
                ShufflePhase::Filling => {
                    self.buffer
                        .extend(self.iter.by_ref().take(self.capacity));
                    self.buffer.shuffle(&mut self.rng);
                    self.phase = if self.buffer.len() < self.capacity {
                        self.start_draining()
                    } else {
                        ShufflePhase::Steady
                    };
                }
                ShufflePhase::Steady => match self.iter.next() {
                    Some(element) => {
                        let i = self.rng.gen_range(0..self.buffer.len());
                        return Some(std::mem::replace(&mut self.buffer[i], element));
                    }
                    None => self.phase = self.start_draining(),
                },
                ShufflePhase::Draining => match self.drain.next() {
                    Some(element) => return Some(element),
                    None => self.phase = ShufflePhase::Done,
                },
                ShufflePhase::Done => return None,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.iter.size_hint();
        let held = self.buffered();
        (lo.saturating_add(held), hi.and_then(|hi| hi.checked_add(held)))
    }
}

impl<I: Iterator, R> Shuffled<I, R> {
    fn start_draining(&mut self) -> ShufflePhase {
        self.drain = std::mem::take(&mut self.buffer).into_iter();
        ShufflePhase::Draining
    }
}
