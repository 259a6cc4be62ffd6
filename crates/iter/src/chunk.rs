//! Chunking: fixed-size, run-length by key, and split-on-predicate.

use std::num::NonZeroUsize;

/// Consecutive groups of `size` elements; only the final group may be shorter
#[derive(Debug, Clone)]
pub struct Chunks<I> {
    iter: I,
    size: usize,
}

/// Split `iterable` into chunks of `size` elements
pub fn chunked<I>(iterable: I, size: NonZeroUsize) -> Chunks<I::IntoIter>
where
    I: IntoIterator,
{
    Chunks {
        iter: iterable.into_iter(),
        size: size.get(),
    }
}

impl<I: Iterator> Iterator for Chunks<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<I::Item> = self.iter.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.iter.size_hint();
        let per = |n: usize| n.div_ceil(self.size);
        (per(lo), hi.map(per))
    }
}

/// Run-length grouping: a new chunk starts whenever the key changes from
/// the previous element's key. Equal keys that are not adjacent land in
/// different chunks.
pub struct ChunksBy<I: Iterator, F, K> {
    iter: I,
    key: F,
    pending: Option<(K, I::Item)>,
}

pub fn chunked_by<I, F, K>(iterable: I, key: F) -> ChunksBy<I::IntoIter, F, K>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> K,
    K: PartialEq,
{
    ChunksBy {
        iter: iterable.into_iter(),
        key,
        pending: None,
    }
}

impl<I, F, K> Iterator for ChunksBy<I, F, K>
where
    I: Iterator,
    F: FnMut(&I::Item) -> K,
    K: PartialEq,
{
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let (current, first) = match self.pending.take() {
            Some(pending) => pending,
            None => {
                let element = self.iter.next()?;
                ((self.key)(&element), element)
            }
        };

        let mut chunk = vec![first];
        for element in self.iter.by_ref() {
            let key = (self.key)(&element);
            if key != current {
                self.pending = Some((key, element));
                break;
            }
            chunk.push(element);
        }
        Some(chunk)
    }
}

/// A new chunk starts at every element for which the predicate holds; the
/// triggering element opens the new chunk.
pub struct ChunksWhen<I: Iterator, P> {
    iter: I,
    pred: P,
    pending: Option<I::Item>,
}

pub fn chunked_when<I, P>(iterable: I, pred: P) -> ChunksWhen<I::IntoIter, P>
where
    I: IntoIterator,
    P: FnMut(&I::Item) -> bool,
{
    ChunksWhen {
        iter: iterable.into_iter(),
        pred,
        pending: None,
    }
}

impl<I, P> Iterator for ChunksWhen<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = match self.pending.take() {
            Some(element) => element,
            None => self.iter.next()?,
        };

        let mut chunk = vec![first];
        for element in self.iter.by_ref() {
            if (self.pred)(&element) {
                self.pending = Some(element);
                break;
            }
            chunk.push(element);
        }
        Some(chunk)
    }
}
