//! Processors that regroup, unnest or reorder the upstream.

use crate::callback::{ElementFn, Key, KeyFn, Mapper, Predicate, RngSource};
use nutflow_core::{Error, Nut, NutKind, Result};
use nutflow_iter::{Chunks, ChunksBy, ChunksWhen, Group, Shuffled, SortedGroups, Windows};
use rand::rngs::StdRng;
use std::hash::Hash;
use std::num::NonZeroUsize;

fn positive(value: usize, what: &str) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value).ok_or_else(|| Error::configuration(format!("{what} must be positive")))
}

/// Consecutive groups of `n` elements; the last may be shorter
#[derive(Debug, Clone, Copy)]
pub struct Chunk {
    size: NonZeroUsize,
}

impl Chunk {
    pub fn new(n: usize) -> Result<Self> {
        Ok(Self {
            size: positive(n, "Chunk size")?,
        })
    }
}

impl<I: IntoIterator> Nut<I> for Chunk {
    const KIND: NutKind = NutKind::Processor;
    type Output = Chunks<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::chunked(input, self.size)
    }
}

/// Runs of adjacent elements sharing a key
pub struct ChunkBy<T, K> {
    key: Key<T, K>,
}

impl<T: 'static, K: 'static> ChunkBy<T, K> {
    pub fn new<F>(key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { key: Key::new(key) }
    }
}

impl<I, T, K> Nut<I> for ChunkBy<T, K>
where
    I: IntoIterator<Item = T>,
    T: 'static,
    K: PartialEq + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = ChunksBy<I::IntoIter, KeyFn<T, K>, K>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::chunked_by(input, self.key.boxed())
    }
}

/// A new chunk starts at each element for which `pred` holds
pub struct ChunkWhen<T> {
    pred: Key<T, bool>,
}

impl<T: 'static> ChunkWhen<T> {
    pub fn new<P>(pred: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            pred: Key::new(pred),
        }
    }
}

impl<I, T> Nut<I> for ChunkWhen<T>
where
    I: IntoIterator<Item = T>,
    T: 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = ChunksWhen<I::IntoIter, Predicate<T>>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::chunked_when(input, self.pred.boxed())
    }
}

/// Sliding windows of `n` elements with stride one
#[derive(Debug, Clone, Copy)]
pub struct Window {
    size: NonZeroUsize,
}

impl Window {
    pub fn new(n: usize) -> Result<Self> {
        Ok(Self {
            size: positive(n, "Window size")?,
        })
    }
}

impl<I> Nut<I> for Window
where
    I: IntoIterator,
    I::Item: Clone,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Windows<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::windowed(input, self.size)
    }
}

/// Removes one level of nesting.
///
/// Elements must be sequences themselves; wrap mixed input in
/// [`nutflow_iter::Nested`] so single values pass through as leaves.
/// `String` is not a sequence and is never split into characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flatten;

impl<I> Nut<I> for Flatten
where
    I: IntoIterator,
    I::Item: IntoIterator,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::Flatten<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::flatten(input)
    }
}

/// Maps each element to a sequence and concatenates the results
pub struct FlatMap<T, U> {
    f: Mapper<T, U>,
}

impl<T: 'static, U: 'static> FlatMap<T, U> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        Self { f: Mapper::new(f) }
    }
}

impl<I, T, U> Nut<I> for FlatMap<T, U>
where
    I: IntoIterator<Item = T>,
    T: 'static,
    U: IntoIterator + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::FlatMap<I::IntoIter, U, ElementFn<T, U>>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().flat_map(self.f.boxed())
    }
}

/// Groups the whole upstream by key.
///
/// Reads everything into memory. Groups come out in order of first
/// occurrence, each as `(key, elements)`.
pub struct GroupBy<T, K> {
    key: Key<T, K>,
}

impl<T: 'static, K: 'static> GroupBy<T, K> {
    pub fn new<F>(key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { key: Key::new(key) }
    }

    /// Yield only the element groups
    pub fn nokey(self) -> GroupByValues<T, K> {
        GroupByValues { key: self.key }
    }
}

impl<T, E> GroupBy<T, Option<E>>
where
    T: AsRef<[E]> + 'static,
    E: Clone + 'static,
{
    /// Group rows on their `index`-th column
    pub fn column(index: usize) -> Self {
        Self {
            key: Key::column(index),
        }
    }
}

impl<I, T, K> Nut<I> for GroupBy<T, K>
where
    I: IntoIterator<Item = T>,
    T: 'static,
    K: Hash + Eq + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = indexmap::map::IntoIter<K, Vec<T>>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::group_map(input, |x| self.key.call(x)).into_iter()
    }
}

/// [`GroupBy`] without the keys
pub struct GroupByValues<T, K> {
    key: Key<T, K>,
}

impl<I, T, K> Nut<I> for GroupByValues<T, K>
where
    I: IntoIterator<Item = T>,
    T: 'static,
    K: Hash + Eq + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = indexmap::map::IntoValues<K, Vec<T>>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::group_map(input, |x| self.key.call(x)).into_values()
    }
}

/// Lazy grouping of upstream that is already sorted by key.
///
/// Each group shares the upstream with the parent sequence, so it must be
/// consumed before the next group is requested. A group kept past that
/// point yields nothing further; the skipped elements are lost.
pub struct GroupBySorted<T, K> {
    key: Key<T, K>,
}

type SortedOf<I, T, K> = SortedGroups<I, KeyFn<T, K>, K>;

/// One group produced by [`GroupBySorted`]
pub type SortedGroup<I, T, K> = Group<I, KeyFn<T, K>, K>;

impl<T: 'static, K: 'static> GroupBySorted<T, K> {
    pub fn new<F>(key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { key: Key::new(key) }
    }

    pub fn nokey(self) -> GroupBySortedValues<T, K> {
        GroupBySortedValues { key: self.key }
    }
}

impl<T, E> GroupBySorted<T, Option<E>>
where
    T: AsRef<[E]> + 'static,
    E: Clone + 'static,
{
    pub fn column(index: usize) -> Self {
        Self {
            key: Key::column(index),
        }
    }
}

impl<I, T, K> Nut<I> for GroupBySorted<T, K>
where
    I: IntoIterator<Item = T>,
    T: 'static,
    K: PartialEq + Clone + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = SortedOf<I::IntoIter, T, K>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::group_by_sorted(input, self.key.boxed())
    }
}

/// [`GroupBySorted`] without the keys
pub struct GroupBySortedValues<T, K> {
    key: Key<T, K>,
}

fn value<K, G>(pair: (K, G)) -> G {
    pair.1
}

impl<I, T, K> Nut<I> for GroupBySortedValues<T, K>
where
    I: IntoIterator<Item = T>,
    T: 'static,
    K: PartialEq + Clone + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    #[allow(clippy::type_complexity)]
    type Output = std::iter::Map<
        SortedOf<I::IntoIter, T, K>,
        fn((K, SortedGroup<I::IntoIter, T, K>)) -> SortedGroup<I::IntoIter, T, K>,
    >;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::group_by_sorted(input, self.key.boxed()).map(
            value::<K, SortedGroup<I::IntoIter, T, K>>
                as fn((K, SortedGroup<I::IntoIter, T, K>)) -> SortedGroup<I::IntoIter, T, K>,
        )
    }
}

/// Bounded-memory shuffle with a buffer of `k` elements.
///
/// `k = 1` keeps the input order; `k` at least the input length gives a
/// full random permutation. Each evaluation draws its own generator.
#[derive(Debug, Clone)]
pub struct Shuffle {
    capacity: NonZeroUsize,
    rng: RngSource,
}

impl Shuffle {
    pub fn new(k: usize) -> Result<Self> {
        Ok(Self {
            capacity: positive(k, "Shuffle buffer size")?,
            rng: RngSource::default(),
        })
    }

    /// Reseed on every evaluation so repeated runs agree
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RngSource::Seed(seed);
        self
    }

    /// Start every evaluation from a clone of `rng`
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = RngSource::Fixed(rng);
        self
    }
}

impl<I: IntoIterator> Nut<I> for Shuffle {
    const KIND: NutKind = NutKind::Processor;
    type Output = Shuffled<I::IntoIter, StdRng>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::shuffled(input, self.capacity, self.rng.generator())
    }
}
