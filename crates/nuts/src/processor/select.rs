//! Processors that keep or drop elements without changing them.

use crate::callback::{Key, KeyFn, Predicate, RngSource};
use nutflow_core::{Error, Nut, NutKind, Result};
use rand::rngs::StdRng;
use rand::Rng;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// The first `n` elements
#[derive(Debug, Clone, Copy)]
pub struct Take {
    n: usize,
}

impl Take {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<I: IntoIterator> Nut<I> for Take {
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::Take<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().take(self.n)
    }
}

/// Everything after the first `n` elements
#[derive(Debug, Clone, Copy)]
pub struct Skip {
    n: usize,
}

impl Skip {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<I: IntoIterator> Nut<I> for Skip {
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::Skip<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().skip(self.n)
    }
}

/// Positions `start, start + step, ..` below `stop`
#[derive(Debug, Clone, Copy)]
pub struct Slice {
    start: usize,
    stop: Option<usize>,
    step: NonZeroUsize,
}

impl Slice {
    pub fn new(start: usize, stop: Option<usize>, step: usize) -> Result<Self> {
        let step = NonZeroUsize::new(step)
            .ok_or_else(|| Error::configuration("Slice step must be positive"))?;
        Ok(Self { start, stop, step })
    }
}

impl<I: IntoIterator> Nut<I> for Slice {
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::StepBy<std::iter::Take<std::iter::Skip<I::IntoIter>>>;

    fn apply(&self, input: I) -> Self::Output {
        let len = self
            .stop
            .map_or(usize::MAX, |stop| stop.saturating_sub(self.start));
        input
            .into_iter()
            .skip(self.start)
            .take(len)
            .step_by(self.step.get())
    }
}

/// Leading elements while `pred` holds
pub struct TakeWhile<T> {
    pred: Key<T, bool>,
}

impl<T: 'static> TakeWhile<T> {
    pub fn new<P>(pred: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            pred: Key::new(pred),
        }
    }
}

impl<I, T> Nut<I> for TakeWhile<T>
where
    I: IntoIterator<Item = T>,
    T: 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::TakeWhile<I::IntoIter, Predicate<T>>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().take_while(self.pred.boxed())
    }
}

/// Everything from the first element for which `pred` fails
pub struct DropWhile<T> {
    pred: Key<T, bool>,
}

impl<T: 'static> DropWhile<T> {
    pub fn new<P>(pred: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            pred: Key::new(pred),
        }
    }
}

impl<I, T> Nut<I> for DropWhile<T>
where
    I: IntoIterator<Item = T>,
    T: 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::SkipWhile<I::IntoIter, Predicate<T>>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().skip_while(self.pred.boxed())
    }
}

#[derive(Debug, Clone, Copy)]
enum PickMode {
    Every(NonZeroUsize),
    Probability(f64),
}

/// Every n-th element, or each element independently with probability p
#[derive(Debug, Clone)]
pub struct Pick {
    mode: PickMode,
    rng: RngSource,
}

impl Pick {
    /// Elements at positions `0, n, 2n, ..`
    pub fn every(n: usize) -> Result<Self> {
        let n = NonZeroUsize::new(n)
            .ok_or_else(|| Error::configuration("Pick step must be positive"))?;
        Ok(Self {
            mode: PickMode::Every(n),
            rng: RngSource::default(),
        })
    }

    pub fn probability(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::configuration(format!(
                "Probability must be in [0, 1]: {p}"
            )));
        }
        Ok(Self {
            mode: PickMode::Probability(p),
            rng: RngSource::default(),
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RngSource::Seed(seed);
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = RngSource::Fixed(rng);
        self
    }
}

impl<I: IntoIterator> Nut<I> for Pick {
    const KIND: NutKind = NutKind::Processor;
    type Output = Picked<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        Picked {
            iter: input.into_iter(),
            mode: self.mode,
            rng: self.rng.generator(),
            position: 0,
        }
    }
}

/// Output of [`Pick`]
pub struct Picked<I> {
    iter: I,
    mode: PickMode,
    rng: StdRng,
    position: usize,
}

impl<I: Iterator> Iterator for Picked<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        loop {
            let element = self.iter.next()?;
            let position = self.position;
            self.position += 1;
            let keep = match self.mode {
                PickMode::Every(n) => position % n.get() == 0,
                PickMode::Probability(p) => self.rng.gen_bool(p),
            };
            if keep {
                return Some(element);
            }
        }
    }
}

/// First occurrence of every key; remembers all keys seen
pub struct Dedupe<T, K> {
    key: Key<T, K>,
}

impl<T: Clone + 'static> Dedupe<T, T> {
    pub fn new() -> Self {
        Self::by(T::clone)
    }
}

impl<T: Clone + 'static> Default for Dedupe<T, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static, K: 'static> Dedupe<T, K> {
    pub fn by<F>(key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { key: Key::new(key) }
    }
}

impl<I, T, K> Nut<I> for Dedupe<T, K>
where
    I: IntoIterator<Item = T>,
    T: 'static,
    K: Hash + Eq + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = nutflow_iter::Dedupe<I::IntoIter, KeyFn<T, K>, K>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::dedupe_by(input, self.key.boxed())
    }
}

/// Repeats the upstream forever
#[derive(Debug, Clone, Copy, Default)]
pub struct Cycle;

impl<I> Nut<I> for Cycle
where
    I: IntoIterator,
    I::IntoIter: Clone,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::Cycle<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().cycle()
    }
}
