//! Built-in sources.
//!
//! A source is iterated directly (`for x in &Range::new(3)`) and restarts
//! on every pass. Chaining an upstream into a source is a usage error.

use nutflow_core::{Error, Nut, NutKind, Result};
use std::marker::PhantomData;

const NO_INPUTS: &str = "sources don't have inputs";

fn leftmost<T>(unit: &str) -> Result<T> {
    Err(Error::usage(unit, NO_INPUTS))
}

/// Integers from `start` towards `end` (exclusive) in steps of `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: i64,
    end: i64,
    step: i64,
}

impl Range {
    /// `0, 1, .., end - 1`
    pub fn new(end: i64) -> Self {
        Self {
            start: 0,
            end,
            step: 1,
        }
    }

    pub fn between(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            step: 1,
        }
    }

    /// A negative step counts down; a zero step is rejected
    pub fn stepped(start: i64, end: i64, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(Error::configuration("Range step must not be zero"));
        }
        Ok(Self { start, end, step })
    }

    pub fn iter(&self) -> RangeIter {
        RangeIter {
            next: Some(self.start),
            end: self.end,
            step: self.step,
        }
    }
}

/// Iterator over a [`Range`]
#[derive(Debug, Clone)]
pub struct RangeIter {
    next: Option<i64>,
    end: i64,
    step: i64,
}

impl Iterator for RangeIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let current = self.next?;
        let inside = if self.step > 0 {
            current < self.end
        } else {
            current > self.end
        };
        if !inside {
            self.next = None;
            return None;
        }
        self.next = current.checked_add(self.step);
        Some(current)
    }
}

impl IntoIterator for Range {
    type Item = i64;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

impl IntoIterator for &Range {
    type Item = i64;
    type IntoIter = RangeIter;

    fn into_iter(self) -> RangeIter {
        self.iter()
    }
}

impl<In> Nut<In> for Range {
    const KIND: NutKind = NutKind::Source;
    type Output = Result<RangeIter>;

    fn apply(&self, _input: In) -> Self::Output {
        leftmost("Range")
    }
}

/// Unbounded counter `start, start + 1, ..`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Enumerate {
    start: i64,
}

impl Enumerate {
    pub fn new(start: i64) -> Self {
        Self { start }
    }

    pub fn iter(&self) -> std::ops::RangeFrom<i64> {
        self.start..
    }
}

impl IntoIterator for &Enumerate {
    type Item = i64;
    type IntoIter = std::ops::RangeFrom<i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Enumerate {
    type Item = i64;
    type IntoIter = std::ops::RangeFrom<i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<In> Nut<In> for Enumerate {
    const KIND: NutKind = NutKind::Source;
    type Output = Result<std::ops::RangeFrom<i64>>;

    fn apply(&self, _input: In) -> Self::Output {
        leftmost("Enumerate")
    }
}

/// One value repeated `times` times, or forever
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repeat<T> {
    value: T,
    times: Option<usize>,
}

impl<T: Clone> Repeat<T> {
    pub fn forever(value: T) -> Self {
        Self { value, times: None }
    }

    pub fn times(value: T, times: usize) -> Self {
        Self {
            value,
            times: Some(times),
        }
    }

    pub fn iter(&self) -> Repeated<T> {
        Repeated {
            value: self.value.clone(),
            remaining: self.times,
        }
    }
}

/// Iterator over a [`Repeat`]
#[derive(Debug, Clone)]
pub struct Repeated<T> {
    value: T,
    remaining: Option<usize>,
}

impl<T: Clone> Iterator for Repeated<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match &mut self.remaining {
            None => Some(self.value.clone()),
            Some(0) => None,
            Some(n) => {
                *n -= 1;
                Some(self.value.clone())
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            None => (usize::MAX, None),
            Some(n) => (n, Some(n)),
        }
    }
}

impl<T: Clone> IntoIterator for &Repeat<T> {
    type Item = T;
    type IntoIter = Repeated<T>;

    fn into_iter(self) -> Repeated<T> {
        self.iter()
    }
}

impl<T: Clone> IntoIterator for Repeat<T> {
    type Item = T;
    type IntoIter = Repeated<T>;

    fn into_iter(self) -> Repeated<T> {
        Repeated {
            value: self.value,
            remaining: self.times,
        }
    }
}

impl<In, T: Clone> Nut<In> for Repeat<T> {
    const KIND: NutKind = NutKind::Source;
    type Output = Result<Repeated<T>>;

    fn apply(&self, _input: In) -> Self::Output {
        leftmost("Repeat")
    }
}

/// Cartesian product of two collections, left-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product<A, B> {
    left: Vec<A>,
    right: Vec<B>,
}

impl<A: Clone, B: Clone> Product<A, B> {
    pub fn new(left: impl IntoIterator<Item = A>, right: impl IntoIterator<Item = B>) -> Self {
        Self {
            left: left.into_iter().collect(),
            right: right.into_iter().collect(),
        }
    }

    pub fn iter(&self) -> ProductIter<'_, A, B> {
        ProductIter {
            left: &self.left,
            right: &self.right,
            i: 0,
            j: 0,
        }
    }
}

/// Iterator over a [`Product`]
#[derive(Debug, Clone)]
pub struct ProductIter<'a, A, B> {
    left: &'a [A],
    right: &'a [B],
    i: usize,
    j: usize,
}

impl<A: Clone, B: Clone> Iterator for ProductIter<'_, A, B> {
    type Item = (A, B);

    fn next(&mut self) -> Option<(A, B)> {
        if self.j == self.right.len() {
            self.i += 1;
            self.j = 0;
        }
        let a = self.left.get(self.i)?;
        let b = self.right.get(self.j)?;
        self.j += 1;
        Some((a.clone(), b.clone()))
    }
}

impl<'a, A: Clone, B: Clone> IntoIterator for &'a Product<A, B> {
    type Item = (A, B);
    type IntoIter = ProductIter<'a, A, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over a [`Product`]
#[derive(Debug, Clone)]
pub struct ProductIntoIter<A, B> {
    left: std::vec::IntoIter<A>,
    current: Option<A>,
    right: Vec<B>,
    j: usize,
}

impl<A: Clone, B: Clone> Iterator for ProductIntoIter<A, B> {
    type Item = (A, B);

    fn next(&mut self) -> Option<(A, B)> {
        if self.right.is_empty() {
            return None;
        }
        if self.current.is_none() || self.j == self.right.len() {
            self.current = Some(self.left.next()?);
            self.j = 0;
        }
        let a = self.current.clone()?;
        let b = self.right[self.j].clone();
        self.j += 1;
        Some((a, b))
    }
}

impl<A: Clone, B: Clone> IntoIterator for Product<A, B> {
    type Item = (A, B);
    type IntoIter = ProductIntoIter<A, B>;

    fn into_iter(self) -> Self::IntoIter {
        ProductIntoIter {
            left: self.left.into_iter(),
            current: None,
            right: self.right,
            j: 0,
        }
    }
}

impl<In, A: Clone, B: Clone> Nut<In> for Product<A, B> {
    const KIND: NutKind = NutKind::Source;
    type Output = Result<std::vec::IntoIter<(A, B)>>;

    fn apply(&self, _input: In) -> Self::Output {
        leftmost("Product")
    }
}

/// A source that yields nothing
pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Empty<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for Empty<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for &Empty<T> {
    type Item = T;
    type IntoIter = std::iter::Empty<T>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::empty()
    }
}

impl<T> IntoIterator for Empty<T> {
    type Item = T;
    type IntoIter = std::iter::Empty<T>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::empty()
    }
}

impl<In, T> Nut<In> for Empty<T> {
    const KIND: NutKind = NutKind::Source;
    type Output = Result<std::iter::Empty<T>>;

    fn apply(&self, _input: In) -> Self::Output {
        leftmost("Empty")
    }
}
