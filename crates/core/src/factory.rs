//! Construction of units from plain functions.
//!
//! Each constructor wraps a fully-bound call site: the closure's signature
//! decides where the upstream sequence (or element) goes, and the `_with`
//! variants capture construction-time arguments once and pass them by
//! reference after the upstream on every invocation.

use crate::errors::{Error, Result};
use crate::nut::{Mapped, Nut, NutKind, Seq};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A unit that produces a sequence from no upstream input
pub struct Source<F> {
    name: &'static str,
    f: F,
}

impl<F, It> Source<F>
where
    F: Fn() -> It,
    It: IntoIterator,
{
    pub fn new(f: F) -> Self {
        Self { name: "Source", f }
    }

    /// Name used in error messages
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Start a fresh pass over the source
    pub fn iter(&self) -> It::IntoIter {
        (self.f)().into_iter()
    }
}

impl<F, It> IntoIterator for Source<F>
where
    F: Fn() -> It,
    It: IntoIterator,
{
    type Item = It::Item;
    type IntoIter = It::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, F, It> IntoIterator for &'a Source<F>
where
    F: Fn() -> It,
    It: IntoIterator,
{
    type Item = It::Item;
    type IntoIter = It::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sources must be the leftmost element of a chain; applying one to an
/// upstream is a usage error.
impl<In, F, It> Nut<In> for Source<F>
where
    F: Fn() -> It,
    It: IntoIterator,
{
    const KIND: NutKind = NutKind::Source;
    type Output = Result<It::IntoIter>;

    fn apply(&self, _input: In) -> Self::Output {
        Err(Error::usage(self.name, "sources don't have inputs"))
    }
}

impl<F> fmt::Debug for Source<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source").field("name", &self.name).finish()
    }
}

/// A unit mapped over the upstream one element at a time
pub struct Function<F> {
    name: &'static str,
    f: Arc<F>,
}

impl<F> Function<F> {
    pub fn new(f: F) -> Self {
        Self {
            name: "Function",
            f: Arc::new(f),
        }
    }

    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply the function to a single element
    pub fn call<T, O>(&self, element: T) -> O
    where
        F: Fn(T) -> O,
    {
        (self.f)(element)
    }
}

impl<F> Clone for Function<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            f: Arc::clone(&self.f),
        }
    }
}

impl<I, F, O> Nut<I> for Function<F>
where
    I: IntoIterator,
    F: Fn(I::Item) -> O,
{
    const KIND: NutKind = NutKind::Function;
    type Output = Mapped<I::IntoIter, F>;

    fn apply(&self, input: I) -> Self::Output {
        Mapped::new(input.into_iter(), Arc::clone(&self.f))
    }
}

impl<F> fmt::Debug for Function<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function").field("name", &self.name).finish()
    }
}

/// A unit that transforms a whole upstream sequence
pub struct Processor<F, T> {
    name: &'static str,
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<F, T> Processor<F, T> {
    pub fn new(f: F) -> Self {
        Self {
            name: "Processor",
            f,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<I, F, T, O> Nut<I> for Processor<F, T>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: 'static,
    F: Fn(Seq<'static, T>) -> O,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = O;

    fn apply(&self, input: I) -> O {
        (self.f)(Box::new(input.into_iter()))
    }
}

impl<F, T> fmt::Debug for Processor<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor").field("name", &self.name).finish()
    }
}

/// A terminal unit that reduces a sequence to a value
pub struct Sink<F, T> {
    name: &'static str,
    f: F,
    _marker: PhantomData<fn(T)>,
}

impl<F, T> Sink<F, T> {
    pub fn new(f: F) -> Self {
        Self {
            name: "Sink",
            f,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Invoke the sink directly; identical to chaining `input` into it
    pub fn call<I, O>(&self, input: I) -> O
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
        F: Fn(Seq<'static, T>) -> O,
    {
        self.apply(input)
    }
}

impl<I, F, T, O> Nut<I> for Sink<F, T>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: 'static,
    F: Fn(Seq<'static, T>) -> O,
{
    const KIND: NutKind = NutKind::Sink;
    type Output = O;

    fn apply(&self, input: I) -> O {
        (self.f)(Box::new(input.into_iter()))
    }
}

impl<F, T> fmt::Debug for Sink<F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("name", &self.name).finish()
    }
}

/// A processor that keeps elements passing (or, inverted, failing) a test
pub struct Filter<F> {
    pred: Arc<F>,
    invert: bool,
}

impl<F> Filter<F> {
    /// Keep elements for which `pred` is true
    pub fn keep(pred: F) -> Self {
        Self {
            pred: Arc::new(pred),
            invert: false,
        }
    }

    /// Keep elements for which `pred` is false
    pub fn reject(pred: F) -> Self {
        Self {
            pred: Arc::new(pred),
            invert: true,
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.invert
    }
}

impl<F> Clone for Filter<F> {
    fn clone(&self) -> Self {
        Self {
            pred: Arc::clone(&self.pred),
            invert: self.invert,
        }
    }
}

impl<I, F> Nut<I> for Filter<F>
where
    I: IntoIterator,
    F: Fn(&I::Item) -> bool,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Filtered<I::IntoIter, F>;

    fn apply(&self, input: I) -> Self::Output {
        Filtered {
            iter: input.into_iter(),
            pred: Arc::clone(&self.pred),
            invert: self.invert,
        }
    }
}

/// Output of a [`Filter`]
pub struct Filtered<I, F> {
    iter: I,
    pred: Arc<F>,
    invert: bool,
}

impl<I, F> Iterator for Filtered<I, F>
where
    I: Iterator,
    F: Fn(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        loop {
            let element = self.iter.next()?;
            if (self.pred)(&element) != self.invert {
                return Some(element);
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.iter.size_hint().1)
    }
}

/// Build a source from a function producing a fresh iterable on every pass
pub fn nut_source<F, It>(f: F) -> Source<F>
where
    F: Fn() -> It,
    It: IntoIterator,
{
    Source::new(f)
}

/// Build a source whose producer receives captured arguments
pub fn nut_source_with<A, F, It>(args: A, f: F) -> Source<impl Fn() -> It>
where
    F: Fn(&A) -> It,
    It: IntoIterator,
{
    Source::new(move || f(&args))
}

/// Build a function-kind unit
pub fn nut_function<F>(f: F) -> Function<F> {
    Function::new(f)
}

/// Build a function-kind unit; captured arguments follow the element
pub fn nut_function_with<A, T, O, F>(args: A, f: F) -> Function<impl Fn(T) -> O>
where
    F: Fn(T, &A) -> O,
{
    Function::new(move |element| f(element, &args))
}

/// Build a processor from a function over the boxed upstream sequence
pub fn nut_processor<T, O, F>(f: F) -> Processor<F, T>
where
    F: Fn(Seq<'static, T>) -> O,
{
    Processor::new(f)
}

/// Build a processor; captured arguments follow the upstream sequence
pub fn nut_processor_with<A, T, O, F>(
    args: A,
    f: F,
) -> Processor<impl Fn(Seq<'static, T>) -> O, T>
where
    F: Fn(Seq<'static, T>, &A) -> O,
{
    Processor::new(move |seq| f(seq, &args))
}

/// Build a sink from a function over the boxed upstream sequence
pub fn nut_sink<T, O, F>(f: F) -> Sink<F, T>
where
    F: Fn(Seq<'static, T>) -> O,
{
    Sink::new(f)
}

/// Build a sink; captured arguments follow the upstream sequence
pub fn nut_sink_with<A, T, O, F>(args: A, f: F) -> Sink<impl Fn(Seq<'static, T>) -> O, T>
where
    F: Fn(Seq<'static, T>, &A) -> O,
{
    Sink::new(move |seq| f(seq, &args))
}

/// Build a filter that keeps elements for which `pred` holds
pub fn nut_filter<F>(pred: F) -> Filter<F> {
    Filter::keep(pred)
}

/// Build a filter that keeps elements for which `pred` does not hold
pub fn nut_filter_false<F>(pred: F) -> Filter<F> {
    Filter::reject(pred)
}

/// Build a keep-if-true filter; captured arguments follow the element
pub fn nut_filter_with<A, T, F>(args: A, pred: F) -> Filter<impl Fn(&T) -> bool>
where
    F: Fn(&T, &A) -> bool,
{
    Filter::keep(move |element: &T| pred(element, &args))
}

/// Build a keep-if-false filter; captured arguments follow the element
pub fn nut_filter_false_with<A, T, F>(args: A, pred: F) -> Filter<impl Fn(&T) -> bool>
where
    F: Fn(&T, &A) -> bool,
{
    Filter::reject(move |element: &T| pred(element, &args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nut::Chain;
    use proptest::prelude::*;

    #[test]
    fn test_source_restarts_each_pass() {
        let range = nut_source(|| 0..3).named("Range");
        let first: Vec<i32> = range.iter().collect();
        let second: Vec<i32> = (&range).into_iter().collect();
        assert_eq!(first, vec![0, 1, 2]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_source_as_right_operand_is_usage_error() {
        let range = nut_source(|| 0..3).named("Range");
        let err = vec![1, 2].then(&range).unwrap_err();
        assert!(err.is_usage());
        assert!(err.to_string().contains("Range"));
        assert_eq!(<Source<fn() -> Vec<i32>> as Nut<Vec<i32>>>::KIND, NutKind::Source);
    }

    #[test]
    fn test_source_with_captured_args() {
        let repeat = nut_source_with((7, 3), |(value, times)| vec![*value; *times]);
        assert_eq!(repeat.iter().collect::<Vec<_>>(), vec![7, 7, 7]);
    }

    #[test]
    fn test_function_maps_and_calls() {
        let times = nut_function_with(3, |x: i32, n: &i32| x * n);
        let out: Vec<i32> = vec![1, 2, 3].then(&times).collect();
        assert_eq!(out, vec![3, 6, 9]);
        assert_eq!(times.call(5), 15);
    }

    #[test]
    fn test_function_reuse_is_side_effect_free() {
        let square = nut_function(|x: i32| x * x);
        let a: Vec<i32> = vec![1, 2].then(&square).collect();
        let b: Vec<i32> = vec![1, 2].then(&square).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_processor_with_args() {
        let clone = nut_processor_with(2usize, |seq: Seq<'static, i32>, n: &usize| {
            let n = *n;
            seq.flat_map(move |x| std::iter::repeat(x).take(n))
        });
        let out: Vec<i32> = vec![1, 2, 3].then(&clone).collect();
        assert_eq!(out, vec![1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_sink_call_equals_chain() {
        let total = nut_sink(|seq: Seq<'static, i32>| seq.sum::<i32>());
        assert_eq!(vec![1, 2, 3].then(&total), 6);
        assert_eq!(total.call(vec![1, 2, 3]), 6);
    }

    #[test]
    fn test_sink_with_container_arg() {
        let join = nut_sink_with("-".to_string(), |seq: Seq<'static, i32>, sep: &String| {
            seq.map(|x| x.to_string()).collect::<Vec<_>>().join(sep)
        });
        assert_eq!(vec![1, 2, 3].then(join), "1-2-3");
    }

    #[test]
    fn test_filters_are_complementary() {
        let data = vec![1, 2, 3, 4];
        let kept: Vec<i32> = data
            .clone()
            .then(nut_filter_with(2, |x: &i32, t: &i32| x > t))
            .collect();
        let dropped: Vec<i32> = data
            .then(nut_filter_false_with(2, |x: &i32, t: &i32| x > t))
            .collect();
        assert_eq!(kept, vec![3, 4]);
        assert_eq!(dropped, vec![1, 2]);
    }

    #[test]
    fn test_filter_is_processor_kind() {
        let even = nut_filter(|x: &i32| x % 2 == 0);
        assert!(!even.is_inverted());
        let out: Vec<i32> = (0..6).then(&even).collect();
        assert_eq!(out, vec![0, 2, 4]);
    }

    proptest! {
        #[test]
        fn prop_filter_pair_splits_input(
            values in proptest::collection::vec(any::<i32>(), 0..100),
            threshold in any::<i32>(),
        ) {
            let kept: Vec<i32> = values.clone().then(nut_filter_with(threshold, |x: &i32, t: &i32| x < t)).collect();
            let dropped: Vec<i32> = values.clone().then(nut_filter_false_with(threshold, |x: &i32, t: &i32| x < t)).collect();
            prop_assert_eq!(kept.len() + dropped.len(), values.len());
            prop_assert!(kept.iter().all(|x| *x < threshold));
            prop_assert!(dropped.iter().all(|x| *x >= threshold));
        }
    }
}
