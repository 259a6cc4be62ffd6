//! Built-in sinks: terminal units that reduce a sequence to a value.
//!
//! Every sink also has a `call` method that does the same thing as
//! chaining into it.

use indexmap::IndexMap;
use nutflow_core::{Nut, NutKind};
use std::collections::VecDeque;
use std::fmt::{self, Display};
use std::hash::Hash;
use std::marker::PhantomData;

macro_rules! callable_sink {
    ($sink:ty $(, $g:ident)*) => {
        impl<$($g),*> $sink {
            /// Same as chaining `input` into this sink
            pub fn call<I>(&self, input: I) -> <Self as Nut<I>>::Output
            where
                Self: Nut<I>,
            {
                self.apply(input)
            }
        }
    };
}

/// Collects everything into any `FromIterator` container
pub struct Collect<C> {
    _marker: PhantomData<fn() -> C>,
}

impl<C> Collect<C> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<C> Default for Collect<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for Collect<C> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for Collect<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Collect")
    }
}

impl<I, C> Nut<I> for Collect<C>
where
    I: IntoIterator,
    C: FromIterator<I::Item>,
{
    const KIND: NutKind = NutKind::Sink;
    type Output = C;

    fn apply(&self, input: I) -> C {
        input.into_iter().collect()
    }
}

callable_sink!(Collect<C>, C);

/// The first `n` elements
#[derive(Debug, Clone, Copy)]
pub struct Head {
    n: usize,
}

impl Head {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<I: IntoIterator> Nut<I> for Head {
    const KIND: NutKind = NutKind::Sink;
    type Output = Vec<I::Item>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().take(self.n).collect()
    }
}

callable_sink!(Head);

/// The last `n` elements; holds at most `n` in memory
#[derive(Debug, Clone, Copy)]
pub struct Tail {
    n: usize,
}

impl Tail {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<I: IntoIterator> Nut<I> for Tail {
    const KIND: NutKind = NutKind::Sink;
    type Output = Vec<I::Item>;

    fn apply(&self, input: I) -> Self::Output {
        if self.n == 0 {
            return Vec::new();
        }
        let mut last = VecDeque::new();
        for element in input {
            if last.len() == self.n {
                last.pop_front();
            }
            last.push_back(element);
        }
        last.into()
    }
}

callable_sink!(Tail);

/// The element at position `n`, if the sequence is that long
#[derive(Debug, Clone, Copy)]
pub struct Nth {
    n: usize,
}

impl Nth {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<I: IntoIterator> Nut<I> for Nth {
    const KIND: NutKind = NutKind::Sink;
    type Output = Option<I::Item>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().nth(self.n)
    }
}

callable_sink!(Nth);

/// Number of elements
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl<I: IntoIterator> Nut<I> for Count {
    const KIND: NutKind = NutKind::Sink;
    type Output = usize;

    fn apply(&self, input: I) -> usize {
        input.into_iter().count()
    }
}

callable_sink!(Count);

/// Pulls elements for their side effects and discards them
#[derive(Debug, Clone, Copy, Default)]
pub struct Consume {
    n: Option<usize>,
}

impl Consume {
    /// Drain the whole sequence
    pub fn all() -> Self {
        Self { n: None }
    }

    /// Pull at most `n` elements
    pub fn first(n: usize) -> Self {
        Self { n: Some(n) }
    }
}

impl<I: IntoIterator> Nut<I> for Consume {
    const KIND: NutKind = NutKind::Sink;
    type Output = ();

    fn apply(&self, input: I) {
        let iter = input.into_iter();
        match self.n {
            Some(n) => iter.take(n).for_each(drop),
            None => iter.for_each(drop),
        }
    }
}

callable_sink!(Consume);

/// Folds the sequence with `f`, starting from `init` when given and from
/// the first element otherwise. `None` only for an empty sequence without
/// an initial value.
#[derive(Debug, Clone)]
pub struct Reduce<F, A> {
    f: F,
    init: Option<A>,
}

impl<F, A> Reduce<F, A> {
    pub fn new(f: F) -> Self {
        Self { f, init: None }
    }

    pub fn with_init(f: F, init: A) -> Self {
        Self {
            f,
            init: Some(init),
        }
    }
}

impl<I, F, A> Nut<I> for Reduce<F, A>
where
    I: IntoIterator<Item = A>,
    F: Fn(A, A) -> A,
    A: Clone,
{
    const KIND: NutKind = NutKind::Sink;
    type Output = Option<A>;

    fn apply(&self, input: I) -> Option<A> {
        let mut iter = input.into_iter();
        let first = match &self.init {
            Some(init) => init.clone(),
            None => iter.next()?,
        };
        Some(iter.fold(first, &self.f))
    }
}

callable_sink!(Reduce<F, A>, F, A);

/// Splits a sequence of pairs into two collections
#[derive(Debug, Clone, Copy, Default)]
pub struct Unzip;

impl<I, A, B> Nut<I> for Unzip
where
    I: IntoIterator<Item = (A, B)>,
{
    const KIND: NutKind = NutKind::Sink;
    type Output = (Vec<A>, Vec<B>);

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().unzip()
    }
}

callable_sink!(Unzip);

/// How often each value occurs, in order of first occurrence
#[derive(Debug, Clone, Copy, Default)]
pub struct CountValues;

impl CountValues {
    /// Counts divided by the largest count, so the most frequent value
    /// maps to `1.0`
    pub fn relative() -> RelativeCountValues {
        RelativeCountValues
    }
}

fn tally<I>(input: I) -> IndexMap<I::Item, usize>
where
    I: IntoIterator,
    I::Item: Hash + Eq,
{
    let mut counts = IndexMap::new();
    for element in input {
        *counts.entry(element).or_insert(0) += 1;
    }
    counts
}

impl<I> Nut<I> for CountValues
where
    I: IntoIterator,
    I::Item: Hash + Eq,
{
    const KIND: NutKind = NutKind::Sink;
    type Output = IndexMap<I::Item, usize>;

    fn apply(&self, input: I) -> Self::Output {
        tally(input)
    }
}

callable_sink!(CountValues);

/// Output of [`CountValues::relative`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RelativeCountValues;

impl<I> Nut<I> for RelativeCountValues
where
    I: IntoIterator,
    I::Item: Hash + Eq,
{
    const KIND: NutKind = NutKind::Sink;
    type Output = IndexMap<I::Item, f64>;

    fn apply(&self, input: I) -> Self::Output {
        let counts = tally(input);
        let max = counts.values().copied().max().unwrap_or(1).max(1) as f64;
        counts
            .into_iter()
            .map(|(value, count)| (value, count as f64 / max))
            .collect()
    }
}

callable_sink!(RelativeCountValues);

/// Concatenates the `Display` form of every element with a separator
#[derive(Debug, Clone, Default)]
pub struct Join {
    separator: String,
}

impl Join {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl<I> Nut<I> for Join
where
    I: IntoIterator,
    I::Item: Display,
{
    const KIND: NutKind = NutKind::Sink;
    type Output = String;

    fn apply(&self, input: I) -> String {
        use std::fmt::Write;

        let mut joined = String::new();
        for (i, element) in input.into_iter().enumerate() {
            if i > 0 {
                joined.push_str(&self.separator);
            }
            // writing into a String cannot fail
            let _ = write!(joined, "{element}");
        }
        joined
    }
}

callable_sink!(Join);

#[cfg(test)]
mod tests {
    use super::*;
    use nutflow_core::Chain;
    use std::collections::HashSet;

    #[test]
    fn test_collect_into_containers() {
        let v: Vec<i32> = (0..5).then(Collect::new());
        assert_eq!(v, vec![0, 1, 2, 3, 4]);
        let set: HashSet<i32> = vec![1, 2, 3, 2].then(Collect::new());
        assert_eq!(set.len(), 3);
        let map: std::collections::HashMap<&str, i32> =
            vec![("one", 1), ("two", 2)].then(Collect::new());
        assert_eq!(map["two"], 2);
        assert_eq!(<Collect<Vec<u8>> as Nut<Vec<u8>>>::KIND, NutKind::Sink);
    }

    #[test]
    fn test_call_equals_chain() {
        assert_eq!(Count.call(vec![1, 2, 3]), vec![1, 2, 3].then(Count));
        assert_eq!(Head::new(2).call(0..10), vec![0, 1]);
    }

    #[test]
    fn test_head_tail_nth() {
        assert_eq!((0..10).then(Tail::new(3)), vec![7, 8, 9]);
        assert_eq!((0..2).then(Tail::new(5)), vec![0, 1]);
        assert!((0..3).then(Tail::new(0)).is_empty());
        assert_eq!((0..3).then(Tail::new(usize::MAX)), vec![0, 1, 2]);
        assert_eq!((0..3).then(Head::new(usize::MAX)), vec![0, 1, 2]);
        assert_eq!((0..10).then(Nth::new(4)), Some(4));
        assert_eq!((0..3).then(Nth::new(4)), None);
    }

    #[test]
    fn test_consume() {
        let mut iter = 0..10;
        (&mut iter).then(Consume::first(3));
        assert_eq!(iter.next(), Some(3));
        (&mut iter).then(Consume::all());
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_reduce() {
        let add = |a: i32, b: i32| a + b;
        assert_eq!((1..=4).then(Reduce::new(add)), Some(10));
        assert_eq!((1..=4).then(Reduce::with_init(add, 100)), Some(110));
        assert_eq!(Vec::<i32>::new().then(Reduce::new(add)), None);
    }

    #[test]
    fn test_unzip() {
        let (nums, chars) = vec![(1, 'a'), (2, 'b')].then(Unzip);
        assert_eq!(nums, vec![1, 2]);
        assert_eq!(chars, vec!['a', 'b']);
    }

    #[test]
    fn test_count_values() {
        let counts = "abaacc".chars().then(CountValues);
        assert_eq!(counts.into_iter().collect::<Vec<_>>(), vec![('a', 3), ('b', 1), ('c', 2)]);

        let relative = "aabaab".chars().then(CountValues::relative());
        assert_eq!(relative[&'a'], 1.0);
        assert_eq!(relative[&'b'], 0.5);
        assert!(Vec::<u8>::new().then(CountValues::relative()).is_empty());
    }

    #[test]
    fn test_join() {
        assert_eq!(vec![1, 2, 3].then(Join::new(", ")), "1, 2, 3");
        assert_eq!(Vec::<i32>::new().then(Join::default()), "");
    }
}
