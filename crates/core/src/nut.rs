//! The unit protocol: the closed set of unit kinds, the `Nut` trait every
//! unit implements, and left-to-right chaining.

use std::fmt;
use std::sync::Arc;

/// A boxed lazy sequence, the upstream type handed to user-defined
/// processors and sinks.
pub type Seq<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// The four unit variants, distinguished by their input/output contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NutKind {
    /// Produces a sequence from no upstream input
    Source,
    /// Maps one element to one element
    Function,
    /// Consumes a sequence and produces a new lazy sequence
    Processor,
    /// Consumes a sequence and produces a terminal value
    Sink,
}

impl NutKind {
    /// Whether a unit of this kind accepts an upstream sequence
    pub fn accepts_upstream(self) -> bool {
        !matches!(self, NutKind::Source)
    }

    /// Whether the output of a unit of this kind can feed another unit
    pub fn produces_sequence(self) -> bool {
        !matches!(self, NutKind::Sink)
    }
}

impl fmt::Display for NutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NutKind::Source => "source",
            NutKind::Function => "function",
            NutKind::Processor => "processor",
            NutKind::Sink => "sink",
        };
        f.write_str(name)
    }
}

/// A chainable processing unit.
///
/// `apply` is the single chain entry point: it receives the upstream
/// (a whole sequence for processors and sinks, a sequence that is mapped
/// element-wise for functions) and returns the unit's output. Units hold
/// only construction-time parameters, so `apply` takes `&self` and the same
/// unit can be chained any number of times.
pub trait Nut<In> {
    /// Which of the four variants this unit is
    const KIND: NutKind;

    /// What chaining this unit produces
    type Output;

    /// Chain `input` into this unit
    fn apply(&self, input: In) -> Self::Output;
}

impl<In, N> Nut<In> for &N
where
    N: Nut<In>,
{
    const KIND: NutKind = N::KIND;
    type Output = N::Output;

    fn apply(&self, input: In) -> Self::Output {
        (**self).apply(input)
    }
}

/// Left-to-right composition of a value with units.
///
/// `seq.then(a).then(b)` evaluates `seq` once, hands it to `a`, and hands
/// `a`'s output to `b`. Nothing is pulled from `seq` until a sink or the
/// caller iterates.
pub trait Chain: Sized {
    /// Chain this value into `nut`
    fn then<N>(self, nut: N) -> N::Output
    where
        N: Nut<Self>,
    {
        nut.apply(self)
    }
}

impl<T> Chain for T {}

/// Free-function form of [`Chain::then`]
pub fn chain<In, N>(input: In, nut: N) -> N::Output
where
    N: Nut<In>,
{
    nut.apply(input)
}

/// Element-wise application of a function-kind unit
pub struct Mapped<I, F> {
    iter: I,
    f: Arc<F>,
}

impl<I, F> Mapped<I, F> {
    pub fn new(iter: I, f: Arc<F>) -> Self {
        Self { iter, f }
    }
}

impl<I, F, O> Iterator for Mapped<I, F>
where
    I: Iterator,
    F: Fn(I::Item) -> O,
{
    type Item = O;

    fn next(&mut self) -> Option<O> {
        self.iter.next().map(|x| (self.f)(x))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<I: fmt::Debug, F> fmt::Debug for Mapped<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapped").field("iter", &self.iter).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;

    fn twice(x: i32) -> i32 {
        x * 2
    }

    impl<I> Nut<I> for Double
    where
        I: IntoIterator<Item = i32>,
    {
        const KIND: NutKind = NutKind::Function;
        type Output = std::iter::Map<I::IntoIter, fn(i32) -> i32>;

        fn apply(&self, input: I) -> Self::Output {
            input.into_iter().map(twice as fn(i32) -> i32)
        }
    }

    #[test]
    fn test_then_and_chain_agree() {
        let a: Vec<i32> = vec![1, 2, 3].then(Double).collect();
        let b: Vec<i32> = chain(vec![1, 2, 3], Double).collect();
        assert_eq!(a, vec![2, 4, 6]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reference_is_a_nut() {
        let double = Double;
        let first: Vec<i32> = vec![1].then(&double).collect();
        let second: Vec<i32> = vec![5].then(&double).collect();
        assert_eq!(first, vec![2]);
        assert_eq!(second, vec![10]);
        assert_eq!(<&Double as Nut<Vec<i32>>>::KIND, NutKind::Function);
    }

    #[test]
    fn test_kind_contracts() {
        assert!(!NutKind::Source.accepts_upstream());
        assert!(NutKind::Sink.accepts_upstream());
        assert!(!NutKind::Sink.produces_sequence());
        assert_eq!(NutKind::Processor.to_string(), "processor");
    }

    #[test]
    fn test_mapped_is_lazy() {
        let calls = std::cell::Cell::new(0);
        let f = Arc::new(|x: i32| {
            calls.set(calls.get() + 1);
            x + 1
        });
        let mut mapped = Mapped::new(vec![1, 2, 3].into_iter(), f);
        assert_eq!(calls.get(), 0);
        assert_eq!(mapped.next(), Some(2));
        assert_eq!(calls.get(), 1);
    }
}
