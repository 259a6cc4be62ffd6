//! Processors that merge the upstream with other sequences or fan it out.

use crate::callback::{ElementFn, Key, Mapper, Predicate};
use crate::function::Identity;
use nutflow_core::{Nut, NutKind};
use std::sync::Arc;

/// The upstream followed by each of `others`
#[derive(Debug, Clone)]
pub struct Concat<T> {
    others: Vec<Vec<T>>,
}

impl<T: Clone> Concat<T> {
    pub fn new<It>(others: impl IntoIterator<Item = It>) -> Self
    where
        It: IntoIterator<Item = T>,
    {
        Self {
            others: others.into_iter().map(|o| o.into_iter().collect()).collect(),
        }
    }
}

impl<I, T> Nut<I> for Concat<T>
where
    I: IntoIterator<Item = T>,
    T: Clone,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::Chain<I::IntoIter, std::iter::Flatten<std::vec::IntoIter<Vec<T>>>>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().chain(self.others.clone().into_iter().flatten())
    }
}

/// One of the inputs taking part in an [`Interleave`]
pub enum Lane<I, T> {
    Upstream(I),
    Other(std::vec::IntoIter<T>),
}

impl<I: Iterator<Item = T>, T> Iterator for Lane<I, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            Lane::Upstream(iter) => iter.next(),
            Lane::Other(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Lane::Upstream(iter) => iter.size_hint(),
            Lane::Other(iter) => iter.size_hint(),
        }
    }
}

/// Round-robin over the upstream and `others`; shorter inputs drop out and
/// the rest continue
#[derive(Debug, Clone)]
pub struct Interleave<T> {
    others: Vec<Vec<T>>,
}

impl<T: Clone> Interleave<T> {
    pub fn new<It>(others: impl IntoIterator<Item = It>) -> Self
    where
        It: IntoIterator<Item = T>,
    {
        Self {
            others: others.into_iter().map(|o| o.into_iter().collect()).collect(),
        }
    }
}

impl<I, T> Nut<I> for Interleave<T>
where
    I: IntoIterator<Item = T>,
    T: Clone,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = nutflow_iter::Interleave<Lane<I::IntoIter, T>>;

    fn apply(&self, input: I) -> Self::Output {
        let lanes = std::iter::once(Lane::Upstream(input.into_iter()))
            .chain(self.others.iter().map(|o| Lane::Other(o.clone().into_iter())));
        nutflow_iter::interleave(lanes)
    }
}

/// Pairs each upstream element with the matching element of `other`;
/// stops at the shorter of the two
#[derive(Debug, Clone)]
pub struct Zip<U> {
    other: Vec<U>,
}

impl<U: Clone> Zip<U> {
    pub fn new(other: impl IntoIterator<Item = U>) -> Self {
        Self {
            other: other.into_iter().collect(),
        }
    }
}

impl<I, U> Nut<I> for Zip<U>
where
    I: IntoIterator,
    U: Clone,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::Zip<I::IntoIter, std::vec::IntoIter<U>>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().zip(self.other.clone())
    }
}

/// [`Zip`] followed by `f(a, b)` on each pair
pub struct ZipWith<U, F> {
    other: Vec<U>,
    f: Arc<F>,
}

impl<U: Clone, F> ZipWith<U, F> {
    pub fn new(other: impl IntoIterator<Item = U>, f: F) -> Self {
        Self {
            other: other.into_iter().collect(),
            f: Arc::new(f),
        }
    }
}

impl<I, U, F, O> Nut<I> for ZipWith<U, F>
where
    I: IntoIterator,
    U: Clone,
    F: Fn(I::Item, U) -> O,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = ZippedWith<I::IntoIter, U, F>;

    fn apply(&self, input: I) -> Self::Output {
        ZippedWith {
            iter: input.into_iter(),
            other: self.other.clone().into_iter(),
            f: Arc::clone(&self.f),
        }
    }
}

/// Output of [`ZipWith`]
pub struct ZippedWith<I, U, F> {
    iter: I,
    other: std::vec::IntoIter<U>,
    f: Arc<F>,
}

impl<I, U, F, O> Iterator for ZippedWith<I, U, F>
where
    I: Iterator,
    F: Fn(I::Item, U) -> O,
{
    type Item = O;

    fn next(&mut self) -> Option<O> {
        let a = self.iter.next()?;
        let b = self.other.next()?;
        Some((self.f)(a, b))
    }
}

/// Maps `f` over the upstream and `others` in lockstep.
///
/// `f` receives one element from each input, the upstream's first. Stops
/// at the shortest input.
pub struct Map<T, O> {
    others: Vec<Vec<T>>,
    f: Arc<dyn Fn(Vec<T>) -> O + Send + Sync>,
}

impl<T: Clone, O> Map<T, O> {
    pub fn new<It, F>(others: impl IntoIterator<Item = It>, f: F) -> Self
    where
        It: IntoIterator<Item = T>,
        F: Fn(Vec<T>) -> O + Send + Sync + 'static,
    {
        Self {
            others: others.into_iter().map(|o| o.into_iter().collect()).collect(),
            f: Arc::new(f),
        }
    }
}

impl<T: Clone, O> Clone for Map<T, O> {
    fn clone(&self) -> Self {
        Self {
            others: self.others.clone(),
            f: Arc::clone(&self.f),
        }
    }
}

impl<I, T, O> Nut<I> for Map<T, O>
where
    I: IntoIterator<Item = T>,
    T: Clone,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Lockstep<I::IntoIter, T, O>;

    fn apply(&self, input: I) -> Self::Output {
        Lockstep {
            iter: input.into_iter(),
            others: self.others.iter().map(|o| o.clone().into_iter()).collect(),
            f: Arc::clone(&self.f),
            done: false,
        }
    }
}

/// Output of [`Map`]
pub struct Lockstep<I, T, O> {
    iter: I,
    others: Vec<std::vec::IntoIter<T>>,
    f: Arc<dyn Fn(Vec<T>) -> O + Send + Sync>,
    done: bool,
}

impl<I, T, O> Iterator for Lockstep<I, T, O>
where
    I: Iterator<Item = T>,
{
    type Item = O;

    fn next(&mut self) -> Option<O> {
        if self.done {
            return None;
        }
        let mut args = Vec::with_capacity(self.others.len() + 1);
        let row = std::iter::once(self.iter.next())
            .chain(self.others.iter_mut().map(Iterator::next));
        for element in row {
            match element {
                Some(element) => args.push(element),
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
        Some((self.f)(args))
    }
}

/// `n` independent copies of the upstream.
///
/// Branches buffer what the others have pulled but they have not, so
/// consuming them far out of step costs memory.
#[derive(Debug, Clone, Copy)]
pub struct Tee {
    n: usize,
}

impl Tee {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<I> Nut<I> for Tee
where
    I: IntoIterator,
    I::Item: Clone,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Vec<nutflow_iter::Tee<I::IntoIter>>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::tee(input, self.n)
    }
}

/// Splits the upstream into the elements passing `pred` and the rest
pub struct Partition<T> {
    pred: Key<T, bool>,
}

impl<T: 'static> Partition<T> {
    pub fn new<P>(pred: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            pred: Key::new(pred),
        }
    }
}

/// One branch of a [`Partition`]
pub type Branch<I, T> = nutflow_iter::Partition<I, Predicate<T>>;

impl<I, T> Nut<I> for Partition<T>
where
    I: IntoIterator<Item = T>,
    T: 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = (Branch<I::IntoIter, T>, Branch<I::IntoIter, T>);

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::partition(input, self.pred.boxed())
    }
}

/// Output of [`If`]: whichever unit the condition selected
#[derive(Debug, Clone)]
pub enum Either<L, R> {
    Then(L),
    Else(R),
}

impl<L, R> Iterator for Either<L, R>
where
    L: Iterator,
    R: Iterator<Item = L::Item>,
{
    type Item = L::Item;

    fn next(&mut self) -> Option<L::Item> {
        match self {
            Either::Then(iter) => iter.next(),
            Either::Else(iter) => iter.next(),
        }
    }
}

/// Routes the whole upstream through `then` when `cond` holds, otherwise
/// through the else unit (identity unless given)
#[derive(Debug, Clone)]
pub struct If<A, B = Identity> {
    cond: bool,
    then: A,
    otherwise: B,
}

impl<A> If<A, Identity> {
    pub fn new(cond: bool, then: A) -> Self {
        Self {
            cond,
            then,
            otherwise: Identity,
        }
    }
}

impl<A, B> If<A, B> {
    pub fn otherwise<C>(self, otherwise: C) -> If<A, C> {
        If {
            cond: self.cond,
            then: self.then,
            otherwise,
        }
    }
}

impl<I, A, B> Nut<I> for If<A, B>
where
    A: Nut<I>,
    B: Nut<I>,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Either<A::Output, B::Output>;

    fn apply(&self, input: I) -> Self::Output {
        if self.cond {
            Either::Then(self.then.apply(input))
        } else {
            Either::Else(self.otherwise.apply(input))
        }
    }
}

/// One output sequence per function, each mapping its own copy of the
/// upstream
pub struct MapMulti<T, O> {
    fs: Vec<Mapper<T, O>>,
}

impl<T: 'static, O: 'static> MapMulti<T, O> {
    pub fn new() -> Self {
        Self { fs: Vec::new() }
    }

    #[must_use]
    pub fn with<F>(mut self, f: F) -> Self
    where
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        self.fs.push(Mapper::new(f));
        self
    }
}

impl<T: 'static, O: 'static> Default for MapMulti<T, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, T, O> Nut<I> for MapMulti<T, O>
where
    I: IntoIterator<Item = T>,
    T: Clone + 'static,
    O: 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Vec<std::iter::Map<nutflow_iter::Tee<I::IntoIter>, ElementFn<T, O>>>;

    fn apply(&self, input: I) -> Self::Output {
        nutflow_iter::tee(input, self.fs.len())
            .into_iter()
            .zip(&self.fs)
            .map(|(branch, f)| branch.map(f.boxed()))
            .collect()
    }
}

/// Applies `f` to the given columns of each row, leaving the others
pub struct MapCol<T> {
    columns: Arc<[usize]>,
    f: Mapper<T, T>,
}

impl<T: 'static> MapCol<T> {
    pub fn new<F>(columns: impl IntoIterator<Item = usize>, f: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        Self {
            columns: columns.into_iter().collect(),
            f: Mapper::new(f),
        }
    }
}

impl<I, T> Nut<I> for MapCol<T>
where
    I: IntoIterator<Item = Vec<T>>,
    T: 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = std::iter::Map<I::IntoIter, ElementFn<Vec<T>, Vec<T>>>;

    fn apply(&self, input: I) -> Self::Output {
        let columns = Arc::clone(&self.columns);
        let f = self.f.clone();
        let per_row: ElementFn<Vec<T>, Vec<T>> = Box::new(move |row: Vec<T>| {
            row.into_iter()
                .enumerate()
                .map(|(i, e)| if columns.contains(&i) { f.call(e) } else { e })
                .collect()
        });
        input.into_iter().map(per_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Square;
    use crate::processor::Take;
    use nutflow_core::Chain;

    #[test]
    fn test_concat() {
        let out: Vec<i32> = vec![1, 2].then(Concat::new([vec![3], vec![4, 5]])).collect();
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_interleave_keeps_longer_inputs() {
        let out: Vec<char> = vec!['1', '2'].then(Interleave::new([vec!['a', 'b', 'c']])).collect();
        assert_eq!(out, vec!['1', 'a', '2', 'b', 'c']);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_zip_and_zip_with() {
        let pairs: Vec<(i32, char)> = vec![1, 2, 3].then(Zip::new(['a', 'b'])).collect();
        assert_eq!(pairs, vec![(1, 'a'), (2, 'b')]);
        let sums: Vec<i32> = vec![1, 2]
            .then(ZipWith::new([10, 20], |a: i32, b: i32| a + b))
            .collect();
        assert_eq!(sums, vec![11, 22]);
    }

    #[test]
    fn test_map_in_lockstep() {
        let sums: Vec<i32> = vec![1, 2, 3]
            .then(Map::new([vec![10, 20, 30], vec![100, 200]], |row: Vec<i32>| {
                row.iter().sum::<i32>()
            }))
            .collect();
        assert_eq!(sums, vec![111, 222]);

        let alone: Vec<i32> = vec![1, 2]
            .then(Map::new(Vec::<Vec<i32>>::new(), |row: Vec<i32>| row[0] * 3))
            .collect();
        assert_eq!(alone, vec![3, 6]);
    }

    #[test]
    fn test_tee() {
        let mut copies = (0..3).then(Tee::new(2));
        let second: Vec<i32> = copies.pop().unwrap().collect();
        let first: Vec<i32> = copies.pop().unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partition() {
        let (small, large) = vec![0, 1, 2, 3, 4].then(Partition::new(|x: &i32| *x < 3));
        assert_eq!(small.collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(large.collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn test_if() {
        let squared: Vec<i32> = vec![1, 2, 3].then(If::new(true, Square)).collect();
        assert_eq!(squared, vec![1, 4, 9]);
        let taken: Vec<i32> = vec![1, 2, 3]
            .then(If::new(false, Square).otherwise(Take::new(1)))
            .collect();
        assert_eq!(taken, vec![1]);
        let untouched: Vec<i32> = vec![1, 2].then(If::new(false, Square)).collect();
        assert_eq!(untouched, vec![1, 2]);
    }

    #[test]
    fn test_map_multi() {
        let mut outs = vec![1, 2, 3]
            .then(MapMulti::new().with(|x: i32| x).with(|x: i32| x * 2))
            .into_iter();
        let nums: Vec<i32> = outs.next().unwrap().collect();
        let twos: Vec<i32> = outs.next().unwrap().collect();
        assert_eq!(nums, vec![1, 2, 3]);
        assert_eq!(twos, vec![2, 4, 6]);
    }

    #[test]
    fn test_map_col() {
        let rows = vec![vec![1, 2], vec![3, 4]];
        let first: Vec<Vec<i32>> = rows.clone().then(MapCol::new([0], |x: i32| -x)).collect();
        assert_eq!(first, vec![vec![-1, 2], vec![-3, 4]]);
        let both: Vec<Vec<i32>> = rows.then(MapCol::new([0, 1], |x: i32| -x)).collect();
        assert_eq!(both, vec![vec![-1, -2], vec![-3, -4]]);
    }
}
