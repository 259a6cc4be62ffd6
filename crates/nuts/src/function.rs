//! Built-in function-kind units: each maps one element to one element.

use nutflow_core::{Error, Nut, NutKind, Result};
use parking_lot::Mutex;
use std::fmt;
use std::io::Write;
use std::marker::PhantomData;
use std::num::NonZeroUsize;
use std::ops::Mul;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Passes every element through unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Identity {
    pub fn call<T>(&self, element: T) -> T {
        element
    }
}

impl<I: IntoIterator> Nut<I> for Identity {
    const KIND: NutKind = NutKind::Function;
    type Output = I::IntoIter;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter()
    }
}

/// `x * x`
#[derive(Debug, Clone, Copy, Default)]
pub struct Square;

fn square<T: Mul<Output = T> + Copy>(x: T) -> T {
    x * x
}

impl Square {
    pub fn call<T: Mul<Output = T> + Copy>(&self, element: T) -> T {
        square(element)
    }
}

impl<I, T> Nut<I> for Square
where
    I: IntoIterator<Item = T>,
    T: Mul<Output = T> + Copy,
{
    const KIND: NutKind = NutKind::Function;
    type Output = std::iter::Map<I::IntoIter, fn(T) -> T>;

    fn apply(&self, input: I) -> Self::Output {
        input.into_iter().map(square::<T> as fn(T) -> T)
    }
}

/// The element's `index`-th column, `None` when the row is too short
pub struct Get<E> {
    index: usize,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Clone> Get<E> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub fn call<R: AsRef<[E]>>(&self, row: R) -> Option<E> {
        row.as_ref().get(self.index).cloned()
    }

    /// Columns `start, start + step, ..` below `end` of each row
    pub fn slice(start: usize, end: Option<usize>, step: usize) -> Result<GetSlice<E>> {
        let step = NonZeroUsize::new(step)
            .ok_or_else(|| Error::configuration("Get step must be positive"))?;
        Ok(GetSlice {
            start,
            end,
            step,
            _marker: PhantomData,
        })
    }
}

impl<I, E> Nut<I> for Get<E>
where
    I: IntoIterator,
    I::Item: AsRef<[E]>,
    E: Clone,
{
    const KIND: NutKind = NutKind::Function;
    type Output = Column<I::IntoIter, E>;

    fn apply(&self, input: I) -> Self::Output {
        Column {
            iter: input.into_iter(),
            index: self.index,
            _marker: PhantomData,
        }
    }
}

/// Output of [`Get`]
pub struct Column<I, E> {
    iter: I,
    index: usize,
    _marker: PhantomData<fn() -> E>,
}

impl<I, E> Iterator for Column<I, E>
where
    I: Iterator,
    I::Item: AsRef<[E]>,
    E: Clone,
{
    type Item = Option<E>;

    fn next(&mut self) -> Option<Option<E>> {
        let row = self.iter.next()?;
        Some(row.as_ref().get(self.index).cloned())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Strided run of columns, built by [`Get::slice`]; bounds past the end of
/// a row are clamped
#[derive(Debug)]
pub struct GetSlice<E> {
    start: usize,
    end: Option<usize>,
    step: NonZeroUsize,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for GetSlice<E> {
    fn clone(&self) -> Self {
        Self {
            start: self.start,
            end: self.end,
            step: self.step,
            _marker: PhantomData,
        }
    }
}

impl<E: Clone> GetSlice<E> {
    pub fn call<R: AsRef<[E]>>(&self, row: R) -> Vec<E> {
        let row = row.as_ref();
        let end = self.end.map_or(row.len(), |end| end.min(row.len()));
        if self.start >= end {
            return Vec::new();
        }
        row[self.start..end]
            .iter()
            .step_by(self.step.get())
            .cloned()
            .collect()
    }
}

impl<I, E> Nut<I> for GetSlice<E>
where
    I: IntoIterator,
    I::Item: AsRef<[E]>,
    E: Clone,
{
    const KIND: NutKind = NutKind::Function;
    type Output = ColumnSlice<I::IntoIter, E>;

    fn apply(&self, input: I) -> Self::Output {
        ColumnSlice {
            iter: input.into_iter(),
            slice: self.clone(),
        }
    }
}

/// Output of [`GetSlice`]
pub struct ColumnSlice<I, E> {
    iter: I,
    slice: GetSlice<E>,
}

impl<I, E> Iterator for ColumnSlice<I, E>
where
    I: Iterator,
    I::Item: AsRef<[E]>,
    E: Clone,
{
    type Item = Vec<E>;

    fn next(&mut self) -> Option<Vec<E>> {
        let row = self.iter.next()?;
        Some(self.slice.call(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Selected columns of each row in the requested order; columns past the
/// end of a row are left out
pub struct GetCols<E> {
    columns: Arc<[usize]>,
    _marker: PhantomData<fn() -> E>,
}

fn select<E: Clone>(row: &[E], columns: &[usize]) -> Vec<E> {
    columns.iter().filter_map(|&c| row.get(c).cloned()).collect()
}

impl<E: Clone> GetCols<E> {
    pub fn new(columns: impl IntoIterator<Item = usize>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            _marker: PhantomData,
        }
    }

    pub fn call<R: AsRef<[E]>>(&self, row: R) -> Vec<E> {
        select(row.as_ref(), &self.columns)
    }
}

impl<I, E> Nut<I> for GetCols<E>
where
    I: IntoIterator,
    I::Item: AsRef<[E]>,
    E: Clone,
{
    const KIND: NutKind = NutKind::Function;
    type Output = ColumnSet<I::IntoIter, E>;

    fn apply(&self, input: I) -> Self::Output {
        ColumnSet {
            iter: input.into_iter(),
            columns: Arc::clone(&self.columns),
            _marker: PhantomData,
        }
    }
}

/// Output of [`GetCols`]
pub struct ColumnSet<I, E> {
    iter: I,
    columns: Arc<[usize]>,
    _marker: PhantomData<fn() -> E>,
}

impl<I, E> Iterator for ColumnSet<I, E>
where
    I: Iterator,
    I::Item: AsRef<[E]>,
    E: Clone,
{
    type Item = Vec<E>;

    fn next(&mut self) -> Option<Vec<E>> {
        let row = self.iter.next()?;
        Some(select(row.as_ref(), &self.columns))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

type Test<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct CounterState<T> {
    name: String,
    value: Mutex<i64>,
    filter: Option<Test<T>>,
}

/// Counts the elements flowing through it and passes them on unchanged.
///
/// Clones share the same count, and the count is guarded by a mutex so the
/// counter can sit under a parallel map or a prefetch worker.
pub struct Counter<T> {
    state: Arc<CounterState<T>>,
}

impl<T> Counter<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_value(name, 0)
    }

    /// Start counting from `value`
    pub fn with_value(name: impl Into<String>, value: i64) -> Self {
        Self {
            state: Arc::new(CounterState {
                name: name.into(),
                value: Mutex::new(value),
                filter: None,
            }),
        }
    }

    /// Only count elements for which `filter` holds.
    ///
    /// Detaches this counter from any clones made before the call.
    #[must_use]
    pub fn filter<F>(self, filter: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(CounterState {
                name: self.state.name.clone(),
                value: Mutex::new(self.value()),
                filter: Some(Arc::new(filter)),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn value(&self) -> i64 {
        *self.state.value.lock()
    }

    pub fn reset(&self, value: i64) {
        *self.state.value.lock() = value;
    }

    /// Count one element and hand it back
    pub fn call(&self, element: T) -> T {
        let counts = match &self.state.filter {
            Some(filter) => filter(&element),
            None => true,
        };
        if counts {
            *self.state.value.lock() += 1;
        }
        element
    }
}

impl<T> Clone for Counter<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> fmt::Display for Counter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.state.name, self.value())
    }
}

impl<T> fmt::Debug for Counter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("name", &self.state.name)
            .field("value", &self.value())
            .finish()
    }
}

impl<I, T> Nut<I> for Counter<T>
where
    I: IntoIterator<Item = T>,
{
    const KIND: NutKind = NutKind::Function;
    type Output = Counted<I::IntoIter, T>;

    fn apply(&self, input: I) -> Self::Output {
        Counted {
            iter: input.into_iter(),
            counter: self.clone(),
        }
    }
}

/// Output of [`Counter`]
pub struct Counted<I, T> {
    iter: I,
    counter: Counter<T>,
}

impl<I, T> Iterator for Counted<I, T>
where
    I: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.iter.next().map(|x| self.counter.call(x))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

/// Sleeps before passing each element on
#[derive(Debug, Clone, Copy)]
pub struct Sleep {
    duration: Duration,
}

impl Sleep {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn call<T>(&self, element: T) -> T {
        std::thread::sleep(self.duration);
        element
    }
}

impl<I: IntoIterator> Nut<I> for Sleep {
    const KIND: NutKind = NutKind::Function;
    type Output = Sleeping<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        Sleeping {
            iter: input.into_iter(),
            sleep: *self,
        }
    }
}

/// Output of [`Sleep`]
pub struct Sleeping<I> {
    iter: I,
    sleep: Sleep,
}

impl<I: Iterator> Iterator for Sleeping<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let element = self.iter.next()?;
        Some(self.sleep.call(element))
    }
}

type Formatter<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;
type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Prints elements as they pass and hands them on unchanged.
///
/// `every_n` prints only every n-th element that passes the filter, and
/// `every` prints at most once per interval.
pub struct Print<T> {
    format: Formatter<T>,
    filter: Option<Test<T>>,
    every_n: usize,
    every: Option<Duration>,
    out: SharedWriter,
}

impl<T: fmt::Debug> Print<T> {
    /// Print each element with its `Debug` representation
    pub fn new() -> Self {
        Self::with_format(|x: &T| format!("{x:?}"))
    }
}

impl<T: fmt::Debug> Default for Print<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Print<T> {
    pub fn with_format<F>(format: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            format: Arc::new(format),
            filter: None,
            every_n: 0,
            every: None,
            out: Arc::new(Mutex::new(Box::new(std::io::stdout()))),
        }
    }

    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Print only every `n`-th element; `0` prints all of them
    #[must_use]
    pub fn every_n(mut self, n: usize) -> Self {
        self.every_n = n;
        self
    }

    #[must_use]
    pub fn every(mut self, interval: Duration) -> Self {
        self.every = Some(interval);
        self
    }

    /// Print somewhere other than stdout
    #[must_use]
    pub fn to_writer(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Arc::new(Mutex::new(Box::new(out)));
        self
    }
}

impl<T> Clone for Print<T> {
    fn clone(&self) -> Self {
        Self {
            format: Arc::clone(&self.format),
            filter: self.filter.clone(),
            every_n: self.every_n,
            every: self.every,
            out: Arc::clone(&self.out),
        }
    }
}

impl<I, T> Nut<I> for Print<T>
where
    I: IntoIterator<Item = T>,
{
    const KIND: NutKind = NutKind::Function;
    type Output = Printed<I::IntoIter, T>;

    fn apply(&self, input: I) -> Self::Output {
        Printed {
            iter: input.into_iter(),
            print: self.clone(),
            seen: 0,
            last: None,
        }
    }
}

/// Output of [`Print`]
pub struct Printed<I, T> {
    iter: I,
    print: Print<T>,
    seen: usize,
    last: Option<Instant>,
}

impl<I, T> Printed<I, T> {
    fn due(&mut self, element: &T) -> bool {
        if let Some(filter) = &self.print.filter {
            if !filter(element) {
                return false;
            }
        }
        self.seen += 1;
        if self.print.every_n > 0 && self.seen % self.print.every_n != 0 {
            return false;
        }
        if let Some(interval) = self.print.every {
            let now = Instant::now();
            if self.last.is_some_and(|last| now.duration_since(last) < interval) {
                return false;
            }
            self.last = Some(now);
        }
        true
    }
}

impl<I, T> Iterator for Printed<I, T>
where
    I: Iterator<Item = T>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let element = self.iter.next()?;
        if self.due(&element) {
            let line = (self.print.format)(&element);
            if let Err(e) = writeln!(self.print.out.lock(), "{line}") {
                tracing::warn!(error = %e, "Print could not write element");
            }
        }
        Some(element)
    }
}
