//! Shared closure handles.
//!
//! Units keep user closures behind an `Arc` so one unit can be chained any
//! number of times. Lazy adapters that need to own their closure get a
//! boxed forwarder to the shared one.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::sync::Arc;

/// Boxed by-value function handed to iterator adapters
pub type ElementFn<T, O> = Box<dyn Fn(T) -> O + Send + Sync>;

/// Boxed by-reference function handed to iterator adapters
pub type KeyFn<T, K> = Box<dyn Fn(&T) -> K + Send + Sync>;

/// Boxed element test
pub type Predicate<T> = KeyFn<T, bool>;

/// A key function (or predicate, with `K = bool`) over borrowed elements
pub struct Key<T, K> {
    f: Arc<dyn Fn(&T) -> K + Send + Sync>,
}

impl<T: 'static, K: 'static> Key<T, K> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn call(&self, element: &T) -> K {
        (self.f)(element)
    }

    pub fn boxed(&self) -> KeyFn<T, K> {
        let f = Arc::clone(&self.f);
        Box::new(move |element: &T| f(element))
    }
}

impl<T, E> Key<T, Option<E>>
where
    T: AsRef<[E]> + 'static,
    E: Clone + 'static,
{
    /// Key on the element's `index`-th column; short rows key on `None`
    pub fn column(index: usize) -> Self {
        Self::new(move |row: &T| row.as_ref().get(index).cloned())
    }
}

impl<T, K> Clone for Key<T, K> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<T, K> fmt::Debug for Key<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Key(..)")
    }
}

/// A function over owned elements
pub struct Mapper<T, O> {
    f: Arc<dyn Fn(T) -> O + Send + Sync>,
}

impl<T: 'static, O: 'static> Mapper<T, O> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn call(&self, element: T) -> O {
        (self.f)(element)
    }

    pub fn boxed(&self) -> ElementFn<T, O> {
        let f = Arc::clone(&self.f);
        Box::new(move |element: T| f(element))
    }
}

impl<T, O> Clone for Mapper<T, O> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
        }
    }
}

impl<T, O> fmt::Debug for Mapper<T, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mapper(..)")
    }
}

/// Where a randomised unit gets its generator from on each evaluation.
///
/// Every evaluation builds its own generator, so no random state leaks
/// between chains that share a unit.
#[derive(Debug, Clone, Default)]
pub enum RngSource {
    /// Fresh entropy per evaluation
    #[default]
    Entropy,
    /// Reseeded per evaluation; identical input gives identical output
    Seed(u64),
    /// A clone of the given generator per evaluation
    Fixed(StdRng),
}

impl RngSource {
    pub fn generator(&self) -> StdRng {
        match self {
            RngSource::Entropy => StdRng::from_entropy(),
            RngSource::Seed(seed) => StdRng::seed_from_u64(*seed),
            RngSource::Fixed(rng) => rng.clone(),
        }
    }
}
