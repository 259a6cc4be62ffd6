//! One level of unnesting over sequences that mix leaves and sub-sequences.

/// An element that is either a single value or a sequence of values.
///
/// Flattening a sequence of `Nested` values unwraps exactly one level:
/// `Many` contributes its elements, `Leaf` passes through unchanged. Text
/// is always a leaf, since strings are not treated as sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nested<T> {
    Leaf(T),
    Many(Vec<T>),
}

impl<T> IntoIterator for Nested<T> {
    type Item = T;
    type IntoIter = NestedIter<T>;

    fn into_iter(self) -> NestedIter<T> {
        match self {
            Nested::Leaf(value) => NestedIter::Leaf(Some(value)),
            Nested::Many(values) => NestedIter::Many(values.into_iter()),
        }
    }
}

impl<T> From<Vec<T>> for Nested<T> {
    fn from(values: Vec<T>) -> Self {
        Nested::Many(values)
    }
}

/// Iterator over the contents of a [`Nested`]
#[derive(Debug, Clone)]
pub enum NestedIter<T> {
    Leaf(Option<T>),
    Many(std::vec::IntoIter<T>),
}

impl<T> Iterator for NestedIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            NestedIter::Leaf(value) => value.take(),
            NestedIter::Many(values) => values.next(),
        }
    }
}

/// Unwrap one level of nesting
pub fn flatten<I>(iterable: I) -> std::iter::Flatten<I::IntoIter>
where
    I: IntoIterator,
    I::Item: IntoIterator,
{
    iterable.into_iter().flatten()
}
