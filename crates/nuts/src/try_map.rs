//! Per-element fault isolation.
//!
//! [`Try`] maps a fallible function over the upstream. An `Err` for one
//! element is handled by the configured [`OnError`] policy and never stops
//! the elements after it. Panics are not caught.

use nutflow_core::{Error, Nut, NutKind, Result};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::Arc;

/// Where reported errors are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

type Handler<T, O, E> = Arc<dyn Fn(&T, &E) -> O + Send + Sync>;

/// What to do with an element whose function call failed
pub enum OnError<T, O, E> {
    /// Drop the element silently
    Skip,
    /// Yield this value instead
    Default(O),
    /// Yield `handler(element, error)` instead
    Handle(Handler<T, O, E>),
    /// Print `Error: <error>` to the channel and drop the element
    Report(Channel),
}

impl<T, O, E> OnError<T, O, E> {
    pub fn handle<H>(handler: H) -> Self
    where
        H: Fn(&T, &E) -> O + Send + Sync + 'static,
    {
        OnError::Handle(Arc::new(handler))
    }

    /// Parse a policy name: `IGNORE`, `STDOUT` or `STDERR`
    pub fn parse(name: &str) -> Result<Self> {
        Ok(match name.parse::<PolicyName>()? {
            PolicyName::Ignore => OnError::Skip,
            PolicyName::Stdout => OnError::Report(Channel::Stdout),
            PolicyName::Stderr => OnError::Report(Channel::Stderr),
        })
    }
}

impl<T, O: Clone, E> Clone for OnError<T, O, E> {
    fn clone(&self) -> Self {
        match self {
            OnError::Skip => OnError::Skip,
            OnError::Default(value) => OnError::Default(value.clone()),
            OnError::Handle(handler) => OnError::Handle(Arc::clone(handler)),
            OnError::Report(channel) => OnError::Report(*channel),
        }
    }
}

impl<T, O: fmt::Debug, E> fmt::Debug for OnError<T, O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OnError::Skip => f.write_str("Skip"),
            OnError::Default(value) => f.debug_tuple("Default").field(value).finish(),
            OnError::Handle(_) => f.write_str("Handle(..)"),
            OnError::Report(channel) => f.debug_tuple("Report").field(channel).finish(),
        }
    }
}

enum PolicyName {
    Ignore,
    Stdout,
    Stderr,
}

impl FromStr for PolicyName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "IGNORE" => Ok(PolicyName::Ignore),
            "STDOUT" => Ok(PolicyName::Stdout),
            "STDERR" => Ok(PolicyName::Stderr),
            other => Err(Error::configuration(format!(
                "unknown error policy '{other}', expected IGNORE, STDOUT or STDERR"
            ))),
        }
    }
}

/// Maps a fallible function, recovering from failed elements by policy.
///
/// The default policy reports to stderr and skips the element.
pub struct Try<T, O, E> {
    f: Arc<dyn Fn(&T) -> std::result::Result<O, E> + Send + Sync>,
    policy: OnError<T, O, E>,
}

impl<T, O, E> Try<T, O, E> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<O, E> + Send + Sync + 'static,
    {
        Self {
            f: Arc::new(f),
            policy: OnError::Report(Channel::Stderr),
        }
    }

    #[must_use]
    pub fn on_error(mut self, policy: OnError<T, O, E>) -> Self {
        self.policy = policy;
        self
    }
}

impl<T, O: Clone, E> Clone for Try<T, O, E> {
    fn clone(&self) -> Self {
        Self {
            f: Arc::clone(&self.f),
            policy: self.policy.clone(),
        }
    }
}

impl<I, T, O, E> Nut<I> for Try<T, O, E>
where
    I: IntoIterator<Item = T>,
    O: Clone,
    E: Display,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Tried<I::IntoIter, T, O, E>;

    fn apply(&self, input: I) -> Self::Output {
        Tried {
            iter: input.into_iter(),
            unit: self.clone(),
        }
    }
}

/// Output of [`Try`]
pub struct Tried<I, T, O, E> {
    iter: I,
    unit: Try<T, O, E>,
}

fn report<E: Display>(channel: Channel, error: &E) {
    tracing::warn!(error = %error, "element failed");
    match channel {
        Channel::Stdout => println!("Error: {error}"),
        Channel::Stderr => eprintln!("Error: {error}"),
    }
}

impl<I, T, O, E> Iterator for Tried<I, T, O, E>
where
    I: Iterator<Item = T>,
    O: Clone,
    E: Display,
{
    type Item = O;

    fn next(&mut self) -> Option<O> {
        loop {
            let element = self.iter.next()?;
            let error = match (self.unit.f)(&element) {
                Ok(value) => return Some(value),
                Err(error) => error,
            };
            match &self.unit.policy {
                OnError::Skip => continue,
                OnError::Default(value) => return Some(value.clone()),
                OnError::Handle(handler) => return Some(handler(&element, &error)),
                OnError::Report(channel) => report(*channel, &error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutflow_core::Chain;

    fn invert(x: &i32) -> std::result::Result<i32, String> {
        if *x == 0 {
            Err("division by zero".to_string())
        } else {
            Ok(10 / x)
        }
    }

    #[test]
    fn test_skip_policy() {
        let out: Vec<i32> = vec![10, 0, 1]
            .then(Try::new(invert).on_error(OnError::Skip))
            .collect();
        assert_eq!(out, vec![1, 10]);
    }

    #[test]
    fn test_default_policy() {
        let out: Vec<i32> = vec![10, 0, 1]
            .then(Try::new(invert).on_error(OnError::Default(-1)))
            .collect();
        assert_eq!(out, vec![1, -1, 10]);
    }

    #[test]
    fn test_handler_sees_element_and_error() {
        let policy = OnError::handle(|x: &i32, e: &String| x * 100 + e.len() as i32);
        let out: Vec<i32> = vec![0, 5].then(Try::new(invert).on_error(policy)).collect();
        assert_eq!(out, vec![16, 2]);
    }

    #[test]
    fn test_report_policy_continues() {
        let out: Vec<i32> = vec![0, 0, 2].then(Try::new(invert)).collect();
        assert_eq!(out, vec![5]);
    }

    #[test]
    fn test_parse_policy() {
        assert!(matches!(
            OnError::<i32, i32, String>::parse("IGNORE"),
            Ok(OnError::Skip)
        ));
        assert!(matches!(
            OnError::<i32, i32, String>::parse("STDOUT"),
            Ok(OnError::Report(Channel::Stdout))
        ));
        let err = OnError::<i32, i32, String>::parse("LOGFILE").unwrap_err();
        assert!(err.is_configuration());
    }
}
