//! Background prefetching
//!
//! [`Prefetch`] moves the upstream onto a worker thread that fills a
//! bounded queue while the consumer drains it. The worker blocks when the
//! queue is full and stops at its next send once the consumer is dropped.
//! A worker blocked inside the upstream itself is not interrupted; it ends
//! with the process.

use crate::config::PrefetchConfig;
use crossbeam::channel::{self, Receiver, Sender};
use nutflow_core::{Nut, NutKind, Result};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

enum Message<T> {
    Item(T),
    End,
    Panicked(Box<dyn Any + Send>),
}

/// Decouples producer and consumer with a bounded queue of `num_prefetch`
/// elements filled by one worker thread per evaluation
#[derive(Debug, Clone)]
pub struct Prefetch {
    config: PrefetchConfig,
}

impl Prefetch {
    pub fn new(num_prefetch: usize) -> Result<Self> {
        Self::with_config(PrefetchConfig::new(num_prefetch)?)
    }

    pub fn with_config(config: PrefetchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn num_prefetch(&self) -> usize {
        self.config.num_prefetch
    }
}

impl Default for Prefetch {
    fn default() -> Self {
        Self {
            config: PrefetchConfig::default(),
        }
    }
}

fn produce<I>(input: I, tx: &Sender<Message<I::Item>>)
where
    I: IntoIterator,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut sent = 0usize;
        for element in input {
            if tx.send(Message::Item(element)).is_err() {
                return Err(sent);
            }
            sent += 1;
        }
        Ok(sent)
    }));

    match outcome {
        Ok(Ok(sent)) => {
            tracing::debug!(sent, "Prefetch worker exhausted upstream");
            let _ = tx.send(Message::End);
        }
        Ok(Err(sent)) => {
            tracing::debug!(sent, "Prefetch consumer dropped, worker stopping");
        }
        Err(payload) => {
            tracing::debug!("Prefetch upstream panicked");
            let _ = tx.send(Message::Panicked(payload));
        }
    }
}

impl<I> Nut<I> for Prefetch
where
    I: IntoIterator + Send + 'static,
    I::Item: Send + 'static,
{
    const KIND: NutKind = NutKind::Processor;
    type Output = Prefetched<I>;

    fn apply(&self, input: I) -> Self::Output {
        let (tx, rx) = channel::bounded(self.config.num_prefetch);
        let slot = Arc::new(Mutex::new(Some(input)));
        let worker_slot = Arc::clone(&slot);

        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || {
                let input = worker_slot.lock().take();
                if let Some(input) = input {
                    produce(input, &tx);
                }
            });

        match spawned {
            Ok(_detached) => {
                tracing::debug!(
                    num_prefetch = self.config.num_prefetch,
                    "Prefetch worker started"
                );
                Prefetched {
                    source: Source::Worker(rx),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not start prefetch worker, reading inline");
                let input = slot.lock().take();
                Prefetched {
                    source: Source::Inline(input.map(IntoIterator::into_iter)),
                }
            }
        }
    }
}

/// Output of [`Prefetch`]
pub struct Prefetched<I: IntoIterator> {
    source: Source<I>,
}

enum Source<I: IntoIterator> {
    Worker(Receiver<Message<I::Item>>),
    Inline(Option<I::IntoIter>),
    Done,
}

impl<I: IntoIterator> Iterator for Prefetched<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        match &mut self.source {
            Source::Worker(rx) => match rx.recv() {
                Ok(Message::Item(element)) => Some(element),
                Ok(Message::Panicked(payload)) => {
                    self.source = Source::Done;
                    panic::resume_unwind(payload)
                }
                Ok(Message::End) | Err(_) => {
                    self.source = Source::Done;
                    None
                }
            },
            Source::Inline(iter) => iter.as_mut()?.next(),
            Source::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutflow_core::Chain;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(Prefetch::new(0).unwrap_err().is_configuration());
        assert_eq!(Prefetch::default().num_prefetch(), 1);
    }

    #[test]
    fn test_same_elements_same_order() {
        let out: Vec<u32> = (0..1000u32).then(Prefetch::new(4).unwrap()).collect();
        assert_eq!(out, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_runs_on_named_worker() {
        let config = PrefetchConfig::new(2).unwrap().with_thread_name("nut-cracker");
        let names: Vec<Option<String>> = (0..3)
            .map(|_| thread::current().name().map(str::to_string))
            .then(Prefetch::with_config(config).unwrap())
            .collect();
        assert!(names.iter().all(|n| n.as_deref() == Some("nut-cracker")));
    }

    #[test]
    fn test_worker_stays_ahead_by_capacity() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&produced);
        let mut out = (0..100)
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .then(Prefetch::new(3).unwrap());

        assert_eq!(out.next(), Some(0));
        thread::sleep(Duration::from_millis(100));
        let ahead = produced.load(Ordering::SeqCst);
        // one taken, three queued, one held by a blocked send
        assert!(ahead <= 5, "worker produced {ahead}");
        assert!(ahead >= 2);
    }

    #[test]
    fn test_dropping_consumer_stops_worker() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&produced);
        let mut out = (0..)
            .inspect(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .then(Prefetch::new(1).unwrap());
        assert_eq!(out.next(), Some(0));
        drop(out);

        thread::sleep(Duration::from_millis(100));
        let settled = produced.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(produced.load(Ordering::SeqCst), settled);
    }

    #[test]
    #[should_panic(expected = "bad walnut")]
    fn test_upstream_panic_resumes_on_consumer() {
        let upstream = (0..5).map(|x| {
            if x == 3 {
                panic!("bad walnut");
            }
            x
        });
        let _: Vec<i32> = upstream.then(Prefetch::new(2).unwrap()).collect();
    }
}
