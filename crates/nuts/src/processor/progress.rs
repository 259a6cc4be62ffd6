//! Progress reporting on a sequence of known length.

use nutflow_core::{Nut, NutKind};
use nutflow_utils::{create_progress_indicator, eta_seconds, percent, timestr, ProgressTracker};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

const BAR_WIDTH: usize = 20;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Passes elements through while printing a progress bar to stderr.
///
/// The bar is redrawn at most once per `interval`; when the upstream is
/// exhausted a final line reports the total time taken.
#[derive(Clone)]
pub struct PrintProgress {
    total: usize,
    interval: Duration,
    out: SharedWriter,
}

impl PrintProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            interval: Duration::from_secs(10),
            out: Arc::new(Mutex::new(Box::new(std::io::stderr()))),
        }
    }

    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn to_writer(mut self, out: impl Write + Send + 'static) -> Self {
        self.out = Arc::new(Mutex::new(Box::new(out)));
        self
    }
}

impl std::fmt::Debug for PrintProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrintProgress")
            .field("total", &self.total)
            .field("interval", &self.interval)
            .finish()
    }
}

impl<I: IntoIterator> Nut<I> for PrintProgress {
    const KIND: NutKind = NutKind::Processor;
    type Output = Progress<I::IntoIter>;

    fn apply(&self, input: I) -> Self::Output {
        let mut tracker = ProgressTracker::with_throttle(self.interval);
        tracker.force_update();
        Progress {
            iter: input.into_iter(),
            unit: self.clone(),
            tracker,
            started: Instant::now(),
            done: 0,
            finished: false,
        }
    }
}

/// Output of [`PrintProgress`]
pub struct Progress<I> {
    iter: I,
    unit: PrintProgress,
    tracker: ProgressTracker,
    started: Instant,
    done: usize,
    finished: bool,
}

impl<I> Progress<I> {
    fn emit(&self, line: &str) {
        let mut out = self.unit.out.lock();
        if let Err(e) = write!(out, "{line}").and_then(|()| out.flush()) {
            tracing::warn!(error = %e, "PrintProgress could not write");
        }
    }

    fn report(&self) {
        let bar = create_progress_indicator(percent(self.done, self.unit.total), BAR_WIDTH);
        let eta = timestr(eta_seconds(self.done, self.unit.total, self.started.elapsed()));
        if eta.is_empty() {
            self.emit(&format!("\rprogress: {bar}"));
        } else {
            self.emit(&format!("\rprogress: {bar} (eta: {eta})"));
        }
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        let took = timestr(self.started.elapsed().as_secs());
        if took.is_empty() {
            self.emit("\rprogress: 100%\n");
        } else {
            self.emit(&format!("\rprogress: 100% (took: {took})\n"));
        }
    }
}

impl<I: Iterator> Iterator for Progress<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        match self.iter.next() {
            Some(element) => {
                if self.tracker.should_update() {
                    self.report();
                }
                self.done += 1;
                Some(element)
            }
            None => {
                self.finish();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nutflow_core::Chain;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_passes_elements_and_reports_completion() {
        let buffer = Buffer::default();
        let progress = PrintProgress::new(4)
            .interval(Duration::ZERO)
            .to_writer(buffer.clone());
        let out: Vec<i32> = vec![1, 2, 3, 4].then(&progress).collect();
        assert_eq!(out, vec![1, 2, 3, 4]);

        let text = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
        assert!(text.contains("progress: [----"));
        assert!(text.ends_with("progress: 100%\n"));
    }

    #[test]
    fn test_completion_reported_once() {
        let buffer = Buffer::default();
        let progress = PrintProgress::new(1)
            .interval(Duration::from_secs(3600))
            .to_writer(buffer.clone());
        let mut iter = vec!['x'].then(&progress);
        assert_eq!(iter.next(), Some('x'));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);

        let text = String::from_utf8_lossy(&buffer.0.lock()).into_owned();
        assert_eq!(text.matches("100%").count(), 1);
    }
}
