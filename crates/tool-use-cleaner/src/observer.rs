//! Observers for cleaning reports.
//!
//! Every pass produces a [`CleanReport`]. The cleaner logs the interesting
//! part itself; observers are for hosts that want the numbers (metrics,
//! dashboards, tests).
//!
//! | Observer | Use case |
//! |----------|----------|
//! | [`NoopObserver`] | Default, ignore reports |
//! | [`FnObserver`] | Quick closures |
//! | [`CompositeObserver`] | Fan out to several observers |

use crate::context::CleanReport;

/// Receives the report of every cleaning pass.
pub trait CleanObserver: Send + Sync {
    fn on_clean(&self, report: &CleanReport) {
        let _ = report;
    }
}

/// Ignores every report.
pub struct NoopObserver;
impl CleanObserver for NoopObserver {}

/// An observer backed by a closure.
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
/// use tool_use_cleaner::context::CleanReport;
/// use tool_use_cleaner::observer::FnObserver;
///
/// let removed = Arc::new(AtomicUsize::new(0));
/// let r = removed.clone();
/// let observer = FnObserver::new(move |report: &CleanReport| {
///     r.fetch_add(report.removed(), Ordering::Relaxed);
/// });
/// # let _ = observer;
/// ```
pub struct FnObserver<F>(F)
where
    F: Fn(&CleanReport) + Send + Sync;

impl<F> FnObserver<F>
where
    F: Fn(&CleanReport) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> CleanObserver for FnObserver<F>
where
    F: Fn(&CleanReport) + Send + Sync,
{
    fn on_clean(&self, report: &CleanReport) {
        (self.0)(report)
    }
}

/// Forwards each report to every inner observer, in registration order.
pub struct CompositeObserver {
    observers: Vec<Box<dyn CleanObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn with(mut self, observer: impl CleanObserver + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for CompositeObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanObserver for CompositeObserver {
    fn on_clean(&self, report: &CleanReport) {
        for observer in &self.observers {
            observer.on_clean(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CleanMode;
    use std::sync::{Arc, Mutex};

    fn report(removed: usize) -> CleanReport {
        CleanReport {
            mode: CleanMode::StripAll,
            original_count: 10,
            cleaned_count: 10 - removed,
            round_ends: Vec::new(),
            cutoff: Some(9),
        }
    }

    #[test]
    fn fn_observer_receives_report() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let observer = FnObserver::new(move |r: &CleanReport| s.lock().unwrap().push(r.removed()));
        observer.on_clean(&report(3));
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn composite_fans_out_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let a = seen.clone();
        let b = seen.clone();
        let composite = CompositeObserver::new()
            .with(FnObserver::new(move |_: &CleanReport| a.lock().unwrap().push("a")))
            .with(NoopObserver)
            .with(FnObserver::new(move |_: &CleanReport| b.lock().unwrap().push("b")));
        assert_eq!(composite.len(), 3);
        composite.on_clean(&report(1));
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn empty_composite_is_noop() {
        let composite = CompositeObserver::default();
        assert!(composite.is_empty());
        composite.on_clean(&report(0));
    }
}
