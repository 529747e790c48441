use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{Chainable, Error, Result};

/// The phase of a build a deferred failure belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Process,
    Generate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Parse => "parse".fmt(f),
            Phase::Process => "process".fmt(f),
            Phase::Generate => "generate".fmt(f),
        }
    }
}

/// Collects the failures of one build phase.
///
/// The first recorded failure is kept and reported by [`Failures::check()`];
/// later ones are logged and counted. Recording is safe from any thread.
#[derive(Debug)]
pub struct Failures {
    phase: Phase,
    first: Mutex<Option<Error>>,
    count: AtomicUsize,
}

impl Failures {
    pub fn new(phase: Phase) -> Self {
        Failures { phase, first: Mutex::new(None), count: AtomicUsize::new(0) }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn record(&self, error: Error) {
        self.count.fetch_add(1, Ordering::AcqRel);
        let mut first = self.first.lock();
        match *first {
            Some(_) => tracing::warn!(phase = %self.phase, "additional failure:\n{error}"),
            None => {
                tracing::debug!(phase = %self.phase, "first failure:\n{error}");
                *first = Some(error);
            }
        }
    }

    /// Records the error of `result`, if any, returning the success value.
    pub fn capture<T>(&self, result: Result<T>) -> Option<T> {
        result.map_err(|e| self.record(e)).ok()
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts the collected failures into a result, consuming the first
    /// recorded one.
    pub fn check(&self) -> Result<()> {
        let total = self.len();
        match self.first.lock().take() {
            None => Ok(()),
            Some(error) => Err(error).chain(error! {
                format!("{} phase failed", self.phase),
                "failures recorded" => total,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static_assertions::assert_impl_all!(Failures: Send, Sync);

    #[test]
    fn first_failure_wins() {
        let failures = Failures::new(Phase::Generate);
        assert!(failures.check().is_ok());

        failures.record(error!("first"));
        failures.record(error!("second"));
        assert_eq!(failures.len(), 2);

        let error = failures.check().unwrap_err();
        assert_eq!(error.message(), "generate phase failed");
        assert!(error.mentions("first"));
        assert!(!error.mentions("second"));
        assert!(error.to_string().contains("failures recorded: 2"));
    }

    #[test]
    fn capture_passes_values_through() {
        let failures = Failures::new(Phase::Parse);
        assert_eq!(failures.capture(Ok::<_, Error>(3)), Some(3));
        assert_eq!(failures.capture::<u8>(err!("nope")), None);
        assert!(!failures.is_empty());
    }

    #[test]
    fn concurrent_records_are_counted() {
        let failures = Failures::new(Phase::Generate);
        std::thread::scope(|s| {
            for i in 0..8 {
                let failures = &failures;
                s.spawn(move || failures.record(error!("unit failed", "unit" => i)));
            }
        });

        assert_eq!(failures.len(), 8);
        assert!(failures.check().is_err());
    }
}
