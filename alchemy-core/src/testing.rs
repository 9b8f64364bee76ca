//! Deterministic generators for tests and offline play.
//!
//! - `ScriptedGenerator` returns queued candidates, then falls back to a
//!   deterministic name derived from the inputs
//! - `FailingGenerator` always fails with a fixed error

use crate::element::Candidate;
use crate::error::GeneratorError;
use crate::generator::ElementGenerator;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A generator that returns scripted candidates.
///
/// Once the script runs out, combining "Water" and "Fire" yields
/// "Fire Water" (inputs sorted by name) with a ✨ glyph, so replays are stable.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    /// Candidates to return in order.
    script: Mutex<VecDeque<Candidate>>,
    /// Number of `generate` calls so far.
    calls: AtomicUsize,
    /// Optional artificial latency per call.
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    /// Create a generator with scripted candidates.
    pub fn new(script: Vec<Candidate>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    /// Sleep this long inside every call, to widen race windows in tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a candidate to the end of the script.
    pub fn queue(&self, candidate: Candidate) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(candidate);
    }

    /// How many times `generate` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The fallback candidate for two names.
    pub fn fallback(name_a: &str, name_b: &str) -> Candidate {
        let (first, second) = if name_a <= name_b {
            (name_a, name_b)
        } else {
            (name_b, name_a)
        };
        Candidate::new(format!("{first} {second}"), "✨")
    }
}

#[async_trait]
impl ElementGenerator for ScriptedGenerator {
    async fn generate(&self, name_a: &str, name_b: &str) -> Result<Candidate, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        Ok(next.unwrap_or_else(|| Self::fallback(name_a, name_b)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// A generator that always fails.
#[derive(Debug)]
pub struct FailingGenerator {
    kind: FailureKind,
    calls: AtomicUsize,
}

#[derive(Debug, Clone, Copy)]
enum FailureKind {
    Timeout,
    Network,
}

impl FailingGenerator {
    /// Fail every call with a timeout.
    pub fn timeout() -> Self {
        Self {
            kind: FailureKind::Timeout,
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every call with a network error.
    pub fn network() -> Self {
        Self {
            kind: FailureKind::Network,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElementGenerator for FailingGenerator {
    async fn generate(&self, _name_a: &str, _name_b: &str) -> Result<Candidate, GeneratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(match self.kind {
            FailureKind::Timeout => GeneratorError::Timeout {
                duration: Duration::from_secs(30),
            },
            FailureKind::Network => GeneratorError::Network("connection refused".to_string()),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_fallback() {
        let generator = ScriptedGenerator::new(vec![Candidate::new("Steam", "♨️")]);
        assert_eq!(
            generator.generate("Water", "Fire").await.unwrap(),
            Candidate::new("Steam", "♨️")
        );
        assert_eq!(
            generator.generate("Water", "Fire").await.unwrap(),
            Candidate::new("Fire Water", "✨")
        );
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_fallback_is_order_independent() {
        let generator = ScriptedGenerator::default();
        let ab = generator.generate("Earth", "Air").await.unwrap();
        let ba = generator.generate("Air", "Earth").await.unwrap();
        assert_eq!(ab, ba);
    }

    #[tokio::test]
    async fn test_failing_generator() {
        let generator = FailingGenerator::network();
        assert!(matches!(
            generator.generate("Water", "Fire").await,
            Err(GeneratorError::Network(_))
        ));
        assert_eq!(generator.calls(), 1);
    }
}
