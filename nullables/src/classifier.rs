//! Nullable classifier — scripted verdicts without a network call.

use async_trait::async_trait;
use ecobuild_vision::{ClassificationVerdict, Classifier, ClassifierMode, VisionError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A classifier that replays scripted results.
///
/// Scripted results are consumed in order; once exhausted, every call
/// returns the fallback verdict (the mock verdict unless overridden).
pub struct NullClassifier {
    mode: ClassifierMode,
    script: Mutex<VecDeque<Result<ClassificationVerdict, VisionError>>>,
    fallback: ClassificationVerdict,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl NullClassifier {
    pub fn new() -> Self {
        Self {
            mode: ClassifierMode::Mock,
            script: Mutex::new(VecDeque::new()),
            fallback: ClassificationVerdict::mock(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return `verdict`.
    pub fn returning(verdict: ClassificationVerdict) -> Self {
        Self {
            fallback: verdict,
            ..Self::new()
        }
    }

    /// Fail the next call with `error`.
    pub fn failing(error: VisionError) -> Self {
        let classifier = Self::new();
        classifier.push(Err(error));
        classifier
    }

    /// Queue a result for a future call.
    pub fn push(&self, result: Result<ClassificationVerdict, VisionError>) {
        self.script.lock().unwrap().push_back(result);
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report this mode (e.g. to exercise live-mode reporting).
    pub fn with_mode(mut self, mode: ClassifierMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for NullClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for NullClassifier {
    fn mode(&self) -> ClassifierMode {
        self.mode
    }

    async fn classify(
        &self,
        _image: &[u8],
        _media_type: &str,
    ) -> Result<ClassificationVerdict, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
