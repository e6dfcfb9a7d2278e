//! Typing presence signal.
//!
//! While a user composes a reply, the UI reports "typing" for the
//! document and comment thread. [`TypingThrottle`] decides which of those
//! reports go out: at most one per interval per `(document, thread)` pair.

use std::collections::HashMap;
use std::time::Duration;

use folio_common::Config;
use smol_str::SmolStr;
use web_time::Instant;

/// Default minimum gap between two typing signals for one pair.
pub const DEFAULT_TYPING_INTERVAL: Duration = Duration::from_millis(500);

/// A typing signal that passed the throttle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSignal {
    pub document: SmolStr,
    pub thread: SmolStr,
}

/// Leading-edge throttle keyed on `(document, thread)`.
#[derive(Debug, Clone)]
pub struct TypingThrottle {
    interval: Duration,
    /// When each pair last emitted.
    last_emitted: HashMap<(SmolStr, SmolStr), Instant>,
}

impl Default for TypingThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_TYPING_INTERVAL)
    }
}

impl TypingThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emitted: HashMap::new(),
        }
    }

    /// Throttle using `typing-throttle-ms` from the config.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.typing_throttle)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a typing event at `now` should be emitted. Records the
    /// emission when it should.
    pub fn should_emit(&mut self, document: &str, thread: &str, now: Instant) -> bool {
        let key = (SmolStr::new(document), SmolStr::new(thread));
        match self.last_emitted.get(&key) {
            Some(&last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last_emitted.insert(key, now);
                true
            }
        }
    }

    /// [`TypingThrottle::should_emit`] at the current time, as a signal.
    pub fn typing(&mut self, document: &str, thread: &str) -> Option<TypingSignal> {
        self.should_emit(document, thread, Instant::now()).then(|| {
            tracing::trace!(document, thread, "typing");
            TypingSignal {
                document: SmolStr::new(document),
                thread: SmolStr::new(thread),
            }
        })
    }

    /// Drop pairs that have been quiet for longer than the interval.
    pub fn prune(&mut self, now: Instant) {
        let interval = self.interval;
        self.last_emitted
            .retain(|_, last| now.saturating_duration_since(*last) < interval);
    }

    pub fn len(&self) -> usize {
        self.last_emitted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_emitted.is_empty()
    }
}
