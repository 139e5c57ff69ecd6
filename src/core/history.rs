//! Bounded log of transition attempts.
//!
//! The machine records one entry per attempt that reached its commit
//! decision, committed or not. Unknown messages and attempts aborted by a
//! callback failure before the decision are not recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// One transition attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionAttempt {
    /// State the attempt started from
    pub from: String,
    /// Message that triggered it
    pub message: String,
    /// State the transition targets
    pub to: String,
    /// Whether the machine moved to `to`
    pub committed: bool,
    /// When the commit decision was made
    pub timestamp: DateTime<Utc>,
}

/// Ordered attempt history holding at most `limit` entries.
///
/// When full, the oldest entry is dropped to make room.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use dynamicfsm::core::{StateHistory, TransitionAttempt};
///
/// let mut history = StateHistory::with_limit(2);
/// for (from, to) in [("A", "B"), ("B", "C"), ("C", "D")] {
///     history.record(TransitionAttempt {
///         from: from.to_string(),
///         message: "NEXT".to_string(),
///         to: to.to_string(),
///         committed: true,
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.get_path(), vec!["B", "C", "D"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHistory {
    attempts: VecDeque<TransitionAttempt>,
    limit: usize,
}

impl StateHistory {
    /// Create an empty history keeping at most `limit` attempts.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            attempts: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn record(&mut self, attempt: TransitionAttempt) {
        if self.limit == 0 {
            return;
        }
        while self.attempts.len() >= self.limit {
            self.attempts.pop_front();
        }
        self.attempts.push_back(attempt);
    }

    /// Recorded attempts, oldest first.
    pub fn attempts(&self) -> impl Iterator<Item = &TransitionAttempt> {
        self.attempts.iter()
    }

    /// Attempts that committed.
    pub fn committed(&self) -> impl Iterator<Item = &TransitionAttempt> {
        self.attempts.iter().filter(|attempt| attempt.committed)
    }

    /// Attempts that `run` rejected.
    pub fn rejected(&self) -> impl Iterator<Item = &TransitionAttempt> {
        self.attempts.iter().filter(|attempt| !attempt.committed)
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn clear(&mut self) {
        self.attempts.clear();
    }

    /// States traversed by committed attempts: the first origin, then every
    /// target.
    pub fn get_path(&self) -> Vec<&str> {
        let mut committed = self.committed().peekable();
        let mut path = Vec::new();
        if let Some(first) = committed.peek().copied() {
            path.push(first.from.as_str());
        }
        path.extend(committed.map(|attempt| attempt.to.as_str()));
        path
    }

    /// Time between the first and last recorded attempt.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.attempts.front()?;
        let last = self.attempts.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_limit(256)
    }
}
