//! Refresh bookkeeping.

use std::time::Instant;

use parking_lot::RwLock;

/// Tracks the outcome of refresh cycles.
///
/// The generation starts at 1 after the initial load and increases by one on
/// every document swap. Cycles that found nothing new only update the refresh
/// time.
#[derive(Debug)]
pub struct RefreshState {
    /// Checksum of the current merged snapshot.
    checksum: RwLock<Option<String>>,
    /// Number of documents published so far.
    generation: RwLock<u64>,
    /// The last successful refresh time.
    last_refresh: RwLock<Option<Instant>>,
    /// The last error message, if any.
    last_error: RwLock<Option<String>>,
    /// Number of consecutive failures.
    failure_count: RwLock<u32>,
}

impl RefreshState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self {
            checksum: RwLock::new(None),
            generation: RwLock::new(0),
            last_refresh: RwLock::new(None),
            last_error: RwLock::new(None),
            failure_count: RwLock::new(0),
        }
    }

    /// Returns the checksum of the current merged snapshot.
    pub fn checksum(&self) -> Option<String> {
        self.checksum.read().clone()
    }

    /// Returns how many documents have been published.
    pub fn generation(&self) -> u64 {
        *self.generation.read()
    }

    /// Returns the time of the last successful refresh.
    pub fn last_refresh(&self) -> Option<Instant> {
        *self.last_refresh.read()
    }

    /// Records a refresh that published a new document.
    pub fn record_swap(&self, checksum: impl Into<String>) {
        {
            let mut checksum_lock = self.checksum.write();
            let mut generation = self.generation.write();

            *checksum_lock = Some(checksum.into());
            *generation += 1;
        }

        self.record_unchanged();
    }

    /// Records a refresh that found every source unchanged.
    pub fn record_unchanged(&self) {
        let mut last_refresh = self.last_refresh.write();
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        *last_refresh = Some(Instant::now());
        *last_error = None;
        *failure_count = 0;
    }

    /// Records a failed refresh.
    pub fn record_failure(&self, error: impl Into<String>) {
        let mut last_error = self.last_error.write();
        let mut failure_count = self.failure_count.write();

        *last_error = Some(error.into());
        *failure_count += 1;
    }

    /// Returns the last error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }

    /// Returns the number of consecutive failures.
    pub fn failure_count(&self) -> u32 {
        *self.failure_count.read()
    }

    /// Returns true if the last cycle succeeded.
    pub fn is_healthy(&self) -> bool {
        self.generation() > 0 && self.last_error.read().is_none()
    }
}

impl Default for RefreshState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = RefreshState::new();
        assert!(state.checksum().is_none());
        assert!(state.last_refresh().is_none());
        assert_eq!(state.generation(), 0);
        assert!(!state.is_healthy());
    }

    #[test]
    fn test_record_swap() {
        let state = RefreshState::new();
        state.record_swap("abc123");
        state.record_swap("def456");

        assert_eq!(state.checksum(), Some("def456".to_string()));
        assert_eq!(state.generation(), 2);
        assert!(state.last_refresh().is_some());
        assert!(state.is_healthy());
    }

    #[test]
    fn test_unchanged_keeps_generation() {
        let state = RefreshState::new();
        state.record_swap("abc123");
        state.record_unchanged();

        assert_eq!(state.generation(), 1);
        assert_eq!(state.checksum(), Some("abc123".to_string()));
    }

    #[test]
    fn test_failures_accumulate_until_success() {
        let state = RefreshState::new();
        state.record_swap("abc123");
        state.record_failure("source unavailable");
        state.record_failure("decode error");

        assert_eq!(state.failure_count(), 2);
        assert_eq!(state.last_error(), Some("decode error".to_string()));
        assert!(!state.is_healthy());

        state.record_unchanged();
        assert_eq!(state.failure_count(), 0);
        assert!(state.last_error().is_none());
    }
}
