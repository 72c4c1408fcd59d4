//! Match window over the most recent emitted rows.

use std::fmt;

use contracts::WindowMode;
use ringbuf::{traits::*, HeapRb};

/// Bounded record of matched / unmatched outcomes since the last (re)seed
pub struct MatchWindow {
    outcomes: HeapRb<bool>,
    size: usize,
    min_matched: usize,
    mode: WindowMode,
    matched: usize,
    rows_since_seed: u64,
}

impl fmt::Debug for MatchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchWindow")
            .field("len", &self.outcomes.occupied_len())
            .field("matched", &self.matched)
            .field("size", &self.size)
            .field("mode", &self.mode)
            .finish()
    }
}

impl MatchWindow {
    /// `size` must be non-zero
    pub fn new(size: usize, min_matched: usize, mode: WindowMode) -> Self {
        Self {
            outcomes: HeapRb::new(size.max(1)),
            size: size.max(1),
            min_matched,
            mode,
            matched: 0,
            rows_since_seed: 0,
        }
    }

    /// Record one row outcome
    ///
    /// Returns `true` when the alignment must be abandoned.
    pub fn record(&mut self, matched: bool) -> bool {
        // oldest outcome drops out once the window is full
        if self.outcomes.is_full() && self.outcomes.try_pop() == Some(true) {
            self.matched -= 1;
        }
        let _ = self.outcomes.try_push(matched);
        if matched {
            self.matched += 1;
        }
        self.rows_since_seed += 1;

        let evaluate = match self.mode {
            WindowMode::Sliding => self.outcomes.is_full(),
            WindowMode::Leading => self.rows_since_seed == self.size as u64,
        };
        evaluate && self.matched < self.min_matched
    }

    /// Forget all outcomes
    pub fn clear(&mut self) {
        self.outcomes = HeapRb::new(self.size);
        self.matched = 0;
        self.rows_since_seed = 0;
    }

    /// Matched rows currently in the window
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Rows currently in the window
    pub fn len(&self) -> usize {
        self.outcomes.occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
