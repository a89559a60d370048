//! Time-window dedup keyed by composite strings (`CMD|subtype|id|...`).

use std::collections::HashMap;

/// Default suppression window.
pub const DEFAULT_WINDOW_MS: i64 = 3000;

#[derive(Debug)]
pub struct DedupCache {
    last_seen: HashMap<String, i64>,
    window_ms: i64,
    /// Sweep threshold; 0 = never sweep.
    max_entries: usize,
    /// At most one automatic sweep per window.
    last_sweep_ms: Option<i64>,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS, 0)
    }
}

impl DedupCache {
    pub fn new(window_ms: i64, max_entries: usize) -> Self {
        Self {
            last_seen: HashMap::new(),
            window_ms,
            max_entries,
            last_sweep_ms: None,
        }
    }

    /// `true` ("proceed") when `key` is unseen or was last accepted at least
    /// one window ago; the key's timestamp is then set to `now`. `false`
    /// ("suppressed") leaves the cache untouched.
    pub fn check(&mut self, key: &str, now_ms: i64) -> bool {
        self.check_within(key, now_ms, self.window_ms)
    }

    /// Same as [`check`](Self::check) with an explicit window.
    pub fn check_within(&mut self, key: &str, now_ms: i64, window_ms: i64) -> bool {
        if let Some(&last) = self.last_seen.get(key) {
            if now_ms - last < window_ms {
                return false;
            }
        }
        // a clock that stepped back lands in the branch above, so this never decreases
        self.last_seen.insert(key.to_string(), now_ms);

        if self.max_entries > 0
            && self.last_seen.len() > self.max_entries
            && self.sweep_due(now_ms)
        {
            self.sweep(now_ms);
        }
        true
    }

    /// Drop entries old enough that a default-window check on them would
    /// proceed anyway. Returns the number of removed keys.
    pub fn sweep(&mut self, now_ms: i64) -> usize {
        self.last_sweep_ms = Some(now_ms);
        let before = self.last_seen.len();
        let window = self.window_ms;
        self.last_seen.retain(|_, last| now_ms - *last < window);
        let removed = before - self.last_seen.len();
        if removed > 0 {
            tracing::debug!(removed, kept = self.last_seen.len(), "dedup cache swept");
        }
        removed
    }

    fn sweep_due(&self, now_ms: i64) -> bool {
        self.last_sweep_ms
            .map_or(true, |last| now_ms - last >= self.window_ms)
    }

    pub fn last_seen(&self, key: &str) -> Option<i64> {
        self.last_seen.get(key).copied()
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}
