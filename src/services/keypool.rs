use crate::services::providers::VideoProvider;

/// Minimum pool size before core features unlock
pub const REQUIRED_KEY_COUNT: usize = 5;

/// Ordered pool of upstream API keys with a rotation cursor
///
/// Keys are opaque and never mutated; only the cursor moves. Validity is
/// unknown until probed, and probing happens one key at a time so the cursor
/// advances deterministically.
#[derive(Debug, Default)]
pub struct ApiKeyPool {
    keys: Vec<String>,
    cursor: usize,
    validating: bool,
}

impl ApiKeyPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a pool from a persisted snapshot
    pub fn from_keys(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: 0,
            validating: false,
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// True while `next_valid` is probing, for loading indicators
    pub fn is_validating(&self) -> bool {
        self.validating
    }

    pub fn has_required_keys(&self) -> bool {
        self.keys.len() >= REQUIRED_KEY_COUNT
    }

    /// Appends a key; duplicates are allowed
    pub fn add(&mut self, key: String) {
        self.keys.push(key);
    }

    /// Removes the key at `index`
    ///
    /// When the cursor pointed at or after the removed slot it decrements,
    /// floored at zero, so it still references a valid remaining entry.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        if index >= self.keys.len() {
            return None;
        }

        let removed = self.keys.remove(index);
        if self.cursor >= index {
            self.cursor = self.cursor.saturating_sub(1);
        }
        Some(removed)
    }

    /// Advances the cursor one position, wrapping
    pub fn rotate(&mut self) -> usize {
        if !self.keys.is_empty() {
            self.cursor = (self.cursor + 1) % self.keys.len();
        }
        self.cursor
    }

    /// Finds the next usable key, probing sequentially from the cursor
    ///
    /// Wraps around exactly once, so an all-invalid pool costs at most one
    /// probe per key. The first key whose probe succeeds becomes the new
    /// cursor position and is returned.
    pub async fn next_valid(&mut self, provider: &dyn VideoProvider) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }

        self.validating = true;

        let start = self.cursor;
        let mut index = start;
        let mut found = None;

        loop {
            let key = self.keys[index].clone();
            if provider.probe_key(&key).await {
                self.cursor = index;
                found = Some(key);
                break;
            }

            index = (index + 1) % self.keys.len();
            if index == start {
                break;
            }
        }

        self.validating = false;
        found
    }
}
