//! Expiring conversation history.
//!
//! Holds the most recent user/assistant turns so the next prompt can carry
//! short-term context. Entries are ordered by a sequence number assigned at
//! insert time; the captured timestamp is used only for expiry.
//!
//! Expiry is lazy: stale entries are dropped at the start of the next
//! [`HistoryCache::insert`], never by a background task. An idle process
//! keeps whatever it last held.

use aisha_core::clock::{Clock, SystemClock};
use aisha_core::persona::Persona;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Default time-to-live for history entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// One completed chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Insertion order, strictly increasing
    pub sequence: u64,

    /// When the turn was recorded
    pub timestamp: DateTime<Utc>,

    pub user_message: String,

    pub ai_response: String,
}

#[derive(Debug, Default)]
struct HistoryState {
    entries: VecDeque<HistoryEntry>,
    next_sequence: u64,
}

/// A process-wide, time-windowed store of recent chat turns.
///
/// Each operation takes the lock once and never holds it across an await.
pub struct HistoryCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<HistoryState>,
}

impl HistoryCache {
    /// Create an empty cache on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create an empty cache reading time from `clock`.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            state: Mutex::new(HistoryState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryState> {
        // The cache is advisory context; a panic elsewhere must not take it down.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a completed turn, then evict everything older than the TTL
    /// relative to this insert.
    pub fn insert(&self, user_message: impl Into<String>, ai_response: impl Into<String>) {
        let now = self.clock.now();
        let mut state = self.lock();

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state.entries.push_back(HistoryEntry {
            sequence,
            timestamp: now,
            user_message: user_message.into(),
            ai_response: ai_response.into(),
        });

        let before = state.entries.len();
        let ttl = self.ttl;
        // Entries stamped after `now` (clock stepped back) count as fresh.
        state
            .entries
            .retain(|e| (now - e.timestamp).to_std().map_or(true, |age| age <= ttl));
        let evicted = before - state.entries.len();

        if evicted > 0 {
            debug!(evicted, remaining = state.entries.len(), "Evicted expired history entries");
        }
    }

    /// Render the history as prompt text, two lines per turn:
    ///
    /// ```text
    /// <human_label>: <user_message>
    /// <ai_label>: <ai_response>
    /// ```
    ///
    /// Returns an empty string when there is no history.
    pub fn render(&self, persona: &Persona) -> String {
        let state = self.lock();
        state
            .entries
            .iter()
            .map(|e| {
                format!(
                    "{}: {}\n{}: {}",
                    persona.human_label, e.user_message, persona.ai_label, e.ai_response
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Snapshot of the current entries in insertion order.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Drop every entry. Sequence numbers keep counting.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl Default for HistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl std::fmt::Debug for HistoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aisha_core::clock::ManualClock;
    use chrono::TimeZone;

    fn persona() -> Persona {
        Persona {
            human_label: "Human".into(),
            ai_label: "AI".into(),
            ..Persona::builtin()
        }
    }

    fn cache_at_epoch() -> (HistoryCache, Arc<ManualClock>) {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        (HistoryCache::with_clock(DEFAULT_TTL, clock.clone()), clock)
    }

    #[test]
    fn empty_cache_renders_empty_string() {
        let (cache, _) = cache_at_epoch();
        assert!(cache.is_empty());
        assert_eq!(cache.render(&persona()), "");
    }

    #[test]
    fn render_keeps_insertion_order() {
        let (cache, clock) = cache_at_epoch();
        cache.insert("one", "first");
        clock.advance(chrono::Duration::seconds(1));
        cache.insert("two", "second");
        clock.advance(chrono::Duration::seconds(1));
        cache.insert("three", "third");

        assert_eq!(
            cache.render(&persona()),
            "Human: one\nAI: first\nHuman: two\nAI: second\nHuman: three\nAI: third"
        );
    }

    #[test]
    fn render_is_idempotent() {
        let (cache, _) = cache_at_epoch();
        cache.insert("hello", "hi");
        let first = cache.render(&persona());
        let second = cache.render(&persona());
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_older_than_ttl_are_evicted_on_insert() {
        let (cache, clock) = cache_at_epoch();
        cache.insert("old", "stale");
        clock.advance(chrono::Duration::seconds(601));
        cache.insert("new", "fresh");

        let entries = cache.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_message, "new");
        assert_eq!(cache.render(&persona()), "Human: new\nAI: fresh");
    }

    #[test]
    fn entry_exactly_at_ttl_is_kept() {
        let (cache, clock) = cache_at_epoch();
        cache.insert("edge", "case");
        clock.advance(chrono::Duration::seconds(600));
        cache.insert("next", "turn");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn eviction_is_lazy() {
        let (cache, clock) = cache_at_epoch();
        cache.insert("old", "stale");
        clock.advance(chrono::Duration::hours(2));
        // No insert, so nothing is evicted yet.
        assert_eq!(cache.len(), 1);
        assert!(cache.render(&persona()).contains("stale"));
    }

    #[test]
    fn identical_timestamps_do_not_collide() {
        let (cache, _) = cache_at_epoch();
        cache.insert("a", "1");
        cache.insert("b", "2");

        let entries = cache.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp, entries[1].timestamp);
        assert!(entries[0].sequence < entries[1].sequence);
    }

    #[test]
    fn clock_stepping_back_keeps_entries() {
        let (cache, clock) = cache_at_epoch();
        cache.insert("future", "entry");
        clock.advance(chrono::Duration::seconds(-30));
        cache.insert("past", "entry");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_keeps_sequence_counting() {
        let (cache, _) = cache_at_epoch();
        cache.insert("a", "1");
        cache.clear();
        assert!(cache.is_empty());
        cache.insert("b", "2");
        assert_eq!(cache.entries()[0].sequence, 1);
    }

    #[test]
    fn render_uses_persona_labels() {
        let (cache, _) = cache_at_epoch();
        cache.insert("Привет", "Здравствуй");
        assert_eq!(
            cache.render(&Persona::builtin()),
            "Человек: Привет\nAI-ша: Здравствуй"
        );
    }

    #[tokio::test]
    async fn concurrent_inserts_are_all_recorded() {
        let cache = Arc::new(HistoryCache::default());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache.insert(format!("msg {i}"), format!("reply {i}"));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let entries = cache.entries();
        assert_eq!(entries.len(), 16);
        let mut seqs: Vec<u64> = entries.iter().map(|e| e.sequence).collect();
        seqs.dedup();
        assert_eq!(seqs.len(), 16);
        assert!(entries.windows(2).all(|w| w[0].sequence < w[1].sequence));
    }
}
