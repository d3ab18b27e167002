//! Sliding-window transcript buffer keyed by session.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use coach_models::{ChunkId, SessionId, TranscriptChunk};

use crate::config::BufferConfig;

/// Why buffered content is (or is not) ready for analysis.
///
/// Variants are listed in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerReason {
    /// A pending chunk ends a sentence.
    CompleteSentence,
    /// Pending words reached the trigger threshold.
    WordThreshold,
    /// The oldest pending fragment waited too long.
    Timeout,
    /// Nothing to process.
    None,
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CompleteSentence => "complete_sentence",
            Self::WordThreshold => "word_threshold",
            Self::Timeout => "timeout",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Result of evaluating a session's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessableContent {
    /// The whole window, carry-over first, joined with spaces.
    pub content: String,
    /// Whether a cycle should run now.
    pub should_process: bool,
    /// The first rule that fired.
    pub reason: TriggerReason,
    /// Pending (not yet processed) chunk ids, oldest first.
    pub chunk_ids: Vec<ChunkId>,
    /// Words in pending chunks.
    pub pending_words: usize,
}

impl ProcessableContent {
    fn empty() -> Self {
        Self {
            content: String::new(),
            should_process: false,
            reason: TriggerReason::None,
            chunk_ids: Vec::new(),
            pending_words: 0,
        }
    }

    /// Whether there is pending speech at all, regardless of the rules.
    pub fn has_pending(&self) -> bool {
        !self.chunk_ids.is_empty()
    }
}

#[derive(Debug)]
struct BufferedChunk {
    chunk: TranscriptChunk,
    words: usize,
    received_at: Instant,
    processed: bool,
}

#[derive(Debug)]
struct SessionBuffer {
    chunks: VecDeque<BufferedChunk>,
    last_activity: Instant,
}

impl SessionBuffer {
    fn new(now: Instant) -> Self {
        Self {
            chunks: VecDeque::new(),
            last_activity: now,
        }
    }

    fn total_words(&self) -> usize {
        self.chunks.iter().map(|c| c.words).sum()
    }

    fn pending(&self) -> impl Iterator<Item = &BufferedChunk> {
        self.chunks.iter().filter(|c| !c.processed)
    }
}

/// Per-session sliding window of speech chunks.
///
/// All state lives behind one lock, so sweeping idle sessions can never
/// interleave with an append.
pub struct TranscriptBuffer {
    config: BufferConfig,
    sessions: RwLock<HashMap<SessionId, SessionBuffer>>,
}

impl TranscriptBuffer {
    /// Creates an empty buffer.
    pub fn new(config: BufferConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SessionBuffer>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, SessionBuffer>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates an empty buffer for a session if none exists.
    ///
    /// Starts the idle clock for sessions that never receive speech.
    pub fn ensure_session(&self, session_id: &SessionId) {
        let now = Instant::now();
        self.write()
            .entry(session_id.clone())
            .or_insert_with(|| SessionBuffer::new(now));
    }

    /// Appends a chunk and enforces the word budget.
    pub fn add_chunk(&self, session_id: &SessionId, text: &str, is_complete: bool) -> ChunkId {
        let chunk = TranscriptChunk::new(session_id.clone(), text.trim(), is_complete);
        let id = chunk.id.clone();
        let words = chunk.word_count();
        let now = Instant::now();

        let mut sessions = self.write();
        let buffer = sessions
            .entry(session_id.clone())
            .or_insert_with(|| SessionBuffer::new(now));

        buffer.chunks.push_back(BufferedChunk {
            chunk,
            words,
            received_at: now,
            processed: false,
        });
        buffer.last_activity = now;

        let mut total = buffer.total_words();
        while total > self.config.max_buffer_words && buffer.chunks.len() > 1 {
            if let Some(evicted) = buffer.chunks.pop_front() {
                total -= evicted.words;
                trace!(
                    session_id = %session_id,
                    chunk_id = %evicted.chunk.id,
                    words = evicted.words,
                    "evicted chunk from sliding window"
                );
            }
        }

        debug!(
            session_id = %session_id,
            words,
            total_words = total,
            is_complete,
            "buffered transcript chunk"
        );

        id
    }

    /// Evaluates whether the session has enough new speech to analyze.
    ///
    /// Rules are checked in order: complete sentence, word threshold,
    /// timeout. Carry-over chunks are included in the content but never
    /// trigger on their own.
    pub fn get_processable_content(&self, session_id: &SessionId) -> ProcessableContent {
        let sessions = self.read();
        let Some(buffer) = sessions.get(session_id) else {
            return ProcessableContent::empty();
        };

        let content = buffer
            .chunks
            .iter()
            .map(|c| c.chunk.content.as_str())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let chunk_ids: Vec<ChunkId> = buffer.pending().map(|c| c.chunk.id.clone()).collect();
        let pending_words: usize = buffer.pending().map(|c| c.words).sum();

        let reason = if buffer.pending().any(|c| c.chunk.is_complete) {
            TriggerReason::CompleteSentence
        } else if pending_words >= self.config.trigger_threshold_words {
            TriggerReason::WordThreshold
        } else if buffer
            .pending()
            .find(|c| !c.chunk.is_complete)
            .is_some_and(|c| c.received_at.elapsed() >= self.config.incomplete_timeout)
        {
            TriggerReason::Timeout
        } else {
            TriggerReason::None
        };

        ProcessableContent {
            content,
            should_process: reason != TriggerReason::None,
            reason,
            chunk_ids,
            pending_words,
        }
    }

    /// Marks chunks as processed and trims the carry-over window.
    ///
    /// Only the most recent `carry_over_chunks` processed chunks survive;
    /// chunks that arrived after the trigger stay pending.
    pub fn mark_processed(&self, session_id: &SessionId, chunk_ids: &[ChunkId]) {
        let mut sessions = self.write();
        let Some(buffer) = sessions.get_mut(session_id) else {
            return;
        };

        for chunk in buffer.chunks.iter_mut() {
            if chunk_ids.contains(&chunk.chunk.id) {
                chunk.processed = true;
            }
        }

        let processed = buffer.chunks.iter().filter(|c| c.processed).count();
        let mut to_drop = processed.saturating_sub(self.config.carry_over_chunks);
        buffer.chunks.retain(|c| {
            if c.processed && to_drop > 0 {
                to_drop -= 1;
                false
            } else {
                true
            }
        });

        debug!(
            session_id = %session_id,
            marked = chunk_ids.len(),
            retained = buffer.chunks.len(),
            "marked chunks processed"
        );
    }

    /// Removes sessions idle for longer than the configured timeout.
    ///
    /// Returns the ids of the removed sessions.
    pub fn sweep_idle(&self) -> Vec<SessionId> {
        let timeout = self.config.session_idle_timeout;
        let mut removed = Vec::new();

        self.write().retain(|session_id, buffer| {
            let idle = buffer.last_activity.elapsed() >= timeout;
            if idle {
                removed.push(session_id.clone());
            }
            !idle
        });

        if !removed.is_empty() {
            info!(count = removed.len(), "swept idle transcript buffers");
        }
        removed
    }

    /// Whether the session has been silent for the idle timeout.
    ///
    /// Unknown sessions are not idle.
    pub fn is_idle(&self, session_id: &SessionId) -> bool {
        self.idle_for(session_id)
            .is_some_and(|idle| idle >= self.config.session_idle_timeout)
    }

    /// Time since the session's last activity.
    pub fn idle_for(&self, session_id: &SessionId) -> Option<Duration> {
        self.read()
            .get(session_id)
            .map(|b| b.last_activity.elapsed())
    }

    /// Discards a session's buffer. Returns whether it existed.
    pub fn remove_session(&self, session_id: &SessionId) -> bool {
        self.write().remove(session_id).is_some()
    }

    /// Total words currently buffered for a session.
    pub fn word_count(&self, session_id: &SessionId) -> usize {
        self.read()
            .get(session_id)
            .map(SessionBuffer::total_words)
            .unwrap_or(0)
    }

    /// Number of chunks currently buffered for a session.
    pub fn chunk_count(&self, session_id: &SessionId) -> usize {
        self.read()
            .get(session_id)
            .map(|b| b.chunks.len())
            .unwrap_or(0)
    }

    /// Copies of the buffered chunks, oldest first.
    pub fn chunks(&self, session_id: &SessionId) -> Vec<TranscriptChunk> {
        self.read()
            .get(session_id)
            .map(|b| b.chunks.iter().map(|c| c.chunk.clone()).collect())
            .unwrap_or_default()
    }

    /// Ids of all sessions with a buffer.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.read().keys().cloned().collect()
    }

    /// Whether a buffer exists for the session.
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.read().contains_key(session_id)
    }
}

impl fmt::Debug for TranscriptBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranscriptBuffer")
            .field("config", &self.config)
            .field("sessions", &self.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sid(s: &str) -> SessionId {
        SessionId::from(s)
    }

    fn buffer_with_threshold(words: usize) -> TranscriptBuffer {
        TranscriptBuffer::new(BufferConfig::new().with_trigger_threshold_words(words))
    }

    #[test]
    fn test_unknown_session_is_empty() {
        let buffer = TranscriptBuffer::new(BufferConfig::default());
        let result = buffer.get_processable_content(&sid("missing"));

        assert!(!result.should_process);
        assert_eq!(result.reason, TriggerReason::None);
        assert!(result.content.is_empty());
        assert_eq!(buffer.word_count(&sid("missing")), 0);
        buffer.mark_processed(&sid("missing"), &[ChunkId::new()]);
        assert!(!buffer.remove_session(&sid("missing")));
    }

    #[tokio::test]
    async fn test_word_threshold_fires_on_fourth_chunk() {
        let buffer = buffer_with_threshold(20);
        let session = sid("s1");
        let chunks = [
            "we open the main panel",
            "then we check the gauge",
            "and look at the dial",
            "before we touch any wire",
            "so nothing gets shorted out",
        ];

        for (i, text) in chunks.iter().enumerate().take(3) {
            buffer.add_chunk(&session, text, false);
            let result = buffer.get_processable_content(&session);
            assert!(!result.should_process, "chunk {} should not trigger", i + 1);
        }

        buffer.add_chunk(&session, chunks[3], false);
        let result = buffer.get_processable_content(&session);
        assert!(result.should_process);
        assert_eq!(result.reason, TriggerReason::WordThreshold);
        assert_eq!(result.pending_words, 20);
        assert_eq!(result.chunk_ids.len(), 4);
    }

    #[tokio::test]
    async fn test_complete_sentence_fires_below_threshold() {
        let buffer = buffer_with_threshold(20);
        let session = sid("s1");

        buffer.add_chunk(&session, "Turn the valve clockwise.", true);
        let result = buffer.get_processable_content(&session);

        assert!(result.should_process);
        assert_eq!(result.reason, TriggerReason::CompleteSentence);
        assert_eq!(result.content, "Turn the valve clockwise.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_after_incomplete_timeout() {
        let buffer = TranscriptBuffer::new(
            BufferConfig::new().with_incomplete_timeout(Duration::from_millis(3000)),
        );
        let session = sid("s1");

        buffer.add_chunk(&session, "so the pump", false);
        assert_eq!(
            buffer.get_processable_content(&session).reason,
            TriggerReason::None
        );

        tokio::time::advance(Duration::from_millis(2999)).await;
        assert!(!buffer.get_processable_content(&session).should_process);

        tokio::time::advance(Duration::from_millis(2)).await;
        let result = buffer.get_processable_content(&session);
        assert!(result.should_process);
        assert_eq!(result.reason, TriggerReason::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reason_priority_order() {
        let buffer = TranscriptBuffer::new(
            BufferConfig::new()
                .with_trigger_threshold_words(5)
                .with_incomplete_timeout(Duration::from_millis(100)),
        );
        let session = sid("s1");

        // Old incomplete fragment (timeout) plus enough words (threshold).
        buffer.add_chunk(&session, "one two three", false);
        tokio::time::advance(Duration::from_millis(200)).await;
        buffer.add_chunk(&session, "four five six", false);
        assert_eq!(
            buffer.get_processable_content(&session).reason,
            TriggerReason::WordThreshold
        );

        // All three conditions at once: sentence wins.
        buffer.add_chunk(&session, "Done.", true);
        assert_eq!(
            buffer.get_processable_content(&session).reason,
            TriggerReason::CompleteSentence
        );

        // Timeout alone.
        let other = sid("s2");
        buffer.add_chunk(&other, "hmm", false);
        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(
            buffer.get_processable_content(&other).reason,
            TriggerReason::Timeout
        );
    }

    #[test]
    fn test_sliding_window_drops_oldest() {
        let buffer = TranscriptBuffer::new(
            BufferConfig::new()
                .with_max_buffer_words(10)
                .with_trigger_threshold_words(5),
        );
        let session = sid("s1");

        buffer.add_chunk(&session, "a b c d", false);
        buffer.add_chunk(&session, "e f g h", false);
        buffer.add_chunk(&session, "i j k l", false);

        assert_eq!(buffer.word_count(&session), 8);
        let chunks = buffer.chunks(&session);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "e f g h");
    }

    #[test]
    fn test_oversized_chunk_is_kept_whole() {
        let buffer = TranscriptBuffer::new(
            BufferConfig::new()
                .with_max_buffer_words(5)
                .with_trigger_threshold_words(2),
        );
        let session = sid("s1");

        buffer.add_chunk(&session, "short one", false);
        buffer.add_chunk(&session, "this chunk alone is far longer than five words", false);

        assert_eq!(buffer.chunk_count(&session), 1);
        assert_eq!(buffer.word_count(&session), 9);
    }

    #[test]
    fn test_word_budget_holds_for_many_inserts() {
        let config = BufferConfig::new()
            .with_max_buffer_words(30)
            .with_trigger_threshold_words(10);
        let max = config.max_buffer_words;
        let buffer = TranscriptBuffer::new(config);
        let session = sid("s1");

        // Deterministic pseudo-random chunk sizes between 1 and 40 words.
        let mut seed: u64 = 0x2545_F491;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let words = (seed >> 33) as usize % 40 + 1;
            let text = vec!["w"; words].join(" ");
            buffer.add_chunk(&session, &text, words % 7 == 0);

            let total = buffer.word_count(&session);
            if total > max {
                assert_eq!(buffer.chunk_count(&session), 1);
                assert_eq!(total, words);
            }
        }
    }

    #[test]
    fn test_mark_processed_keeps_carry_over() {
        let buffer = TranscriptBuffer::new(
            BufferConfig::new()
                .with_trigger_threshold_words(1)
                .with_carry_over_chunks(2),
        );
        let session = sid("s1");

        for i in 0..4 {
            buffer.add_chunk(&session, &format!("part {}", i), false);
        }
        let result = buffer.get_processable_content(&session);
        assert_eq!(result.chunk_ids.len(), 4);

        // A chunk arriving mid-cycle stays pending.
        buffer.add_chunk(&session, "late words", false);
        buffer.mark_processed(&session, &result.chunk_ids);

        let chunks = buffer.chunks(&session);
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(texts, vec!["part 2", "part 3", "late words"]);

        let next = buffer.get_processable_content(&session);
        assert_eq!(next.chunk_ids.len(), 1);
        assert_eq!(next.pending_words, 2);
        assert_eq!(next.content, "part 2 part 3 late words");
    }

    #[test]
    fn test_carry_over_never_retriggers() {
        let buffer = buffer_with_threshold(20);
        let session = sid("s1");

        buffer.add_chunk(&session, "Turn the valve clockwise.", true);
        let first = buffer.get_processable_content(&session);
        buffer.mark_processed(&session, &first.chunk_ids);

        let second = buffer.get_processable_content(&session);
        assert!(!second.should_process);
        assert!(!second.has_pending());
        assert_eq!(second.content, "Turn the valve clockwise.");
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_idle_removes_only_silent_sessions() {
        let buffer = TranscriptBuffer::new(
            BufferConfig::new().with_session_idle_timeout(Duration::from_secs(60)),
        );

        buffer.add_chunk(&sid("quiet"), "hello there", false);
        tokio::time::advance(Duration::from_secs(45)).await;
        buffer.add_chunk(&sid("busy"), "still talking", false);
        tokio::time::advance(Duration::from_secs(20)).await;

        assert!(buffer.is_idle(&sid("quiet")));
        assert!(!buffer.is_idle(&sid("busy")));

        let removed = buffer.sweep_idle();
        assert_eq!(removed, vec![sid("quiet")]);
        assert!(!buffer.contains(&sid("quiet")));
        assert!(buffer.contains(&sid("busy")));
    }

    #[test]
    fn test_ensure_session_creates_empty_buffer() {
        let buffer = TranscriptBuffer::new(BufferConfig::default());
        let session = sid("s1");

        buffer.ensure_session(&session);
        assert!(buffer.contains(&session));
        assert_eq!(buffer.chunk_count(&session), 0);
        assert!(buffer.idle_for(&session).is_some());
    }

    #[test]
    fn test_concurrent_appends_survive_sweeps() {
        let buffer = Arc::new(TranscriptBuffer::new(
            BufferConfig::new().with_max_buffer_words(10_000),
        ));

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let buffer = Arc::clone(&buffer);
                std::thread::spawn(move || {
                    let session = sid(&format!("s{}", w));
                    for i in 0..200 {
                        buffer.add_chunk(&session, &format!("word {}", i), false);
                    }
                })
            })
            .collect();

        let sweeper = {
            let buffer = Arc::clone(&buffer);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    buffer.sweep_idle();
                }
            })
        };

        for handle in writers {
            handle.join().unwrap();
        }
        sweeper.join().unwrap();

        for w in 0..4 {
            assert_eq!(buffer.chunk_count(&sid(&format!("s{}", w))), 200);
        }
    }
}
