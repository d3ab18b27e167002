//! Per-session run state.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::trace;

use coach_models::{AgentKind, SessionId, SessionSnapshot, SharedContext, StreamEvent};

/// Where a session is in its processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No cycle running; eligible for the next trigger.
    #[default]
    Idle,
    /// A cycle is being set up.
    Triggering,
    /// At least one agent is in flight.
    Active,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Triggering => write!(f, "triggering"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Outbound event channel for one session.
///
/// Shared with agent tasks so partial output can be emitted without taking
/// the session lock. Sends after close are dropped.
#[derive(Debug, Default)]
pub(crate) struct EventSink {
    tx: Mutex<Option<mpsc::UnboundedSender<StreamEvent>>>,
}

impl EventSink {
    /// Replaces the current subscriber, closing the previous channel.
    pub(crate) fn subscribe(&self) -> mpsc::UnboundedReceiver<StreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.lock() = Some(tx);
        rx
    }

    /// Closes the channel.
    pub(crate) fn close(&self) {
        self.lock().take();
    }

    pub(crate) fn emit(&self, event: StreamEvent) {
        let mut tx = self.lock();
        if let Some(sender) = tx.as_ref() {
            if sender.send(event).is_err() {
                trace!("event receiver dropped, closing sink");
                tx.take();
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<StreamEvent>>> {
        self.tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Buffered transcript and store snapshot captured when a cycle starts.
#[derive(Debug, Clone)]
pub(crate) struct CycleInput {
    pub transcript: String,
    pub snapshot: SessionSnapshot,
}

/// Mutable state of one session, guarded by the session mutex.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub id: SessionId,
    pub phase: SessionPhase,
    /// Agents currently in flight for this cycle.
    pub active: HashSet<AgentKind>,
    pub context: SharedContext,
    /// Incremented every time a cycle starts.
    pub cycle: u64,
    pub input: Option<CycleInput>,
    pub tasks: Vec<AbortHandle>,
}

impl SessionState {
    pub(crate) fn new(id: SessionId) -> Self {
        Self {
            id,
            phase: SessionPhase::Idle,
            active: HashSet::new(),
            context: SharedContext::new(),
            cycle: 0,
            input: None,
            tasks: Vec::new(),
        }
    }

    /// Returns to `Idle` once the last agent has finished.
    pub(crate) fn finish_cycle(&mut self) {
        self.phase = SessionPhase::Idle;
        self.active.clear();
        self.input = None;
        self.tasks.clear();
    }

    /// Aborts every in-flight agent task.
    pub(crate) fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.active.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_delivers_in_order() {
        let sink = EventSink::default();
        let session = SessionId::from("s");
        let mut rx = sink.subscribe();

        sink.emit(StreamEvent::agent_start(&session, AgentKind::Validation));
        sink.emit(StreamEvent::agent_stream(&session, AgentKind::Validation, "C"));

        assert_eq!(rx.recv().await.unwrap().content, None);
        assert_eq!(rx.recv().await.unwrap().content.as_deref(), Some("C"));
    }

    #[tokio::test]
    async fn test_close_ends_stream() {
        let sink = EventSink::default();
        let mut rx = sink.subscribe();

        sink.close();
        sink.emit(StreamEvent::error(&SessionId::from("s"), None, "late"));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_resubscribe_closes_previous() {
        let sink = EventSink::default();
        let mut first = sink.subscribe();
        let mut second = sink.subscribe();

        sink.emit(StreamEvent::error(&SessionId::from("s"), None, "x"));
        assert!(first.recv().await.is_none());
        assert!(second.recv().await.is_some());
    }

    #[test]
    fn test_finish_cycle_resets() {
        let mut state = SessionState::new(SessionId::from("s"));
        state.phase = SessionPhase::Active;
        state.active.insert(AgentKind::Validation);

        state.finish_cycle();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.active.is_empty());
    }
}
