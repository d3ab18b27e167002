//! Session orchestration: triggers, agent scheduling and event emission.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info, trace, warn};

use coach_agent::{AgentInput, AgentRunner, ModelConfig, TextGenerator};
use coach_buffer::TranscriptBuffer;
use coach_models::{
    ends_sentence, AgentKind, AgentMetadata, AgentStreamResult, ChunkId, SessionId,
    SharedContext, StreamEvent,
};

use crate::config::{CoachConfig, OrchestratorConfig};
use crate::error::Result;
use crate::schedule;
use crate::selector::{select_response, SelectedResponse};
use crate::session::{CycleInput, EventSink, SessionPhase, SessionState};
use crate::store::ConversationStore;

type AgentTask = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Clone)]
struct SessionHandle {
    state: Arc<Mutex<SessionState>>,
    events: Arc<EventSink>,
}

struct Inner {
    buffer: TranscriptBuffer,
    store: Arc<dyn ConversationStore>,
    generator: Arc<dyn TextGenerator>,
    config: OrchestratorConfig,
    model: ModelConfig,
    sessions: RwLock<HashMap<SessionId, SessionHandle>>,
}

/// Ties buffered transcript to agent runs for many concurrent sessions.
///
/// Cheap to clone; all clones share the same sessions.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("generator", &self.inner.generator.name())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Creates an orchestrator after validating the configuration.
    pub fn new(
        config: CoachConfig,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn ConversationStore>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(Inner {
                buffer: TranscriptBuffer::new(config.buffer),
                store,
                generator,
                config: config.orchestrator,
                model: config.model,
                sessions: RwLock::new(HashMap::new()),
            }),
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }

    pub fn buffer(&self) -> &TranscriptBuffer {
        &self.inner.buffer
    }

    async fn handle(&self, session_id: &SessionId) -> Option<SessionHandle> {
        self.inner.sessions.read().await.get(session_id).cloned()
    }

    /// Registers a session and returns its event stream.
    ///
    /// Registering an existing session replaces its subscriber.
    pub async fn register_session(
        &self,
        session_id: &SessionId,
    ) -> mpsc::UnboundedReceiver<StreamEvent> {
        let mut sessions = self.inner.sessions.write().await;
        let handle = sessions.entry(session_id.clone()).or_insert_with(|| {
            info!(session_id = %session_id, "registering session");
            SessionHandle {
                state: Arc::new(Mutex::new(SessionState::new(session_id.clone()))),
                events: Arc::new(EventSink::default()),
            }
        });
        self.inner.buffer.ensure_session(session_id);
        handle.events.subscribe()
    }

    /// Opens a new event stream for a registered session, closing the old one.
    pub async fn subscribe(
        &self,
        session_id: &SessionId,
    ) -> Option<mpsc::UnboundedReceiver<StreamEvent>> {
        let handle = self.handle(session_id).await?;
        Some(handle.events.subscribe())
    }

    /// Closes the session's event stream; processing continues.
    pub async fn unsubscribe(&self, session_id: &SessionId) -> bool {
        match self.handle(session_id).await {
            Some(handle) => {
                handle.events.close();
                true
            }
            None => false,
        }
    }

    /// Tears a session down: aborts in-flight agents, closes its event
    /// stream and drops its buffer and shared context.
    pub async fn unregister_session(&self, session_id: &SessionId) -> bool {
        let Some(handle) = self.inner.sessions.write().await.remove(session_id) else {
            return false;
        };
        self.teardown(session_id, handle).await;
        true
    }

    async fn teardown(&self, session_id: &SessionId, handle: SessionHandle) {
        let mut state = handle.state.lock().await;
        let in_flight = state.active.len();
        state.abort_tasks();
        state.finish_cycle();
        state.context = SharedContext::new();
        handle.events.close();
        self.inner.buffer.remove_session(session_id);

        info!(session_id = %session_id, in_flight, "unregistered session");
    }

    /// Adds transcribed speech and starts a cycle if the buffer is ready.
    ///
    /// Text ending in `.`, `!` or `?` is treated as a complete sentence.
    /// Returns `None` for blank text or unknown sessions.
    pub async fn add_transcript_content(&self, session_id: &SessionId, text: &str) -> Option<ChunkId> {
        if text.trim().is_empty() {
            return None;
        }

        // Held across the append so a concurrent reap sees the new activity.
        let sessions = self.inner.sessions.read().await;
        if !sessions.contains_key(session_id) {
            return None;
        }
        let chunk_id = self
            .inner
            .buffer
            .add_chunk(session_id, text, ends_sentence(text));
        drop(sessions);

        self.try_start_cycle(session_id, false).await;
        Some(chunk_id)
    }

    /// Starts a cycle for any pending content, ignoring the trigger rules.
    pub async fn force_trigger_processing(&self, session_id: &SessionId) -> bool {
        self.try_start_cycle(session_id, true).await
    }

    /// Atomically checks the session is idle and starts a cycle.
    async fn try_start_cycle(&self, session_id: &SessionId, forced: bool) -> bool {
        let Some(handle) = self.handle(session_id).await else {
            return false;
        };

        let mut state = handle.state.lock().await;
        if state.phase != SessionPhase::Idle {
            trace!(session_id = %session_id, phase = %state.phase, "cycle already running");
            return false;
        }

        let ready = self.inner.buffer.get_processable_content(session_id);
        let go = if forced {
            ready.has_pending()
        } else {
            ready.should_process
        };
        if !go {
            return false;
        }

        let agents = schedule::initial_agents(&self.inner.config);
        self.inner.buffer.mark_processed(session_id, &ready.chunk_ids);
        if agents.is_empty() {
            warn!(session_id = %session_id, "no agents enabled, discarding pending content");
            return false;
        }

        state.phase = SessionPhase::Triggering;
        state.cycle += 1;
        let snapshot = self.inner.store.snapshot(session_id).await;
        state.input = Some(CycleInput {
            transcript: ready.content,
            snapshot,
        });
        state.phase = SessionPhase::Active;

        info!(
            session_id = %session_id,
            cycle = state.cycle,
            reason = %ready.reason,
            forced,
            pending_words = ready.pending_words,
            "starting cycle"
        );

        for kind in agents {
            self.start_agent(&mut state, &handle.events, kind);
        }
        true
    }

    /// Spawns one agent run for the current cycle.
    fn start_agent(&self, state: &mut SessionState, events: &Arc<EventSink>, kind: AgentKind) {
        let Some(cycle_input) = state.input.as_ref() else {
            return;
        };
        let input = AgentInput::from_snapshot(
            cycle_input.transcript.clone(),
            &cycle_input.snapshot,
            self.inner.model.history_turns,
            state.context.clone(),
        );

        state.active.insert(kind);
        events.emit(StreamEvent::agent_start(&state.id, kind));
        debug!(session_id = %state.id, agent = %kind, cycle = state.cycle, "agent started");

        let task = self.agent_task(state.id.clone(), state.cycle, kind, input, Arc::clone(events));
        state.tasks.push(tokio::spawn(task).abort_handle());
    }

    fn agent_task(
        &self,
        session_id: SessionId,
        cycle: u64,
        kind: AgentKind,
        input: AgentInput,
        events: Arc<EventSink>,
    ) -> AgentTask {
        let this = self.clone();
        Box::pin(async move {
            let runner = AgentRunner::new(
                kind,
                Arc::clone(&this.inner.generator),
                this.inner.model.clone(),
            );
            let result = runner
                .run(&input, |partial| {
                    events.emit(StreamEvent::agent_stream(&session_id, kind, partial.content))
                })
                .await;
            this.on_agent_complete(&session_id, cycle, result).await;
        })
    }

    /// Applies a finished run and starts whatever it unlocks.
    async fn on_agent_complete(&self, session_id: &SessionId, cycle: u64, result: AgentStreamResult) {
        let kind = result.agent_type;
        let Some(handle) = self.handle(session_id).await else {
            debug!(session_id = %session_id, agent = %kind, "completion for unknown session ignored");
            return;
        };

        let mut state = handle.state.lock().await;
        if state.cycle != cycle || !state.active.remove(&kind) {
            debug!(session_id = %session_id, agent = %kind, cycle, "stale completion ignored");
            return;
        }

        let metadata = result
            .metadata
            .clone()
            .unwrap_or_else(|| AgentMetadata::empty(kind));
        state.context.apply(metadata.clone());

        if let Some(error) = &result.error {
            warn!(session_id = %session_id, agent = %kind, error = %error, "agent degraded");
            handle
                .events
                .emit(StreamEvent::error(session_id, Some(kind), error.clone()));
        }
        handle.events.emit(StreamEvent::agent_complete(
            session_id,
            kind,
            result.content,
            Some(metadata.clone()),
        ));

        let selected = select_response(&state.context, self.inner.config.confidence_threshold);
        handle
            .events
            .emit(StreamEvent::context_update(session_id, kind, selected.message, metadata));

        for next in schedule::unlocked_by(kind, &self.inner.config) {
            self.start_agent(&mut state, &handle.events, next);
        }

        if state.active.is_empty() {
            state.finish_cycle();
            info!(session_id = %session_id, cycle, "cycle complete");
        }
    }

    /// The session's accumulated agent results.
    pub async fn shared_context(&self, session_id: &SessionId) -> Option<SharedContext> {
        let handle = self.handle(session_id).await?;
        let state = handle.state.lock().await;
        Some(state.context.clone())
    }

    /// The message currently selected for the interviewer.
    pub async fn primary_response(&self, session_id: &SessionId) -> Option<SelectedResponse> {
        let context = self.shared_context(session_id).await?;
        Some(select_response(&context, self.inner.config.confidence_threshold))
    }

    /// Agents in flight, in dependency order.
    pub async fn active_agents(&self, session_id: &SessionId) -> Vec<AgentKind> {
        let Some(handle) = self.handle(session_id).await else {
            return Vec::new();
        };
        let state = handle.state.lock().await;
        AgentKind::ALL
            .into_iter()
            .filter(|kind| state.active.contains(kind))
            .collect()
    }

    pub async fn phase(&self, session_id: &SessionId) -> Option<SessionPhase> {
        let handle = self.handle(session_id).await?;
        let phase = handle.state.lock().await.phase;
        Some(phase)
    }

    /// Registered sessions, sorted.
    pub async fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.inner.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Unregisters sessions whose buffers have been silent for the idle timeout.
    pub async fn reap_idle_sessions(&self) -> Vec<SessionId> {
        let idle = self.inner.buffer.sweep_idle();
        self.reap(idle).await
    }

    /// Unregisters swept sessions unless they were revived since the sweep.
    async fn reap(&self, idle: Vec<SessionId>) -> Vec<SessionId> {
        let mut reaped = Vec::new();
        for session_id in idle {
            let handle = {
                let mut sessions = self.inner.sessions.write().await;
                // Speech or a re-registration after the sweep revives the buffer.
                if self.inner.buffer.contains(&session_id)
                    && !self.inner.buffer.is_idle(&session_id)
                {
                    debug!(session_id = %session_id, "session became active, not reaping");
                    continue;
                }
                sessions.remove(&session_id)
            };
            if let Some(handle) = handle {
                self.teardown(&session_id, handle).await;
                reaped.push(session_id);
            }
        }
        reaped
    }

    /// One poller pass: reap idle sessions, then start a cycle for every idle
    /// session whose buffer is ready. Returns the number of cycles started.
    pub async fn poll_sessions(&self) -> usize {
        let reaped = self.reap_idle_sessions().await;
        if !reaped.is_empty() {
            info!(count = reaped.len(), "reaped idle sessions");
        }

        let mut started = 0;
        for session_id in self.session_ids().await {
            if self.try_start_cycle(&session_id, false).await {
                started += 1;
            }
        }
        started
    }

    /// Unregisters every session.
    pub async fn shutdown_sessions(&self) {
        for session_id in self.session_ids().await {
            self.unregister_session(&session_id).await;
        }
    }
}
