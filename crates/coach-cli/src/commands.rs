//! Command handlers for CLI subcommands.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use coach_agent::{OpenRouterClient, ScriptedGenerator, TextGenerator};
use coach_models::{ConversationTurn, SessionId, StreamEvent, StreamEventType};
use coach_orchestrator::{
    CoachConfig, InMemoryConversationStore, Orchestrator, Runtime, SessionPhase,
};

use crate::cli::Commands;

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// How often to check whether the last cycle has finished.
const IDLE_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Execute a CLI command.
pub async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            offline,
            session,
            domain,
            topics,
            model,
        } => cmd_run(offline, &session, domain, topics, model).await,
        Commands::Config => cmd_config(),
    }
}

fn cmd_config() -> Result<()> {
    let config = CoachConfig::from_env()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// One line of operator input.
#[derive(Debug, PartialEq, Eq)]
pub enum InputLine {
    /// Transcribed speech.
    Speech(String),
    /// An interviewer question to record in the conversation history.
    Ask(String),
    Force,
    Status,
    Quit,
    Empty,
}

/// Parses a stdin line; anything not starting with a known command is speech.
pub fn parse_input(line: &str) -> InputLine {
    let line = line.trim();
    if line.is_empty() {
        return InputLine::Empty;
    }

    match line.split_once(' ').unwrap_or((line, "")) {
        ("/force", _) => InputLine::Force,
        ("/status", _) => InputLine::Status,
        ("/quit" | "/exit", _) => InputLine::Quit,
        ("/ask", rest) if !rest.trim().is_empty() => InputLine::Ask(rest.trim().to_string()),
        _ => InputLine::Speech(line.to_string()),
    }
}

/// Renders an event for the terminal. Partial stream output is not shown.
pub fn format_event(event: &StreamEvent) -> Option<String> {
    let agent = event
        .agent_type
        .map(|a| a.to_string())
        .unwrap_or_else(|| "session".to_string());
    let content = event.content.as_deref().unwrap_or_default();

    match event.event_type {
        StreamEventType::AgentStart => Some(format!("[{}] started", agent)),
        StreamEventType::AgentStream => None,
        StreamEventType::AgentComplete => Some(format!("[{}] complete\n{}", agent, content.trim())),
        StreamEventType::ContextUpdate => Some(format!(">> {}", content)),
        StreamEventType::Error => Some(format!("[{}] error: {}", agent, content)),
    }
}

async fn cmd_run(
    offline: bool,
    session: &str,
    domain: Option<String>,
    topics: Vec<String>,
    model: Option<String>,
) -> Result<()> {
    let mut config = CoachConfig::from_env()?;
    if let Some(model) = model {
        config.model.model = model;
    }
    let stream_timeout = config.model.stream_timeout();

    let generator: Arc<dyn TextGenerator> = if offline {
        info!("running offline with scripted responses");
        Arc::new(ScriptedGenerator::new())
    } else {
        Arc::new(OpenRouterClient::from_env()?)
    };

    let session_id = SessionId::from(session);
    let store = Arc::new(InMemoryConversationStore::new());
    if let Some(domain) = domain {
        store.set_domain_context(&session_id, domain).await;
    }
    if !topics.is_empty() {
        store.set_topics(&session_id, topics).await;
    }

    let orchestrator = Orchestrator::new(config, generator, store.clone())?;
    let mut runtime = Runtime::new(orchestrator.clone());
    runtime.start()?;

    let mut events = orchestrator.register_session(&session_id).await;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = format_event(&event) {
                println!("{}", line);
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            InputLine::Speech(text) => {
                orchestrator.add_transcript_content(&session_id, &text).await;
            }
            InputLine::Ask(question) => {
                store
                    .push_turn(&session_id, ConversationTurn::interviewer(question))
                    .await;
            }
            InputLine::Force => {
                if !orchestrator.force_trigger_processing(&session_id).await {
                    println!("(nothing pending or a cycle is already running)");
                }
            }
            InputLine::Status => print_primary(&orchestrator, &session_id).await,
            InputLine::Quit => break,
            InputLine::Empty => {}
        }
    }

    wait_for_idle(&orchestrator, &session_id, stream_timeout * 3).await;
    if orchestrator.force_trigger_processing(&session_id).await {
        wait_for_idle(&orchestrator, &session_id, stream_timeout * 3).await;
    }
    print_primary(&orchestrator, &session_id).await;

    runtime.shutdown().await?;
    printer.await?;
    Ok(())
}

async fn print_primary(orchestrator: &Orchestrator, session_id: &SessionId) {
    if let Some(selected) = orchestrator.primary_response(session_id).await {
        println!("== {}", selected.message);
    }
}

async fn wait_for_idle(orchestrator: &Orchestrator, session_id: &SessionId, limit: Duration) {
    let started = tokio::time::Instant::now();
    while matches!(
        orchestrator.phase(session_id).await,
        Some(SessionPhase::Triggering | SessionPhase::Active)
    ) {
        if started.elapsed() >= limit {
            debug!(session_id = %session_id, "gave up waiting for cycle to finish");
            return;
        }
        tokio::time::sleep(IDLE_CHECK_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coach_models::AgentKind;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("   "), InputLine::Empty);
        assert_eq!(parse_input("/force"), InputLine::Force);
        assert_eq!(parse_input("/status"), InputLine::Status);
        assert_eq!(parse_input("/quit"), InputLine::Quit);
        assert_eq!(
            parse_input("/ask What comes next?"),
            InputLine::Ask("What comes next?".into())
        );
        assert_eq!(
            parse_input("  Open the valve. "),
            InputLine::Speech("Open the valve.".into())
        );
        assert_eq!(parse_input("/ask"), InputLine::Speech("/ask".into()));
    }

    #[test]
    fn test_format_event() {
        let session = SessionId::from("s");

        let start = StreamEvent::agent_start(&session, AgentKind::Validation);
        assert_eq!(format_event(&start).unwrap(), "[validation] started");

        let partial = StreamEvent::agent_stream(&session, AgentKind::Validation, "CONF");
        assert!(format_event(&partial).is_none());

        let error = StreamEvent::error(&session, Some(AgentKind::FollowUp), "timed out");
        assert_eq!(format_event(&error).unwrap(), "[follow-up] error: timed out");
    }

    #[tokio::test]
    async fn test_wait_for_idle_returns_for_unknown_session() {
        let orchestrator = Orchestrator::new(
            CoachConfig::default(),
            Arc::new(ScriptedGenerator::new()),
            Arc::new(InMemoryConversationStore::new()),
        )
        .unwrap();
        wait_for_idle(&orchestrator, &SessionId::from("none"), Duration::from_secs(1)).await;
    }
}
