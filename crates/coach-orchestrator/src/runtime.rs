//! Runtime manager owning the poller task.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::{OrchestratorError, Result};
use crate::orchestrator::Orchestrator;
use crate::poller::CyclePoller;

/// Runs the orchestrator's background poller.
pub struct Runtime {
    orchestrator: Orchestrator,
    /// Handle to the poller task.
    poller_handle: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    started: bool,
}

impl Runtime {
    pub fn new(orchestrator: Orchestrator) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            orchestrator,
            poller_handle: None,
            shutdown_tx,
            shutdown_rx,
            started: false,
        }
    }

    /// Start the runtime (begins polling).
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(OrchestratorError::AlreadyStarted);
        }

        info!("starting runtime");

        let orchestrator = self.orchestrator.clone();
        let shutdown_rx = self.shutdown_rx.clone();

        let handle = tokio::spawn(async move {
            let mut poller = CyclePoller::new(orchestrator, shutdown_rx);
            poller.run().await;
        });

        self.poller_handle = Some(handle);
        self.started = true;

        debug!("runtime started");

        Ok(())
    }

    /// Stop polling and tear down every session.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Err(OrchestratorError::NotStarted);
        }

        info!("shutting down runtime");

        self.shutdown_tx.send(true).map_err(|e| {
            OrchestratorError::Shutdown(format!("failed to send shutdown signal: {}", e))
        })?;

        if let Some(handle) = self.poller_handle.take() {
            debug!("waiting for poller to stop");
            handle.await.map_err(|e| {
                OrchestratorError::Shutdown(format!("poller task panicked: {}", e))
            })?;
        }

        self.orchestrator.shutdown_sessions().await;
        self.started = false;

        info!("runtime stopped");

        Ok(())
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Check if the runtime has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if self.started {
            let _ = self.shutdown_tx.send(true);
        }
    }
}
