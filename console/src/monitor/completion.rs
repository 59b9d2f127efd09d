//! Completion-detection protocol
//!
//! The push stream is timely but can report a transient
//! `is_running: false` before the process is fully reaped; the status
//! endpoint is authoritative but may lag the last log bytes. Either alone
//! gives premature disconnects or a stuck console. Completion is therefore
//! declared only when the status endpoint reports not-running AND the
//! candidate event shows a finish marker or numeric EOF.

use tracing::{debug, error, info, warn};

use crate::models::event::{self, ParsedFrame, StreamEvent};
use crate::monitor::fsm::{MonitorFsm, MonitorPhase, PhaseEvent};
use crate::monitor::sink::ConsoleSink;
use crate::monitor::source::StatusSource;

/// Mutable monitor state. One instance per deployment run; a new run gets
/// a freshly constructed monitor, never a reset of a shared one.
#[derive(Debug, Clone)]
pub struct MonitorState {
    /// Push channel currently open
    pub connected: bool,

    /// Completion confirmed; terminal for this run
    pub completed: bool,

    /// A confirmation check is in flight (mutual exclusion)
    pub verifying: bool,

    /// Last byte offset reported by the stream. Best-effort overwrite;
    /// monotonicity is not enforced.
    pub last_position: u64,

    /// Reconnect attempts made so far
    pub retry_count: u32,
}

impl MonitorState {
    fn new() -> Self {
        Self {
            connected: false,
            completed: false,
            verifying: false,
            last_position: 0,
            retry_count: 0,
        }
    }
}

/// What the driver loop should do after a transport drop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// The deployment is over; stop driving the channel
    Finished,

    /// Reopen the channel after the driver's fixed reconnect delay
    Reconnect,
}

/// Log-stream completion monitor.
///
/// Consumes raw push-channel frames, appends log content in arrival order,
/// and emits exactly one completion transition per deployment run.
pub struct Monitor<S, K> {
    source: S,
    sink: K,
    state: MonitorState,
    fsm: MonitorFsm,
}

impl<S, K> Monitor<S, K>
where
    S: StatusSource,
    K: ConsoleSink,
{
    /// Create a monitor for a fresh deployment run
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            state: MonitorState::new(),
            fsm: MonitorFsm::new(),
        }
    }

    /// Current monitor state
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Current phase
    pub fn phase(&self) -> MonitorPhase {
        self.fsm.phase()
    }

    /// Borrow the sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Consume the monitor, returning the sink
    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Note that the driver is opening (or reopening) the channel
    pub fn channel_connecting(&mut self) {
        if self.state.completed {
            return;
        }
        self.state.connected = false;
        self.transition(PhaseEvent::Connect);
    }

    /// Note that the channel is established
    pub fn channel_opened(&mut self) {
        if self.state.completed {
            return;
        }
        self.state.connected = true;
        self.transition(PhaseEvent::Opened);
    }

    /// Handle one raw frame from the push channel
    pub async fn handle_frame(&mut self, raw: &str) {
        match event::parse_frame(raw) {
            ParsedFrame::Event(event) => self.handle_event(event).await,
            ParsedFrame::Raw(text) => {
                if self.state.completed {
                    return;
                }
                self.sink.append_log(&text);
                self.sink.append_log("\n");
            }
        }
    }

    /// Handle one decoded stream event
    pub async fn handle_event(&mut self, event: StreamEvent) {
        if self.state.completed {
            debug!("event after confirmed completion, ignoring");
            return;
        }

        if let Some(message) = event.error.clone() {
            error!("service reported error: {}", message);
            self.sink.show_error(&message);
            if event.is_fatal_error() {
                self.close();
            }
            return;
        }

        if event.is_waiting_sentinel() {
            debug!("deployment log not started yet");
            return;
        }

        if let Some(content) = &event.content {
            self.sink.append_log(content);
            if let Some(position) = event.position {
                self.state.last_position = position;
            }
        }

        // A single false reading can be transiently wrong; treat it as a
        // candidate and cross-check before acting on it.
        if event.is_running == Some(false) {
            self.verify_completion(&event).await;
        }
    }

    /// Cross-check a provisional completion signal against the status
    /// endpoint. Returns true iff this call declared completion.
    ///
    /// Completion requires both: the status endpoint reports not-running,
    /// and the candidate carries a finish marker or has reached numeric
    /// EOF. Poll failures are inconclusive and leave the channel open.
    pub async fn verify_completion(&mut self, candidate: &StreamEvent) -> bool {
        if self.state.completed || self.state.verifying {
            return false;
        }

        self.state.verifying = true;
        self.transition(PhaseEvent::VerifyStarted);

        let confirmed = match self.source.deployment_status().await {
            Ok(snapshot) => !snapshot.running && candidate.matches_finish(),
            Err(e) => {
                warn!("completion check inconclusive: {}", e);
                false
            }
        };

        self.state.verifying = false;

        if confirmed {
            info!("deployment completion confirmed");
            self.close();
        } else {
            self.transition(PhaseEvent::VerifyFailed);
        }

        confirmed
    }

    /// Decide what to do after the channel dropped (or failed to open)
    pub async fn handle_transport_error(&mut self) -> Recovery {
        if self.state.completed {
            debug!("transport error after confirmed completion, ignoring");
            return Recovery::Finished;
        }

        self.state.connected = false;

        match self.source.deployment_status().await {
            Ok(snapshot) if snapshot.running => {
                info!("channel dropped while deployment still running, will reconnect");
                self.schedule_reconnect()
            }
            Ok(_) => {
                // No fresh stream event to judge by; the last known
                // position stands in as a degenerate EOF match.
                let candidate = StreamEvent::eof_candidate(self.state.last_position);
                if self.verify_completion(&candidate).await {
                    Recovery::Finished
                } else {
                    self.schedule_reconnect()
                }
            }
            Err(e) => {
                warn!("status check failed after channel drop: {}", e);
                self.schedule_reconnect()
            }
        }
    }

    fn schedule_reconnect(&mut self) -> Recovery {
        self.state.retry_count += 1;
        Recovery::Reconnect
    }

    /// Tear down the monitor. Idempotent; the first call marks completion,
    /// notifies the sink, and any later call is a no-op. The driver loop
    /// drops the channel and cancels any pending reconnect sleep once it
    /// observes `completed`.
    pub fn close(&mut self) {
        if self.state.completed {
            return;
        }

        self.state.completed = true;
        self.state.connected = false;
        self.state.verifying = false;
        self.transition(PhaseEvent::Closed);
        self.sink.deploy_finished();
        info!("log-stream monitor closed");
    }

    fn transition(&mut self, event: PhaseEvent) {
        // The FSM tracks phase for logging and inspection; an out-of-order
        // trigger is a bookkeeping bug, not a reason to drop an event.
        if let Err(e) = self.fsm.process(event) {
            debug!("phase bookkeeping: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::errors::ConsoleError;
    use crate::models::status::StatusSnapshot;
    use crate::monitor::sink::MemorySink;

    /// Scripted status source: pops one snapshot per poll
    #[derive(Clone, Default)]
    struct ScriptedSource {
        snapshots: Arc<Mutex<VecDeque<Result<StatusSnapshot, String>>>>,
        polls: Arc<AtomicUsize>,
    }

    impl ScriptedSource {
        fn with_running(states: &[bool]) -> Self {
            let source = Self::default();
            for &running in states {
                source.push(Ok(StatusSnapshot {
                    running,
                    log_file: None,
                }));
            }
            source
        }

        fn push(&self, snapshot: Result<StatusSnapshot, String>) {
            self.snapshots.lock().unwrap().push_back(snapshot);
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn deployment_status(&self) -> Result<StatusSnapshot, ConsoleError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            match self.snapshots.lock().unwrap().pop_front() {
                Some(Ok(snapshot)) => Ok(snapshot),
                Some(Err(message)) => Err(ConsoleError::StatusError(message)),
                None => Err(ConsoleError::StatusError("no scripted snapshot".to_string())),
            }
        }
    }

    fn monitor_with(source: ScriptedSource) -> Monitor<ScriptedSource, MemorySink> {
        Monitor::new(source, MemorySink::default())
    }

    #[tokio::test]
    async fn test_verifying_flag_gates_concurrent_checks() {
        let source = ScriptedSource::with_running(&[false]);
        let mut monitor = monitor_with(source.clone());

        // Simulate a check already in flight
        monitor.state.verifying = true;

        let candidate = StreamEvent::eof_candidate(100);
        let declared = monitor.verify_completion(&candidate).await;

        assert!(!declared);
        assert_eq!(source.polls(), 0, "gated check must not poll");
        assert!(!monitor.state().completed);
    }

    #[tokio::test]
    async fn test_verify_clears_flag_on_poll_failure() {
        let source = ScriptedSource::default();
        source.push(Err("connection refused".to_string()));
        let mut monitor = monitor_with(source.clone());
        monitor.channel_connecting();
        monitor.channel_opened();

        let candidate = StreamEvent::eof_candidate(100);
        let declared = monitor.verify_completion(&candidate).await;

        assert!(!declared);
        assert!(!monitor.state().verifying);
        assert!(!monitor.state().completed);
        assert_eq!(monitor.phase(), MonitorPhase::Streaming);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let source = ScriptedSource::default();
        let mut monitor = monitor_with(source);

        monitor.close();
        monitor.close();
        monitor.close();

        assert!(monitor.state().completed);
        assert_eq!(monitor.sink().finished, 1);
        assert_eq!(monitor.phase(), MonitorPhase::Completed);
    }

    #[tokio::test]
    async fn test_raw_frame_appended_with_newline() {
        let source = ScriptedSource::default();
        let mut monitor = monitor_with(source);

        monitor.handle_frame("not json at all").await;

        assert_eq!(monitor.sink().log, "not json at all\n");
    }
}
