//! Monitor phase machine

/// Monitor phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorPhase {
    /// Not yet started
    Idle,

    /// Opening (or reopening) the push channel
    Connecting,

    /// Channel open, consuming events
    Streaming,

    /// Confirmation check in flight
    Verifying,

    /// Completion confirmed; terminal for this deployment run
    Completed,
}

/// Phase transition trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Channel open started
    Connect,

    /// Channel established
    Opened,

    /// Confirmation check started
    VerifyStarted,

    /// Confirmation check came back negative or inconclusive
    VerifyFailed,

    /// Monitor closed (confirmed completion, fatal error, or shutdown)
    Closed,
}

/// Monitor phase FSM
#[derive(Debug, Clone)]
pub struct MonitorFsm {
    phase: MonitorPhase,
}

impl MonitorFsm {
    /// Create a new FSM in the idle phase
    pub fn new() -> Self {
        Self {
            phase: MonitorPhase::Idle,
        }
    }

    /// Get the current phase
    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    /// Process an event and transition phase
    pub fn process(&mut self, event: PhaseEvent) -> Result<(), String> {
        let new_phase = match (self.phase, event) {
            // Channel lifecycle
            (MonitorPhase::Idle, PhaseEvent::Connect) => MonitorPhase::Connecting,
            (MonitorPhase::Connecting, PhaseEvent::Connect) => MonitorPhase::Connecting,
            (MonitorPhase::Connecting, PhaseEvent::Opened) => MonitorPhase::Streaming,

            // Reconnect after a drop or a failed confirmation while
            // disconnected
            (MonitorPhase::Streaming, PhaseEvent::Connect) => MonitorPhase::Connecting,

            // Confirmation checks; the disconnected check after a channel
            // drop starts from Connecting
            (MonitorPhase::Streaming, PhaseEvent::VerifyStarted) => MonitorPhase::Verifying,
            (MonitorPhase::Connecting, PhaseEvent::VerifyStarted) => MonitorPhase::Verifying,
            (MonitorPhase::Verifying, PhaseEvent::VerifyFailed) => MonitorPhase::Streaming,

            // Close is legal from any non-terminal phase
            (MonitorPhase::Idle, PhaseEvent::Closed)
            | (MonitorPhase::Connecting, PhaseEvent::Closed)
            | (MonitorPhase::Streaming, PhaseEvent::Closed)
            | (MonitorPhase::Verifying, PhaseEvent::Closed) => MonitorPhase::Completed,

            // Invalid transitions
            (phase, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", phase, event));
            }
        };

        self.phase = new_phase;
        Ok(())
    }
}

impl Default for MonitorFsm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_verify_cycle() {
        let mut fsm = MonitorFsm::new();
        assert_eq!(fsm.phase(), MonitorPhase::Idle);

        fsm.process(PhaseEvent::Connect).unwrap();
        fsm.process(PhaseEvent::Opened).unwrap();
        assert_eq!(fsm.phase(), MonitorPhase::Streaming);

        fsm.process(PhaseEvent::VerifyStarted).unwrap();
        assert_eq!(fsm.phase(), MonitorPhase::Verifying);

        fsm.process(PhaseEvent::VerifyFailed).unwrap();
        assert_eq!(fsm.phase(), MonitorPhase::Streaming);

        fsm.process(PhaseEvent::VerifyStarted).unwrap();
        fsm.process(PhaseEvent::Closed).unwrap();
        assert_eq!(fsm.phase(), MonitorPhase::Completed);
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut fsm = MonitorFsm::new();
        fsm.process(PhaseEvent::Closed).unwrap();
        assert_eq!(fsm.phase(), MonitorPhase::Completed);

        assert!(fsm.process(PhaseEvent::Connect).is_err());
        assert!(fsm.process(PhaseEvent::Closed).is_err());
        assert_eq!(fsm.phase(), MonitorPhase::Completed);
    }

    #[test]
    fn test_reconnect_after_drop() {
        let mut fsm = MonitorFsm::new();
        fsm.process(PhaseEvent::Connect).unwrap();
        fsm.process(PhaseEvent::Opened).unwrap();

        // Drop, then retry the open twice before it sticks
        fsm.process(PhaseEvent::Connect).unwrap();
        fsm.process(PhaseEvent::Connect).unwrap();
        fsm.process(PhaseEvent::Opened).unwrap();
        assert_eq!(fsm.phase(), MonitorPhase::Streaming);
    }

    #[test]
    fn test_invalid_transition() {
        let mut fsm = MonitorFsm::new();
        assert!(fsm.process(PhaseEvent::Opened).is_err());
        assert_eq!(fsm.phase(), MonitorPhase::Idle);
    }
}
