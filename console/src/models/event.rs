//! Push-channel event payloads
//!
//! Every field of a [`StreamEvent`] is optional; the server sends sparse
//! objects and absence is meaningful (a heartbeat carries no content).

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Content the server emits before the deployment log exists
pub const WAITING_SENTINEL: &str = "Waiting for deployment to start...";

/// Substrings in log content indicating the remote process has terminated
pub const FINISH_MARKERS: &[&str] = &["Finished deploy cluster", "Process exited with code"];

/// Error text class that aborts the stream outright
pub const FATAL_ERROR_MARKER: &str = "Multiple errors";

/// A single event from the deployment log stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Log content to append, verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Byte offset into the server-side log file after this chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,

    /// Size of the server-side log file at emission time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Server's last known execution state at emission time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_running: Option<bool>,

    /// Server-reported application error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamEvent {
    /// A synthetic candidate for confirmation checks run without a fresh
    /// event, where the last known position stands in for both offset and
    /// file size (degenerate EOF equality).
    pub fn eof_candidate(position: u64) -> Self {
        Self {
            position: Some(position),
            file_size: Some(position),
            ..Self::default()
        }
    }

    /// Whether this is the pre-start placeholder message
    pub fn is_waiting_sentinel(&self) -> bool {
        self.content.as_deref() == Some(WAITING_SENTINEL)
    }

    /// Whether the content carries a known finish marker
    pub fn has_finish_marker(&self) -> bool {
        let Some(content) = self.content.as_deref() else {
            return false;
        };
        FINISH_MARKERS.iter().any(|marker| content.contains(marker))
    }

    /// Whether the reported position has reached the reported file size.
    /// Assumes the log file is append-only; rotation or truncation
    /// mid-stream is not defended against.
    pub fn reached_eof(&self) -> bool {
        matches!(
            (self.position, self.file_size),
            (Some(position), Some(size)) if position >= size
        )
    }

    /// Whether this event is acceptable evidence that the last log bytes
    /// are visible: a finish marker in the content, or numeric EOF.
    pub fn matches_finish(&self) -> bool {
        self.has_finish_marker() || self.reached_eof()
    }

    /// Whether the reported error belongs to the fatal class that forces
    /// the channel closed
    pub fn is_fatal_error(&self) -> bool {
        self.error
            .as_deref()
            .is_some_and(|error| error.contains(FATAL_ERROR_MARKER))
    }
}

/// A decoded push-channel frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFrame {
    /// A structured stream event
    Event(StreamEvent),

    /// Payload that was not valid JSON; appended to the log as-is
    Raw(String),
}

/// Decode one raw frame. Non-JSON payloads degrade to raw text rather
/// than failing the handler.
pub fn parse_frame(data: &str) -> ParsedFrame {
    match serde_json::from_str::<StreamEvent>(data) {
        Ok(event) => ParsedFrame::Event(event),
        Err(e) => {
            debug!("frame is not JSON ({}), treating as raw text", e);
            ParsedFrame::Raw(data.to_string())
        }
    }
}
