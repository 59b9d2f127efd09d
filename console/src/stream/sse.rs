//! Server-sent-events transport
//!
//! Default [`Transport`] implementation over the service's
//! `/stream_logs` endpoint (`text/event-stream`).

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

use crate::errors::ConsoleError;
use crate::stream::transport::{LogStream, Transport};

/// Incremental decoder for `text/event-stream` bodies.
///
/// Network chunks may split a frame anywhere, including inside a UTF-8
/// sequence boundary of the delimiter; frames are only emitted once their
/// terminating blank line has arrived.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    /// Feed one network chunk, returning the data payloads of any frames
    /// completed by it
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((index, delim_len)) = frame_boundary(&self.buf) {
            let block = String::from_utf8_lossy(&self.buf[..index]).into_owned();
            self.buf.drain(..index + delim_len);
            if let Some(data) = decode_block(&block) {
                frames.push(data);
            }
        }
        frames
    }
}

/// Position and length of the earliest frame delimiter (blank line, LF or
/// CRLF flavored)
fn frame_boundary(buf: &[u8]) -> Option<(usize, usize)> {
    let mut index = 0;
    while index + 1 < buf.len() {
        if buf[index] == b'\r'
            && index + 3 < buf.len()
            && &buf[index..index + 4] == b"\r\n\r\n"
        {
            return Some((index, 4));
        }
        if buf[index] == b'\n' && buf[index + 1] == b'\n' {
            return Some((index, 2));
        }
        index += 1;
    }
    None
}

/// Extract the joined `data:` payload of one frame block. Comment lines
/// and non-data fields are ignored; a block with no data yields nothing.
fn decode_block(block: &str) -> Option<String> {
    let mut data_lines: Vec<&str> = Vec::new();
    for raw_line in block.split('\n') {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        }
    }
    if data_lines.is_empty() {
        return None;
    }
    Some(data_lines.join("\n"))
}

/// An open SSE connection
struct SseStream {
    response: Option<reqwest::Response>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
}

#[async_trait]
impl LogStream for SseStream {
    async fn next_frame(&mut self) -> Result<Option<String>, ConsoleError> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }

            let Some(response) = self.response.as_mut() else {
                return Ok(None);
            };

            match response.chunk().await {
                Ok(Some(chunk)) => {
                    self.pending.extend(self.decoder.feed(&chunk));
                }
                Ok(None) => {
                    debug!("push channel body ended");
                    self.response = None;
                    return Ok(None);
                }
                Err(e) => {
                    self.response = None;
                    return Err(ConsoleError::StreamError(e.to_string()));
                }
            }
        }
    }

    async fn close(&mut self) {
        self.response = None;
        self.pending.clear();
    }
}

/// SSE transport for the deployment log stream
pub struct SseTransport {
    client: Client,
    url: String,
}

impl SseTransport {
    /// Create a transport for the given service base URL.
    ///
    /// Uses its own HTTP client with no overall request timeout; a
    /// deployment stream stays open for many minutes.
    pub fn new(base_url: &str) -> Result<Self, ConsoleError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/stream_logs", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Transport for SseTransport {
    async fn open(&self) -> Result<Box<dyn LogStream>, ConsoleError> {
        debug!("GET {} (push channel)", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConsoleError::StreamError(format!(
                "push channel refused: {}",
                response.status()
            )));
        }

        Ok(Box::new(SseStream {
            response: Some(response),
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_handles_chunk_boundaries() {
        let mut decoder = SseDecoder::default();

        let frames = decoder.feed(b"data: {\"content\":\"par");
        assert!(frames.is_empty());

        let frames = decoder.feed(b"tial\"}\n\n");
        assert_eq!(frames, vec![r#"{"content":"partial"}"#.to_string()]);
    }

    #[test]
    fn test_decoder_handles_crlf_delimiters() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.feed(b"data: one\r\n\r\ndata: two\n\n");
        assert_eq!(frames, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_decoder_joins_multiline_data() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.feed(b"data: first\ndata: second\n\n");
        assert_eq!(frames, vec!["first\nsecond".to_string()]);
    }

    #[test]
    fn test_decoder_skips_comments_and_other_fields() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.feed(b": keep-alive\n\nevent: message\ndata: payload\n\n");
        assert_eq!(frames, vec!["payload".to_string()]);
    }

    #[test]
    fn test_decoder_emits_multiple_frames_from_one_chunk() {
        let mut decoder = SseDecoder::default();
        let frames = decoder.feed(b"data: a\n\ndata: b\n\ndata: c\n\n");
        assert_eq!(frames, vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }
}
