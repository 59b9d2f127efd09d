//! Push-channel abstraction
//!
//! The monitor is written against these traits, so any long-poll or
//! streaming transport can stand in for the default server-sent-events
//! implementation without touching the monitor's logic.

use async_trait::async_trait;

use crate::errors::ConsoleError;

/// One open push channel delivering raw data frames
#[async_trait]
pub trait LogStream: Send {
    /// Next raw frame. `Ok(None)` means the server closed the channel.
    async fn next_frame(&mut self) -> Result<Option<String>, ConsoleError>;

    /// Release the underlying connection
    async fn close(&mut self);
}

/// Factory for opening push channels
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self) -> Result<Box<dyn LogStream>, ConsoleError>;
}
