//! Log-stream worker
//!
//! Drives the completion monitor: opens the push channel, pumps frames
//! into the monitor, and reconnects with a fixed delay when the channel
//! drops before completion is confirmed. The channel is closed on every
//! exit path, and a pending reconnect sleep is abandoned the moment the
//! worker stops.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::monitor::completion::{Monitor, Recovery};
use crate::monitor::sink::ConsoleSink;
use crate::monitor::source::StatusSource;
use crate::stream::transport::Transport;

/// Log-stream worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Fixed delay before reopening a dropped channel. No backoff.
    pub reconnect_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Run the log-stream worker until completion is confirmed or the
/// shutdown signal fires
pub async fn run<T, S, K, Sl, F>(
    options: &Options,
    transport: &T,
    monitor: &mut Monitor<S, K>,
    sleep_fn: Sl,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    T: Transport + ?Sized,
    S: StatusSource,
    K: ConsoleSink,
    Sl: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Log-stream worker starting...");

    loop {
        if monitor.state().completed {
            return;
        }

        monitor.channel_connecting();

        let opened = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Log-stream worker shutting down...");
                monitor.close();
                return;
            }
            opened = transport.open() => opened,
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                warn!("failed to open push channel: {}", e);
                match monitor.handle_transport_error().await {
                    Recovery::Finished => return,
                    Recovery::Reconnect => {
                        tokio::select! {
                            _ = &mut shutdown_signal => {
                                info!("Log-stream worker shutting down...");
                                monitor.close();
                                return;
                            }
                            _ = sleep_fn(options.reconnect_delay) => {}
                        }
                        continue;
                    }
                }
            }
        };

        monitor.channel_opened();
        debug!("push channel open");

        // Pump frames until the channel drops or completion is confirmed
        let dropped = loop {
            tokio::select! {
                _ = &mut shutdown_signal => {
                    info!("Log-stream worker shutting down...");
                    stream.close().await;
                    monitor.close();
                    return;
                }
                frame = stream.next_frame() => match frame {
                    Ok(Some(raw)) => monitor.handle_frame(&raw).await,
                    Ok(None) => {
                        debug!("push channel closed by server");
                        break true;
                    }
                    Err(e) => {
                        warn!("push channel error: {}", e);
                        break true;
                    }
                }
            }

            if monitor.state().completed {
                break false;
            }
        };

        stream.close().await;

        if !dropped {
            // Confirmed completion tore the monitor down already
            return;
        }

        match monitor.handle_transport_error().await {
            Recovery::Finished => return,
            Recovery::Reconnect => {
                debug!("reconnecting push channel in {:?}", options.reconnect_delay);
                tokio::select! {
                    _ = &mut shutdown_signal => {
                        info!("Log-stream worker shutting down...");
                        monitor.close();
                        return;
                    }
                    _ = sleep_fn(options.reconnect_delay) => {}
                }
            }
        }
    }
}
