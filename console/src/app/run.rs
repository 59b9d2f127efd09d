//! Main application run loop

use std::future::Future;

use tracing::{info, warn};

use crate::app::options::AppOptions;
use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::config::ClusterConfig;
use crate::monitor::completion::Monitor;
use crate::monitor::sink::{ConsoleSink, TerminalSink};
use crate::stream::sse::SseTransport;
use crate::workers::log_stream;

/// Run the deploy console
pub async fn run(
    options: AppOptions,
    config: Option<ClusterConfig>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ConsoleError> {
    info!("Connecting to deployment service at {}", options.base_url);
    let client = HttpClient::new(&options.base_url)?;
    let mut sink = TerminalSink;

    if options.show_params {
        let params = client.deployment_params().await?;
        for (key, value) in params {
            println!("{}={}", key, value);
        }
        return Ok(());
    }

    if options.save_only {
        let config = require_config(config)?;
        client.save_config(&config).await?;
        info!("Configuration saved");
        return Ok(());
    }

    // A deployment may already be in flight from a previous session
    let status = client.deployment_status().await?;

    if status.running {
        info!("Deployment already in progress, attaching to its log stream");
        if let Some(path) = &status.log_file {
            sink.show_log_path(path);
        }
        sink.deploy_started();
    } else if options.attach_only {
        if let Some(path) = &status.log_file {
            sink.show_log_path(path);
        }
        // Nothing live to follow; fall back to the pull-style refresh
        match client.deployment_logs().await {
            Ok(contents) => sink.append_log(&contents.logs),
            Err(e) => warn!("unable to fetch deployment logs: {}", e),
        }
        return Ok(());
    } else {
        let config = require_config(config)?;

        if options.save_config {
            client.save_config(&config).await?;
            info!("Configuration saved");
        }

        sink.clear_error();
        sink.deploy_started();

        let response = match client.start_deploy(&config).await {
            Ok(response) => response,
            Err(e) => {
                sink.show_error(&format!("Error starting deployment: {}", e));
                sink.deploy_finished();
                return Err(e);
            }
        };

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "Failed to start deployment".to_string());
            sink.show_error(&message);
            sink.deploy_finished();
            return Err(ConsoleError::DeployError(message));
        }

        sink.append_log("Deployment started successfully.\n");
        if let Some(path) = &response.log_path {
            sink.show_log_path(path);
        }
    }

    // Follow the log stream until completion is confirmed
    let transport = SseTransport::new(&options.base_url)?;
    let mut monitor = Monitor::new(client, sink);

    log_stream::run(
        &options.log_stream,
        &transport,
        &mut monitor,
        tokio::time::sleep,
        Box::pin(shutdown_signal),
    )
    .await;

    Ok(())
}

fn require_config(config: Option<ClusterConfig>) -> Result<ClusterConfig, ConsoleError> {
    config.ok_or_else(|| {
        ConsoleError::ConfigError(
            "a cluster configuration is required, pass --config=<file>".to_string(),
        )
    })
}
