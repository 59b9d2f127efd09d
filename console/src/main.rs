//! Cluster Deploy Console - Entry Point
//!
//! Terminal client for the cluster deployment service: submits the
//! cluster configuration, starts a deployment, and follows the log
//! stream until completion is confirmed.

use std::collections::HashMap;
use std::env;

use deploy_console::app::options::AppOptions;
use deploy_console::app::run::run;
use deploy_console::logs::{init_logging, LogOptions};
use deploy_console::models::config::ClusterConfig;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        println!("deploy-console {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    // Initialize logging
    let mut log_options = LogOptions::default();
    if let Some(level) = cli_args.get("log-level") {
        match level.parse() {
            Ok(level) => log_options.log_level = level,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(2);
            }
        }
    }
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    // Load the cluster configuration, if given
    let config = match cli_args.get("config") {
        Some(path) => match load_config(path).await {
            Ok(config) => Some(config),
            Err(e) => {
                error!("Unable to read configuration {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => None,
    };

    let mut options = AppOptions::default();
    if let Some(base_url) = cli_args.get("base-url") {
        options.base_url = base_url.clone();
    }
    options.save_only = cli_args.contains_key("save-only");
    options.attach_only = cli_args.contains_key("attach");
    options.show_params = cli_args.contains_key("show-params");
    if cli_args.contains_key("no-save") {
        options.save_config = false;
    }

    info!("Running deploy console with options: {:?}", options);
    let result = run(options, config, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Deploy console failed: {e}");
        std::process::exit(1);
    }
}

async fn load_config(path: &str) -> Result<ClusterConfig, deploy_console::errors::ConsoleError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let config = serde_json::from_str(&raw)?;
    Ok(config)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down...");
        }
    }
}
