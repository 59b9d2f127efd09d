//! Application configuration options

use crate::workers::log_stream;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Deployment service base URL
    pub base_url: String,

    /// Submit the configuration with a save request before deploying
    pub save_config: bool,

    /// Save the configuration and exit without deploying
    pub save_only: bool,

    /// Attach to a running deployment instead of starting one; if nothing
    /// is running, show the last log and exit
    pub attach_only: bool,

    /// Print the parameters stored on the service and exit
    pub show_params: bool,

    /// Log-stream worker options
    pub log_stream: log_stream::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            save_config: true,
            save_only: false,
            attach_only: false,
            show_params: false,
            log_stream: log_stream::Options::default(),
        }
    }
}
