//! Presentation sinks
//!
//! The monitor treats its output surfaces as opaque targets: an
//! append-only log buffer, an error banner, and the deploy-button
//! enable/disable side effects.

use std::io::Write;

/// Opaque presentation target for the monitor and the app loop
pub trait ConsoleSink: Send {
    /// Append a chunk of log output verbatim
    fn append_log(&mut self, chunk: &str);

    /// Show a message in the error banner
    fn show_error(&mut self, message: &str);

    /// Clear the error banner
    fn clear_error(&mut self);

    /// Deployment submitted; block re-submission
    fn deploy_started(&mut self);

    /// Deployment over, successfully or not; allow re-submission
    fn deploy_finished(&mut self);

    /// Display the server-side log file path
    fn show_log_path(&mut self, path: &str);
}

/// Sink rendering to the terminal: log chunks stream to stdout, the error
/// banner goes to stderr
#[derive(Debug, Default)]
pub struct TerminalSink;

impl ConsoleSink for TerminalSink {
    fn append_log(&mut self, chunk: &str) {
        print!("{}", chunk);
        let _ = std::io::stdout().flush();
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("error: {}", message);
    }

    fn clear_error(&mut self) {}

    fn deploy_started(&mut self) {
        println!("Deployment in progress...");
    }

    fn deploy_finished(&mut self) {
        println!();
        println!("Deployment finished.");
    }

    fn show_log_path(&mut self, path: &str) {
        println!("Log file: {}", path);
    }
}

/// Sink recording everything in memory, for embedding and for tests
#[derive(Debug, Default)]
pub struct MemorySink {
    /// Accumulated log buffer, in arrival order
    pub log: String,

    /// Current error banner contents, if shown
    pub banner: Option<String>,

    /// Every error ever shown
    pub errors: Vec<String>,

    /// Number of deploy-started notifications
    pub started: u32,

    /// Number of deploy-finished notifications
    pub finished: u32,

    /// Last displayed log file path
    pub log_path: Option<String>,
}

impl ConsoleSink for MemorySink {
    fn append_log(&mut self, chunk: &str) {
        self.log.push_str(chunk);
    }

    fn show_error(&mut self, message: &str) {
        self.banner = Some(message.to_string());
        self.errors.push(message.to_string());
    }

    fn clear_error(&mut self) {
        self.banner = None;
    }

    fn deploy_started(&mut self) {
        self.started += 1;
    }

    fn deploy_finished(&mut self) {
        self.finished += 1;
    }

    fn show_log_path(&mut self, path: &str) {
        self.log_path = Some(path.to_string());
    }
}
