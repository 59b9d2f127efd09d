//! Status and control-plane payloads

use serde::{Deserialize, Serialize};

/// Snapshot from the status endpoint.
///
/// Authoritative for whether the deployment process is alive right now,
/// but may lag the log stream by up to one round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Whether the deployment process is currently running
    pub running: bool,

    /// Path of the most recent deployment log file, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

/// Response to a deploy-start request
#[derive(Debug, Clone, Deserialize)]
pub struct DeployResponse {
    /// Whether the deployment process was launched
    pub success: bool,

    /// Error detail when `success` is false
    #[serde(default)]
    pub message: Option<String>,

    /// Server-side log file path. Older service builds return this under
    /// `log_file`; both spellings are accepted.
    #[serde(default, alias = "log_file")]
    pub log_path: Option<String>,
}

/// Full log contents from the pull-style refresh endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LogContents {
    #[serde(default)]
    pub logs: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_response_accepts_both_path_keys() {
        let new_style: DeployResponse =
            serde_json::from_str(r#"{"success":true,"log_path":"/var/log/deploy.log"}"#).unwrap();
        assert_eq!(new_style.log_path.as_deref(), Some("/var/log/deploy.log"));

        let old_style: DeployResponse =
            serde_json::from_str(r#"{"success":true,"log_file":"/var/log/deploy.log"}"#).unwrap();
        assert_eq!(old_style.log_path.as_deref(), Some("/var/log/deploy.log"));
    }

    #[test]
    fn test_status_snapshot_log_file_optional() {
        let snapshot: StatusSnapshot = serde_json::from_str(r#"{"running":false}"#).unwrap();
        assert!(!snapshot.running);
        assert!(snapshot.log_file.is_none());
    }
}
