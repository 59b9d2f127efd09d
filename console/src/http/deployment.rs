//! Deployment service endpoints

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::ConsoleError;
use crate::http::client::HttpClient;
use crate::models::config::ClusterConfig;
use crate::models::status::{DeployResponse, LogContents, StatusSnapshot};
use crate::monitor::source::StatusSource;

impl HttpClient {
    /// Get the current deployment status
    pub async fn deployment_status(&self) -> Result<StatusSnapshot, ConsoleError> {
        self.get("/deployment_status").await
    }

    /// Pull the full deployment log contents
    pub async fn deployment_logs(&self) -> Result<LogContents, ConsoleError> {
        self.get("/deployment_logs").await
    }

    /// Get the deployment parameters currently stored on the service
    pub async fn deployment_params(&self) -> Result<BTreeMap<String, String>, ConsoleError> {
        self.get("/get_deployment_params").await
    }

    /// Save the cluster configuration without deploying
    pub async fn save_config(&self, config: &ClusterConfig) -> Result<(), ConsoleError> {
        self.post_form_discard("/save", &config.to_form()).await
    }

    /// Start a deployment with the given configuration
    pub async fn start_deploy(&self, config: &ClusterConfig) -> Result<DeployResponse, ConsoleError> {
        self.post_form("/deploy", &config.to_form()).await
    }
}

#[async_trait]
impl StatusSource for HttpClient {
    async fn deployment_status(&self) -> Result<StatusSnapshot, ConsoleError> {
        HttpClient::deployment_status(self).await
    }
}
