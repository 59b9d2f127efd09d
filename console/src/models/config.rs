//! Cluster configuration submitted through the deploy form

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One host line: address plus hostname
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostEntry {
    pub ip: String,
    pub hostname: String,
}

/// Cluster configuration: deployment parameters plus the coordinator and
/// segment host lists
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Mandatory deployment parameters, exported as shell variables by the
    /// service when it writes its parameter file
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Coordinator host
    #[serde(default)]
    pub coordinator: Option<HostEntry>,

    /// Segment hosts
    #[serde(default)]
    pub segments: Vec<HostEntry>,
}

impl ClusterConfig {
    /// Flatten into the form-field layout the service expects:
    /// one field per parameter, `coord_ip`/`coord_hostname`,
    /// `segment_count` and indexed `segment_ip_{i}`/`segment_hostname_{i}`
    /// pairs.
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = self
            .parameters
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if let Some(coordinator) = &self.coordinator {
            fields.push(("coord_ip".to_string(), coordinator.ip.clone()));
            fields.push(("coord_hostname".to_string(), coordinator.hostname.clone()));
        }

        fields.push(("segment_count".to_string(), self.segments.len().to_string()));
        for (index, segment) in self.segments.iter().enumerate() {
            fields.push((format!("segment_ip_{}", index), segment.ip.clone()));
            fields.push((format!("segment_hostname_{}", index), segment.hostname.clone()));
        }

        fields
    }
}
