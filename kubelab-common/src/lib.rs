//! Common types shared between kubelab-api and its clients

pub mod auth;

use serde::{Deserialize, Serialize};

pub use auth::Role;

/// Highest valid TCP port
pub const MAX_PORT: i64 = 65535;

/// Container ports as accepted on the wire
///
/// Clients send either `"80,8080"` or `[80, 8080]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortsInput {
    List(Vec<i64>),
    Csv(String),
}

impl PortsInput {
    /// Parse into an ordered list of distinct ports in 1..=65535
    pub fn parse(&self) -> Result<Vec<i32>> {
        let raw: Vec<i64> = match self {
            PortsInput::List(ports) => ports.clone(),
            PortsInput::Csv(s) => s
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| {
                    p.parse::<i64>()
                        .map_err(|_| Error::Validation(format!("Invalid port: '{}'", p)))
                })
                .collect::<Result<_>>()?,
        };

        if raw.is_empty() {
            return Err(Error::Validation("At least one port is required".to_string()));
        }

        let mut ports = Vec::with_capacity(raw.len());
        for port in raw {
            if !(1..=MAX_PORT).contains(&port) {
                return Err(Error::Validation(format!(
                    "Port {} is out of range (1-{})",
                    port, MAX_PORT
                )));
            }
            let port = port as i32;
            if ports.contains(&port) {
                return Err(Error::Validation(format!("Duplicate port: {}", port)));
            }
            ports.push(port);
        }

        Ok(ports)
    }
}

/// Id list as accepted on the wire for group membership
///
/// Mirrors [`PortsInput`] but is lenient: entries that are not numeric are
/// skipped rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdList {
    List(Vec<i64>),
    Csv(String),
}

impl IdList {
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = match self {
            IdList::List(ids) => ids.clone(),
            IdList::Csv(s) => s
                .split(',')
                .filter_map(|id| id.trim().parse::<i64>().ok())
                .collect(),
        };
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Request body for `POST /pods`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CreatePodRequest {
    pub name: Option<String>,
    pub image: Option<String>,
    pub ports: Option<PortsInput>,
}

/// Response body for a successfully provisioned workload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionedPod {
    pub name: String,
    pub ip: String,
    pub status: String,
    pub node_ports: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// One entry of `GET /pods`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodSummary {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub ports: Vec<i32>,
    pub node_ports: Vec<i32>,
    pub ip: String,
    pub status: String,
    pub owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

/// Response body for `GET /pods/{name}/terminal`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalInfo {
    pub msg: String,
    pub pod_ip: Option<String>,
}

/// Request body for `POST /pods/{name}/exec`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExecRequest {
    pub command: Option<String>,
}

/// Response body for `POST /pods/{name}/exec`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecResponse {
    pub output: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Response body for `GET /check`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterCheck {
    pub msg: String,
    pub pods: Vec<String>,
}

/// Request body for group create/update
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupRequest {
    pub name: Option<String>,
    pub users: Option<IdList>,
    pub pods: Option<IdList>,
}

/// Group as returned by the group endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    pub id: i64,
    pub name: String,
    pub users: Vec<String>,
    pub pods: Vec<String>,
}

/// Response body for `POST /create_group`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupCreated {
    pub msg: String,
    pub group_id: i64,
}

/// Shared error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("System error: {0}")]
    System(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication failed")]
    AuthenticationFailed,
}

pub type Result<T> = std::result::Result<T, Error>;
