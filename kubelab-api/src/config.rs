//! Configuration management for the Kubelab API
//!
//! This module provides a centralized configuration system that loads settings from:
//! 1. Environment variables (highest priority)
//! 2. Configuration file (TOML format)
//! 3. Default values (lowest priority)

use crate::auth::token::MAX_TOKEN_TTL_HOURS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct for Kubelab
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubelabConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token and bootstrap account configuration
    pub auth: AuthConfig,
    /// Cluster and workload configuration
    pub kubernetes: KubernetesConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// CORS configuration
    pub cors: CorsSettings,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite:///var/lib/kubelab/kubelab.db")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Token signing and bootstrap admin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for signing bearer tokens
    pub jwt_secret: String,
    /// Token lifetime in hours
    pub token_ttl_hours: i64,
    /// Password for the admin account created on an empty database
    pub admin_password: String,
}

/// Cluster and workload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesConfig {
    /// Path to a kubeconfig file; in-cluster or default config when unset
    pub kubeconfig: Option<PathBuf>,
    /// Namespace all workloads are created in
    pub namespace: String,
    /// Maximum number of workloads per user; unlimited when unset
    pub pod_quota: Option<u32>,
    /// Base domain for per-workload Ingress hosts; no Ingress when unset
    pub ingress_domain: Option<String>,
    /// Ingress class name set on created Ingresses
    pub ingress_class: Option<String>,
    /// How long to wait for a workload to become ready
    pub readiness_timeout_secs: u64,
    /// Initial delay between readiness polls
    pub poll_interval_ms: u64,
    /// Upper bound on the delay between readiness polls
    pub poll_max_interval_ms: u64,
    /// First candidate NodePort
    pub node_port_base: i32,
    /// Last usable NodePort
    pub node_port_max: i32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for rolling JSON log files; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Emit console output as JSON
    pub json_console: bool,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    /// Allowed origins, "*" for any
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://kubelab.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "kubelab-default-jwt-secret-change-in-production".to_string(),
            token_ttl_hours: 24,
            admin_password: "admin".to_string(),
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            namespace: "default".to_string(),
            pod_quota: None,
            ingress_domain: None,
            ingress_class: None,
            readiness_timeout_secs: 120,
            poll_interval_ms: 1000,
            poll_max_interval_ms: 5000,
            node_port_base: 30000,
            node_port_max: 32767,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            json_console: false,
        }
    }
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl KubernetesConfig {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_max_interval(&self) -> Duration {
        Duration::from_millis(self.poll_max_interval_ms.max(self.poll_interval_ms))
    }
}

impl KubelabConfig {
    /// Load configuration from environment variables and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Load configuration from a specific file path
    pub fn load_from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.clone(), e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let paths = [
            std::env::var("KUBELAB_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("/etc/kubelab/config.toml")),
            Some(PathBuf::from("./kubelab.toml")),
        ];

        paths.into_iter().flatten().find(|p| p.exists())
    }

    /// Apply environment variable overrides
    ///
    /// The lookup is injected so tests do not have to touch process state.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(k));

        // Server
        if let Some(host) = first(&["KUBELAB_HOST"]) {
            self.server.host = host;
        }
        if let Some(port) = first(&["KUBELAB_PORT"]).and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        // Database
        if let Some(url) = first(&["KUBELAB_DATABASE_URL", "DATABASE_URL"]) {
            self.database.url = url;
        }
        if let Some(max) = first(&["KUBELAB_DATABASE_MAX_CONNECTIONS"]).and_then(|m| m.parse().ok()) {
            self.database.max_connections = max;
        }

        // Auth
        if let Some(secret) = first(&["KUBELAB_JWT_SECRET", "JWT_SECRET"]) {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = first(&["KUBELAB_TOKEN_TTL_HOURS"]).and_then(|t| t.parse().ok()) {
            self.auth.token_ttl_hours = ttl;
        }
        if let Some(password) = first(&["KUBELAB_ADMIN_PASSWORD"]) {
            self.auth.admin_password = password;
        }

        // Kubernetes
        if let Some(path) = first(&["KUBELAB_KUBECONFIG"]) {
            self.kubernetes.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(ns) = first(&["KUBELAB_NAMESPACE"]) {
            self.kubernetes.namespace = ns;
        }
        if let Some(quota) = first(&["KUBELAB_POD_QUOTA", "POD_QUOTA"]) {
            self.kubernetes.pod_quota = quota.parse().ok();
        }
        if let Some(domain) = first(&["KUBELAB_INGRESS_DOMAIN", "INGRESS_DOMAIN"]) {
            let domain = domain.trim().trim_start_matches('.').to_string();
            self.kubernetes.ingress_domain = if domain.is_empty() { None } else { Some(domain) };
        }
        if let Some(class) = first(&["KUBELAB_INGRESS_CLASS"]) {
            self.kubernetes.ingress_class = Some(class);
        }
        if let Some(secs) = first(&["KUBELAB_READINESS_TIMEOUT_SECS"]).and_then(|s| s.parse().ok()) {
            self.kubernetes.readiness_timeout_secs = secs;
        }
        if let Some(ms) = first(&["KUBELAB_POLL_INTERVAL_MS"]).and_then(|s| s.parse().ok()) {
            self.kubernetes.poll_interval_ms = ms;
        }
        if let Some(base) = first(&["KUBELAB_NODE_PORT_BASE"]).and_then(|s| s.parse().ok()) {
            self.kubernetes.node_port_base = base;
        }
        if let Some(max) = first(&["KUBELAB_NODE_PORT_MAX"]).and_then(|s| s.parse().ok()) {
            self.kubernetes.node_port_max = max;
        }

        // Logging
        if let Some(level) = first(&["KUBELAB_LOG_LEVEL"]) {
            self.logging.level = level;
        }
        if let Some(dir) = first(&["KUBELAB_LOG_DIR"]) {
            self.logging.log_dir = Some(PathBuf::from(dir));
        }
        if let Some(json) = first(&["KUBELAB_LOG_JSON"]) {
            self.logging.json_console = json.parse().unwrap_or(false);
        }

        // CORS
        if let Some(origins) = first(&["KUBELAB_CORS_ORIGINS"]) {
            self.cors.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("Port cannot be 0".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(ConfigError::Validation("Database URL cannot be empty".to_string()));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Validation("JWT secret cannot be empty".to_string()));
        }

        if self.auth.token_ttl_hours <= 0 {
            return Err(ConfigError::Validation("Token TTL must be positive".to_string()));
        }

        if self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Validation(format!(
                "Token TTL cannot exceed {} hours",
                MAX_TOKEN_TTL_HOURS
            )));
        }

        if self.kubernetes.namespace.is_empty() {
            return Err(ConfigError::Validation("Namespace cannot be empty".to_string()));
        }

        if self.kubernetes.readiness_timeout_secs == 0 || self.kubernetes.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "Readiness timeout and poll interval must be non-zero".to_string(),
            ));
        }

        if self.kubernetes.node_port_base <= 0
            || self.kubernetes.node_port_base > self.kubernetes.node_port_max
        {
            return Err(ConfigError::Validation(format!(
                "Invalid NodePort range {}-{}",
                self.kubernetes.node_port_base, self.kubernetes.node_port_max
            )));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Failed to read configuration file
    FileRead(PathBuf, String),
    /// Failed to parse configuration
    Parse(String),
    /// Configuration validation failed
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, err) => {
                write!(f, "Failed to read config file {:?}: {}", path, err)
            }
            ConfigError::Parse(err) => write!(f, "Failed to parse config: {}", err),
            ConfigError::Validation(err) => write!(f, "Config validation failed: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = KubelabConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.kubernetes.namespace, "default");
        assert_eq!(config.kubernetes.node_port_base, 30000);
        assert!(config.kubernetes.pod_quota.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = KubelabConfig::default();
        invalid.server.port = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = KubelabConfig::default();
        invalid.kubernetes.node_port_base = 32000;
        invalid.kubernetes.node_port_max = 31000;
        assert!(invalid.validate().is_err());

        let mut invalid = KubelabConfig::default();
        invalid.auth.jwt_secret.clear();
        assert!(invalid.validate().is_err());

        let mut invalid = KubelabConfig::default();
        invalid.auth.token_ttl_hours = i64::MAX;
        assert!(invalid.validate().is_err());

        let mut valid = KubelabConfig::default();
        valid.auth.token_ttl_hours = MAX_TOKEN_TTL_HOURS;
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "s3cret"),
            ("POD_QUOTA", "3"),
            ("INGRESS_DOMAIN", ".lab.example.com"),
            ("KUBELAB_CORS_ORIGINS", "http://localhost:3000, https://lab.example.com"),
        ]);

        let mut config = KubelabConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.auth.jwt_secret, "s3cret");
        assert_eq!(config.kubernetes.pod_quota, Some(3));
        assert_eq!(config.kubernetes.ingress_domain.as_deref(), Some("lab.example.com"));
        assert_eq!(config.cors.allowed_origins.len(), 2);
    }

    #[test]
    fn test_prefixed_env_wins() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite://plain.db"),
            ("KUBELAB_DATABASE_URL", "sqlite://prefixed.db"),
        ]);

        let mut config = KubelabConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.database.url, "sqlite://prefixed.db");
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[kubernetes]\nnamespace = \"classroom\"\npod_quota = 2").unwrap();

        let config = KubelabConfig::load_from_file(&file.path().to_path_buf()).unwrap();
        assert_eq!(config.kubernetes.namespace, "classroom");
        assert_eq!(config.kubernetes.pod_quota, Some(2));
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_generate_sample_config() {
        let sample = KubelabConfig::generate_sample();
        assert!(sample.contains("[server]"));
        assert!(sample.contains("[database]"));
        assert!(sample.contains("[kubernetes]"));
        assert!(sample.contains("[logging]"));
    }
}
