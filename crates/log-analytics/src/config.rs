// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::fmt;
use std::time::Duration;

use crate::error::Error;

pub const DEFAULT_DOMAIN: &str = "ods.opinsights.azure.com";
pub const API_VERSION: &str = "2016-04-01";
/// Path of the ingestion resource, both in the URL and in the string-to-sign.
pub const RESOURCE_PATH: &str = "/api/logs";
pub const DEFAULT_WORKER_COUNT: usize = 2;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Read-only settings shared by every worker of a client.
#[derive(Clone)]
pub struct Config {
    pub workspace_id: String,
    /// Base64 encoded, decoded once when the client is built.
    pub shared_key: String,
    /// Sent as the `Log-Type` header, names the custom log table.
    pub log_name: String,
    pub domain: String,
    /// Replaces the whole ingestion url, used for tests and forwarding proxies.
    pub url_override: Option<String>,
    pub worker_count: usize,
    pub timeout: Duration,
    pub https_proxy: Option<String>,
}

impl Config {
    #[must_use]
    pub fn new(workspace_id: &str, shared_key: &str, log_name: &str) -> Self {
        Config {
            workspace_id: workspace_id.to_string(),
            shared_key: shared_key.to_string(),
            log_name: log_name.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            url_override: None,
            worker_count: DEFAULT_WORKER_COUNT,
            timeout: DEFAULT_TIMEOUT,
            https_proxy: None,
        }
    }

    /// Reads the configuration from `LOG_ANALYTICS_*` environment variables.
    pub fn from_env() -> Result<Config, Error> {
        let workspace_id = required_var("LOG_ANALYTICS_WORKSPACE_ID")?;
        let shared_key = required_var("LOG_ANALYTICS_SHARED_KEY")?;
        let log_name = required_var("LOG_ANALYTICS_LOG_NAME")?;

        let mut config = Config::new(&workspace_id, &shared_key, &log_name);

        if let Ok(domain) = env::var("LOG_ANALYTICS_DOMAIN") {
            if !domain.is_empty() {
                config.domain = domain;
            }
        }
        config.url_override = env::var("LOG_ANALYTICS_URL")
            .ok()
            .filter(|url| !url.is_empty());
        config.worker_count = env::var("LOG_ANALYTICS_WORKERS")
            .ok()
            .and_then(|workers| workers.parse::<usize>().ok())
            .filter(|workers| *workers > 0)
            .unwrap_or(DEFAULT_WORKER_COUNT);
        config.timeout = env::var("LOG_ANALYTICS_TIMEOUT_SECS")
            .ok()
            .and_then(|secs| secs.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);
        config.https_proxy = env::var("LOG_ANALYTICS_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();

        Ok(config)
    }

    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        self.url_override = Some(url.to_string());
        self
    }

    #[must_use]
    pub fn ingestion_url(&self) -> String {
        match &self.url_override {
            Some(url) => url.clone(),
            None => format!(
                "https://{}.{}{RESOURCE_PATH}?api-version={API_VERSION}",
                self.workspace_id, self.domain
            ),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.worker_count == 0 {
            return Err(Error::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(Error::InvalidConfig("timeout must be positive".to_string()));
        }
        if self.log_name.is_empty() {
            return Err(Error::InvalidConfig("log name is empty".to_string()));
        }
        Ok(())
    }
}

fn required_var(name: &str) -> Result<String, Error> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::InvalidConfig(format!(
            "{name} environment variable is not set"
        ))),
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("workspace_id", &self.workspace_id)
            .field("shared_key", &"<redacted>")
            .field("log_name", &self.log_name)
            .field("domain", &self.domain)
            .field("url_override", &self.url_override)
            .field("worker_count", &self.worker_count)
            .field("timeout", &self.timeout)
            .field("https_proxy", &self.https_proxy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use std::env;
    use std::time::Duration;

    use super::*;

    const VARS: [&str; 9] = [
        "LOG_ANALYTICS_WORKSPACE_ID",
        "LOG_ANALYTICS_SHARED_KEY",
        "LOG_ANALYTICS_LOG_NAME",
        "LOG_ANALYTICS_DOMAIN",
        "LOG_ANALYTICS_URL",
        "LOG_ANALYTICS_WORKERS",
        "LOG_ANALYTICS_TIMEOUT_SECS",
        "LOG_ANALYTICS_PROXY_HTTPS",
        "HTTPS_PROXY",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    fn set_required() {
        env::set_var("LOG_ANALYTICS_WORKSPACE_ID", "workspace");
        env::set_var("LOG_ANALYTICS_SHARED_KEY", "c2VjcmV0");
        env::set_var("LOG_ANALYTICS_LOG_NAME", "AppEvents");
    }

    #[test]
    fn test_default_ingestion_url() {
        let config = Config::new("0b1c2d3e", "c2VjcmV0", "AppEvents");
        assert_eq!(
            config.ingestion_url(),
            "https://0b1c2d3e.ods.opinsights.azure.com/api/logs?api-version=2016-04-01"
        );
    }

    #[test]
    fn test_url_override_wins() {
        let config = Config::new("ws", "c2VjcmV0", "AppEvents").with_url("http://127.0.0.1:1234");
        assert_eq!(config.ingestion_url(), "http://127.0.0.1:1234");
    }

    #[test]
    fn test_debug_redacts_shared_key() {
        let config = Config::new("ws", "c2VjcmV0", "AppEvents");
        let debug = format!("{config:?}");
        assert!(!debug.contains("c2VjcmV0"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let config = Config::new("ws", "c2VjcmV0", "AppEvents").with_worker_count(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = Config::new("ws", "c2VjcmV0", "AppEvents").with_timeout(Duration::ZERO);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    #[serial]
    fn test_error_if_workspace_id_missing() {
        clear_env();
        env::set_var("LOG_ANALYTICS_SHARED_KEY", "c2VjcmV0");
        env::set_var("LOG_ANALYTICS_LOG_NAME", "AppEvents");
        let config = Config::from_env();
        assert!(config.is_err());
        assert_eq!(
            config.unwrap_err().to_string(),
            "Invalid configuration: LOG_ANALYTICS_WORKSPACE_ID environment variable is not set"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        set_required();
        let config = Config::from_env().unwrap();
        assert_eq!(config.workspace_id, "workspace");
        assert_eq!(config.log_name, "AppEvents");
        assert_eq!(config.domain, DEFAULT_DOMAIN);
        assert_eq!(config.worker_count, DEFAULT_WORKER_COUNT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.url_override.is_none());
        assert!(config.https_proxy.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set_required();
        env::set_var("LOG_ANALYTICS_DOMAIN", "ods.opinsights.azure.us");
        env::set_var("LOG_ANALYTICS_WORKERS", "8");
        env::set_var("LOG_ANALYTICS_TIMEOUT_SECS", "5");
        env::set_var("HTTPS_PROXY", "https://proxy.local:3128");
        let config = Config::from_env().unwrap();
        assert_eq!(
            config.ingestion_url(),
            "https://workspace.ods.opinsights.azure.us/api/logs?api-version=2016-04-01"
        );
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.https_proxy.as_deref(),
            Some("https://proxy.local:3128")
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_ignores_unparsable_numbers() {
        clear_env();
        set_required();
        env::set_var("LOG_ANALYTICS_WORKERS", "many");
        env::set_var("LOG_ANALYTICS_TIMEOUT_SECS", "-1");
        let config = Config::from_env().unwrap();
        assert_eq!(config.worker_count, DEFAULT_WORKER_COUNT);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_zero_timeout_falls_back_to_default() {
        clear_env();
        set_required();
        env::set_var("LOG_ANALYTICS_TIMEOUT_SECS", "0");
        let config = Config::from_env().unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.validate().is_ok());
        clear_env();
    }
}
