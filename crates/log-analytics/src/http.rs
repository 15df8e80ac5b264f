// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;
use std::time::Duration;

use tracing::error;

use crate::config::Config;

/// Builds the HTTP client shared by all workers of a client.
///
/// An unusable proxy is logged and the client falls back to a direct connection.
pub fn get_client(config: &Config) -> Result<reqwest::Client, reqwest::Error> {
    match build_client(config, true) {
        Ok(client) => Ok(client),
        Err(e) => {
            error!(
                "LOG_ANALYTICS | Unable to parse proxy configuration: {}, falling back to direct connection",
                e
            );
            build_client(config, false)
        }
    }
}

fn build_client(config: &Config, allow_proxy: bool) -> Result<reqwest::Client, reqwest::Error> {
    let mut client = reqwest::Client::builder()
        .timeout(config.timeout)
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if allow_proxy {
        if let Some(https_uri) = &config.https_proxy {
            let proxy = reqwest::Proxy::https(https_uri.clone())?;
            client = client.proxy(proxy);
        }
    }

    client.build()
}

/// Flattens an error and its sources into one line for the diagnostic log.
pub(crate) fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_without_proxy() {
        let config = Config::new("ws", "c2VjcmV0", "AppEvents");
        assert!(get_client(&config).is_ok());
    }

    #[test]
    fn test_invalid_proxy_falls_back() {
        let mut config = Config::new("ws", "c2VjcmV0", "AppEvents");
        config.https_proxy = Some("not a url at all".to_string());
        assert!(get_client(&config).is_ok());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("request failed")]
    struct RequestFailed(#[source] std::io::Error);

    #[test]
    fn test_error_chain_joins_sources() {
        let err = RequestFailed(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ));
        assert_eq!(error_chain(&err), "request failed: connection reset");
    }
}
