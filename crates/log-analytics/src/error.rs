// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Errors returned to the owner of a [`crate::client::LogAnalytics`] client.
///
/// Per-item delivery failures never surface here, see [`ShippingError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid shared key: {0}")]
    InvalidSharedKey(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Log Analytics client is closed, no further items are accepted")]
    Closed,

    #[error("Log Analytics client was already finalized")]
    AlreadyFinalized,
}

/// Outcome of a failed delivery attempt. Every variant is terminal for the item.
#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    #[error("Could not serialize log item: {0}")]
    Payload(String),

    #[error("Could not create http request: {0}")]
    Request(String),

    #[error("Could not send http request: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Could not insert log item ({status}): {body}")]
    Destination { status: StatusCode, body: String },
}

impl From<serde_json::Error> for ShippingError {
    fn from(err: serde_json::Error) -> Self {
        ShippingError::Payload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::InvalidConfig("missing workspace id".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: missing workspace id"
        );
    }

    #[test]
    fn test_destination_error_carries_status_and_body() {
        let error = ShippingError::Destination {
            status: StatusCode::FORBIDDEN,
            body: "{\"Error\":\"InvalidAuthorization\"}".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("InvalidAuthorization"));
    }

    #[test]
    fn test_serde_error_is_a_payload_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let shipping: ShippingError = err.into();
        assert!(matches!(shipping, ShippingError::Payload(_)));
    }
}
