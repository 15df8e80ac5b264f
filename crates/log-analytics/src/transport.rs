// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use time::OffsetDateTime;
use tracing::debug;

use crate::config::Config;
use crate::envelope::TIME_GENERATED_FIELD;
use crate::error::{Error, ShippingError};
use crate::http::get_client;
use crate::signature::{self, signature_date, Signer};

const LOG_TYPE: HeaderName = HeaderName::from_static("log-type");
const MS_DATE: HeaderName = HeaderName::from_static("x-ms-date");
const TIME_GENERATED: HeaderName = HeaderName::from_static("time-generated-field");

/// Delivers one serialized envelope. Implementations make a single attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, body: Vec<u8>) -> Result<(), ShippingError>;
}

/// Posts envelopes to the HTTP Data Collector API, signing each request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    signer: Signer,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let signer = Signer::new(&config.workspace_id, &config.shared_key)?;
        let client = get_client(config).map_err(|e| Error::HttpClient(e.to_string()))?;
        let headers = static_headers(&config.log_name)?;
        Ok(HttpTransport {
            client,
            url: config.ingestion_url(),
            signer,
            headers,
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    fn create_request(&self, body: Vec<u8>) -> Result<reqwest::RequestBuilder, ShippingError> {
        let date = signature_date(OffsetDateTime::now_utc())
            .map_err(|e| ShippingError::Request(e.to_string()))?;
        let authorization = self
            .signer
            .authorization(signature::METHOD, body.len(), &date);

        let mut headers = self.headers.clone();
        headers.insert(AUTHORIZATION, header_value(&authorization)?);
        headers.insert(MS_DATE, header_value(&date)?);

        Ok(self.client.post(&self.url).headers(headers).body(body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, body: Vec<u8>) -> Result<(), ShippingError> {
        let request = self.create_request(body)?;
        let response = request.send().await?;

        let status = response.status();
        if status.as_u16() >= 300 {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("<response body unreadable: {e}>"),
            };
            return Err(ShippingError::Destination { status, body });
        }

        debug!("LOG_ANALYTICS | Log item accepted ({status})");
        Ok(())
    }
}

fn static_headers(log_name: &str) -> Result<HeaderMap, Error> {
    let log_type = HeaderValue::from_str(log_name).map_err(|_| {
        Error::InvalidConfig(format!("log name {log_name:?} is not a valid header value"))
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(signature::CONTENT_TYPE));
    headers.insert(LOG_TYPE, log_type);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(signature::CONTENT_TYPE));
    headers.insert(TIME_GENERATED, HeaderValue::from_static(TIME_GENERATED_FIELD));
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, ShippingError> {
    HeaderValue::from_str(value).map_err(|e| ShippingError::Request(e.to_string()))
}
