// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared Key authorization for the HTTP Data Collector API.
//!
//! Every request carries `Authorization: SharedKey <workspace id>:<signature>` where the signature
//! is the base64 encoded HMAC-SHA256 of a canonical string built from the request:
//!
//! ```text
//! POST\n<body length>\napplication/json\nx-ms-date:<rfc 1123 date>\n/api/logs
//! ```
//!
//! The endpoint recomputes the same string, so any byte of difference is an authentication
//! failure.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use time::{format_description::BorrowedFormatItem, macros::format_description, OffsetDateTime};

use crate::config::RESOURCE_PATH;
use crate::error::Error;

type HmacSha256 = Hmac<Sha256>;

pub const METHOD: &str = "POST";
pub const CONTENT_TYPE: &str = "application/json";

// RFC 1123 with the zone spelled `GMT`, the only form the endpoint accepts in `x-ms-date`.
const SIGNATURE_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Builds the canonical string the signature is computed over.
#[must_use]
pub fn string_to_sign(method: &str, body_length: usize, date: &str) -> String {
    format!("{method}\n{body_length}\n{CONTENT_TYPE}\nx-ms-date:{date}\n{RESOURCE_PATH}")
}

/// Formats `at` for the `x-ms-date` header. `at` must be in UTC.
pub fn signature_date(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.format(SIGNATURE_DATE_FORMAT)
}

/// Signs requests on behalf of one workspace.
///
/// The key is decoded and loaded into the MAC once; signing only clones the keyed state.
#[derive(Clone)]
pub struct Signer {
    workspace_id: String,
    mac: HmacSha256,
}

impl Signer {
    pub fn new(workspace_id: &str, shared_key: &str) -> Result<Self, Error> {
        let key = STANDARD
            .decode(shared_key)
            .map_err(|e| Error::InvalidSharedKey(e.to_string()))?;
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| Error::InvalidSharedKey(e.to_string()))?;
        Ok(Signer {
            workspace_id: workspace_id.to_string(),
            mac,
        })
    }

    #[must_use]
    pub fn sign(&self, string_to_sign: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(string_to_sign.as_bytes());
        STANDARD.encode(mac.finalize().into_bytes())
    }

    /// Value of the `Authorization` header for a request with the given body length and date.
    #[must_use]
    pub fn authorization(&self, method: &str, body_length: usize, date: &str) -> String {
        let signature = self.sign(&string_to_sign(method, body_length, date));
        format!("SharedKey {}:{signature}", self.workspace_id)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signer({})", self.workspace_id)
    }
}
