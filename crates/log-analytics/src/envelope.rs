// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use serde_json::{Map, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::error::ShippingError;

/// Wire name of the generation timestamp, also announced in the `time-generated-field` header.
pub const TIME_GENERATED_FIELD: &str = "TimeGenerated";

/// A log item's fields plus the `TimeGenerated` stamp, ready to be posted.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    fields: Map<String, Value>,
}

impl Envelope {
    /// Wraps `item`, stamping it with the current UTC time.
    pub fn build<T: Serialize>(item: &T) -> Result<Self, ShippingError> {
        Self::build_at(item, OffsetDateTime::now_utc())
    }

    /// Wraps `item` stamped with `at`.
    ///
    /// The item must serialize to a JSON object. A `TimeGenerated` field set by the caller is
    /// replaced so the envelope carries exactly one stamp.
    pub fn build_at<T: Serialize>(item: &T, at: OffsetDateTime) -> Result<Self, ShippingError> {
        let mut fields = match serde_json::to_value(item)? {
            Value::Object(fields) => fields,
            other => {
                return Err(ShippingError::Payload(format!(
                    "expected a JSON object, got {}",
                    kind(&other)
                )))
            }
        };
        let stamp = time_generated(at).map_err(|e| ShippingError::Payload(e.to_string()))?;
        fields.insert(TIME_GENERATED_FIELD.to_string(), Value::String(stamp));
        Ok(Envelope { fields })
    }

    #[must_use]
    pub fn time_generated(&self) -> Option<&str> {
        self.fields.get(TIME_GENERATED_FIELD).and_then(Value::as_str)
    }

    pub fn to_body(&self) -> Result<Vec<u8>, ShippingError> {
        Ok(serde_json::to_vec(&self.fields)?)
    }
}

/// RFC 3339 at whole-second precision, e.g. `2019-01-01T00:00:00Z`.
pub fn time_generated(at: OffsetDateTime) -> Result<String, time::error::Format> {
    at.replace_nanosecond(0).unwrap_or(at).format(&Rfc3339)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
