use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::null_as_default;

/// Request body for every call: the intent names the remote operation and
/// `data` carries its intent-specific payload.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ApiRequest<T> {
    pub intent: String,
    pub data: T,
}

impl<T: Serialize> ApiRequest<T> {
    pub fn new(intent: impl Into<String>, data: T) -> Self {
        Self {
            intent: intent.into(),
            data,
        }
    }
}

/// Fixed outer shape of every response. `result` stays untyped until the
/// caller has confirmed `code == 0`.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiResponse {
    pub code: i64,
    #[serde(rename = "requestId", default, deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(rename = "messageDetail", default, deserialize_with = "null_as_default")]
    pub message_detail: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Human readable reason for a failure, preferring the detailed message.
    pub fn error_message(&self) -> String {
        if self.message_detail.is_empty() {
            self.message.clone()
        } else {
            self.message_detail.clone()
        }
    }

    /// Turn a non-zero code into a vendor error, leaving successful envelopes untouched.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Api {
                code: self.code,
                message: self.error_message(),
            })
        }
    }

    /// Second decoding phase: interpret `result` as the intent's typed payload.
    pub fn decode_result<R: DeserializeOwned>(self) -> Result<R> {
        let response = self.into_result()?;
        serde_json::from_value(response.result).map_err(Error::Decode)
    }
}
