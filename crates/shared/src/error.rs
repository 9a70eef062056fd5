use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::text_field;

pub const UNKNOWN_ERROR: &str = "An unknown error occurred.";

/// Body of a rejected registration. Any other keys the backend sends are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            detail: None,
            message: Some(message.into()),
        }
    }

    /// Picks the string-valued `detail` and `message` keys out of any JSON
    /// body; keys holding other types are treated as absent.
    pub fn from_json(body: &Value) -> Self {
        Self {
            detail: text_field(body, "detail"),
            message: text_field(body, "message"),
        }
    }

    /// `detail` wins over `message`; empty strings count as missing.
    pub fn reason(&self) -> &str {
        non_empty(&self.detail)
            .or_else(|| non_empty(&self.message))
            .unwrap_or(UNKNOWN_ERROR)
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown form field: {0}")]
pub struct UnknownFieldError(pub String);
