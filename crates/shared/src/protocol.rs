use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{domain::RegistrationForm, error::non_empty};

pub const REGISTER_PATH: &str = "/api/register/";
pub const USER_COUNT_PATH: &str = "/api/users/count/";

pub const REGISTRATION_SUCCESS: &str = "Registration successful! Welcome aboard.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub discord_id: String,
    pub referral_source: String,
}

impl From<&RegistrationForm> for RegisterRequest {
    fn from(form: &RegistrationForm) -> Self {
        Self {
            email: form.email.clone(),
            discord_id: form.discord_id.clone(),
            referral_source: form.referral_source.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RegisterResponse {
    pub fn from_json(body: &Value) -> Self {
        Self {
            message: text_field(body, "message"),
        }
    }

    pub fn message_or_default(&self) -> &str {
        non_empty(&self.message).unwrap_or(REGISTRATION_SUCCESS)
    }
}

pub(crate) fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).map(str::to_owned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCountResponse {
    pub count: u64,
}
