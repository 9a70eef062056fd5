use std::{collections::BTreeMap, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::UnknownFieldError;

pub const EMAIL_REQUIRED: &str = "Email ID is required.";
pub const EMAIL_INVALID: &str = "Email ID is invalid.";

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

/// Loose `local@domain.tld` check. Unanchored, so surrounding text is tolerated.
pub fn is_plausible_email(value: &str) -> bool {
    EMAIL_SHAPE.is_match(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Email,
    DiscordId,
    ReferralSource,
}

impl FormField {
    pub const ALL: [FormField; 3] = [
        FormField::Email,
        FormField::DiscordId,
        FormField::ReferralSource,
    ];

    /// Key used by the backend's JSON contract.
    pub fn wire_name(self) -> &'static str {
        match self {
            FormField::Email => "email",
            FormField::DiscordId => "discord_id",
            FormField::ReferralSource => "referral_source",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormField::Email => "Email ID",
            FormField::DiscordId => "Discord ID",
            FormField::ReferralSource => "Where did you hear about us?",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, FormField::Email)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for FormField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(FormField::Email),
            "discordId" | "discord_id" => Ok(FormField::DiscordId),
            "referralSource" | "referral_source" => Ok(FormField::ReferralSource),
            other => Err(UnknownFieldError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub email: String,
    pub discord_id: String,
    pub referral_source: String,
}

impl RegistrationForm {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Email => &self.email,
            FormField::DiscordId => &self.discord_id,
            FormField::ReferralSource => &self.referral_source,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Email => &mut self.email,
            FormField::DiscordId => &mut self.discord_id,
            FormField::ReferralSource => &mut self.referral_source,
        };
        *slot = value.into();
    }

    pub fn is_empty(&self) -> bool {
        FormField::ALL.iter().all(|field| self.get(*field).is_empty())
    }

    /// Only the email is checked; the optional fields are accepted as-is, empty included.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::default();
        if self.email.is_empty() {
            errors.insert(FormField::Email, EMAIL_REQUIRED);
        } else if !is_plausible_email(&self.email) {
            errors.insert(FormField::Email, EMAIL_INVALID);
        }
        errors
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<FormField, String>);

impl ValidationErrors {
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    /// Returns whether an error was actually removed.
    pub fn clear_field(&mut self, field: FormField) -> bool {
        self.0.remove(&field).is_some()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Idle,
    Submitting,
    Success,
    Error,
}

impl SubmissionStatus {
    /// A new attempt may start from `Idle` or `Error`; `Success` is terminal.
    pub fn accepts_submit(self) -> bool {
        matches!(self, SubmissionStatus::Idle | SubmissionStatus::Error)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionState {
    pub status: SubmissionStatus,
    pub message: String,
}

/// Values captured when the backend accepted the registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRecord {
    email: String,
    discord_id: String,
    referral_source: String,
}

impl RegisteredRecord {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn discord_id(&self) -> &str {
        &self.discord_id
    }

    pub fn referral_source(&self) -> &str {
        &self.referral_source
    }

    /// Rows of the confirmation view. The referral row only appears when a note was given.
    pub fn confirmation_lines(&self) -> Vec<(&'static str, &str)> {
        let mut lines = vec![("Email ID", self.email()), ("Discord ID", self.discord_id())];
        if !self.referral_source.is_empty() {
            lines.push(("Heard about us from", self.referral_source()));
        }
        lines
    }
}

impl From<RegistrationForm> for RegisteredRecord {
    fn from(form: RegistrationForm) -> Self {
        Self {
            email: form.email,
            discord_id: form.discord_id,
            referral_source: form.referral_source,
        }
    }
}

impl PartialEq<RegistrationForm> for RegisteredRecord {
    fn eq(&self, other: &RegistrationForm) -> bool {
        self.email == other.email
            && self.discord_id == other.discord_id
            && self.referral_source == other.referral_source
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrantCount {
    pub value: u64,
    pub loading: bool,
}

impl Default for RegistrantCount {
    // The page shows the placeholder until the first fetch settles.
    fn default() -> Self {
        Self {
            value: 0,
            loading: true,
        }
    }
}

impl RegistrantCount {
    pub fn display(&self) -> String {
        if self.loading {
            "---".to_string()
        } else {
            group_thousands(self.value)
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
