//! Pre-registration form: field state, validation and the submission lifecycle.
//!
//! [`RegistrationMachine`] is the pure transition function; it never performs
//! I/O and only returns the effects the caller must run.
//! [`RegistrationController`] is the dispatcher that executes those effects
//! against a [`RegistrationBackend`] and feeds the results back in.

use std::{collections::VecDeque, sync::Arc};

use shared::{
    domain::{
        FormField, RegisteredRecord, RegistrationForm, SubmissionState, SubmissionStatus,
        ValidationErrors,
    },
    error::ErrorBody,
    protocol::{RegisterRequest, RegisterResponse},
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::backend::{RegisterOutcome, RegistrationBackend};

pub const CONNECT_FAILED: &str = "Failed to connect to the server. Please try again later.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("registration already completed")]
    AlreadyRegistered,
    #[error("form has errors: {0}")]
    Invalid(ValidationErrors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Accepted(RegisterResponse),
    Rejected(ErrorBody),
    TransportFailed,
}

impl From<RegisterOutcome> for Settlement {
    fn from(outcome: RegisterOutcome) -> Self {
        match outcome {
            RegisterOutcome::Accepted(body) => Settlement::Accepted(body),
            RegisterOutcome::Rejected { body, .. } => Settlement::Rejected(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    FieldEdited { field: FormField, value: String },
    SubmitRequested,
    Settled(Settlement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEffect {
    Post(RegisterRequest),
    NotifyRegistered,
}

#[derive(Debug, Default)]
pub struct RegistrationMachine {
    form: RegistrationForm,
    errors: ValidationErrors,
    submission: SubmissionState,
    in_flight: Option<RegistrationForm>,
    record: Option<RegisteredRecord>,
}

impl RegistrationMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SubmissionStatus {
        self.submission.status
    }

    pub fn handle(
        &mut self,
        event: RegistrationEvent,
    ) -> Result<Vec<RegistrationEffect>, SubmitError> {
        match event {
            RegistrationEvent::FieldEdited { field, value } => {
                self.edit(field, value);
                Ok(Vec::new())
            }
            RegistrationEvent::SubmitRequested => self.begin_submit(),
            RegistrationEvent::Settled(settlement) => Ok(self.settle(settlement)),
        }
    }

    fn edit(&mut self, field: FormField, value: String) {
        if self.submission.status == SubmissionStatus::Success {
            debug!(%field, "registration: ignoring edit after completion");
            return;
        }
        self.form.set(field, value);
        // Cleared optimistically; the new value is only checked on the next submit.
        self.errors.clear_field(field);
    }

    fn begin_submit(&mut self) -> Result<Vec<RegistrationEffect>, SubmitError> {
        match self.submission.status {
            SubmissionStatus::Submitting => return Err(SubmitError::InFlight),
            SubmissionStatus::Success => return Err(SubmitError::AlreadyRegistered),
            SubmissionStatus::Idle | SubmissionStatus::Error => {}
        }

        self.errors = self.form.validate();
        if !self.errors.is_empty() {
            return Err(SubmitError::Invalid(self.errors.clone()));
        }

        self.submission = SubmissionState {
            status: SubmissionStatus::Submitting,
            message: String::new(),
        };
        let request = RegisterRequest::from(&self.form);
        self.in_flight = Some(self.form.clone());
        Ok(vec![RegistrationEffect::Post(request)])
    }

    fn settle(&mut self, settlement: Settlement) -> Vec<RegistrationEffect> {
        let Some(submitted) = self.in_flight.take() else {
            warn!("registration: settlement arrived with nothing in flight");
            return Vec::new();
        };

        match settlement {
            Settlement::Accepted(body) => {
                self.submission = SubmissionState {
                    status: SubmissionStatus::Success,
                    message: body.message_or_default().to_string(),
                };
                self.record = Some(RegisteredRecord::from(submitted));
                self.form = RegistrationForm::default();
                self.errors.clear();
                vec![RegistrationEffect::NotifyRegistered]
            }
            Settlement::Rejected(body) => {
                self.fail(body.reason());
                Vec::new()
            }
            Settlement::TransportFailed => {
                self.fail(CONNECT_FAILED);
                Vec::new()
            }
        }
    }

    fn fail(&mut self, message: &str) {
        self.submission = SubmissionState {
            status: SubmissionStatus::Error,
            message: message.to_string(),
        };
    }

    pub fn view(&self) -> RegistrationView {
        RegistrationView {
            form: self.form.clone(),
            errors: self.errors.clone(),
            submission: self.submission.clone(),
            record: self.record.clone(),
        }
    }
}

/// Everything needed to render either the form or the confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationView {
    pub form: RegistrationForm,
    pub errors: ValidationErrors,
    pub submission: SubmissionState,
    pub record: Option<RegisteredRecord>,
}

impl RegistrationView {
    pub fn is_registered(&self) -> bool {
        self.record.is_some()
    }

    pub fn inputs_disabled(&self) -> bool {
        self.submission.status == SubmissionStatus::Submitting
    }

    pub fn submit_label(&self) -> &'static str {
        if self.inputs_disabled() {
            "Submitting..."
        } else {
            "Pre-Register"
        }
    }

    /// The success banner belongs to the confirmation, the error banner to the form.
    pub fn visible_message(&self) -> Option<&str> {
        let message = self.submission.message.as_str();
        if message.is_empty() {
            return None;
        }
        match (self.submission.status, self.is_registered()) {
            (SubmissionStatus::Success, true) | (SubmissionStatus::Error, false) => Some(message),
            _ => None,
        }
    }
}

pub type RegisteredCallback = Arc<dyn Fn() + Send + Sync>;

pub struct RegistrationController {
    backend: Arc<dyn RegistrationBackend>,
    machine: Arc<Mutex<RegistrationMachine>>,
    on_registered: Option<RegisteredCallback>,
}

impl RegistrationController {
    pub fn new(backend: Arc<dyn RegistrationBackend>) -> Self {
        Self {
            backend,
            machine: Arc::new(Mutex::new(RegistrationMachine::new())),
            on_registered: None,
        }
    }

    pub fn with_on_registered(mut self, callback: RegisteredCallback) -> Self {
        self.on_registered = Some(callback);
        self
    }

    pub async fn update_field(&self, field: FormField, value: impl Into<String>) {
        let event = RegistrationEvent::FieldEdited {
            field,
            value: value.into(),
        };
        // Edits never produce effects.
        let _ = self.machine.lock().await.handle(event);
    }

    pub async fn view(&self) -> RegistrationView {
        self.machine.lock().await.view()
    }

    pub async fn status(&self) -> SubmissionStatus {
        self.machine.lock().await.status()
    }

    /// Runs one submission attempt to completion and returns where it ended.
    ///
    /// The request and its settlement run on a spawned task, so dropping the
    /// returned future does not strand the form in `Submitting`. The machine
    /// lock is released while the request is outstanding, so a concurrent call
    /// observes `Submitting` and is rejected with [`SubmitError::InFlight`]
    /// without touching the network.
    pub async fn submit(&self) -> Result<SubmissionStatus, SubmitError> {
        let effects = {
            let mut machine = self.machine.lock().await;
            match machine.handle(RegistrationEvent::SubmitRequested) {
                Ok(effects) => effects,
                Err(err) => {
                    debug!(error = %err, "registration: submit rejected");
                    return Err(err);
                }
            }
        };

        let run = EffectRunner {
            backend: Arc::clone(&self.backend),
            machine: Arc::clone(&self.machine),
            on_registered: self.on_registered.clone(),
        };
        match tokio::spawn(run.drain(effects)).await {
            Ok(status) => Ok(status),
            Err(err) => {
                error!(error = %err, "registration: submission task died");
                let mut machine = self.machine.lock().await;
                machine.handle(RegistrationEvent::Settled(Settlement::TransportFailed))?;
                Ok(machine.status())
            }
        }
    }
}

/// Everything the spawned submission task needs, detached from the controller.
struct EffectRunner {
    backend: Arc<dyn RegistrationBackend>,
    machine: Arc<Mutex<RegistrationMachine>>,
    on_registered: Option<RegisteredCallback>,
}

impl EffectRunner {
    async fn drain(self, effects: Vec<RegistrationEffect>) -> SubmissionStatus {
        let mut queue: VecDeque<RegistrationEffect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                RegistrationEffect::Post(request) => {
                    let settlement = self.post(&request).await;
                    let mut machine = self.machine.lock().await;
                    // Settling never fails.
                    if let Ok(follow_up) = machine.handle(RegistrationEvent::Settled(settlement)) {
                        queue.extend(follow_up);
                    }
                }
                RegistrationEffect::NotifyRegistered => {
                    if let Some(callback) = &self.on_registered {
                        callback();
                    }
                }
            }
        }
        self.machine.lock().await.status()
    }

    async fn post(&self, request: &RegisterRequest) -> Settlement {
        info!(email = %request.email, "registration: submitting");
        match self.backend.register(request).await {
            Ok(RegisterOutcome::Accepted(body)) => {
                info!(email = %request.email, "registration: submission accepted");
                Settlement::Accepted(body)
            }
            Ok(RegisterOutcome::Rejected { status, body }) => {
                warn!(
                    email = %request.email,
                    status,
                    reason = body.reason(),
                    "registration: submission rejected"
                );
                Settlement::Rejected(body)
            }
            Err(err) => {
                error!(error = %err, "registration: submission failed to reach backend");
                Settlement::TransportFailed
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/registration_tests.rs"]
mod tests;
