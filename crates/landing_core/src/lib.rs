pub mod backend;
pub mod config;
pub mod counter;
pub mod page;
pub mod registration;
pub mod typewriter;

pub use backend::{
    CounterFetchError, HttpBackend, RegisterOutcome, RegistrationBackend, TransportError,
};
pub use config::{load_settings, ConfigError, Settings};
pub use counter::CounterController;
pub use page::LandingPage;
pub use registration::{RegistrationController, RegistrationView, SubmitError};
pub use typewriter::{AnimatorHandle, TypewriterAnimator, TypewriterMachine, TypewriterTiming};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
