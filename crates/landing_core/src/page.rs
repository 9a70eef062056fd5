//! One page session: wires the controllers together and owns their lifetimes.

use std::sync::Arc;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    backend::{HttpBackend, RegistrationBackend},
    config::{normalize_base_url, ConfigError, Settings},
    counter::CounterController,
    registration::RegistrationController,
    typewriter::{AnimatorHandle, TypewriterAnimator, TypewriterMachine},
};

pub struct LandingPage {
    registration: Arc<RegistrationController>,
    counter: Arc<CounterController>,
    headline: TypewriterMachine,
    animator: Option<AnimatorHandle>,
}

impl LandingPage {
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let backend = Arc::new(HttpBackend::new(normalize_base_url(&settings.base_url)?));
        Self::with_backend(settings, backend)
    }

    pub fn with_backend(
        settings: &Settings,
        backend: Arc<dyn RegistrationBackend>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let headline = TypewriterMachine::from_settings(settings)?;
        let counter = Arc::new(CounterController::new(Arc::clone(&backend)));

        let refresh_target = Arc::clone(&counter);
        let registration = RegistrationController::new(backend).with_on_registered(Arc::new(
            move || {
                let counter = Arc::clone(&refresh_target);
                tokio::spawn(async move {
                    counter.refresh().await;
                });
            },
        ));

        Ok(Self {
            registration: Arc::new(registration),
            counter,
            headline,
            animator: None,
        })
    }

    pub fn registration(&self) -> &Arc<RegistrationController> {
        &self.registration
    }

    pub fn counter(&self) -> &Arc<CounterController> {
        &self.counter
    }

    /// Starts the first count fetch and the headline loop, independently.
    /// Mounting twice leaves the running animation alone.
    pub fn mount(&mut self) -> JoinHandle<()> {
        info!("page: mounted");
        let counter = Arc::clone(&self.counter);
        let initial_refresh = tokio::spawn(async move {
            counter.refresh().await;
        });
        if self.animator.is_none() {
            self.animator = Some(TypewriterAnimator::start(self.headline.clone()));
        }
        initial_refresh
    }

    pub fn headline(&self) -> Option<watch::Receiver<String>> {
        self.animator.as_ref().map(AnimatorHandle::subscribe)
    }

    pub fn is_animating(&self) -> bool {
        self.animator
            .as_ref()
            .is_some_and(|animator| !animator.is_stopped())
    }

    /// Stops the headline timer. In-flight requests are left to finish on their own.
    pub fn unmount(&mut self) {
        if let Some(animator) = self.animator.take() {
            animator.stop();
            debug!("page: unmounted");
        }
    }
}

impl Drop for LandingPage {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
#[path = "tests/page_tests.rs"]
mod tests;
