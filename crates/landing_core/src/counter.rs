//! Registrant counter shown next to the headline.

use std::sync::Arc;

use shared::domain::RegistrantCount;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::backend::RegistrationBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterEvent {
    RefreshStarted,
    Loaded(u64),
    Failed,
}

#[derive(Debug, Default)]
pub struct CounterMachine {
    count: RegistrantCount,
}

impl CounterMachine {
    pub fn handle(&mut self, event: CounterEvent) -> RegistrantCount {
        match event {
            CounterEvent::RefreshStarted => self.count.loading = true,
            CounterEvent::Loaded(value) => {
                self.count = RegistrantCount {
                    value,
                    loading: false,
                }
            }
            CounterEvent::Failed => {
                self.count = RegistrantCount {
                    value: 0,
                    loading: false,
                }
            }
        }
        self.count
    }

    pub fn count(&self) -> RegistrantCount {
        self.count
    }
}

pub struct CounterController {
    backend: Arc<dyn RegistrationBackend>,
    machine: Mutex<CounterMachine>,
    updates: watch::Sender<RegistrantCount>,
}

impl CounterController {
    pub fn new(backend: Arc<dyn RegistrationBackend>) -> Self {
        let (updates, _) = watch::channel(RegistrantCount::default());
        Self {
            backend,
            machine: Mutex::new(CounterMachine::default()),
            updates,
        }
    }

    pub async fn snapshot(&self) -> RegistrantCount {
        self.machine.lock().await.count()
    }

    pub fn subscribe(&self) -> watch::Receiver<RegistrantCount> {
        self.updates.subscribe()
    }

    /// One GET; any failure shows zero until the next trigger. Never retries.
    pub async fn refresh(&self) -> RegistrantCount {
        self.apply(CounterEvent::RefreshStarted).await;

        let event = match self.backend.registrant_count().await {
            Ok(value) => {
                debug!(count = value, "counter: refreshed");
                CounterEvent::Loaded(value)
            }
            Err(err) => {
                warn!(error = %err, "counter: failed to fetch registrant count");
                CounterEvent::Failed
            }
        };
        self.apply(event).await
    }

    async fn apply(&self, event: CounterEvent) -> RegistrantCount {
        let count = self.machine.lock().await.handle(event);
        self.updates.send_replace(count);
        count
    }
}

#[cfg(test)]
#[path = "tests/counter_tests.rs"]
mod tests;
