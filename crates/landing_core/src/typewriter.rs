//! Typewriter headline: types a phrase, pauses, deletes it, pauses, moves on.
//!
//! [`TypewriterMachine`] holds the [`AnimationState`] and knows two things:
//! how long the next timer waits ([`TypewriterMachine::delay`]) and what
//! happens when it fires ([`TypewriterMachine::fire`]). The animator task owns
//! the one pending timer and publishes the displayed text.

use std::time::Duration;

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, trace};

use crate::config::{ConfigError, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Typing,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Active,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub current_word_index: usize,
    pub char_index: usize,
    pub direction: Direction,
    pub phase: Phase,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            current_word_index: 0,
            char_index: 0,
            direction: Direction::Typing,
            phase: Phase::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTiming {
    pub typing: Duration,
    pub deleting: Duration,
    pub pause: Duration,
}

impl Default for TypewriterTiming {
    fn default() -> Self {
        Self {
            typing: Duration::from_millis(150),
            deleting: Duration::from_millis(100),
            pause: Duration::from_millis(1000),
        }
    }
}

impl From<&Settings> for TypewriterTiming {
    fn from(settings: &Settings) -> Self {
        Self {
            typing: settings.typing_speed(),
            deleting: settings.deleting_speed(),
            pause: settings.pause(),
        }
    }
}

/// What a timer fire did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Typed,
    Deleted,
    PausedAfterTyping,
    StartedDeleting,
    PausedAfterDeleting,
    NextWord,
}

impl Step {
    pub fn changes_text(self) -> bool {
        matches!(self, Step::Typed | Step::Deleted)
    }
}

#[derive(Debug, Clone)]
pub struct TypewriterMachine {
    words: Vec<Vec<char>>,
    timing: TypewriterTiming,
    state: AnimationState,
}

impl TypewriterMachine {
    pub fn new<I, S>(words: I, timing: TypewriterTiming) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<Vec<char>> = words
            .into_iter()
            .map(|word| word.as_ref().chars().collect())
            .collect();
        if words.is_empty() {
            return Err(ConfigError::NoWords);
        }
        if let Some(index) = words.iter().position(Vec::is_empty) {
            return Err(ConfigError::EmptyWord { index });
        }
        Ok(Self {
            words,
            timing,
            state: AnimationState::default(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        Self::new(&settings.words, TypewriterTiming::from(settings))
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn current_word(&self) -> &[char] {
        &self.words[self.state.current_word_index]
    }

    pub fn text(&self) -> String {
        self.current_word()[..self.state.char_index].iter().collect()
    }

    /// Wait before the next [`fire`](Self::fire). Leaving a pause is immediate.
    pub fn delay(&self) -> Duration {
        let len = self.current_word().len();
        match (self.state.direction, self.state.phase) {
            (_, Phase::Paused) => Duration::ZERO,
            (Direction::Typing, Phase::Active) if self.state.char_index < len => {
                self.timing.typing
            }
            (Direction::Deleting, Phase::Active) if self.state.char_index > 0 => {
                self.timing.deleting
            }
            (_, Phase::Active) => self.timing.pause,
        }
    }

    pub fn fire(&mut self) -> Step {
        let len = self.current_word().len();
        let state = &mut self.state;
        match (state.direction, state.phase) {
            (Direction::Typing, Phase::Active) if state.char_index < len => {
                state.char_index += 1;
                Step::Typed
            }
            (Direction::Typing, Phase::Active) => {
                state.phase = Phase::Paused;
                Step::PausedAfterTyping
            }
            (Direction::Typing, Phase::Paused) => {
                state.direction = Direction::Deleting;
                state.phase = Phase::Active;
                Step::StartedDeleting
            }
            (Direction::Deleting, Phase::Active) if state.char_index > 0 => {
                state.char_index -= 1;
                Step::Deleted
            }
            (Direction::Deleting, Phase::Active) => {
                state.phase = Phase::Paused;
                Step::PausedAfterDeleting
            }
            (Direction::Deleting, Phase::Paused) => {
                state.current_word_index = (state.current_word_index + 1) % self.words.len();
                state.char_index = 0;
                state.direction = Direction::Typing;
                state.phase = Phase::Active;
                Step::NextWord
            }
        }
    }

    /// Time for one word to be typed, held, deleted and held again.
    pub fn word_period(&self, word_index: usize) -> Duration {
        let len = self.words[word_index].len() as u32;
        self.timing.typing * len + self.timing.deleting * len + self.timing.pause * 2
    }

    pub fn cycle_period(&self) -> Duration {
        (0..self.words.len()).map(|idx| self.word_period(idx)).sum()
    }
}

pub struct TypewriterAnimator;

impl TypewriterAnimator {
    /// Spawns the loop on the current tokio runtime.
    pub fn start(machine: TypewriterMachine) -> AnimatorHandle {
        let (text_tx, text_rx) = watch::channel(machine.text());
        let task = tokio::spawn(run(machine, text_tx));
        AnimatorHandle {
            task,
            text: text_rx,
        }
    }
}

async fn run(mut machine: TypewriterMachine, text_tx: watch::Sender<String>) {
    debug!(words = machine.words.len(), "typewriter: started");
    loop {
        let delay = machine.delay();
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
        let step = machine.fire();
        trace!(?step, state = ?machine.state(), "typewriter: step");
        if step.changes_text() {
            text_tx.send_replace(machine.text());
        }
    }
}

/// Owns the animation task. Stopping (or dropping) cancels the pending timer.
pub struct AnimatorHandle {
    task: JoinHandle<()>,
    text: watch::Receiver<String>,
}

impl AnimatorHandle {
    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.text.clone()
    }

    pub fn stop(&self) {
        if !self.task.is_finished() {
            debug!("typewriter: stopped");
        }
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for AnimatorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
#[path = "tests/typewriter_tests.rs"]
mod tests;
