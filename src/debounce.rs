// Magic Wand - Gesture Debouncer
//
// Turns the per-pass score stream into rare, confident gesture events.
// Pure state machine: no I/O, one transition per inference pass.

use log::trace;

use crate::config::DebounceConfig;
use crate::events::{Gesture, Scores};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    /// `gesture` has won the last `count` passes in a row.
    Candidate { gesture: Gesture, count: u16 },
    /// `gesture` was just emitted; `cooldown` more passes are ignored.
    Confirmed { gesture: Gesture, cooldown: u16 },
}

pub struct GestureDebouncer {
    config: DebounceConfig,
    state: DebounceState,
}

impl GestureDebouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: DebounceState::Idle,
        }
    }

    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = DebounceState::Idle;
    }

    /// Feed one pass worth of scores. Returns a gesture on the pass that
    /// confirms it, and `None` on every other pass.
    pub fn classify(&mut self, scores: &Scores) -> Option<Gesture> {
        if let DebounceState::Confirmed { gesture, cooldown } = self.state {
            self.state = match cooldown.saturating_sub(1) {
                0 => DebounceState::Idle,
                left => DebounceState::Confirmed { gesture, cooldown: left },
            };
            return None;
        }

        let candidate = self.candidate(scores);
        let next = match (self.state, candidate) {
            (_, None) => None,
            (DebounceState::Candidate { gesture, count }, Some(g)) if gesture == g => {
                Some((g, count.saturating_add(1)))
            }
            // A different winner breaks the run.
            (DebounceState::Candidate { .. }, Some(_)) => None,
            (_, Some(g)) => Some((g, 1)),
        };

        let Some((gesture, count)) = next else {
            self.state = DebounceState::Idle;
            return None;
        };

        if count >= self.required(gesture) {
            trace!("{gesture} confirmed after {count} passes");
            self.state = match self.config.refractory {
                0 => DebounceState::Idle,
                cooldown => DebounceState::Confirmed { gesture, cooldown },
            };
            Some(gesture)
        } else {
            self.state = DebounceState::Candidate { gesture, count };
            None
        }
    }

    /// The winning gesture, if it clears the threshold.
    fn candidate(&self, scores: &Scores) -> Option<Gesture> {
        let (class, score) = scores.top();
        if score > self.config.threshold {
            Gesture::from_class(class)
        } else {
            None
        }
    }

    fn required(&self, gesture: Gesture) -> u16 {
        self.config.consistency[gesture.class_index()].max(1)
    }
}
