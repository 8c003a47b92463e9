//! [`NavStateMachine`] – the four-state supervisor core.
//!
//! Holds the current state plus the state observed at the start of the
//! previous control step.  The previous value exists only to detect
//! state-entry edges ("we just became `NAVIGATING`", "we just left it").
//!
//! | From | Command | To |
//! |---|---|---|
//! | any | `Navigate` | `NAVIGATING` |
//! | any | `Cancel` | `IDLE` |
//! | `NAVIGATING` | `Suspend` | `SUSPENDED` |
//! | `SUSPENDED` | `Resume` | `NAVIGATING` |
//! | `NAV_ERROR` | `ResetError` | `IDLE` |
//!
//! Commands outside their source state are ignored.  The step-driven
//! transitions (goal reached, pose failure, stall) go through
//! [`NavStateMachine::finish`] and [`NavStateMachine::fail`].

use pilot_types::NavState;

/// Caller-issued state-machine triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Navigate,
    Cancel,
    Suspend,
    Resume,
    ResetError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavStateMachine {
    current: NavState,
    previous: NavState,
}

impl NavStateMachine {
    /// A machine in `IDLE` that has never navigated.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> NavState {
        self.current
    }

    /// State at the start of the previous control step.
    pub fn previous(&self) -> NavState {
        self.previous
    }

    /// Apply a caller command.
    ///
    /// Returns the new state when the command applies, `None` when it is a
    /// no-op in the current state.
    pub fn on_command(&mut self, command: Command) -> Option<NavState> {
        let next = match (command, self.current) {
            (Command::Navigate, _) => NavState::Navigating,
            (Command::Cancel, _) => NavState::Idle,
            (Command::Suspend, NavState::Navigating) => NavState::Suspended,
            (Command::Resume, NavState::Suspended) => NavState::Navigating,
            (Command::ResetError, NavState::NavError) => NavState::Idle,
            _ => return None,
        };
        self.current = next;
        Some(next)
    }

    /// Goal reached: back to `IDLE`.
    pub fn finish(&mut self) {
        self.current = NavState::Idle;
    }

    /// Hard or soft failure: enter `NAV_ERROR`.
    pub fn fail(&mut self) {
        self.current = NavState::NavError;
    }

    /// `true` when the previous step ran in `NAVIGATING`.
    pub fn was_navigating(&self) -> bool {
        self.previous == NavState::Navigating
    }

    /// Record the state the just-finished step started in.
    pub fn commit_step(&mut self, started_in: NavState) {
        self.previous = started_in;
    }
}
