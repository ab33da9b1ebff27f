//! Element picker state machine.
//!
//! The host page delivers toggle, escape, hover and click events and
//! performs whatever [`PickerAction`] comes back. Events on the picker's
//! own overlay element are filtered out by the host before they get here.

use serde::{Deserialize, Serialize};

/// Id of the highlight overlay the host injects into the page
pub const OVERLAY_ID: &str = "__html2figma_overlay__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerState {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent<T> {
    /// The popup asked to toggle the picker
    Toggle,
    /// The user pressed Escape
    Escape,
    Hover(T),
    Click(T),
}

/// What the host should do after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerAction<T> {
    None,
    /// Create the overlay and start listening for hover, click and key events
    Activate,
    /// Remove the overlay and stop listening
    Deactivate,
    /// Move the overlay over the target
    Highlight(T),
    /// Capture the target, then tear the picker down
    Capture(T),
}

/// Next state and action for `event` in `state`
pub fn transition<T>(state: PickerState, event: PickerEvent<T>) -> (PickerState, PickerAction<T>) {
    match (state, event) {
        (PickerState::Idle, PickerEvent::Toggle) => (PickerState::Active, PickerAction::Activate),
        (PickerState::Idle, _) => (PickerState::Idle, PickerAction::None),
        (PickerState::Active, PickerEvent::Toggle | PickerEvent::Escape) => {
            (PickerState::Idle, PickerAction::Deactivate)
        }
        (PickerState::Active, PickerEvent::Hover(target)) => (PickerState::Active, PickerAction::Highlight(target)),
        (PickerState::Active, PickerEvent::Click(target)) => (PickerState::Idle, PickerAction::Capture(target)),
    }
}

/// Holds the current picker state and applies events to it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Picker {
    state: PickerState,
}

impl Picker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == PickerState::Active
    }

    pub fn handle<T>(&mut self, event: PickerEvent<T>) -> PickerAction<T> {
        let (next, action) = transition(self.state, event);
        if next != self.state {
            log::debug!("Picker {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        action
    }
}
