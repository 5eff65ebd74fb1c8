//! Dialog engine: turns one inbound event into the next screen.
//!
//! Where a user stands is derived from the persisted profile, the ephemeral session
//! and the action token carried by the event; nothing else is remembered between events.

mod engine;
pub mod i18n;

pub use engine::DialogEngine;

use serde::{Deserialize, Serialize};

use crate::codec::Action;

/// Screen the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    AwaitingLanguage,
    MainMenu,
    AwaitingEnvironment,
    AwaitingCategory,
    AwaitingConfirmation,
    RoutineDisplayed,
    AwaitingFeedback,
    History,
    Settings,
    SettingsLanguage,
    SettingsDifficulty,
    ConfirmClearHistory,
}

/// Inbound event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Slash command such as `/start`.
    Command(String),
    /// Free text typed by the user.
    Text(String),
    /// Button press carrying an action token.
    Callback(String),
}

/// One inbound event from the chat platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user_id: String,
    pub first_name: String,
    pub username: Option<String>,
    pub event: Event,
}

impl Inbound {
    pub fn new(user_id: impl Into<String>, first_name: impl Into<String>, event: Event) -> Self {
        Self {
            user_id: user_id.into(),
            first_name: first_name.into(),
            username: None,
            event,
        }
    }

    pub fn command(user_id: impl Into<String>, first_name: impl Into<String>, command: &str) -> Self {
        Self::new(user_id, first_name, Event::Command(command.to_string()))
    }

    pub fn text(user_id: impl Into<String>, first_name: impl Into<String>, text: &str) -> Self {
        Self::new(user_id, first_name, Event::Text(text.to_string()))
    }

    pub fn callback(user_id: impl Into<String>, first_name: impl Into<String>, token: &str) -> Self {
        Self::new(user_id, first_name, Event::Callback(token.to_string()))
    }

    pub fn action(user_id: impl Into<String>, first_name: impl Into<String>, action: Action) -> Self {
        Self::new(user_id, first_name, Event::Callback(action.encode()))
    }
}

/// A labeled button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub action: Action,
}

impl Choice {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }

    pub fn token(&self) -> String {
        self.action.encode()
    }
}

/// Outbound screen: HTML text plus rows of buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub state: DialogState,
    pub text: String,
    pub keyboard: Vec<Vec<Choice>>,
}

impl Screen {
    pub fn new(state: DialogState, text: impl Into<String>) -> Self {
        Self {
            state,
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    pub fn row(mut self, row: Vec<Choice>) -> Self {
        self.keyboard.push(row);
        self
    }

    pub fn button(self, label: impl Into<String>, action: Action) -> Self {
        self.row(vec![Choice::new(label, action)])
    }

    /// Every action offered, in keyboard order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.keyboard.iter().flatten().map(|c| c.action)
    }

    pub fn offers(&self, action: Action) -> bool {
        self.actions().any(|a| a == action)
    }
}
