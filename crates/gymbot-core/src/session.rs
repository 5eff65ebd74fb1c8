//! Ephemeral per-user working state. Lives only as long as the process.

use std::sync::Arc;

use dashmap::DashMap;

use crate::dialog::DialogState;
use crate::shared::{Category, Environment, RoutineId};

/// In-flight selections for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub environment: Option<Environment>,
    pub category: Option<Category>,
    /// Last screen state emitted to the user.
    pub state: Option<DialogState>,
    /// Routine whose feedback was already recorded; guards against double taps.
    pub last_logged_routine: Option<RoutineId>,
}

/// Concurrent session map keyed by user id. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the user's session (empty if none yet).
    pub fn get(&self, user_id: &str) -> Session {
        self.sessions
            .get(user_id)
            .map(|s| s.value().clone())
            .unwrap_or_default()
    }

    /// Mutate the user's session in place, creating it lazily.
    pub fn update<R>(&self, user_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut entry = self.sessions.entry(user_id.to_string()).or_default();
        f(entry.value_mut())
    }

    pub fn set_environment(&self, user_id: &str, environment: Environment) {
        self.update(user_id, |s| s.environment = Some(environment));
    }

    pub fn set_selection(&self, user_id: &str, environment: Environment, category: Category) {
        self.update(user_id, |s| {
            s.environment = Some(environment);
            s.category = Some(category);
        });
    }

    /// Drop the environment/category selections; called on every return to the main menu.
    pub fn clear_selection(&self, user_id: &str) {
        self.update(user_id, |s| {
            s.environment = None;
            s.category = None;
        });
    }

    pub fn set_state(&self, user_id: &str, state: DialogState) {
        self.update(user_id, |s| s.state = Some(state));
    }

    /// Record `routine_id` as logged. Returns false if it was already the last logged one.
    pub fn mark_logged(&self, user_id: &str, routine_id: RoutineId) -> bool {
        self.update(user_id, |s| {
            if s.last_logged_routine == Some(routine_id) {
                false
            } else {
                s.last_logged_routine = Some(routine_id);
                true
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
