//! Callback action codec.
//!
//! Every button carries one opaque token of at most [`MAX_TOKEN_LEN`] bytes. Tokens are
//! `_`-joined segments, and `_` also occurs inside category names and two-word feedback
//! kinds, so decoding anchors the fixed-width segments (action prefix, environment,
//! numeric routine id) at the front and back and joins whatever is left in the middle.

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;
use crate::shared::{Category, Difficulty, Environment, FeedbackKind, Language, RoutineId};

/// Platform limit on callback payloads.
pub const MAX_TOKEN_LEN: usize = 64;

const SEP: char = '_';

/// One dialog transition and its parameters, as carried by a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SelectLanguage(Language),
    StartWorkout,
    SelectEnvironment(Environment),
    SelectCategory {
        environment: Environment,
        category: Category,
    },
    ConfirmRoutine {
        environment: Environment,
        category: Category,
    },
    NewRoutine {
        environment: Environment,
        category: Category,
    },
    FinishWorkout {
        routine_id: RoutineId,
        environment: Environment,
        category: Category,
    },
    Feedback {
        kind: FeedbackKind,
        routine_id: RoutineId,
        environment: Environment,
        category: Category,
    },
    BackToMain,
    ShowHistory,
    OpenSettings,
    ChangeLanguage,
    SetLanguage(Language),
    ChangeDifficulty,
    SetDifficulty(Difficulty),
    ClearHistory,
    ConfirmClearHistory,
}

// Fixed tokens are matched whole before any prefix is tried.
const FIXED: [(&str, Action); 8] = [
    ("start_workout", Action::StartWorkout),
    ("back_to_main", Action::BackToMain),
    ("show_history", Action::ShowHistory),
    ("settings", Action::OpenSettings),
    ("change_language", Action::ChangeLanguage),
    ("change_difficulty", Action::ChangeDifficulty),
    ("clear_history", Action::ClearHistory),
    ("confirm_clear_history", Action::ConfirmClearHistory),
];

// Longest first: `workout_feedback_` must win over `workout_`.
const P_FEEDBACK: &str = "workout_feedback_";
const P_CONFIRM: &str = "confirm_routine_";
const P_FINISH: &str = "finish_workout_";
const P_NEW: &str = "new_routine_";
const P_SET_LANG: &str = "set_lang_";
const P_SET_DIFF: &str = "set_diff_";
const P_ROUTINE: &str = "routine_";
const P_WORKOUT: &str = "workout_";
const P_LANG: &str = "lang_";

impl Action {
    /// Short action name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectLanguage(_) => "select_language",
            Self::StartWorkout => "start_workout",
            Self::SelectEnvironment(_) => "select_environment",
            Self::SelectCategory { .. } => "select_category",
            Self::ConfirmRoutine { .. } => "confirm_routine",
            Self::NewRoutine { .. } => "new_routine",
            Self::FinishWorkout { .. } => "finish_workout",
            Self::Feedback { .. } => "feedback",
            Self::BackToMain => "back_to_main",
            Self::ShowHistory => "show_history",
            Self::OpenSettings => "open_settings",
            Self::ChangeLanguage => "change_language",
            Self::SetLanguage(_) => "set_language",
            Self::ChangeDifficulty => "change_difficulty",
            Self::SetDifficulty(_) => "set_difficulty",
            Self::ClearHistory => "clear_history",
            Self::ConfirmClearHistory => "confirm_clear_history",
        }
    }

    /// Encode into a callback token. Total over every typed action value; ids above
    /// [`RoutineId::MAX`] yield tokens that [`decode`](Self::decode) rejects.
    pub fn encode(&self) -> String {
        match *self {
            Self::SelectLanguage(l) => format!("{P_LANG}{}", l.as_str()),
            Self::SelectEnvironment(e) => format!("{P_WORKOUT}{}", e.as_str()),
            Self::SelectCategory {
                environment,
                category,
            } => format!("{P_ROUTINE}{}_{}", environment.as_str(), category.as_str()),
            Self::ConfirmRoutine {
                environment,
                category,
            } => format!("{P_CONFIRM}{}_{}", environment.as_str(), category.as_str()),
            Self::NewRoutine {
                environment,
                category,
            } => format!("{P_NEW}{}_{}", category.as_str(), environment.as_str()),
            Self::FinishWorkout {
                routine_id,
                environment,
                category,
            } => format!(
                "{P_FINISH}{}_{}_{}",
                routine_id,
                category.as_str(),
                environment.as_str()
            ),
            Self::Feedback {
                kind,
                routine_id,
                environment,
                category,
            } => format!(
                "{P_FEEDBACK}{}_{}_{}_{}",
                kind.as_str(),
                routine_id,
                category.as_str(),
                environment.as_str()
            ),
            Self::SetLanguage(l) => format!("{P_SET_LANG}{}", l.as_str()),
            Self::SetDifficulty(d) => format!("{P_SET_DIFF}{}", d.as_str()),
            fixed => FIXED
                .iter()
                .find(|(_, a)| *a == fixed)
                .map(|(token, _)| (*token).to_string())
                .unwrap_or_default(),
        }
    }

    /// Decode a callback token. Fails only for unknown action kinds, values outside the
    /// closed vocabularies, or a layout with missing segments.
    pub fn decode(token: &str) -> Result<Self, CodecError> {
        if let Some((_, action)) = FIXED.iter().find(|(t, _)| *t == token) {
            return Ok(*action);
        }

        if let Some(rest) = token.strip_prefix(P_FEEDBACK) {
            return decode_feedback(token, rest);
        }
        if let Some(rest) = token.strip_prefix(P_CONFIRM) {
            let (environment, category) = env_then_category(token, rest)?;
            return Ok(Self::ConfirmRoutine {
                environment,
                category,
            });
        }
        if let Some(rest) = token.strip_prefix(P_FINISH) {
            let parts: Vec<&str> = rest.split(SEP).collect();
            let (routine_id, middle) = parts
                .split_first()
                .ok_or_else(|| CodecError::Malformed(token.to_string()))?;
            let routine_id = parse_routine_id(routine_id)?;
            let (category, environment) = category_then_env(token, middle)?;
            return Ok(Self::FinishWorkout {
                routine_id,
                environment,
                category,
            });
        }
        if let Some(rest) = token.strip_prefix(P_NEW) {
            let parts: Vec<&str> = rest.split(SEP).collect();
            let (category, environment) = category_then_env(token, &parts)?;
            return Ok(Self::NewRoutine {
                environment,
                category,
            });
        }
        if let Some(rest) = token.strip_prefix(P_SET_LANG) {
            return Ok(Self::SetLanguage(parse_language(rest)?));
        }
        if let Some(rest) = token.strip_prefix(P_SET_DIFF) {
            let d = Difficulty::from_token(rest).ok_or_else(|| CodecError::BadValue {
                field: "difficulty",
                value: rest.to_string(),
            })?;
            return Ok(Self::SetDifficulty(d));
        }
        if let Some(rest) = token.strip_prefix(P_ROUTINE) {
            let (environment, category) = env_then_category(token, rest)?;
            return Ok(Self::SelectCategory {
                environment,
                category,
            });
        }
        if let Some(rest) = token.strip_prefix(P_WORKOUT) {
            return Ok(Self::SelectEnvironment(parse_environment(rest)?));
        }
        if let Some(rest) = token.strip_prefix(P_LANG) {
            return Ok(Self::SelectLanguage(parse_language(rest)?));
        }

        Err(CodecError::UnknownAction(token.to_string()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Action {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

fn decode_feedback(token: &str, rest: &str) -> Result<Action, CodecError> {
    let parts: Vec<&str> = rest.split(SEP).collect();
    // "perfect" / "skip" take one part, "too_easy" / "too_hard" take two.
    let (kind, used) = match parts.first().and_then(|p| FeedbackKind::from_token(p)) {
        Some(k) => (k, 1),
        None if parts.len() >= 2 => {
            let joined = format!("{}_{}", parts[0], parts[1]);
            let k = FeedbackKind::from_token(&joined).ok_or(CodecError::BadValue {
                field: "feedback",
                value: joined,
            })?;
            (k, 2)
        }
        None => return Err(CodecError::Malformed(token.to_string())),
    };
    let remaining = &parts[used..];
    let (routine_id, middle) = remaining
        .split_first()
        .ok_or_else(|| CodecError::Malformed(token.to_string()))?;
    let routine_id = parse_routine_id(routine_id)?;
    let (category, environment) = category_then_env(token, middle)?;
    Ok(Action::Feedback {
        kind,
        routine_id,
        environment,
        category,
    })
}

/// `{env}_{category...}`: environment anchored at the front.
fn env_then_category(token: &str, rest: &str) -> Result<(Environment, Category), CodecError> {
    let (env, category) = rest
        .split_once(SEP)
        .ok_or_else(|| CodecError::Malformed(token.to_string()))?;
    Ok((parse_environment(env)?, parse_category(category)?))
}

/// `{category...}_{env}`: environment anchored at the back, middle parts rejoined.
fn category_then_env(token: &str, parts: &[&str]) -> Result<(Category, Environment), CodecError> {
    let (env, middle) = parts
        .split_last()
        .ok_or_else(|| CodecError::Malformed(token.to_string()))?;
    if middle.is_empty() {
        return Err(CodecError::Malformed(token.to_string()));
    }
    let category = middle.join("_");
    Ok((parse_category(&category)?, parse_environment(env)?))
}

fn parse_routine_id(s: &str) -> Result<RoutineId, CodecError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::BadValue {
            field: "routine_id",
            value: s.to_string(),
        });
    }
    s.parse::<u64>()
        .ok()
        .map(RoutineId)
        .filter(RoutineId::is_valid)
        .ok_or_else(|| CodecError::BadValue {
            field: "routine_id",
            value: s.to_string(),
        })
}

fn parse_environment(s: &str) -> Result<Environment, CodecError> {
    Environment::from_token(s).ok_or_else(|| CodecError::BadValue {
        field: "environment",
        value: s.to_string(),
    })
}

fn parse_category(s: &str) -> Result<Category, CodecError> {
    Category::from_token(s).ok_or_else(|| CodecError::BadValue {
        field: "category",
        value: s.to_string(),
    })
}

fn parse_language(s: &str) -> Result<Language, CodecError> {
    Language::from_token(s).ok_or_else(|| CodecError::BadValue {
        field: "language",
        value: s.to_string(),
    })
}
