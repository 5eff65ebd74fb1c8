//! Shared domain types: language, difficulty, environment, category, feedback,
//! and the durable user record (profile + workout history).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default difficulty assigned to a freshly created profile.
pub const DEFAULT_DIFFICULTY: Difficulty = Difficulty::Intermediate;

/// Interface language of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub const ALL: [Self; 2] = [Self::En, Self::Es];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Per-user training level. Totally ordered: beginner < intermediate < advanced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// One level up; saturates at `Advanced`.
    pub fn harder(self) -> Self {
        match self {
            Self::Beginner => Self::Intermediate,
            Self::Intermediate | Self::Advanced => Self::Advanced,
        }
    }

    /// One level down; saturates at `Beginner`.
    pub fn easier(self) -> Self {
        match self {
            Self::Advanced => Self::Intermediate,
            Self::Intermediate | Self::Beginner => Self::Beginner,
        }
    }
}

/// Where the user trains today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Gym,
    Home,
}

impl Environment {
    pub const ALL: [Self; 2] = [Self::Gym, Self::Home];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gym => "gym",
            Self::Home => "home",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        match s {
            "gym" => Some(Self::Gym),
            "home" => Some(Self::Home),
            _ => None,
        }
    }
}

/// Muscle-group category. Closed set of seven; `FullBody` is the aggregate category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FullBody,
    ChestBiceps,
    BackTriceps,
    LegsShoulders,
    Core,
    Cardio,
    Yoga,
}

impl Category {
    pub const ALL: [Self; 7] = [
        Self::FullBody,
        Self::ChestBiceps,
        Self::BackTriceps,
        Self::LegsShoulders,
        Self::Core,
        Self::Cardio,
        Self::Yoga,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullBody => "full_body",
            Self::ChestBiceps => "chest_biceps",
            Self::BackTriceps => "back_triceps",
            Self::LegsShoulders => "legs_shoulders",
            Self::Core => "core",
            Self::Cardio => "cardio",
            Self::Yoga => "yoga",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

/// Feedback stored on a workout record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    TooEasy,
    Perfect,
    TooHard,
}

impl Feedback {
    pub const ALL: [Self; 3] = [Self::TooEasy, Self::Perfect, Self::TooHard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooEasy => "too_easy",
            Self::Perfect => "perfect",
            Self::TooHard => "too_hard",
        }
    }
}

/// Feedback choice offered after a workout. `Skip` records the workout without feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    TooEasy,
    Perfect,
    TooHard,
    Skip,
}

impl FeedbackKind {
    pub const ALL: [Self; 4] = [Self::TooEasy, Self::Perfect, Self::TooHard, Self::Skip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooEasy => "too_easy",
            Self::Perfect => "perfect",
            Self::TooHard => "too_hard",
            Self::Skip => "skip",
        }
    }

    pub fn from_token(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// The stored feedback value, or `None` for `Skip`.
    pub fn as_feedback(&self) -> Option<Feedback> {
        match self {
            Self::TooEasy => Some(Feedback::TooEasy),
            Self::Perfect => Some(Feedback::Perfect),
            Self::TooHard => Some(Feedback::TooHard),
            Self::Skip => None,
        }
    }
}

/// Identifier of a generated routine: generation time in epoch milliseconds.
/// Informational only; never used as a cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutineId(pub u64);

impl RoutineId {
    /// Largest id the action codec carries: 13 digits, epoch milliseconds until
    /// the year 2286. Tokens built from ids above it exceed the callback limit and
    /// are rejected on decode.
    pub const MAX: RoutineId = RoutineId(9_999_999_999_999);

    pub fn now() -> Self {
        Self((Utc::now().timestamp_millis().max(0) as u64).min(Self::MAX.0))
    }

    pub fn is_valid(&self) -> bool {
        self.0 <= Self::MAX.0
    }
}

impl std::fmt::Display for RoutineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable profile attributes for one chat user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
}

/// Feedback attached to a workout record, once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub kind: Feedback,
    pub routine_id: RoutineId,
    pub submitted_at: DateTime<Utc>,
}

impl FeedbackEntry {
    pub fn now(kind: Feedback, routine_id: RoutineId) -> Self {
        Self {
            kind,
            routine_id,
            submitted_at: Utc::now(),
        }
    }
}

/// One completed workout. Insertion order in the history is chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub category: Category,
    pub environment: Environment,
    /// Difficulty at the time of the workout.
    pub difficulty: Difficulty,
    #[serde(default)]
    pub exercises: Vec<String>,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<FeedbackEntry>,
    /// Routine the workout was logged from; a second submission for it is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routine_id: Option<RoutineId>,
}

impl WorkoutRecord {
    pub fn now(
        category: Category,
        environment: Environment,
        difficulty: Difficulty,
        exercises: Vec<String>,
    ) -> Self {
        Self {
            category,
            environment,
            difficulty,
            exercises,
            completed_at: Utc::now(),
            feedback: None,
            routine_id: None,
        }
    }

    pub fn feedback_kind(&self) -> Option<Feedback> {
        self.feedback.as_ref().map(|f| f.kind)
    }
}

/// The whole durable document for one user: profile plus append-only history.
/// Stored as a single JSON value so every mutation is one atomic swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub profile: UserProfile,
    #[serde(default)]
    pub history: Vec<WorkoutRecord>,
}

impl UserRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn last_workout(&self) -> Option<&WorkoutRecord> {
        self.history.last()
    }
}
