//! Sled-backed profile store. One JSON document per user under `user/{id}`;
//! every mutation is a single `update_and_fetch` swap of that document.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;

use super::{blocking, ProfileStore};
use crate::difficulty::{self, Adjustment};
use crate::error::{StoreError, StoreResult};
use crate::shared::{
    Difficulty, FeedbackEntry, FeedbackKind, Language, RoutineId, UserProfile, UserRecord,
    WorkoutRecord, DEFAULT_DIFFICULTY,
};

const PROFILES_TREE: &str = "profiles";
const USER_PREFIX: &str = "user/";

fn record_key(user_id: &str) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Fields to write on a profile. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpsert {
    pub user_id: String,
    pub first_name: Option<String>,
    pub username: Option<String>,
    pub language: Option<Language>,
    pub difficulty: Option<Difficulty>,
    /// When false, a missing profile is an error rather than created.
    pub create_if_missing: bool,
}

impl ProfileUpsert {
    /// Create-or-update, as done when the user picks a language on first contact.
    pub fn create(user_id: impl Into<String>, language: Language) -> Self {
        Self {
            user_id: user_id.into(),
            language: Some(language),
            create_if_missing: true,
            ..Default::default()
        }
    }

    /// Update an existing profile only.
    pub fn update(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    fn apply(&self, current: Option<UserRecord>) -> StoreResult<UserRecord> {
        let mut record = match current {
            Some(r) => r,
            None if self.create_if_missing => UserRecord {
                profile: UserProfile {
                    user_id: self.user_id.clone(),
                    first_name: String::new(),
                    username: None,
                    language: Language::default(),
                    difficulty: DEFAULT_DIFFICULTY,
                    created_at: Utc::now(),
                },
                history: Vec::new(),
            },
            None => return Err(StoreError::NotFound(self.user_id.clone())),
        };
        let p = &mut record.profile;
        if let Some(name) = &self.first_name {
            p.first_name = name.clone();
        }
        if self.username.is_some() {
            p.username = self.username.clone();
        }
        if let Some(l) = self.language {
            p.language = l;
        }
        if let Some(d) = self.difficulty {
            p.difficulty = d;
        }
        Ok(record)
    }
}

/// Result of [`ProfileStore::complete_workout`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutOutcome {
    pub record: UserRecord,
    /// Stored level the adjustment started from.
    pub previous: Difficulty,
    pub adjustment: Adjustment,
    /// The routine was already in the history; nothing was written.
    pub duplicate: bool,
}

/// Profiles and histories in the `profiles` tree of a sled database.
#[derive(Clone)]
pub struct SledProfileStore {
    tree: sled::Tree,
}

impl SledProfileStore {
    pub fn open_path<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    /// Share an already opened database (the catalog lives in the same one).
    pub fn from_db(db: &sled::Db) -> StoreResult<Self> {
        Ok(Self {
            tree: db.open_tree(PROFILES_TREE)?,
        })
    }

    pub fn count(&self) -> usize {
        self.tree.len()
    }

    fn load(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        match self.tree.get(record_key(user_id))? {
            Some(bytes) => Ok(Some(UserRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Atomic read-modify-write of one user document. `f` may run more than once under
    /// contention; when it fails the stored bytes are left as they were.
    fn mutate<F>(&self, user_id: &str, mut f: F) -> StoreResult<UserRecord>
    where
        F: FnMut(Option<UserRecord>) -> StoreResult<UserRecord>,
    {
        let mut failure: Option<StoreError> = None;
        let updated = self
            .tree
            .update_and_fetch(record_key(user_id), |old: Option<&[u8]>| {
                failure = None;
                let current = match old.map(UserRecord::from_bytes).transpose() {
                    Ok(c) => c,
                    Err(e) => {
                        failure = Some(e.into());
                        return old.map(<[u8]>::to_vec);
                    }
                };
                match f(current).and_then(|r| r.to_bytes().map_err(StoreError::from)) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        failure = Some(e);
                        old.map(<[u8]>::to_vec)
                    }
                }
            })?;

        if let Some(e) = failure {
            return Err(e);
        }
        let bytes = updated.ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        Ok(UserRecord::from_bytes(&bytes)?)
    }

    /// Append, attach and adjust inside one swap of the user document.
    fn complete(
        &self,
        user_id: &str,
        routine_id: RoutineId,
        workout: WorkoutRecord,
        kind: FeedbackKind,
    ) -> StoreResult<WorkoutOutcome> {
        let mut decided = (DEFAULT_DIFFICULTY, Adjustment::Unchanged, false);
        let record = self.mutate(user_id, |current| {
            let mut record = current.ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
            let previous = record.profile.difficulty;
            if record.history.iter().any(|w| w.routine_id == Some(routine_id)) {
                decided = (previous, Adjustment::Unchanged, true);
                return Ok(record);
            }

            let mut logged = workout.clone();
            logged.difficulty = previous;
            logged.routine_id = Some(routine_id);
            logged.feedback = kind.as_feedback().map(|f| FeedbackEntry::now(f, routine_id));
            record.history.push(logged);

            let adjustment = if kind == FeedbackKind::Skip {
                Adjustment::Unchanged
            } else {
                let window = difficulty::preceding_window(&record.history);
                difficulty::classify(previous, &window, kind)
            };
            if let Adjustment::Raised(next) | Adjustment::Lowered(next) = adjustment {
                record.profile.difficulty = next;
            }
            decided = (previous, adjustment, false);
            Ok(record)
        })?;

        let (previous, adjustment, duplicate) = decided;
        Ok(WorkoutOutcome {
            record,
            previous,
            adjustment,
            duplicate,
        })
    }
}

#[async_trait]
impl ProfileStore for SledProfileStore {
    async fn get_record(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        let store = self.clone();
        let user_id = user_id.to_string();
        blocking(move || store.load(&user_id)).await
    }

    async fn upsert_profile(&self, upsert: &ProfileUpsert) -> StoreResult<UserProfile> {
        let store = self.clone();
        let upsert = upsert.clone();
        let record = blocking(move || store.mutate(&upsert.user_id, |current| upsert.apply(current))).await?;
        tracing::debug!(
            target: "gymbot::store",
            user_id = %record.profile.user_id,
            language = record.profile.language.as_str(),
            difficulty = record.profile.difficulty.as_str(),
            "Profile upserted"
        );
        Ok(record.profile)
    }

    async fn append_workout(
        &self,
        user_id: &str,
        workout: WorkoutRecord,
    ) -> StoreResult<UserRecord> {
        let store = self.clone();
        let id = user_id.to_string();
        let (category, environment) = (workout.category, workout.environment);
        let record = blocking(move || {
            store.mutate(&id, |current| {
                let mut record = current.ok_or_else(|| StoreError::NotFound(id.clone()))?;
                record.history.push(workout.clone());
                Ok(record)
            })
        })
        .await?;
        tracing::info!(
            target: "gymbot::store",
            user_id,
            category = category.as_str(),
            environment = environment.as_str(),
            total = record.history.len(),
            "Workout appended"
        );
        Ok(record)
    }

    async fn attach_feedback(
        &self,
        user_id: &str,
        entry: FeedbackEntry,
    ) -> StoreResult<UserRecord> {
        let store = self.clone();
        let id = user_id.to_string();
        blocking(move || {
            store.mutate(&id, |current| {
                let mut record = current.ok_or_else(|| StoreError::NotFound(id.clone()))?;
                let last = record
                    .history
                    .last_mut()
                    .ok_or_else(|| StoreError::NoWorkout(id.clone()))?;
                if last.feedback.is_some() {
                    return Err(StoreError::FeedbackAlreadySet(id.clone()));
                }
                last.feedback = Some(entry.clone());
                Ok(record)
            })
        })
        .await
    }

    async fn complete_workout(
        &self,
        user_id: &str,
        routine_id: RoutineId,
        workout: WorkoutRecord,
        kind: FeedbackKind,
    ) -> StoreResult<WorkoutOutcome> {
        let store = self.clone();
        let id = user_id.to_string();
        let outcome = blocking(move || store.complete(&id, routine_id, workout, kind)).await?;
        tracing::info!(
            target: "gymbot::store",
            user_id,
            %routine_id,
            feedback = kind.as_str(),
            duplicate = outcome.duplicate,
            total = outcome.record.history.len(),
            "Workout completed"
        );
        Ok(outcome)
    }

    async fn clear_history(&self, user_id: &str) -> StoreResult<usize> {
        let store = self.clone();
        let id = user_id.to_string();
        let removed = blocking(move || {
            let mut removed = 0;
            store.mutate(&id, |current| {
                let mut record = current.ok_or_else(|| StoreError::NotFound(id.clone()))?;
                removed = record.history.len();
                record.history.clear();
                Ok(record)
            })?;
            Ok(removed)
        })
        .await?;
        tracing::info!(target: "gymbot::store", user_id, removed, "History cleared");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{Category, Environment, Feedback, RoutineId};

    fn open() -> (tempfile::TempDir, SledProfileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SledProfileStore::open_path(dir.path()).unwrap();
        (dir, store)
    }

    fn workout() -> WorkoutRecord {
        WorkoutRecord::now(
            Category::Core,
            Environment::Home,
            Difficulty::Intermediate,
            vec!["Plank".to_string()],
        )
    }

    #[tokio::test]
    async fn update_without_create_reports_missing_profile() {
        let (_dir, store) = open();
        let err = store
            .upsert_profile(&ProfileUpsert::update("42").language(Language::Es))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "42"));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn create_starts_at_intermediate_and_keeps_history_on_update() {
        let (_dir, store) = open();
        let p = store
            .upsert_profile(&ProfileUpsert::create("7", Language::Es).first_name("Ana"))
            .await
            .unwrap();
        assert_eq!(p.difficulty, Difficulty::Intermediate);
        assert_eq!(p.first_name, "Ana");

        store.append_workout("7", workout()).await.unwrap();
        let p = store
            .upsert_profile(&ProfileUpsert::update("7").difficulty(Difficulty::Advanced))
            .await
            .unwrap();
        assert_eq!(p.difficulty, Difficulty::Advanced);
        assert_eq!(p.language, Language::Es);
        assert_eq!(p.first_name, "Ana");

        let record = store.get_record("7").await.unwrap().unwrap();
        assert_eq!(record.history.len(), 1);
    }

    #[tokio::test]
    async fn feedback_attaches_once_to_latest() {
        let (_dir, store) = open();
        store
            .upsert_profile(&ProfileUpsert::create("1", Language::En))
            .await
            .unwrap();

        let err = store
            .attach_feedback("1", FeedbackEntry::now(Feedback::Perfect, RoutineId(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NoWorkout(_)));

        store.append_workout("1", workout()).await.unwrap();
        store.append_workout("1", workout()).await.unwrap();
        let record = store
            .attach_feedback("1", FeedbackEntry::now(Feedback::TooHard, RoutineId(2)))
            .await
            .unwrap();
        assert_eq!(record.history[0].feedback, None);
        assert_eq!(record.history[1].feedback_kind(), Some(Feedback::TooHard));

        let err = store
            .attach_feedback("1", FeedbackEntry::now(Feedback::TooEasy, RoutineId(2)))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::FeedbackAlreadySet(_)));
        let record = store.get_record("1").await.unwrap().unwrap();
        assert_eq!(record.history[1].feedback_kind(), Some(Feedback::TooHard));
    }

    #[tokio::test]
    async fn completing_a_workout_is_one_update() {
        let (_dir, store) = open();
        store
            .upsert_profile(&ProfileUpsert::create("3", Language::En))
            .await
            .unwrap();

        let err = store
            .complete_workout("nobody", RoutineId(1), workout(), FeedbackKind::TooEasy)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        for id in 1..=2 {
            let outcome = store
                .complete_workout("3", RoutineId(id), workout(), FeedbackKind::TooEasy)
                .await
                .unwrap();
            assert_eq!(outcome.adjustment, Adjustment::Unchanged);
        }
        let outcome = store
            .complete_workout("3", RoutineId(3), workout(), FeedbackKind::TooEasy)
            .await
            .unwrap();
        assert_eq!(outcome.previous, Difficulty::Intermediate);
        assert_eq!(outcome.adjustment, Adjustment::Raised(Difficulty::Advanced));
        assert!(!outcome.duplicate);

        let record = store.get_record("3").await.unwrap().unwrap();
        assert_eq!(record.profile.difficulty, Difficulty::Advanced);
        assert_eq!(record.history.len(), 3);
        let last = record.history.last().unwrap();
        assert_eq!(last.routine_id, Some(RoutineId(3)));
        assert_eq!(last.feedback_kind(), Some(Feedback::TooEasy));
        assert_eq!(last.difficulty, Difficulty::Intermediate);
    }

    #[tokio::test]
    async fn same_routine_is_recorded_once() {
        let (_dir, store) = open();
        store
            .upsert_profile(&ProfileUpsert::create("4", Language::En))
            .await
            .unwrap();

        let first = store
            .complete_workout("4", RoutineId(77), workout(), FeedbackKind::Skip)
            .await
            .unwrap();
        assert!(!first.duplicate);
        assert_eq!(first.record.history[0].feedback, None);

        let again = store
            .complete_workout("4", RoutineId(77), workout(), FeedbackKind::TooHard)
            .await
            .unwrap();
        assert!(again.duplicate);
        assert_eq!(again.record.history.len(), 1);
        assert_eq!(again.record.history[0].feedback, None);
    }

    #[tokio::test]
    async fn adjustment_starts_from_the_stored_level() {
        let (_dir, store) = open();
        store
            .upsert_profile(&ProfileUpsert::create("5", Language::En))
            .await
            .unwrap();
        for id in 1..=2 {
            store
                .complete_workout("5", RoutineId(id), workout(), FeedbackKind::TooHard)
                .await
                .unwrap();
        }
        // Level changed elsewhere between reading the profile and submitting feedback.
        store
            .upsert_profile(&ProfileUpsert::update("5").difficulty(Difficulty::Beginner))
            .await
            .unwrap();

        let outcome = store
            .complete_workout("5", RoutineId(3), workout(), FeedbackKind::TooHard)
            .await
            .unwrap();
        assert_eq!(outcome.previous, Difficulty::Beginner);
        assert_eq!(outcome.adjustment, Adjustment::AtMinimum);
        assert_eq!(outcome.record.profile.difficulty, Difficulty::Beginner);
    }

    #[tokio::test]
    async fn clear_history_reports_removed_count() {
        let (_dir, store) = open();
        store
            .upsert_profile(&ProfileUpsert::create("9", Language::En))
            .await
            .unwrap();
        for _ in 0..3 {
            store.append_workout("9", workout()).await.unwrap();
        }
        assert_eq!(store.clear_history("9").await.unwrap(), 3);
        assert_eq!(store.clear_history("9").await.unwrap(), 0);
        assert!(store.get_profile("9").await.unwrap().is_some());
    }
}
