//! Storage collaborators: the durable profile store and the exercise catalog.
//!
//! Both are async traits so the dialog engine can be driven against sled in
//! production and against in-memory doubles in tests.

pub mod catalog;
pub mod profile;
pub mod stats;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::shared::{FeedbackEntry, FeedbackKind, RoutineId, UserProfile, UserRecord, WorkoutRecord};

pub use catalog::{
    default_catalog, parse_catalog, CatalogEnvironment, CatalogStat, Exercise, ExerciseQuery,
    LocalizedList, LocalizedText, MemoryCatalog, Prescription, Prescriptions, SeedReport,
    SledCatalog,
};
pub use profile::{ProfileUpsert, SledProfileStore, WorkoutOutcome};
pub use stats::{FeedbackCounts, UserStats};

/// Query over the catalog. Every filter is optional.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find(&self, query: &ExerciseQuery) -> StoreResult<Vec<Exercise>>;
}

/// Durable per-user record: profile plus append-only workout history.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_record(&self, user_id: &str) -> StoreResult<Option<UserRecord>>;

    async fn get_profile(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        Ok(self.get_record(user_id).await?.map(|r| r.profile))
    }

    /// Create or update a profile. Fails with `NotFound` when the profile is missing
    /// and the upsert does not allow creation.
    async fn upsert_profile(&self, upsert: &ProfileUpsert) -> StoreResult<UserProfile>;

    /// Append one workout; returns the updated record.
    async fn append_workout(&self, user_id: &str, workout: WorkoutRecord)
        -> StoreResult<UserRecord>;

    /// Attach feedback to the most recent workout. Feedback is written once.
    async fn attach_feedback(&self, user_id: &str, entry: FeedbackEntry)
        -> StoreResult<UserRecord>;

    /// Record a finished workout in one atomic update: append it tagged with
    /// `routine_id`, attach the feedback unless `kind` is skip, and apply the
    /// difficulty adjustment computed from the stored level. A routine id already
    /// present in the history is not recorded twice.
    async fn complete_workout(
        &self,
        user_id: &str,
        routine_id: RoutineId,
        workout: WorkoutRecord,
        kind: FeedbackKind,
    ) -> StoreResult<WorkoutOutcome>;

    /// Empty the history irreversibly; returns how many workouts were removed.
    async fn clear_history(&self, user_id: &str) -> StoreResult<usize>;

    async fn user_stats(&self, user_id: &str) -> StoreResult<Option<UserStats>> {
        Ok(self
            .get_record(user_id)
            .await?
            .map(|r| UserStats::from_history(&r.history, chrono::Utc::now().date_naive())))
    }
}

/// Bound a store call; expiry is reported as a transient `StoreError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit.as_millis() as u64)),
    }
}

/// Run synchronous store work on the blocking pool so a surrounding
/// [`with_timeout`] can fire while it is still in progress.
pub(crate) async fn blocking<T, F>(work: F) -> StoreResult<T>
where
    F: FnOnce() -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result,
        Err(e) => Err(StoreError::Worker(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn timeout_is_reported_as_store_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, StoreError>(1)
        };
        let err = with_timeout(Duration::from_millis(10), slow)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(10)));
        assert!(err.is_transient());

        let fast = async { Ok::<_, StoreError>(2) };
        assert_eq!(with_timeout(Duration::from_secs(1), fast).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn timeout_fires_while_blocking_work_runs() {
        // Current-thread runtime: the timer only gets a chance because the work
        // is off the async worker.
        let slow = blocking(|| {
            std::thread::sleep(Duration::from_millis(300));
            Ok::<_, StoreError>(1)
        });
        let err = with_timeout(Duration::from_millis(20), slow)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout(20)));

        let quick = blocking(|| Ok::<_, StoreError>(3));
        assert_eq!(with_timeout(Duration::from_secs(1), quick).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn panicking_work_is_a_transient_error() {
        let err = blocking::<u8, _>(|| panic!("boom")).await.unwrap_err();
        assert!(matches!(err, StoreError::Worker(_)));
        assert!(err.is_transient());
    }
}
