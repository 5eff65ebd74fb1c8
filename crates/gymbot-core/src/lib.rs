//! GymBot core library.
//! Action codec, dialog engine, routine generator, adaptive difficulty and the
//! sled-backed profile and catalog stores.

pub mod codec;
pub mod config;
pub mod dialog;
pub mod difficulty;
pub mod error;
pub mod routine;
pub mod session;
pub mod shared;
pub mod store;

pub use codec::{Action, MAX_TOKEN_LEN};
pub use config::GymBotConfig;
pub use dialog::{Choice, DialogEngine, DialogState, Event, Inbound, Screen};
pub use difficulty::{adjust, Adjustment, FEEDBACK_WINDOW};
pub use error::{CodecError, DialogError, RoutineError, StoreError, StoreResult};
pub use routine::{RoutineEntry, RoutineGenerator, RoutineInstance};
pub use session::{Session, SessionStore};
pub use shared::{
    Category, Difficulty, Environment, Feedback, FeedbackEntry, FeedbackKind, Language,
    RoutineId, UserProfile, UserRecord, WorkoutRecord,
};
pub use store::{
    CatalogStore, Exercise, ExerciseQuery, ProfileStore, ProfileUpsert, SledCatalog,
    SledProfileStore, UserStats,
};

/// Open both stores over one sled database.
pub fn open_stores<P: AsRef<std::path::Path>>(
    path: P,
) -> StoreResult<(SledProfileStore, SledCatalog)> {
    let db = sled::open(path)?;
    Ok((SledProfileStore::from_db(&db)?, SledCatalog::from_db(&db)?))
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
