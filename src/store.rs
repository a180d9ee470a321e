use std::future::Future;

use thiserror::Error;

use crate::models::{Exercise, RemoteSession, SessionExerciseInput};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session `{0}` not found")]
    SessionNotFound(String),

    #[error("exercise `{0}` not found")]
    ExerciseNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Authoritative persistence for sessions and the exercise catalog.
///
/// The live session engine only talks to the store through this trait.
/// Timestamps crossing it are nanoseconds.
pub trait SessionStore: Send + Sync + 'static {
    fn fetch_session(&self, id: &str) -> impl Future<Output = StoreResult<RemoteSession>> + Send;

    fn fetch_exercise_catalog(&self) -> impl Future<Output = StoreResult<Vec<Exercise>>> + Send;

    /// `notes: None` keeps the stored notes and `exercises: None` leaves the
    /// stored exercise tree as it is.
    fn update_session(
        &self,
        id: &str,
        name: &str,
        notes: Option<&str>,
        exercises: Option<Vec<SessionExerciseInput>>,
    ) -> impl Future<Output = StoreResult<RemoteSession>> + Send;

    fn finish_session(
        &self,
        id: &str,
        finished_at: i64,
    ) -> impl Future<Output = StoreResult<RemoteSession>> + Send;

    fn add_exercise_to_session(
        &self,
        session_id: &str,
        exercise_id: &str,
    ) -> impl Future<Output = StoreResult<RemoteSession>> + Send;

    fn create_session(
        &self,
        user_id: &str,
        name: &str,
        template_id: Option<&str>,
    ) -> impl Future<Output = StoreResult<RemoteSession>> + Send;

    /// Newest first.
    fn list_sessions(&self, user_id: &str)
    -> impl Future<Output = StoreResult<Vec<RemoteSession>>> + Send;

    /// Returns whether a session was removed.
    fn delete_session(&self, id: &str) -> impl Future<Output = StoreResult<bool>> + Send;

    /// Returns `None` when an exercise with that name already exists.
    fn add_catalog_exercise(
        &self,
        name: &str,
        category: &str,
        muscle_group: &str,
    ) -> impl Future<Output = StoreResult<Option<Exercise>>> + Send;
}
