use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    autosave::{self, Autosave, SharedSession},
    live::{LiveError, LiveSession, SetField},
    metrics::{personal_record_count, total_volume},
    models::{Exercise, RemoteSession},
    reports::previous_bests,
    rest_timer::RestTimer,
    store::{SessionStore, StoreError},
    types::Settings,
    utils::{millis_to_nanos, now_millis},
};

#[derive(Debug, Error)]
pub enum WorkoutError {
    #[error("no workout session is loaded")]
    NoSession,

    #[error("exercise `{0}` is not in the catalog")]
    UnknownExercise(String),

    #[error(transparent)]
    Live(#[from] LiveError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Figures shown while the workout runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub session_id: Option<String>,
    pub name: String,
    pub elapsed_secs: i64,
    pub volume: f64,
    pub pr_count: usize,
    pub rest_timer: Option<RestTimer>,
    pub dirty: bool,
}

/// Owner of one in-progress workout: the live model, the store it syncs
/// with and the autosave scheduled on its behalf. Dropping it cancels any
/// pending autosave.
pub struct Workout<S: SessionStore> {
    store: Arc<S>,
    session: SharedSession,
    autosave: Autosave<S>,
    catalog: Vec<Exercise>,
    bests: HashMap<String, String>,
}

impl<S: SessionStore> Workout<S> {
    pub fn new(store: Arc<S>, settings: &Settings) -> Self {
        let session: SharedSession = Arc::new(Mutex::new(LiveSession::new(settings.rest_secs)));
        let autosave = Autosave::new(
            Arc::clone(&store),
            Arc::clone(&session),
            settings.autosave_delay,
        );

        Self {
            store,
            session,
            autosave,
            catalog: Vec::new(),
            bests: HashMap::new(),
        }
    }

    pub fn snapshot(&self) -> LiveSession {
        self.session.lock().clone()
    }

    pub fn catalog(&self) -> &[Exercise] {
        &self.catalog
    }

    pub fn autosave_armed(&self) -> bool {
        self.autosave.is_armed()
    }

    fn current_id(&self) -> Result<String, WorkoutError> {
        self.session
            .lock()
            .session_id()
            .map(str::to_owned)
            .ok_or(WorkoutError::NoSession)
    }

    /// Loads `session_id`, dropping whatever workout was open before.
    pub async fn open(&mut self, session_id: &str) -> Result<(), WorkoutError> {
        let switching = self.session.lock().session_id() != Some(session_id);
        if switching {
            self.autosave.disarm();
            self.session.lock().reset();
            self.bests.clear();
        }

        self.catalog = self.store.fetch_exercise_catalog().await?;
        let remote = self.store.fetch_session(session_id).await?;

        match self.store.list_sessions(&remote.user_id).await {
            Ok(history) => self.bests = previous_bests(&history, &remote.id),
            Err(err) => debug!(%err, "no history for previous bests"),
        }

        let mut live = self.session.lock();
        if live.session_id().is_some_and(|id| id != remote.id) {
            debug!(session = %remote.id, "ignoring response for a workout no longer shown");
            return Ok(());
        }
        live.load(&remote, &self.catalog);
        live.apply_previous_bests(&self.bests);
        Ok(())
    }

    /// Refetches the open session and merges it.
    pub async fn refresh(&mut self) -> Result<(), WorkoutError> {
        let id = self.current_id()?;
        let remote = self.store.fetch_session(&id).await?;
        self.merge(&remote);
        Ok(())
    }

    fn merge(&mut self, remote: &RemoteSession) {
        {
            let mut live = self.session.lock();
            if live.session_id() != Some(remote.id.as_str()) {
                debug!(session = %remote.id, "ignoring stale session response");
                return;
            }
            live.load(remote, &self.catalog);
            live.apply_previous_bests(&self.bests);
        }
        self.autosave.arm();
    }

    pub fn set_weight(&mut self, exercise: usize, set: usize, raw: &str) -> Result<(), WorkoutError> {
        self.session
            .lock()
            .mutate_set_field(exercise, set, SetField::Weight, raw)?;
        self.autosave.arm();
        Ok(())
    }

    pub fn set_reps(&mut self, exercise: usize, set: usize, raw: &str) -> Result<(), WorkoutError> {
        self.session
            .lock()
            .mutate_set_field(exercise, set, SetField::Reps, raw)?;
        self.autosave.arm();
        Ok(())
    }

    /// Returns whether the set is completed now.
    pub fn toggle_set(&mut self, exercise: usize, set: usize) -> Result<bool, WorkoutError> {
        let completed = self.session.lock().toggle_set_completion(exercise, set)?;
        self.autosave.arm();
        Ok(completed)
    }

    pub fn add_set(&mut self, exercise: usize) -> Result<(), WorkoutError> {
        self.session.lock().add_set(exercise)?;
        self.autosave.arm();
        Ok(())
    }

    pub fn rename(&mut self, name: &str) {
        self.session.lock().update_name(name);
        self.autosave.arm();
    }

    /// Inserts the exercise locally, then asks the store to add it. A failed
    /// request takes the local insert back out.
    pub async fn add_exercise(&mut self, exercise_id: &str) -> Result<(), WorkoutError> {
        let session_id = self.current_id()?;
        let exercise = self
            .catalog
            .iter()
            .find(|e| e.id == exercise_id)
            .cloned()
            .ok_or_else(|| WorkoutError::UnknownExercise(exercise_id.to_string()))?;

        let (local_id, was_dirty, revision) = {
            let mut live = self.session.lock();
            let was_dirty = live.is_dirty();
            let id = live.add_exercise(&exercise);
            (id, was_dirty, live.revision())
        };

        match self
            .store
            .add_exercise_to_session(&session_id, &exercise.id)
            .await
        {
            Ok(remote) => {
                {
                    let mut live = self.session.lock();
                    // Nothing but the insert changed, so the store's copy is
                    // the whole truth.
                    if !was_dirty && live.revision() == revision {
                        live.mark_clean();
                    }
                }
                self.merge(&remote);
                Ok(())
            }
            Err(err) => {
                let mut live = self.session.lock();
                if live.session_id() == Some(session_id.as_str()) {
                    live.revert_exercise(&local_id, was_dirty, revision);
                }
                Err(err.into())
            }
        }
    }

    /// Persists the current state right away.
    pub async fn save(&mut self) -> Result<(), WorkoutError> {
        self.current_id()?;
        autosave::flush(self.store.as_ref(), &self.session).await?;
        Ok(())
    }

    /// Final flush, then marks the session finished and resets the model.
    /// On failure the model is left as it was.
    pub async fn finish(&mut self) -> Result<RemoteSession, WorkoutError> {
        let id = self.current_id()?;
        self.autosave.disarm();

        let result = self.finish_session(&id).await;
        match &result {
            Ok(_) => {
                self.session.lock().reset();
                self.bests.clear();
            }
            Err(_) => self.autosave.arm(),
        }
        result
    }

    async fn finish_session(&self, id: &str) -> Result<RemoteSession, WorkoutError> {
        autosave::flush(self.store.as_ref(), &self.session).await?;
        let finished = self
            .store
            .finish_session(id, millis_to_nanos(now_millis()))
            .await?;
        Ok(finished)
    }

    pub fn tick_rest_timer(&self) {
        self.session.lock().tick_rest_timer();
    }

    pub fn dismiss_rest_timer(&self) {
        self.session.lock().dismiss_rest_timer();
    }

    pub fn rest_timer(&self) -> Option<RestTimer> {
        self.session.lock().rest_timer()
    }

    pub fn summary(&self, now_ms: i64) -> WorkoutSummary {
        let live = self.session.lock();
        WorkoutSummary {
            session_id: live.session_id().map(str::to_owned),
            name: live.name().to_owned(),
            elapsed_secs: live.elapsed_secs(now_ms),
            volume: total_volume(live.exercises()),
            pr_count: personal_record_count(live.exercises()),
            rest_timer: live.rest_timer(),
            dirty: live.is_dirty(),
        }
    }
}
