#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use repsy::{
    models::{
        Exercise, RemoteSession, RemoteSessionExercise, RemoteWorkoutSet, SessionExerciseInput,
    },
    store::{SessionStore, StoreError, StoreResult},
};
use uuid::Uuid;

pub const STARTED_AT: i64 = 1_700_000_000_000_000_000;

/// In-memory store that records what the engine sends it.
#[derive(Default)]
pub struct FakeStore {
    pub sessions: Mutex<HashMap<String, RemoteSession>>,
    pub catalog: Vec<Exercise>,
    pub updates: Mutex<Vec<Update>>,
    pub finished: Mutex<Vec<String>>,
    pub fail_updates: AtomicBool,
    pub fail_adds: AtomicBool,
    pub write_delay: Mutex<Duration>,
}

#[derive(Debug, Clone)]
pub struct Update {
    pub id: String,
    pub name: String,
    pub exercises: Option<Vec<SessionExerciseInput>>,
}

fn exercise(id: &str, name: &str, muscle: &str) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        category: "barbell".into(),
        muscle_group: muscle.into(),
    }
}

fn empty_set(n: u32) -> RemoteWorkoutSet {
    RemoteWorkoutSet {
        id: Uuid::new_v4().to_string(),
        set_number: n,
        weight: None,
        reps: None,
        completed: false,
        is_pr: false,
    }
}

pub fn session(id: &str, name: &str) -> RemoteSession {
    RemoteSession {
        id: id.into(),
        user_id: "local".into(),
        name: name.into(),
        template_id: None,
        started_at: STARTED_AT,
        finished_at: None,
        duration_seconds: None,
        total_volume: 0.0,
        pr_count: 0,
        notes: None,
        exercises: vec![RemoteSessionExercise {
            id: format!("{id}-bench"),
            exercise_id: "bench".into(),
            order: 0,
            sets: vec![empty_set(1), empty_set(2)],
        }],
    }
}

impl FakeStore {
    /// Catalog of bench and squat, plus sessions `s1` ("Push") and
    /// `s2` ("Legs"), each holding one bench slot with two empty sets.
    pub fn seeded() -> Arc<Self> {
        let store = Self {
            catalog: vec![
                exercise("bench", "Bench Press", "chest"),
                exercise("squat", "Back Squat", "quads"),
            ],
            ..Default::default()
        };
        {
            let mut sessions = store.sessions.lock();
            sessions.insert("s1".into(), session("s1", "Push"));
            sessions.insert("s2".into(), session("s2", "Legs"));
        }
        Arc::new(store)
    }

    pub fn update_count(&self) -> usize {
        self.updates.lock().len()
    }

    pub fn last_update(&self) -> Option<Update> {
        self.updates.lock().last().cloned()
    }

    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Makes every `update_session` take `delay` before it lands.
    pub fn slow_writes(&self, delay: Duration) {
        *self.write_delay.lock() = delay;
    }

    pub fn fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    fn get(&self, id: &str) -> StoreResult<RemoteSession> {
        self.sessions
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))
    }
}

fn offline() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

impl SessionStore for FakeStore {
    async fn fetch_session(&self, id: &str) -> StoreResult<RemoteSession> {
        self.get(id)
    }

    async fn fetch_exercise_catalog(&self) -> StoreResult<Vec<Exercise>> {
        Ok(self.catalog.clone())
    }

    async fn update_session(
        &self,
        id: &str,
        name: &str,
        _notes: Option<&str>,
        exercises: Option<Vec<SessionExerciseInput>>,
    ) -> StoreResult<RemoteSession> {
        self.updates.lock().push(Update {
            id: id.into(),
            name: name.into(),
            exercises: exercises.clone(),
        });
        let delay = *self.write_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(offline());
        }

        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        session.name = name.into();
        if let Some(exercises) = exercises {
            let previous = std::mem::take(&mut session.exercises);
            session.exercises = exercises
                .into_iter()
                .enumerate()
                .map(|(idx, ex)| {
                    let slot_id = previous
                        .get(idx)
                        .filter(|p| p.exercise_id == ex.exercise_id)
                        .map(|p| p.id.clone())
                        .unwrap_or_else(|| Uuid::new_v4().to_string());
                    RemoteSessionExercise {
                        id: slot_id,
                        exercise_id: ex.exercise_id,
                        order: ex.order,
                        sets: ex
                            .sets
                            .into_iter()
                            .map(|s| RemoteWorkoutSet {
                                id: Uuid::new_v4().to_string(),
                                set_number: s.set_number,
                                weight: s.weight,
                                reps: s.reps,
                                completed: s.completed,
                                is_pr: false,
                            })
                            .collect(),
                    }
                })
                .collect();
        }
        Ok(session.clone())
    }

    async fn finish_session(&self, id: &str, finished_at: i64) -> StoreResult<RemoteSession> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;
        if session.finished_at.is_none() {
            session.finished_at = Some(finished_at);
            session.duration_seconds = Some((finished_at - session.started_at) / 1_000_000_000);
            self.finished.lock().push(id.into());
        }
        Ok(session.clone())
    }

    async fn add_exercise_to_session(
        &self,
        session_id: &str,
        exercise_id: &str,
    ) -> StoreResult<RemoteSession> {
        if self.fail_adds.load(Ordering::SeqCst) {
            return Err(offline());
        }
        if !self.catalog.iter().any(|e| e.id == exercise_id) {
            return Err(StoreError::ExerciseNotFound(exercise_id.to_string()));
        }

        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        let order = session.exercises.len() as u32;
        session.exercises.push(RemoteSessionExercise {
            id: Uuid::new_v4().to_string(),
            exercise_id: exercise_id.into(),
            order,
            sets: vec![empty_set(1)],
        });
        Ok(session.clone())
    }

    async fn create_session(
        &self,
        user_id: &str,
        name: &str,
        template_id: Option<&str>,
    ) -> StoreResult<RemoteSession> {
        let mut created = session(&Uuid::new_v4().to_string(), name);
        created.user_id = user_id.into();
        created.template_id = template_id.map(str::to_owned);
        created.exercises.clear();
        self.sessions.lock().insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<RemoteSession>> {
        let mut list: Vec<_> = self
            .sessions
            .lock()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(list)
    }

    async fn delete_session(&self, id: &str) -> StoreResult<bool> {
        Ok(self.sessions.lock().remove(id).is_some())
    }

    async fn add_catalog_exercise(
        &self,
        _name: &str,
        _category: &str,
        _muscle_group: &str,
    ) -> StoreResult<Option<Exercise>> {
        Ok(None)
    }
}
