//! In-memory state of the workout currently being performed.
//!
//! The model merges freshly fetched sessions with unsaved local edits.
//! While it is dirty, a fetch for the same session never overwrites the
//! exercise tree; it only hands out server identifiers to entries that were
//! added optimistically.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    metrics::{parse_reps, parse_weight},
    models::{Exercise, RemoteSession, RemoteWorkoutSet, SessionExerciseInput, WorkoutSetInput},
    rest_timer::{DEFAULT_REST_SECS, RestTimer},
    utils::nanos_to_millis,
};

pub const UNKNOWN_EXERCISE: &str = "Unknown Exercise";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiveError {
    #[error("no exercise at index {0}")]
    NoSuchExercise(usize),

    #[error("no set {set} for exercise {exercise}")]
    NoSuchSet { exercise: usize, set: usize },
}

/// Identity of a live exercise or set: generated locally until the store
/// confirms it with its own id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LocalId {
    Pending(String),
    Server(String),
}

impl LocalId {
    pub fn generate() -> Self {
        Self::Pending(Uuid::new_v4().to_string())
    }

    pub fn server(id: impl Into<String>) -> Self {
        Self::Server(id.into())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Server(id) => Some(id),
            Self::Pending(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending(id) | Self::Server(id) => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Weight,
    Reps,
}

/// Set as the user edits it. Weight and reps stay raw text until a number
/// is actually needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveSet {
    pub id: LocalId,
    pub set_number: u32,
    pub weight: String,
    pub reps: String,
    pub completed: bool,
    pub is_pr: bool,
}

impl LiveSet {
    fn empty(set_number: u32) -> Self {
        Self {
            id: LocalId::generate(),
            set_number,
            weight: String::new(),
            reps: String::new(),
            completed: false,
            is_pr: false,
        }
    }

    fn from_remote(set: &RemoteWorkoutSet) -> Self {
        Self {
            id: LocalId::server(&set.id),
            set_number: set.set_number,
            weight: set.weight.map(|w| w.to_string()).unwrap_or_default(),
            reps: set.reps.map(|r| r.to_string()).unwrap_or_default(),
            completed: set.completed,
            is_pr: set.is_pr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveExercise {
    pub id: LocalId,
    pub exercise_id: String,
    pub name: String,
    pub muscle_group: String,
    pub order: u32,
    pub sets: Vec<LiveSet>,
    /// Informational only.
    pub previous_best: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiveSession {
    session_id: Option<String>,
    name: String,
    /// Local clock, milliseconds.
    started_at: i64,
    exercises: Vec<LiveExercise>,
    dirty: bool,
    rest_timer: Option<RestTimer>,
    #[serde(skip)]
    rest_secs: i64,
    /// Bumped on every local edit.
    #[serde(skip)]
    revision: u64,
}

impl Default for LiveSession {
    fn default() -> Self {
        Self::new(DEFAULT_REST_SECS)
    }
}

impl LiveSession {
    pub fn new(rest_secs: i64) -> Self {
        Self {
            session_id: None,
            name: String::new(),
            started_at: 0,
            exercises: Vec::new(),
            dirty: false,
            rest_timer: None,
            rest_secs,
            revision: 0,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    pub fn exercises(&self) -> &[LiveExercise] {
        &self.exercises
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn rest_timer(&self) -> Option<RestTimer> {
        self.rest_timer
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Merges a fetched session into the model.
    ///
    /// Session id and start time are always adopted. The exercise tree is
    /// rebuilt unless the model holds unsaved edits for this very session,
    /// in which case only pending identifiers are reconciled.
    pub fn load(&mut self, remote: &RemoteSession, catalog: &[Exercise]) {
        let same_session = self.session_id.as_deref() == Some(remote.id.as_str());

        if !same_session {
            self.name = remote.name.clone();
        }
        self.session_id = Some(remote.id.clone());
        self.started_at = nanos_to_millis(remote.started_at);

        if self.dirty && same_session {
            debug!(session = %remote.id, "dirty model, keeping local exercises");
            self.adopt_server_ids(remote);
            return;
        }

        let by_id: HashMap<&str, &Exercise> =
            catalog.iter().map(|e| (e.id.as_str(), e)).collect();

        self.exercises = remote
            .exercises
            .iter()
            .map(|se| {
                let info = by_id.get(se.exercise_id.as_str());
                LiveExercise {
                    id: LocalId::server(&se.id),
                    exercise_id: se.exercise_id.clone(),
                    name: info
                        .map(|e| e.name.clone())
                        .unwrap_or_else(|| UNKNOWN_EXERCISE.to_string()),
                    muscle_group: info.map(|e| e.muscle_group.clone()).unwrap_or_default(),
                    order: se.order,
                    sets: se.sets.iter().map(LiveSet::from_remote).collect(),
                    previous_best: None,
                }
            })
            .collect();

        if !same_session {
            // Edits of another workout do not carry over.
            self.dirty = false;
            self.rest_timer = None;
        }
    }

    fn adopt_server_ids(&mut self, remote: &RemoteSession) {
        let claimed: HashSet<String> = self
            .exercises
            .iter()
            .filter_map(|e| e.id.server_id().map(str::to_owned))
            .collect();
        let mut unclaimed: Vec<_> = remote
            .exercises
            .iter()
            .filter(|r| !claimed.contains(&r.id))
            .collect();

        for ex in self.exercises.iter_mut() {
            let matched = if ex.id.is_pending() {
                let pos = unclaimed.iter().position(|r| r.exercise_id == ex.exercise_id);
                pos.map(|pos| {
                    let r = unclaimed.remove(pos);
                    debug!(exercise = %r.id, "confirmed optimistic exercise");
                    ex.id = LocalId::server(&r.id);
                    r
                })
            } else {
                let id = ex.id.as_str();
                remote.exercises.iter().find(|r| r.id == id)
            };

            if let Some(r) = matched {
                adopt_set_ids(&mut ex.sets, &r.sets);
            }
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.revision += 1;
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut LiveSet, LiveError> {
        self.exercises
            .get_mut(exercise)
            .ok_or(LiveError::NoSuchExercise(exercise))?
            .sets
            .get_mut(set)
            .ok_or(LiveError::NoSuchSet { exercise, set })
    }

    /// Replaces the raw text of one field. Anything goes, including text
    /// that will never parse.
    pub fn mutate_set_field(
        &mut self,
        exercise: usize,
        set: usize,
        field: SetField,
        raw: impl Into<String>,
    ) -> Result<(), LiveError> {
        let target = self.set_mut(exercise, set)?;
        match field {
            SetField::Weight => target.weight = raw.into(),
            SetField::Reps => target.reps = raw.into(),
        }
        self.touch();
        Ok(())
    }

    /// Flips the completed flag and returns the new value. Completing a set
    /// (re)starts the rest timer for it; un-completing leaves the timer alone.
    pub fn toggle_set_completion(&mut self, exercise: usize, set: usize) -> Result<bool, LiveError> {
        let target = self.set_mut(exercise, set)?;
        target.completed = !target.completed;
        let completed = target.completed;

        if completed {
            self.rest_timer = Some(RestTimer::start(exercise, set, self.rest_secs));
        }
        self.touch();
        Ok(completed)
    }

    /// Appends a set pre-filled from the previous one.
    pub fn add_set(&mut self, exercise: usize) -> Result<(), LiveError> {
        let ex = self
            .exercises
            .get_mut(exercise)
            .ok_or(LiveError::NoSuchExercise(exercise))?;

        let mut set = LiveSet::empty(ex.sets.len() as u32 + 1);
        if let Some(last) = ex.sets.last() {
            set.weight = last.weight.clone();
            set.reps = last.reps.clone();
        }
        ex.sets.push(set);
        self.touch();
        Ok(())
    }

    /// Optimistic insert ahead of the store round trip.
    pub fn add_exercise(&mut self, exercise: &Exercise) -> LocalId {
        let id = LocalId::generate();
        self.exercises.push(LiveExercise {
            id: id.clone(),
            exercise_id: exercise.id.clone(),
            name: exercise.name.clone(),
            muscle_group: exercise.muscle_group.clone(),
            order: self.exercises.len() as u32,
            sets: vec![LiveSet::empty(1)],
            previous_best: None,
        });
        self.touch();
        id
    }

    /// Undoes an optimistic insert. The dirty flag is restored only when
    /// nothing else was edited since `revision`.
    pub fn revert_exercise(&mut self, id: &LocalId, was_dirty: bool, revision: u64) {
        self.exercises.retain(|ex| &ex.id != id);
        if self.revision == revision {
            self.dirty = was_dirty;
        }
    }

    pub fn update_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn tick_rest_timer(&mut self) {
        self.rest_timer = self.rest_timer.and_then(RestTimer::tick);
    }

    pub fn dismiss_rest_timer(&mut self) {
        self.rest_timer = None;
    }

    /// Only call right after the serialized state was persisted.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Clears the dirty flag if nothing changed since `revision` was
    /// serialized. Returns whether the model is clean now.
    pub fn mark_clean_at(&mut self, revision: u64) -> bool {
        if self.revision == revision {
            self.mark_clean();
        }
        !self.dirty
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.rest_secs);
    }

    pub fn apply_previous_bests(&mut self, bests: &HashMap<String, String>) {
        for ex in self.exercises.iter_mut() {
            ex.previous_best = bests.get(&ex.exercise_id).cloned();
        }
    }

    /// Exercise tree in the shape the store persists. Text that does not
    /// parse is sent as absent, never as zero.
    pub fn persist_payload(&self) -> Vec<SessionExerciseInput> {
        self.exercises
            .iter()
            .map(|ex| SessionExerciseInput {
                exercise_id: ex.exercise_id.clone(),
                order: ex.order,
                sets: ex
                    .sets
                    .iter()
                    .map(|s| WorkoutSetInput {
                        set_number: s.set_number,
                        weight: parse_weight(&s.weight),
                        reps: parse_reps(&s.reps),
                        completed: s.completed,
                        is_pr: s.is_pr,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Whole seconds since the workout started, 0 before anything is loaded.
    pub fn elapsed_secs(&self, now_ms: i64) -> i64 {
        if self.started_at == 0 {
            return 0;
        }
        ((now_ms - self.started_at) / 1000).max(0)
    }
}

fn adopt_set_ids(sets: &mut [LiveSet], remote: &[RemoteWorkoutSet]) {
    let mut unclaimed: Vec<&RemoteWorkoutSet> = {
        let claimed: HashSet<&str> = sets.iter().filter_map(|s| s.id.server_id()).collect();
        remote
            .iter()
            .filter(|r| !claimed.contains(r.id.as_str()))
            .collect()
    };

    for set in sets.iter_mut().filter(|s| s.id.is_pending()) {
        if let Some(pos) = unclaimed.iter().position(|r| r.set_number == set.set_number) {
            set.id = LocalId::server(&unclaimed.remove(pos).id);
        }
    }
}
