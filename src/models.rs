use serde::{Deserialize, Serialize};

/// Catalog entry, independent of any session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: String,
    pub muscle_group: String,
}

/// Authoritative workout session as held by the store.
/// `finished_at` stays `None` while the workout is in progress.
/// Timestamps are nanoseconds since the unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSession {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub template_id: Option<String>,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub total_volume: f64,
    pub pr_count: u32,
    pub notes: Option<String>,
    pub exercises: Vec<RemoteSessionExercise>,
}

impl RemoteSession {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Exercise slot inside a session. `order` sequences the display,
/// it is not guaranteed to be contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSessionExercise {
    pub id: String,
    pub exercise_id: String,
    pub order: u32,
    pub sets: Vec<RemoteWorkoutSet>,
}

/// Logged set. `weight`/`reps` are `None` until entered.
/// `is_pr` is computed by the store, never by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWorkoutSet {
    pub id: String,
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub completed: bool,
    pub is_pr: bool,
}

/// Persist payload for one exercise of `update_session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExerciseInput {
    pub exercise_id: String,
    pub order: u32,
    pub sets: Vec<WorkoutSetInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSetInput {
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub completed: bool,
    pub is_pr: bool,
}
