use std::collections::HashMap;

use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db::DB,
    metrics::{best_one_rep_max, estimated_one_rep_max, set_volume},
    models::{
        Exercise, RemoteSession, RemoteSessionExercise, RemoteWorkoutSet, SessionExerciseInput,
    },
    store::{SessionStore, StoreError, StoreResult},
    utils::{NANOS_PER_MILLI, millis_to_nanos, now_millis},
};

type SessionRow = (
    String,
    String,
    String,
    Option<String>,
    i64,
    Option<i64>,
    Option<i64>,
    f64,
    i64,
    Option<String>,
);

type SetRow = (String, String, i64, Option<f64>, Option<i64>, bool, bool);

/// SQLite-backed session store.
///
/// Personal records, total volume and PR count are recomputed here on every
/// update; whatever the client sends for `is_pr` is ignored.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DB,
}

impl SqliteStore {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DB {
        &self.pool
    }

    async fn read(&self, id: &str) -> StoreResult<RemoteSession> {
        let mut conn = self.pool.acquire().await?;
        read_session(&mut conn, id).await
    }
}

fn to_u32(value: i64, what: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::Corrupt(format!("{what} out of range: {value}")))
}

async fn read_session(conn: &mut SqliteConnection, id: &str) -> StoreResult<RemoteSession> {
    let row: Option<SessionRow> = sqlx::query_as(
        r#"
        SELECT id, user_id, name, template_id, started_at, finished_at,
               duration_seconds, total_volume, pr_count, notes
        FROM workout_sessions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((
        id,
        user_id,
        name,
        template_id,
        started_at,
        finished_at,
        duration_seconds,
        total_volume,
        pr_count,
        notes,
    )) = row
    else {
        return Err(StoreError::SessionNotFound(id.to_string()));
    };

    let slots: Vec<(String, String, i64)> = sqlx::query_as(
        "SELECT id, exercise_id, position FROM session_exercises WHERE session_id = ? ORDER BY position, rowid",
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?;

    let set_rows: Vec<SetRow> = sqlx::query_as(
        r#"
        SELECT ws.id, ws.session_exercise_id, ws.set_number, ws.weight, ws.reps,
               ws.completed, ws.is_pr
        FROM workout_sets ws
        JOIN session_exercises se ON se.id = ws.session_exercise_id
        WHERE se.session_id = ?
        ORDER BY ws.set_number, ws.rowid
        "#,
    )
    .bind(&id)
    .fetch_all(&mut *conn)
    .await?;

    let mut sets_by_slot: HashMap<String, Vec<RemoteWorkoutSet>> = HashMap::new();
    for (set_id, slot_id, set_number, weight, reps, completed, is_pr) in set_rows {
        let reps = reps.map(|r| to_u32(r, "reps")).transpose()?;
        sets_by_slot.entry(slot_id).or_default().push(RemoteWorkoutSet {
            id: set_id,
            set_number: to_u32(set_number, "set number")?,
            weight,
            reps,
            completed,
            is_pr,
        });
    }

    let exercises = slots
        .into_iter()
        .map(|(slot_id, exercise_id, position)| {
            Ok(RemoteSessionExercise {
                sets: sets_by_slot.remove(&slot_id).unwrap_or_default(),
                id: slot_id,
                exercise_id,
                order: to_u32(position, "exercise order")?,
            })
        })
        .collect::<StoreResult<Vec<_>>>()?;

    Ok(RemoteSession {
        id,
        user_id,
        name,
        template_id,
        started_at,
        finished_at,
        duration_seconds,
        total_volume,
        pr_count: to_u32(pr_count, "pr count")?,
        notes,
        exercises,
    })
}

/// Best estimated one-rep max for an exercise over sessions started
/// before `before`.
async fn historical_best(
    conn: &mut SqliteConnection,
    exercise_id: &str,
    session_id: &str,
    before: i64,
) -> StoreResult<Option<f64>> {
    let rows: Vec<(Option<f64>, Option<i64>)> = sqlx::query_as(
        r#"
        SELECT ws.weight, ws.reps
        FROM workout_sets ws
        JOIN session_exercises se ON se.id = ws.session_exercise_id
        JOIN workout_sessions s ON s.id = se.session_id
        WHERE se.exercise_id = ?
          AND s.id != ?
          AND s.started_at < ?
          AND ws.completed = 1
        "#,
    )
    .bind(exercise_id)
    .bind(session_id)
    .bind(before)
    .fetch_all(&mut *conn)
    .await?;

    Ok(best_one_rep_max(rows.into_iter().map(|(weight, reps)| {
        (weight, reps.and_then(|r| u32::try_from(r).ok()), true)
    })))
}

async fn replace_exercises(
    conn: &mut SqliteConnection,
    session_id: &str,
    started_at: i64,
    exercises: Vec<SessionExerciseInput>,
) -> StoreResult<(f64, u32)> {
    let existing: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, exercise_id FROM session_exercises WHERE session_id = ? ORDER BY position, rowid",
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    let existing_sets: Vec<(String, String, i64)> = sqlx::query_as(
        r#"
        SELECT ws.id, ws.session_exercise_id, ws.set_number
        FROM workout_sets ws
        JOIN session_exercises se ON se.id = ws.session_exercise_id
        WHERE se.session_id = ?
        ORDER BY ws.set_number, ws.rowid
        "#,
    )
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut set_ids: HashMap<String, Vec<(String, i64)>> = HashMap::new();
    for (set_id, slot_id, set_number) in existing_sets {
        set_ids.entry(slot_id).or_default().push((set_id, set_number));
    }

    sqlx::query(
        "DELETE FROM workout_sets WHERE session_exercise_id IN (SELECT id FROM session_exercises WHERE session_id = ?)",
    )
    .bind(session_id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM session_exercises WHERE session_id = ?")
        .bind(session_id)
        .execute(&mut *conn)
        .await?;

    let mut best: HashMap<String, Option<f64>> = HashMap::new();
    let mut volume = 0.0;
    let mut prs = 0u32;

    for (idx, ex) in exercises.into_iter().enumerate() {
        let slot_id = existing
            .get(idx)
            .filter(|(_, exercise_id)| *exercise_id == ex.exercise_id)
            .map(|(id, _)| id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut reusable = set_ids.remove(&slot_id).unwrap_or_default();

        sqlx::query(
            "INSERT INTO session_exercises (id, session_id, exercise_id, position) VALUES (?, ?, ?, ?)",
        )
        .bind(&slot_id)
        .bind(session_id)
        .bind(&ex.exercise_id)
        .bind(ex.order as i64)
        .execute(&mut *conn)
        .await?;

        if !best.contains_key(&ex.exercise_id) {
            let previous = historical_best(conn, &ex.exercise_id, session_id, started_at).await?;
            best.insert(ex.exercise_id.clone(), previous);
        }

        for set in ex.sets {
            let set_id = reusable
                .iter()
                .position(|(_, n)| *n == set.set_number as i64)
                .map(|pos| reusable.remove(pos).0)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            let mut is_pr = false;
            if set.completed {
                volume += set_volume(set.weight, set.reps);

                if let (Some(w), Some(r)) = (set.weight, set.reps) {
                    if w > 0.0 && r > 0 {
                        let rm = estimated_one_rep_max(w, r);
                        let record = best.entry(ex.exercise_id.clone()).or_default();
                        if record.is_none_or(|b| rm > b) {
                            is_pr = true;
                            *record = Some(rm);
                        }
                    }
                }
            }
            if is_pr {
                prs += 1;
            }

            sqlx::query(
                r#"
                INSERT INTO workout_sets
                  (id, session_exercise_id, set_number, weight, reps, completed, is_pr)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&set_id)
            .bind(&slot_id)
            .bind(set.set_number as i64)
            .bind(set.weight)
            .bind(set.reps.map(|r| r as i64))
            .bind(set.completed)
            .bind(is_pr)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok((volume, prs))
}

impl SessionStore for SqliteStore {
    async fn fetch_session(&self, id: &str) -> StoreResult<RemoteSession> {
        self.read(id).await
    }

    async fn fetch_exercise_catalog(&self) -> StoreResult<Vec<Exercise>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT id, name, category, muscle_group FROM exercises ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, category, muscle_group)| Exercise {
                id,
                name,
                category,
                muscle_group,
            })
            .collect())
    }

    async fn update_session(
        &self,
        id: &str,
        name: &str,
        notes: Option<&str>,
        exercises: Option<Vec<SessionExerciseInput>>,
    ) -> StoreResult<RemoteSession> {
        let mut tx = self.pool.begin().await?;

        let started_at: Option<i64> =
            sqlx::query_scalar("SELECT started_at FROM workout_sessions WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let started_at = started_at.ok_or_else(|| StoreError::SessionNotFound(id.to_string()))?;

        sqlx::query("UPDATE workout_sessions SET name = ?, notes = COALESCE(?, notes) WHERE id = ?")
            .bind(name)
            .bind(notes)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(exercises) = exercises {
            let (volume, prs) = replace_exercises(&mut tx, id, started_at, exercises).await?;
            sqlx::query("UPDATE workout_sessions SET total_volume = ?, pr_count = ? WHERE id = ?")
                .bind(volume)
                .bind(prs as i64)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            debug!(session = id, volume, prs, "replaced exercise tree");
        }

        let session = read_session(&mut tx, id).await?;
        tx.commit().await?;
        Ok(session)
    }

    async fn finish_session(&self, id: &str, finished_at: i64) -> StoreResult<RemoteSession> {
        let session = self.read(id).await?;
        if session.is_finished() {
            debug!(session = id, "already finished");
            return Ok(session);
        }

        let duration = ((finished_at - session.started_at) / (NANOS_PER_MILLI * 1000)).max(0);
        sqlx::query(
            "UPDATE workout_sessions SET finished_at = ?, duration_seconds = ? WHERE id = ? AND finished_at IS NULL",
        )
        .bind(finished_at)
        .bind(duration)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.read(id).await
    }

    async fn add_exercise_to_session(
        &self,
        session_id: &str,
        exercise_id: &str,
    ) -> StoreResult<RemoteSession> {
        let mut tx = self.pool.begin().await?;

        let known: Option<String> = sqlx::query_scalar("SELECT id FROM exercises WHERE id = ?")
            .bind(exercise_id)
            .fetch_optional(&mut *tx)
            .await?;
        if known.is_none() {
            return Err(StoreError::ExerciseNotFound(exercise_id.to_string()));
        }

        let count: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT (SELECT count(*) FROM session_exercises WHERE session_id = s.id)
            FROM workout_sessions s
            WHERE s.id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await?;
        let count = count.ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        let slot_id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO session_exercises (id, session_id, exercise_id, position) VALUES (?, ?, ?, ?)",
        )
        .bind(&slot_id)
        .bind(session_id)
        .bind(exercise_id)
        .bind(count)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO workout_sets (id, session_exercise_id, set_number) VALUES (?, ?, 1)")
            .bind(Uuid::new_v4().to_string())
            .bind(&slot_id)
            .execute(&mut *tx)
            .await?;

        let session = read_session(&mut tx, session_id).await?;
        tx.commit().await?;
        Ok(session)
    }

    async fn create_session(
        &self,
        user_id: &str,
        name: &str,
        template_id: Option<&str>,
    ) -> StoreResult<RemoteSession> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO workout_sessions (id, user_id, name, template_id, started_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(template_id)
        .bind(millis_to_nanos(now_millis()))
        .execute(&self.pool)
        .await?;

        self.read(&id).await
    }

    async fn list_sessions(&self, user_id: &str) -> StoreResult<Vec<RemoteSession>> {
        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM workout_sessions WHERE user_id = ? ORDER BY started_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut conn = self.pool.acquire().await?;
        let mut sessions = Vec::with_capacity(ids.len());
        for id in ids {
            sessions.push(read_session(&mut conn, &id).await?);
        }
        Ok(sessions)
    }

    async fn delete_session(&self, id: &str) -> StoreResult<bool> {
        let res = sqlx::query("DELETE FROM workout_sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn add_catalog_exercise(
        &self,
        name: &str,
        category: &str,
        muscle_group: &str,
    ) -> StoreResult<Option<Exercise>> {
        let id = Uuid::new_v4().to_string();
        let res = sqlx::query(
            "INSERT OR IGNORE INTO exercises (id, name, category, muscle_group) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(category)
        .bind(muscle_group)
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(Exercise {
            id,
            name: name.to_string(),
            category: category.to_string(),
            muscle_group: muscle_group.to_string(),
        }))
    }
}
