use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    category      TEXT NOT NULL DEFAULT '',
    muscle_group  TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS workout_sessions (
    id                TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL,
    name              TEXT NOT NULL,
    template_id       TEXT,
    started_at        INTEGER NOT NULL,
    finished_at       INTEGER,
    duration_seconds  INTEGER,
    total_volume      REAL NOT NULL DEFAULT 0,
    pr_count          INTEGER NOT NULL DEFAULT 0,
    notes             TEXT
);

CREATE TABLE IF NOT EXISTS session_exercises (
    id           TEXT PRIMARY KEY,
    session_id   TEXT NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
    exercise_id  TEXT NOT NULL,
    position     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS workout_sets (
    id                   TEXT PRIMARY KEY,
    session_exercise_id  TEXT NOT NULL REFERENCES session_exercises(id) ON DELETE CASCADE,
    set_number           INTEGER NOT NULL,
    weight               REAL,
    reps                 INTEGER,
    completed            INTEGER NOT NULL DEFAULT 0,
    is_pr                INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_session_exercises_session ON session_exercises(session_id);
CREATE INDEX IF NOT EXISTS idx_workout_sets_exercise ON workout_sets(session_exercise_id);
"#;

pub async fn open(path: &str) -> Result<DB, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Single-connection in-memory database; every connection to
/// `sqlite::memory:` would otherwise see its own empty database.
pub async fn open_memory() -> Result<DB, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &DB) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
