pub mod autosave;
pub mod cli;
pub mod commands;
pub mod db;
pub mod live;
pub mod metrics;
pub mod models;
pub mod reports;
pub mod rest_timer;
pub mod storage;
pub mod store;
pub mod types;
pub mod utils;
pub mod workout;

pub use live::{LiveError, LiveExercise, LiveSession, LiveSet, LocalId, SetField};
pub use rest_timer::RestTimer;
pub use storage::SqliteStore;
pub use store::{SessionStore, StoreError};
pub use workout::{Workout, WorkoutError, WorkoutSummary};
