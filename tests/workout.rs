mod common;

use std::time::Duration;

use common::FakeStore;
use repsy::{
    Workout, WorkoutError,
    live::LiveError,
    types::Settings,
};
use tokio::time::sleep;

fn settings() -> Settings {
    Settings::default()
}

async fn open_push() -> (std::sync::Arc<FakeStore>, Workout<FakeStore>) {
    let store = FakeStore::seeded();
    let mut workout = Workout::new(store.clone(), &settings());
    workout.open("s1").await.unwrap();
    (store, workout)
}

#[tokio::test(start_paused = true)]
async fn autosave_fires_once_after_the_delay() {
    let (store, mut workout) = open_push().await;
    assert!(!workout.autosave_armed());

    workout.set_weight(0, 0, "100").unwrap();
    assert!(workout.autosave_armed());

    sleep(Duration::from_secs(29)).await;
    assert_eq!(store.update_count(), 0);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(store.update_count(), 1);
    assert!(!workout.autosave_armed());
    assert!(!workout.snapshot().is_dirty());

    let sent = store.last_update().unwrap().exercises.unwrap();
    assert_eq!(sent[0].sets[0].weight, Some(100.0));
}

#[tokio::test(start_paused = true)]
async fn later_edits_ride_along_with_the_first_deadline() {
    let (store, mut workout) = open_push().await;

    workout.set_weight(0, 0, "100").unwrap();
    sleep(Duration::from_secs(20)).await;
    workout.set_reps(0, 0, "5").unwrap();

    sleep(Duration::from_secs(11)).await;
    assert_eq!(store.update_count(), 1);

    let sent = store.last_update().unwrap().exercises.unwrap();
    assert_eq!(sent[0].sets[0].weight, Some(100.0));
    assert_eq!(sent[0].sets[0].reps, Some(5));

    sleep(Duration::from_secs(60)).await;
    assert_eq!(store.update_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn edits_after_an_autosave_arm_a_new_one() {
    let (store, mut workout) = open_push().await;

    workout.set_weight(0, 0, "100").unwrap();
    sleep(Duration::from_secs(31)).await;
    assert_eq!(store.update_count(), 1);

    workout.rename("Push A");
    assert!(workout.autosave_armed());
    sleep(Duration::from_secs(31)).await;

    assert_eq!(store.update_count(), 2);
    assert_eq!(store.last_update().unwrap().name, "Push A");
}

#[tokio::test(start_paused = true)]
async fn failed_autosave_is_silent_and_keeps_edits() {
    let (store, mut workout) = open_push().await;
    store.fail_updates(true);

    workout.set_reps(0, 1, "8").unwrap();
    sleep(Duration::from_secs(31)).await;

    assert_eq!(store.update_count(), 1);
    assert!(!workout.autosave_armed());
    let live = workout.snapshot();
    assert!(live.is_dirty());
    assert_eq!(live.exercises()[0].sets[1].reps, "8");

    store.fail_updates(false);
    workout.set_reps(0, 1, "9").unwrap();
    assert!(workout.autosave_armed());
    sleep(Duration::from_secs(31)).await;
    assert!(!workout.snapshot().is_dirty());
}

#[tokio::test(start_paused = true)]
async fn edits_during_an_autosave_write_are_saved_next_round() {
    let (store, mut workout) = open_push().await;
    store.slow_writes(Duration::from_secs(5));

    workout.set_weight(0, 0, "100").unwrap();
    sleep(Duration::from_secs(32)).await;
    assert_eq!(store.update_count(), 1);

    workout.set_reps(0, 0, "5").unwrap();
    assert!(workout.autosave_armed());

    sleep(Duration::from_secs(600)).await;
    assert_eq!(store.update_count(), 2);
    let live = workout.snapshot();
    assert!(!live.is_dirty());
    assert!(!workout.autosave_armed());

    let sent = store.last_update().unwrap().exercises.unwrap();
    assert_eq!(sent[0].sets[0].reps, Some(5));
    assert_eq!(store.sessions.lock()["s1"].exercises[0].sets[0].reps, Some(5));
}

#[tokio::test(start_paused = true)]
async fn clean_workout_is_not_rewritten() {
    let (store, mut workout) = open_push().await;

    workout.save().await.unwrap();
    let finished = workout.finish().await.unwrap();

    assert!(finished.is_finished());
    assert_eq!(store.update_count(), 0);
    assert_eq!(*store.finished.lock(), vec!["s1".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_workout_cancels_the_pending_autosave() {
    let (store, mut workout) = open_push().await;

    workout.set_weight(0, 0, "60").unwrap();
    drop(workout);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(store.update_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn save_flushes_immediately() {
    let (store, mut workout) = open_push().await;

    workout.toggle_set(0, 0).unwrap();
    workout.save().await.unwrap();

    assert_eq!(store.update_count(), 1);
    assert!(!workout.snapshot().is_dirty());
    assert!(store.last_update().unwrap().exercises.unwrap()[0].sets[0].completed);
}

#[tokio::test(start_paused = true)]
async fn finish_flushes_first_then_resets() {
    let (store, mut workout) = open_push().await;

    workout.set_weight(0, 0, "80").unwrap();
    workout.set_reps(0, 0, "10").unwrap();
    let finished = workout.finish().await.unwrap();

    assert!(finished.is_finished());
    assert_eq!(store.update_count(), 1);
    assert_eq!(*store.finished.lock(), vec!["s1".to_string()]);

    let summary = workout.summary(0);
    assert_eq!(summary.session_id, None);
    assert!(!summary.dirty);
    assert!(!workout.autosave_armed());

    sleep(Duration::from_secs(60)).await;
    assert_eq!(store.update_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn failed_finish_keeps_the_workout_open() {
    let (store, mut workout) = open_push().await;
    store.fail_updates(true);

    workout.set_weight(0, 0, "80").unwrap();
    assert!(workout.finish().await.is_err());

    assert!(store.finished.lock().is_empty());
    let live = workout.snapshot();
    assert_eq!(live.session_id(), Some("s1"));
    assert!(live.is_dirty());
    assert!(workout.autosave_armed());
}

#[tokio::test(start_paused = true)]
async fn added_exercise_is_confirmed_by_the_store() {
    let (store, mut workout) = open_push().await;

    workout.add_exercise("squat").await.unwrap();

    let live = workout.snapshot();
    assert_eq!(live.exercises().len(), 2);
    let squat = &live.exercises()[1];
    assert_eq!(squat.name, "Back Squat");
    assert!(!squat.id.is_pending());
    assert_eq!(squat.sets.len(), 1);
    assert!(!live.is_dirty());
    assert_eq!(store.sessions.lock()["s1"].exercises.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn added_exercise_rolls_back_when_the_store_refuses() {
    let (store, mut workout) = open_push().await;
    store.fail_adds(true);

    let err = workout.add_exercise("squat").await.unwrap_err();
    assert!(matches!(err, WorkoutError::Store(_)));

    let live = workout.snapshot();
    assert_eq!(live.exercises().len(), 1);
    assert!(!live.is_dirty());
}

#[tokio::test(start_paused = true)]
async fn unknown_catalog_entry_is_rejected_up_front() {
    let (store, mut workout) = open_push().await;

    let err = workout.add_exercise("deadlift").await.unwrap_err();
    assert!(matches!(err, WorkoutError::UnknownExercise(id) if id == "deadlift"));
    assert_eq!(workout.snapshot().exercises().len(), 1);
    assert_eq!(store.sessions.lock()["s1"].exercises.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn opening_another_session_drops_unsaved_edits() {
    let (store, mut workout) = open_push().await;

    workout.set_weight(0, 0, "100").unwrap();
    workout.open("s2").await.unwrap();

    let live = workout.snapshot();
    assert_eq!(live.session_id(), Some("s2"));
    assert_eq!(live.name(), "Legs");
    assert!(!live.is_dirty());
    assert!(!workout.autosave_armed());

    sleep(Duration::from_secs(60)).await;
    assert_eq!(store.update_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_keeps_unsaved_edits_of_the_same_session() {
    let (_store, mut workout) = open_push().await;

    workout.set_weight(0, 1, "70").unwrap();
    workout.refresh().await.unwrap();

    let live = workout.snapshot();
    assert!(live.is_dirty());
    assert_eq!(live.exercises()[0].sets[1].weight, "70");
}

#[tokio::test(start_paused = true)]
async fn completing_a_set_starts_the_rest_timer() {
    let (_store, mut workout) = open_push().await;

    assert!(workout.toggle_set(0, 1).unwrap());
    let timer = workout.rest_timer().unwrap();
    assert_eq!((timer.exercise_index, timer.set_index), (0, 1));
    assert_eq!(timer.seconds_left, 90);

    workout.tick_rest_timer();
    assert_eq!(workout.rest_timer().unwrap().seconds_left, 89);

    workout.dismiss_rest_timer();
    assert!(workout.rest_timer().is_none());
}

#[tokio::test(start_paused = true)]
async fn operations_without_a_session() {
    let store = FakeStore::seeded();
    let mut workout = Workout::new(store, &settings());

    assert!(matches!(
        workout.set_weight(0, 0, "1"),
        Err(WorkoutError::Live(LiveError::NoSuchExercise(0)))
    ));
    assert!(matches!(workout.finish().await, Err(WorkoutError::NoSession)));
    assert!(matches!(workout.save().await, Err(WorkoutError::NoSession)));
    assert!(!workout.autosave_armed());
}

#[tokio::test(start_paused = true)]
async fn summary_tracks_completed_volume() {
    let (_store, mut workout) = open_push().await;

    workout.set_weight(0, 0, "100").unwrap();
    workout.set_reps(0, 0, "5").unwrap();
    workout.set_weight(0, 1, "100").unwrap();
    workout.set_reps(0, 1, "5").unwrap();
    workout.toggle_set(0, 0).unwrap();

    let summary = workout.summary(0);
    assert_eq!(summary.volume, 500.0);
    assert!(summary.dirty);
    assert_eq!(summary.name, "Push");
}
