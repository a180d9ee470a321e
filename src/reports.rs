//! Cross-session reports over finished workouts.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate};
use itertools::Itertools;
use serde::Serialize;

use crate::{
    metrics::{best_one_rep_max, estimated_one_rep_max, set_volume},
    models::{Exercise, RemoteSession, RemoteWorkoutSet},
};

const TREND_POINTS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

pub fn started_on(session: &RemoteSession) -> NaiveDate {
    DateTime::from_timestamp_nanos(session.started_at).date_naive()
}

fn finished_chronologically(sessions: &[RemoteSession]) -> impl Iterator<Item = &RemoteSession> {
    sessions
        .iter()
        .filter(|s| s.is_finished())
        .sorted_by_key(|s| s.started_at)
}

fn sets_of<'a>(
    session: &'a RemoteSession,
    exercise_id: &'a str,
) -> impl Iterator<Item = &'a RemoteWorkoutSet> {
    session
        .exercises
        .iter()
        .filter(move |e| e.exercise_id == exercise_id)
        .flat_map(|e| e.sets.iter())
}

fn completed_volume<'a>(sets: impl Iterator<Item = &'a RemoteWorkoutSet>) -> f64 {
    sets.filter(|s| s.completed)
        .map(|s| set_volume(s.weight, s.reps))
        .sum()
}

fn last_points(mut points: Vec<TrendPoint>) -> Vec<TrendPoint> {
    let skip = points.len().saturating_sub(TREND_POINTS);
    points.drain(..skip);
    points
}

/// Completed volume of one exercise per finished session.
pub fn volume_trend(sessions: &[RemoteSession], exercise_id: &str) -> Vec<TrendPoint> {
    let points = finished_chronologically(sessions)
        .filter_map(|s| {
            let volume = completed_volume(sets_of(s, exercise_id));
            (volume > 0.0).then(|| TrendPoint {
                date: started_on(s),
                value: volume.round(),
            })
        })
        .collect();
    last_points(points)
}

/// Best estimated one-rep max of one exercise per finished session.
pub fn strength_trend(sessions: &[RemoteSession], exercise_id: &str) -> Vec<TrendPoint> {
    let points = finished_chronologically(sessions)
        .filter_map(|s| {
            let best = best_one_rep_max(sets_of(s, exercise_id).map(|ws| (ws.weight, ws.reps, ws.completed)))?;
            Some(TrendPoint {
                date: started_on(s),
                value: best.round(),
            })
        })
        .collect();
    last_points(points)
}

/// Finished sessions per Monday-based week, oldest week first.
pub fn weekly_frequency(sessions: &[RemoteSession], today: NaiveDate, weeks: u32) -> Vec<(NaiveDate, usize)> {
    let this_monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);

    (0..weeks as i64)
        .rev()
        .map(|i| {
            let start = this_monday - Duration::weeks(i);
            let end = start + Duration::weeks(1);
            let count = sessions
                .iter()
                .filter(|s| s.is_finished())
                .filter(|s| {
                    let day = started_on(s);
                    day >= start && day < end
                })
                .count();
            (start, count)
        })
        .collect()
}

/// Completed volume per muscle group, largest first. Exercises missing from
/// the catalog are left out.
pub fn muscle_volume(sessions: &[RemoteSession], catalog: &[Exercise]) -> Vec<(String, f64)> {
    let by_id: HashMap<&str, &Exercise> = catalog.iter().map(|e| (e.id.as_str(), e)).collect();
    let mut groups: HashMap<String, f64> = HashMap::new();

    for slot in sessions
        .iter()
        .filter(|s| s.is_finished())
        .flat_map(|s| s.exercises.iter())
    {
        let Some(info) = by_id.get(slot.exercise_id.as_str()) else {
            continue;
        };
        *groups.entry(info.muscle_group.clone()).or_default() += completed_volume(slot.sets.iter());
    }

    groups
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(name, v)| (name, v.round()))
        .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .collect()
}

/// Heaviest completed set per exercise over finished sessions other than
/// `exclude`, ranked by estimated one-rep max and rendered for display.
pub fn previous_bests(sessions: &[RemoteSession], exclude: &str) -> HashMap<String, String> {
    let mut best: HashMap<&str, (f64, f64, u32)> = HashMap::new();

    for slot in sessions
        .iter()
        .filter(|s| s.is_finished() && s.id != exclude)
        .flat_map(|s| s.exercises.iter())
    {
        for set in slot.sets.iter().filter(|s| s.completed) {
            let (Some(w), Some(r)) = (set.weight, set.reps) else {
                continue;
            };
            if w <= 0.0 || r == 0 {
                continue;
            }
            let rm = estimated_one_rep_max(w, r);
            let entry = best.entry(slot.exercise_id.as_str()).or_insert((rm, w, r));
            if rm > entry.0 {
                *entry = (rm, w, r);
            }
        }
    }

    best.into_iter()
        .map(|(id, (_, w, r))| (id.to_string(), format!("{}kg × {}", w, r)))
        .collect()
}
