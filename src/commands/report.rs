use anyhow::Result;
use chrono::Local;
use colored::Colorize;

use crate::{
    cli::ReportCmd,
    models::Exercise,
    reports::{TrendPoint, muscle_volume, strength_trend, volume_trend, weekly_frequency},
    storage::SqliteStore,
    store::SessionStore,
    types::{OutputFmt, Settings, best_suggestion, emit},
};

const BAR_WIDTH: f64 = 40.0;

fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 {
        return String::new();
    }
    "█".repeat(((value / max) * BAR_WIDTH).round() as usize)
}

fn find_exercise<'a>(catalog: &'a [Exercise], name: &str) -> Option<&'a Exercise> {
    let found = catalog.iter().find(|e| e.name.eq_ignore_ascii_case(name.trim()));
    if found.is_none() {
        let hint = best_suggestion(name, catalog.iter().map(|e| e.name.as_str()))
            .map(|s| format!(" -- did you mean: `{}`?", s.green()))
            .unwrap_or_default();
        println!("{} no exercise named `{}`{}", "error:".red().bold(), name, hint);
    }
    found
}

fn print_trend(title: &str, unit: &str, points: &[TrendPoint]) {
    println!("{}", title.cyan().bold());
    if points.is_empty() {
        println!("{}", "(no finished workouts with this exercise)".dimmed());
        return;
    }

    let max = points.iter().map(|p| p.value).fold(0.0, f64::max);
    for p in points {
        println!(
            "{}  {:>7} {}  {}",
            p.date.format("%b %d"),
            p.value,
            unit,
            bar(p.value, max).green()
        );
    }
}

pub async fn handle(cmd: ReportCmd, store: &SqliteStore, settings: &Settings, fmt: OutputFmt) -> Result<()> {
    let sessions = store.list_sessions(&settings.user_id).await?;
    let catalog = store.fetch_exercise_catalog().await?;

    match cmd {
        ReportCmd::Volume { exercise } => {
            let Some(ex) = find_exercise(&catalog, &exercise) else {
                return Ok(());
            };
            let points = volume_trend(&sessions, &ex.id);
            emit(fmt, &points, || {
                print_trend(&format!("{} — volume", ex.name), "kg", &points)
            })?;
        }

        ReportCmd::Strength { exercise } => {
            let Some(ex) = find_exercise(&catalog, &exercise) else {
                return Ok(());
            };
            let points = strength_trend(&sessions, &ex.id);
            emit(fmt, &points, || {
                print_trend(&format!("{} — estimated 1RM (Epley)", ex.name), "kg", &points)
            })?;
        }

        ReportCmd::Frequency { weeks } => {
            let counts = weekly_frequency(&sessions, Local::now().date_naive(), weeks);
            emit(fmt, &counts, || {
                println!("{}", "Workouts per week:".cyan().bold());
                let max = counts.iter().map(|(_, n)| *n).max().unwrap_or(0) as f64;
                for (week, n) in &counts {
                    println!("{}  {:>2}  {}", week.format("%b %d"), n, bar(*n as f64, max).green());
                }
            })?;
        }

        ReportCmd::Muscles => {
            let groups = muscle_volume(&sessions, &catalog);
            emit(fmt, &groups, || {
                println!("{}", "Volume by muscle group:".cyan().bold());
                if groups.is_empty() {
                    println!("{}", "(no finished workouts)".dimmed());
                    return;
                }
                let total: f64 = groups.iter().map(|(_, v)| v).sum();
                for (name, v) in &groups {
                    println!(
                        "{:<12} {:>3}%  ({} kg)",
                        name.green(),
                        ((v / total) * 100.0).round(),
                        v
                    );
                }
            })?;
        }
    }

    Ok(())
}
