use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colored::Colorize;

use crate::{
    cli::SessionCmd,
    live::UNKNOWN_EXERCISE,
    models::{Exercise, RemoteSession, RemoteWorkoutSet},
    storage::SqliteStore,
    store::SessionStore,
    types::{OutputFmt, Settings, emit},
    utils::{format_duration, format_volume},
    workout::Workout,
};

fn local_time(nanos: i64) -> DateTime<Local> {
    DateTime::from_timestamp_nanos(nanos).with_timezone(&Local)
}

fn describe_set(set: &RemoteWorkoutSet) -> String {
    let weight = set
        .weight
        .map(|w| format!("{}kg", w))
        .unwrap_or_else(|| "–".to_string());
    let reps = set
        .reps
        .map(|r| r.to_string())
        .unwrap_or_else(|| "–".to_string());
    format!("{} × {}", weight, reps)
}

fn print_session(session: &RemoteSession, catalog: &[Exercise]) {
    let names: HashMap<&str, &str> = catalog
        .iter()
        .map(|e| (e.id.as_str(), e.name.as_str()))
        .collect();

    println!(
        "{} {} (started {})",
        "Session:".cyan().bold(),
        session.name.bold(),
        local_time(session.started_at).format("%Y-%m-%d %H:%M")
    );
    match (session.finished_at, session.duration_seconds) {
        (Some(finished), Some(secs)) => println!(
            "{} {} after {}",
            "Finished:".cyan().bold(),
            local_time(finished).format("%Y-%m-%d %H:%M"),
            format_duration(chrono::Duration::seconds(secs))
        ),
        _ => println!("{}", "in progress".yellow()),
    }
    println!(
        "{} {}   {} {}",
        "Volume:".cyan().bold(),
        format_volume(session.total_volume),
        "PRs:".cyan().bold(),
        session.pr_count
    );

    if session.exercises.is_empty() {
        println!("\n{}", "(no exercises)".dimmed());
    }

    for (i, ex) in session.exercises.iter().enumerate() {
        let name = names.get(ex.exercise_id.as_str()).copied().unwrap_or(UNKNOWN_EXERCISE);
        println!("\n{} • {}", format!("{}", i + 1).yellow(), name.bold());

        for set in &ex.sets {
            let mark = if set.completed { "✓".green() } else { "·".dimmed() };
            let pr = if set.is_pr { " PR".red().bold().to_string() } else { String::new() };
            println!("    {} Set {}: {}{}", mark, set.set_number, describe_set(set), pr);
        }
    }

    if let Some(notes) = &session.notes {
        println!("\n{} {}", "Notes:".cyan().bold(), notes);
    }
}

fn print_history(sessions: &[RemoteSession]) {
    if sessions.is_empty() {
        println!("{}", "(no sessions)".dimmed());
        return;
    }

    println!("{}", "Sessions:".cyan().bold());
    for s in sessions {
        let state = match s.duration_seconds {
            Some(secs) if s.is_finished() => format_duration(chrono::Duration::seconds(secs)),
            _ => "in progress".yellow().to_string(),
        };
        let prs = if s.pr_count > 0 {
            format!("  {} PR", s.pr_count).red().to_string()
        } else {
            String::new()
        };
        println!(
            "{}  {}  {}  {}{}  {}",
            local_time(s.started_at).format("%Y-%m-%d"),
            s.name.bold(),
            state,
            format_volume(s.total_volume),
            prs,
            s.id.dimmed()
        );
    }
}

pub async fn handle(
    cmd: SessionCmd,
    store: Arc<SqliteStore>,
    settings: &Settings,
    fmt: OutputFmt,
) -> Result<()> {
    match cmd {
        SessionCmd::Start { name } => {
            let session = store.create_session(&settings.user_id, &name, None).await?;
            emit(fmt, &session, || {
                println!(
                    "{} session started (id: {})",
                    "ok:".green().bold(),
                    session.id
                );
                println!("{} repsy session live {}", "next:".dimmed(), session.id);
            })?;
        }

        SessionCmd::List => {
            let sessions = store.list_sessions(&settings.user_id).await?;
            emit(fmt, &sessions, || print_history(&sessions))?;
        }

        SessionCmd::Show { id } => {
            let session = store
                .fetch_session(&id)
                .await
                .with_context(|| format!("Could not load session `{}`", id))?;
            let catalog = store.fetch_exercise_catalog().await?;
            emit(fmt, &session, || print_session(&session, &catalog))?;
        }

        SessionCmd::Live { id } => {
            crate::commands::live::run(store, settings, &id).await?;
        }

        SessionCmd::Finish { id } => {
            let mut workout = Workout::new(store, settings);
            workout.open(&id).await?;
            let finished = workout.finish().await?;
            emit(fmt, &finished, || {
                println!(
                    "{} finished `{}` — {} volume, {} PR",
                    "ok:".green().bold(),
                    finished.name,
                    format_volume(finished.total_volume),
                    finished.pr_count
                )
            })?;
        }

        SessionCmd::Note { id, text } => {
            let session = store
                .fetch_session(&id)
                .await
                .with_context(|| format!("Could not load session `{}`", id))?;
            store
                .update_session(&id, &session.name, Some(text.trim()), None)
                .await?;
            println!("{} note saved (id: {})", "ok:".green().bold(), id);
        }

        SessionCmd::Delete { id } => {
            if store.delete_session(&id).await? {
                println!("{} session deleted (id: {})", "ok:".green().bold(), id);
            } else {
                println!("{} no session with id {}", "error:".red().bold(), id);
            }
        }
    }

    Ok(())
}
