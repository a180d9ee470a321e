use std::{collections::BTreeSet, path::Path};

use crate::{
    cli::ExerciseCmd,
    models::Exercise,
    storage::SqliteStore,
    store::SessionStore,
    types::{
        ALLOWED_MUSCLES, ExerciseImport, OutputFmt, best_muscle_suggestion, canonical_muscle,
        emit,
    },
};
use anyhow::{Context, Result};
use colored::Colorize;

/// Resolves a muscle group, printing a hint when it is unknown.
fn checked_muscle(exercise: &str, muscle: &str) -> Option<String> {
    if let Some(m) = canonical_muscle(muscle) {
        return Some(m);
    }

    match best_muscle_suggestion(muscle) {
        Some(sug) => println!(
            "{} `{}` skipped – unknown muscle `{}` -- did you mean: `{}`?",
            "warning:".yellow().bold(),
            exercise,
            muscle,
            sug.green()
        ),
        None => println!(
            "{} `{}` skipped – unknown muscle `{}`",
            "warning:".yellow().bold(),
            exercise,
            muscle
        ),
    }
    None
}

fn allowed_muscles() -> String {
    let allowed: BTreeSet<&str> = ALLOWED_MUSCLES.iter().copied().collect();
    allowed.into_iter().collect::<Vec<_>>().join(", ")
}

fn print_catalog(exercises: &[Exercise]) {
    if exercises.is_empty() {
        println!("{}", "(no exercises)".dimmed());
        return;
    }

    let width = exercises.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);
    println!("{}", "Exercises:".cyan().bold());
    for (i, ex) in exercises.iter().enumerate() {
        let pad = width - ex.name.chars().count();
        println!(
            "{} • {}{}  {} {}",
            format!("{:>3}", i + 1).yellow(),
            ex.name.bold(),
            " ".repeat(pad),
            ex.muscle_group.green(),
            ex.category.dimmed()
        );
    }
}

pub async fn handle(cmd: ExerciseCmd, store: &SqliteStore, fmt: OutputFmt) -> Result<()> {
    match cmd {
        ExerciseCmd::Add {
            name,
            muscle,
            category,
        } => {
            let Some(muscle) = checked_muscle(&name, &muscle) else {
                println!("{} {}", "Allowed muscles:".cyan().bold(), allowed_muscles());
                return Ok(());
            };

            match store.add_catalog_exercise(name.trim(), &category, &muscle).await? {
                Some(_) => println!("{} Exercise \"{}\" added", "info:".blue().bold(), name),
                None => println!(
                    "{} Exercise \"{}\" already exists — use `ex list` to view all exercises",
                    "warning:".yellow().bold(),
                    name
                ),
            }
        }

        ExerciseCmd::Import { file } => {
            let toml_str = tokio::fs::read_to_string(Path::new(&file))
                .await
                .with_context(|| format!("Could not read file: `{}`", file))?;

            let import: ExerciseImport = toml::from_str(&toml_str)
                .context("Failed to parse TOML: Expected `[[exercise]] entries`")?;

            if import.exercise.is_empty() {
                println!("{}", "warning: no [[exercise]] entries found".yellow().bold());
                return Ok(());
            }

            let mut inserted = 0;
            let mut skipped = 0;
            let mut unknowns: BTreeSet<String> = BTreeSet::new();

            for ex in import.exercise {
                if ex.name.trim().is_empty() {
                    skipped += 1;
                    continue;
                }

                let Some(muscle) = checked_muscle(&ex.name, &ex.muscle_group) else {
                    skipped += 1;
                    unknowns.insert(ex.muscle_group);
                    continue;
                };

                let category = ex.category.unwrap_or_default();
                let added = store
                    .add_catalog_exercise(ex.name.trim(), &category, &muscle)
                    .await
                    .with_context(|| format!("DB error inserting `{}`", ex.name))?;

                if added.is_some() {
                    inserted += 1;
                    println!("{} `{}`", "ok:".green().bold(), ex.name);
                } else {
                    skipped += 1;
                    println!("{} `{}` (already exists)", "info:".blue().bold(), ex.name);
                }
            }

            println!(
                "\n{} {} inserted, {} skipped",
                "Summary:".cyan().bold(),
                inserted,
                skipped
            );

            if !unknowns.is_empty() {
                let bad = unknowns.into_iter().collect::<Vec<_>>().join(", ");
                println!();
                println!("{} {}", "Unknown muscles:".yellow().bold(), bad);
                println!("{} {}", "Allowed muscles:".cyan().bold(), allowed_muscles());
            }
        }

        ExerciseCmd::List { muscle } => {
            let mut catalog = store.fetch_exercise_catalog().await?;

            if let Some(filter) = muscle {
                let Some(m) = canonical_muscle(&filter) else {
                    println!("{} unknown muscle `{}`", "error:".red().bold(), filter);
                    println!("{} {}", "Allowed muscles:".cyan().bold(), allowed_muscles());
                    return Ok(());
                };
                catalog.retain(|e| e.muscle_group == m);
            }

            emit(fmt, &catalog, || print_catalog(&catalog))?;
        }
    }

    Ok(())
}
