use std::{str::FromStr, sync::Arc, time::Duration};

use anyhow::Result;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    storage::SqliteStore,
    store::SessionStore,
    types::{Settings, best_suggestion},
    utils::{format_elapsed, format_volume, now_millis},
    workout::{Workout, WorkoutError},
};

/// One line typed during a live workout. Indices are 1-based on input and
/// 0-based once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveInput {
    Weight { exercise: usize, set: usize, value: String },
    Reps { exercise: usize, set: usize, value: String },
    Toggle { exercise: usize, set: usize },
    AddSet { exercise: usize },
    AddExercise { name: String },
    Rename { name: String },
    Skip,
    Show,
    Save,
    Finish,
    Quit,
    Help,
}

fn index(raw: Option<&str>, what: &str) -> Result<usize, String> {
    let raw = raw.ok_or_else(|| format!("missing {what} index"))?;
    raw.parse::<usize>()
        .ok()
        .and_then(|i| i.checked_sub(1))
        .ok_or_else(|| format!("{what} index must be a number ≥ 1, got `{raw}`"))
}

impl FromStr for LiveInput {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut args = rest.split_whitespace();

        match cmd {
            "w" | "weight" | "r" | "reps" => {
                let exercise = index(args.next(), "exercise")?;
                let set = index(args.next(), "set")?;
                let value = args.collect::<Vec<_>>().join(" ");
                Ok(if cmd.starts_with('w') {
                    Self::Weight { exercise, set, value }
                } else {
                    Self::Reps { exercise, set, value }
                })
            }
            "c" | "done" => Ok(Self::Toggle {
                exercise: index(args.next(), "exercise")?,
                set: index(args.next(), "set")?,
            }),
            "+s" | "set" => Ok(Self::AddSet {
                exercise: index(args.next(), "exercise")?,
            }),
            "+e" | "add" if !rest.is_empty() => Ok(Self::AddExercise {
                name: rest.to_string(),
            }),
            "name" if !rest.is_empty() => Ok(Self::Rename {
                name: rest.to_string(),
            }),
            "skip" => Ok(Self::Skip),
            "show" | "" => Ok(Self::Show),
            "save" => Ok(Self::Save),
            "finish" => Ok(Self::Finish),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "?" | "help" => Ok(Self::Help),
            _ => Err(format!("unknown command `{line}` (try `help`)")),
        }
    }
}

fn print_help() {
    println!("{}", "Commands:".cyan().bold());
    for (usage, what) in [
        ("w EX SET VALUE", "set weight"),
        ("r EX SET VALUE", "set reps"),
        ("c EX SET", "complete / uncomplete a set"),
        ("+s EX", "add a set"),
        ("+e NAME", "add an exercise"),
        ("name TEXT", "rename the workout"),
        ("skip", "dismiss the rest timer"),
        ("show", "show the workout"),
        ("save", "save now"),
        ("finish", "save and finish"),
        ("quit", "save and leave"),
    ] {
        println!("  {:<16} {}", usage.yellow(), what);
    }
}

fn render<S: SessionStore>(workout: &Workout<S>) {
    let summary = workout.summary(now_millis());
    let live = workout.snapshot();

    let unsaved = if summary.dirty {
        " (unsaved)".yellow().to_string()
    } else {
        String::new()
    };
    println!(
        "\n{} {}{}  {}  {}  {} PR",
        "Workout:".cyan().bold(),
        summary.name.bold(),
        unsaved,
        format_elapsed(summary.elapsed_secs),
        format_volume(summary.volume),
        summary.pr_count
    );
    if let Some(timer) = summary.rest_timer {
        println!("{} {}", "Rest:".green().bold(), timer.display());
    }

    for (i, ex) in live.exercises().iter().enumerate() {
        let prev = ex
            .previous_best
            .as_deref()
            .map(|p| format!("  prev {}", p).dimmed().to_string())
            .unwrap_or_default();
        println!(
            "{} • {} {}{}",
            format!("{}", i + 1).yellow(),
            ex.name.bold(),
            ex.muscle_group.dimmed(),
            prev
        );
        for set in &ex.sets {
            let mark = if set.completed { "✓".green() } else { "·".dimmed() };
            let pr = if set.is_pr { " PR".red().bold().to_string() } else { String::new() };
            let weight = if set.weight.is_empty() { "–" } else { set.weight.as_str() };
            let reps = if set.reps.is_empty() { "–" } else { set.reps.as_str() };
            println!("    {} {}: {}kg × {}{}", mark, set.set_number, weight, reps, pr);
        }
    }
}

/// Applies one input. Returns `false` once the loop should stop.
async fn apply<S: SessionStore>(workout: &mut Workout<S>, input: LiveInput) -> Result<bool, WorkoutError> {
    match input {
        LiveInput::Weight { exercise, set, value } => workout.set_weight(exercise, set, &value)?,
        LiveInput::Reps { exercise, set, value } => workout.set_reps(exercise, set, &value)?,
        LiveInput::Toggle { exercise, set } => {
            if workout.toggle_set(exercise, set)? {
                if let Some(timer) = workout.rest_timer() {
                    println!("{} {}", "rest".green().bold(), timer.display());
                }
            }
        }
        LiveInput::AddSet { exercise } => workout.add_set(exercise)?,
        LiveInput::AddExercise { name } => {
            let found = workout
                .catalog()
                .iter()
                .find(|e| e.name.eq_ignore_ascii_case(&name))
                .map(|e| e.id.clone());
            match found {
                Some(id) => {
                    workout.add_exercise(&id).await?;
                    render(workout);
                }
                None => {
                    let hint = best_suggestion(&name, workout.catalog().iter().map(|e| e.name.as_str()))
                        .map(|s| format!(" -- did you mean: `{}`?", s.green()))
                        .unwrap_or_default();
                    println!("{} no exercise named `{}`{}", "error:".red().bold(), name, hint);
                }
            }
        }
        LiveInput::Rename { name } => workout.rename(&name),
        LiveInput::Skip => workout.dismiss_rest_timer(),
        LiveInput::Show => render(workout),
        LiveInput::Help => print_help(),
        LiveInput::Save => {
            workout.save().await?;
            println!("{} saved", "ok:".green().bold());
        }
        LiveInput::Finish => {
            let finished = workout.finish().await?;
            println!(
                "{} finished `{}` — {} volume, {} PR",
                "ok:".green().bold(),
                finished.name,
                format_volume(finished.total_volume),
                finished.pr_count
            );
            return Ok(false);
        }
        LiveInput::Quit => {
            if workout.summary(now_millis()).dirty {
                workout.save().await?;
            }
            return Ok(false);
        }
    }
    Ok(true)
}

pub async fn run(store: Arc<SqliteStore>, settings: &Settings, session_id: &str) -> Result<()> {
    let mut workout = Workout::new(store, settings);
    workout.open(session_id).await?;
    render(&workout);
    println!("{}", "type `help` for commands".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let resting = workout.rest_timer().is_some();
                workout.tick_rest_timer();
                if resting && workout.rest_timer().is_none() {
                    println!("{}", "rest over".green().bold());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    apply(&mut workout, LiveInput::Quit).await?;
                    break;
                };
                match line.parse::<LiveInput>() {
                    Ok(input) => match apply(&mut workout, input).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(err) => println!("{} {}", "error:".red().bold(), err),
                    },
                    Err(msg) => println!("{} {}", "error:".red().bold(), msg),
                }
            }
        }
    }

    Ok(())
}
