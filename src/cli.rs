use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "repsy", version, about = "Workout tracker with live sessions")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Workout sessions
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Exercise catalog
    #[command(subcommand, visible_alias = "ex")]
    Exercise(ExerciseCmd),

    /// Progress reports over finished workouts
    #[command(subcommand, visible_alias = "r")]
    Report(ReportCmd),

    /// View or edit repsy config
    #[command(subcommand)]
    Config(ConfigCmd),
}

//
// Commands
//

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a new workout
    #[command(visible_alias = "s")]
    Start {
        /// Display name of the workout
        name: String,
    },

    /// List workouts, newest first
    #[command(visible_alias = "l")]
    List,

    /// Show a workout in detail
    #[command(visible_alias = "i")]
    Show { id: String },

    /// Log a workout interactively (autosaves, runs the rest timer)
    #[command(visible_alias = "go")]
    Live { id: String },

    /// Mark a workout finished
    Finish { id: String },

    /// Attach a note to a workout
    #[command(visible_alias = "n")]
    Note {
        id: String,

        /// Note text, replaces any earlier note
        text: String,
    },

    /// Delete a workout
    #[command(visible_alias = "d")]
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCmd {
    /// Add a new exercise
    #[command(visible_alias = "a")]
    Add {
        /// Exercise name
        name: String,

        /// Muscle group
        #[arg(short, long)]
        muscle: String,

        /// Equipment or movement category
        #[arg(short, long, default_value = "")]
        category: String,
    },

    /// Import exercises from a TOML file
    #[command(visible_alias = "i")]
    Import {
        /// Path to TOML file
        file: String,
    },

    /// List all exercises
    #[command(visible_alias = "l")]
    List {
        /// Filter by muscle group
        #[arg(short, long)]
        muscle: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ReportCmd {
    /// Volume per workout for one exercise
    Volume {
        /// Exercise name
        exercise: String,
    },

    /// Estimated one-rep max per workout for one exercise
    Strength {
        /// Exercise name
        exercise: String,
    },

    /// Finished workouts per week
    Frequency {
        /// Number of weeks to show
        #[arg(short, long, default_value = "8")]
        weeks: u32,
    },

    /// Volume per muscle group
    Muscles,
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}
