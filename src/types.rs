use once_cell::sync::Lazy;
use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
    time::Duration,
};
use strsim::jaro_winkler;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{autosave::DEFAULT_AUTOSAVE_DELAY, rest_timer::DEFAULT_REST_SECS};

pub static ALLOWED_MUSCLES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "biceps",
        "triceps",
        "forearms",
        "chest",
        "shoulders",
        "back",
        "quads",
        "hamstrings",
        "glutes",
        "calves",
        "core",
    ])
});

/// Returns the canonical lowercase muscle group or `None` if not allowed.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<String> {
    let m = m.as_ref().trim().to_ascii_lowercase();
    let m = match m.as_str() {
        "abs" | "abdominals" => "core".to_string(),
        "quadriceps" | "quad" => "quads".to_string(),
        _ => m,
    };

    ALLOWED_MUSCLES.contains(m.as_str()).then_some(m)
}

/// Best match among `candidates` for `input` if it is close enough and
/// clearly ahead of the runner-up.
pub fn best_suggestion<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let inp = input.trim().to_lowercase();
    if inp.is_empty() {
        return None;
    }

    let mut scores: Vec<(&'a str, f64)> = candidates
        .into_iter()
        .map(|c| (c, jaro_winkler(&inp, &c.to_lowercase())))
        .collect();
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = *scores.first()?;
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    (best_score >= MIN_SCORE && best_score - second_score >= GAP).then_some(best)
}

pub fn best_muscle_suggestion(input: &str) -> Option<&'static str> {
    best_suggestion(input, ALLOWED_MUSCLES.iter().copied())
}

#[derive(Deserialize)]
pub struct ExerciseDef {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub muscle_group: String,
}

#[derive(Deserialize)]
pub struct ExerciseImport {
    pub exercise: Vec<ExerciseDef>,
}

/// Flat `key = "value"` settings file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    pub fn default_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|d| d.join("repsy").join("config"))
    }

    /// A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let content = toml::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to save config to {}", path.display()))
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T, valid: impl Fn(&T) -> bool) -> T {
        let Some(raw) = self.map.get(key) else {
            return default;
        };
        match raw.trim().parse() {
            Ok(value) if valid(&value) => value,
            _ => {
                warn!(key, value = %raw, "unusable config value, using default");
                default
            }
        }
    }

    pub fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            db_path: self.map.get("db").cloned().unwrap_or(defaults.db_path),
            user_id: self.map.get("user").cloned().unwrap_or(defaults.user_id),
            autosave_delay: Duration::from_secs(
                self.parsed("autosave_secs", defaults.autosave_delay.as_secs(), |_| true),
            ),
            rest_secs: self.parsed("rest_secs", defaults.rest_secs, |secs| *secs >= 1),
        }
    }
}

/// Resolved configuration handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub db_path: String,
    pub user_id: String,
    pub autosave_delay: Duration,
    pub rest_secs: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: "./repsy.db".to_string(),
            user_id: "local".to_string(),
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
            rest_secs: DEFAULT_REST_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFmt {
    Text,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Prints `value` as pretty JSON when asked to, otherwise runs `text`.
pub fn emit<T: Serialize>(fmt: OutputFmt, value: &T, text: impl FnOnce()) -> Result<()> {
    match fmt {
        OutputFmt::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFmt::Text => text(),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muscles_are_canonicalised() {
        assert_eq!(canonical_muscle("Chest"), Some("chest".into()));
        assert_eq!(canonical_muscle(" abs "), Some("core".into()));
        assert_eq!(canonical_muscle("wings"), None);
    }

    #[test]
    fn suggestions_need_a_clear_winner() {
        assert_eq!(best_muscle_suggestion("hamstring"), Some("hamstrings"));
        assert_eq!(best_muscle_suggestion("zzz"), None);
        assert_eq!(
            best_suggestion("bench pres", ["Bench Press", "Back Squat", "Deadlift"]),
            Some("Bench Press")
        );
    }

    #[test]
    fn settings_fall_back_on_bad_values() {
        let mut cfg = Config::default();
        cfg.map.insert("rest_secs".into(), "120".into());
        cfg.map.insert("autosave_secs".into(), "soon".into());

        let settings = cfg.settings();
        assert_eq!(settings.rest_secs, 120);
        assert_eq!(settings.autosave_delay, Duration::from_secs(30));
        assert_eq!(settings.user_id, "local");
    }

    #[test]
    fn rest_interval_must_be_positive() {
        for raw in ["0", "-15"] {
            let mut cfg = Config::default();
            cfg.map.insert("rest_secs".into(), raw.into());
            assert_eq!(cfg.settings().rest_secs, DEFAULT_REST_SECS);
        }
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repsy").join("config");

        assert!(Config::load(&path).unwrap().map.is_empty());

        let mut cfg = Config::default();
        cfg.map.insert("db".into(), "/tmp/gym.db".into());
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.settings().db_path, "/tmp/gym.db");
    }
}
