use serde::Serialize;

/// Rest interval started when a set is completed.
pub const DEFAULT_REST_SECS: i64 = 90;

/// Single-slot countdown bound to the set that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestTimer {
    pub exercise_index: usize,
    pub set_index: usize,
    pub seconds_left: i64,
}

impl RestTimer {
    pub fn start(exercise_index: usize, set_index: usize, seconds: i64) -> Self {
        Self {
            exercise_index,
            set_index,
            seconds_left: seconds,
        }
    }

    /// One second passes. The timer is gone once it reaches zero.
    pub fn tick(self) -> Option<Self> {
        let seconds_left = self.seconds_left - 1;
        if seconds_left <= 0 {
            None
        } else {
            Some(Self {
                seconds_left,
                ..self
            })
        }
    }

    /// `M:SS`, the way the countdown is shown.
    pub fn display(&self) -> String {
        let secs = self.seconds_left.max(0);
        format!("{}:{:02}", secs / 60, secs % 60)
    }
}
