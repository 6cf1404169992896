use std::fmt;

use serde::{Deserialize, Serialize};

/// The total order a MediaItem / Season advances through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Rip,
    Organize,
    Remux,
    Transcode,
    Publish,
}

const ORDER: [Stage; 5] = [
    Stage::Rip,
    Stage::Organize,
    Stage::Remux,
    Stage::Transcode,
    Stage::Publish,
];

impl Stage {
    /// The stage that follows this one, or `None` if this stage is terminal.
    pub fn next(self) -> Option<Stage> {
        let idx = ORDER.iter().position(|s| *s == self).expect("exhaustive");
        ORDER.get(idx + 1).copied()
    }

    /// The stage that precedes this one, or `None` if this stage is first.
    pub fn previous(self) -> Option<Stage> {
        let idx = ORDER.iter().position(|s| *s == self).expect("exhaustive");
        idx.checked_sub(1).map(|i| ORDER[i])
    }

    pub fn is_terminal(self) -> bool {
        self == Stage::Publish
    }

    pub fn ordinal(self) -> usize {
        ORDER.iter().position(|s| *s == self).expect("exhaustive")
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Stage::Rip => "Rip",
            Stage::Organize => "Organize",
            Stage::Remux => "Remux",
            Stage::Transcode => "Transcode",
            Stage::Publish => "Publish",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Rip => "rip",
            Stage::Organize => "organize",
            Stage::Remux => "remux",
            Stage::Transcode => "transcode",
            Stage::Publish => "publish",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Stage> {
        match s {
            "rip" => Some(Stage::Rip),
            "organize" => Some(Stage::Organize),
            "remux" => Some(Stage::Remux),
            "transcode" => Some(Stage::Transcode),
            "publish" => Some(Stage::Publish),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns `true` iff moving `current_stage` to `candidate` respects the
/// monotonicity invariant: stay put, or advance to the immediate next stage.
pub fn is_valid_stage_transition(current: Stage, candidate: Stage) -> bool {
    candidate == current || Some(candidate) == current.next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_order_is_rip_through_publish() {
        assert_eq!(Stage::Rip.next(), Some(Stage::Organize));
        assert_eq!(Stage::Organize.next(), Some(Stage::Remux));
        assert_eq!(Stage::Remux.next(), Some(Stage::Transcode));
        assert_eq!(Stage::Transcode.next(), Some(Stage::Publish));
        assert_eq!(Stage::Publish.next(), None);
        assert!(Stage::Publish.is_terminal());
    }

    #[test]
    fn previous_mirrors_next() {
        assert_eq!(Stage::Rip.previous(), None);
        assert_eq!(Stage::Organize.previous(), Some(Stage::Rip));
        assert_eq!(Stage::Publish.previous(), Some(Stage::Transcode));
    }

    #[test]
    fn transition_validity() {
        assert!(is_valid_stage_transition(Stage::Rip, Stage::Rip));
        assert!(is_valid_stage_transition(Stage::Rip, Stage::Organize));
        assert!(!is_valid_stage_transition(Stage::Rip, Stage::Remux));
        assert!(!is_valid_stage_transition(Stage::Remux, Stage::Rip));
    }

    #[test]
    fn round_trips_through_str() {
        for stage in ORDER {
            assert_eq!(Stage::from_str_opt(stage.as_str()), Some(stage));
        }
    }
}
