//! Spirit encounter records.
//!
//! An [`Encounter`] is produced by the catalog when a spirit is found and
//! written into the journal once the player completes its task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Longest personal note the front end accepts, in characters.
pub const MAX_NOTE_CHARS: usize = 200;

/// Category of a spirit's task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncounterType {
    Mindfulness,
    Story,
    Puzzle,
}

impl EncounterType {
    /// Every category, in display order.
    pub const ALL: [EncounterType; 3] = [
        EncounterType::Mindfulness,
        EncounterType::Story,
        EncounterType::Puzzle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EncounterType::Mindfulness => "Mindfulness",
            EncounterType::Story => "Story",
            EncounterType::Puzzle => "Puzzle",
        }
    }

    /// Badge shown next to journal entries of this category.
    pub fn icon(&self) -> &'static str {
        match self {
            EncounterType::Mindfulness => "🧘",
            EncounterType::Story => "📖",
            EncounterType::Puzzle => "🧩",
        }
    }
}

impl fmt::Display for EncounterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when text does not name an encounter category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown encounter type: {0}")]
pub struct ParseEncounterTypeError(pub String);

impl FromStr for EncounterType {
    type Err = ParseEncounterTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mindfulness" => Ok(EncounterType::Mindfulness),
            "story" => Ok(EncounterType::Story),
            "puzzle" => Ok(EncounterType::Puzzle),
            _ => Err(ParseEncounterTypeError(s.to_string())),
        }
    }
}

/// A generated or completed spirit encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    /// Unique within a session; repeated completions keep the same id.
    pub id: String,

    pub spirit_name: String,

    #[serde(rename = "type")]
    pub encounter_type: EncounterType,

    /// Prompt the spirit gives the player.
    pub task: String,

    /// Flavor label for what the player receives.
    pub reward: String,

    /// Generation time, replaced by the completion time in the journal.
    pub date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_note: Option<String>,

    pub completed: bool,

    pub xp_earned: u32,
}

impl Encounter {
    /// The journal form of this encounter: completed now, with the note attached.
    ///
    /// Only `personal_note`, `completed` and `date` change.
    pub fn completed_at(&self, at: DateTime<Utc>, personal_note: impl Into<String>) -> Self {
        Self {
            personal_note: Some(personal_note.into()),
            completed: true,
            date: at,
            ..self.clone()
        }
    }

    /// The note, if one was written and it is not blank.
    pub fn note(&self) -> Option<&str> {
        self.personal_note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Truncate a note to [`MAX_NOTE_CHARS`] characters.
pub fn clamp_note(note: &str) -> String {
    note.chars().take(MAX_NOTE_CHARS).collect()
}
