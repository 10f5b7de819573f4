//! Journal views: filtering, per-category counts, ordering and export.

use crate::encounter::{Encounter, EncounterType};
use crate::state::ProgressionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Which journal entries to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalFilter {
    #[default]
    All,
    Only(EncounterType),
}

impl JournalFilter {
    pub fn matches(&self, encounter: &Encounter) -> bool {
        match self {
            JournalFilter::All => true,
            JournalFilter::Only(t) => encounter.encounter_type == *t,
        }
    }
}

impl From<EncounterType> for JournalFilter {
    fn from(t: EncounterType) -> Self {
        JournalFilter::Only(t)
    }
}

/// Entries matching `filter`, in journal order.
pub fn filter_journal(journal: &[Encounter], filter: JournalFilter) -> Vec<&Encounter> {
    journal.iter().filter(|e| filter.matches(e)).collect()
}

/// Entries sorted most recent first. Entries with equal dates keep journal order.
pub fn newest_first<'a>(entries: impl IntoIterator<Item = &'a Encounter>) -> Vec<&'a Encounter> {
    let mut sorted: Vec<_> = entries.into_iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted
}

/// Encounter counts per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JournalStats {
    pub total: usize,
    pub mindfulness: usize,
    pub story: usize,
    pub puzzle: usize,
}

impl JournalStats {
    pub fn from_journal(journal: &[Encounter]) -> Self {
        let mut stats = Self::default();
        for encounter in journal {
            stats.total += 1;
            match encounter.encounter_type {
                EncounterType::Mindfulness => stats.mindfulness += 1,
                EncounterType::Story => stats.story += 1,
                EncounterType::Puzzle => stats.puzzle += 1,
            }
        }
        stats
    }

    pub fn count(&self, filter: JournalFilter) -> usize {
        match filter {
            JournalFilter::All => self.total,
            JournalFilter::Only(EncounterType::Mindfulness) => self.mindfulness,
            JournalFilter::Only(EncounterType::Story) => self.story,
            JournalFilter::Only(EncounterType::Puzzle) => self.puzzle,
        }
    }
}

/// A shareable summary of the player's journey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyExport {
    pub xp: u64,
    pub spirit_bond_level: u64,
    pub journal_count: usize,
    pub encounters: Vec<ExportedEncounter>,
    pub export_date: DateTime<Utc>,
}

/// One journal entry in an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedEncounter {
    pub spirit_name: String,
    #[serde(rename = "type")]
    pub encounter_type: EncounterType,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_note: Option<String>,
}

impl JourneyExport {
    pub fn from_state(state: &ProgressionState, exported_at: DateTime<Utc>) -> Self {
        Self {
            xp: state.xp(),
            spirit_bond_level: state.spirit_bond_level(),
            journal_count: state.journal().len(),
            encounters: state
                .journal()
                .iter()
                .map(|e| ExportedEncounter {
                    spirit_name: e.spirit_name.clone(),
                    encounter_type: e.encounter_type,
                    date: e.date,
                    personal_note: e.personal_note.clone(),
                })
                .collect(),
            export_date: exported_at,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the export as pretty JSON.
    pub async fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let content = self.to_json()?;
        fs::write(path, content).await?;
        Ok(())
    }
}

/// Errors from writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
