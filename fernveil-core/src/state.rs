//! Progression state: XP, bond level, journal and preferences.

use crate::encounter::Encounter;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// XP needed to advance one bond level.
pub const XP_PER_LEVEL: u64 = 100;

/// Bond level for a total XP: `floor(xp / 100) + 1`.
pub fn bond_level(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

/// The player's progression.
///
/// `spirit_bond_level` is always recomputed from `xp`; nothing outside this
/// module can set either field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionState {
    xp: u64,
    spirit_bond_level: u64,
    journal: Vec<Encounter>,
    sound_enabled: bool,
    current_encounter: Option<Encounter>,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            xp: 0,
            spirit_bond_level: 1,
            journal: Vec::new(),
            sound_enabled: true,
            current_encounter: None,
        }
    }
}

impl ProgressionState {
    pub fn xp(&self) -> u64 {
        self.xp
    }

    pub fn spirit_bond_level(&self) -> u64 {
        self.spirit_bond_level
    }

    /// Completed encounters in the order they were completed.
    pub fn journal(&self) -> &[Encounter] {
        &self.journal
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    /// The encounter in progress, if any. Never persisted.
    pub fn current_encounter(&self) -> Option<&Encounter> {
        self.current_encounter.as_ref()
    }

    pub fn progress(&self) -> BondProgress {
        BondProgress::from_xp(self.xp)
    }

    pub(crate) fn set_current_encounter(&mut self, encounter: Encounter) {
        self.current_encounter = Some(encounter);
    }

    pub(crate) fn record_completion(&mut self, completed: Encounter) {
        self.xp = self.xp.saturating_add(u64::from(completed.xp_earned));
        self.spirit_bond_level = bond_level(self.xp);
        self.journal.push(completed);
        self.current_encounter = None;
    }

    pub(crate) fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }

    /// Back to first-run defaults, sound preference included.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Overlay persisted fields, falling back to defaults for missing ones.
    ///
    /// The in-flight encounter is kept. The stored level is ignored in favour
    /// of the one derived from `xp`.
    pub(crate) fn restore(&mut self, saved: PersistedProgress) {
        self.xp = saved.xp.unwrap_or(0);
        self.spirit_bond_level = bond_level(self.xp);
        self.journal = saved.journal.unwrap_or_default();
        self.sound_enabled = saved.sound_enabled.unwrap_or(true);
    }

    /// The durable part of the state.
    pub fn to_persisted(&self) -> PersistedProgress {
        PersistedProgress {
            xp: Some(self.xp),
            spirit_bond_level: Some(self.spirit_bond_level),
            journal: Some(self.journal.clone()),
            sound_enabled: Some(self.sound_enabled),
        }
    }
}

/// The blob written to storage.
///
/// Every field is optional so that blobs written by older or newer versions
/// still load. Use [`from_object`](Self::from_object) when reading: it
/// decodes each field on its own so one bad field does not cost the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProgress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spirit_bond_level: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal: Option<Vec<Encounter>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
}

impl PersistedProgress {
    /// Decode a stored object field by field.
    ///
    /// A field of the wrong shape is treated as missing. Journal entries that
    /// do not decode are skipped; the rest are kept in order.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let xp = object.get("xp").and_then(|v| number_field("xp", v));
        let spirit_bond_level = object
            .get("spiritBondLevel")
            .and_then(|v| number_field("spiritBondLevel", v));

        let sound_enabled = object.get("soundEnabled").and_then(|v| match v {
            Value::Bool(enabled) => Some(*enabled),
            Value::Null => None,
            other => {
                warn!(value = %other, "Ignoring stored soundEnabled that is not a boolean");
                None
            }
        });

        let journal = object.get("journal").and_then(|v| match v {
            Value::Array(entries) => Some(decode_journal(entries)),
            Value::Null => None,
            _ => {
                warn!("Ignoring stored journal that is not a list");
                None
            }
        });

        Self {
            xp,
            spirit_bond_level,
            journal,
            sound_enabled,
        }
    }
}

fn number_field(name: &str, value: &Value) -> Option<u64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .or_else(|| {
                warn!(field = name, value = %n, "Ignoring negative stored number");
                None
            }),
        other => {
            warn!(field = name, value = %other, "Ignoring stored field that is not a number");
            None
        }
    }
}

fn decode_journal(entries: &[Value]) -> Vec<Encounter> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match serde_json::from_value::<Encounter>(entry.clone()) {
                Ok(encounter) => Some(encounter),
                Err(e) => {
                    warn!(index, error = %e, "Skipping journal entry that does not decode");
                    None
                }
            }
        })
        .collect()
}

/// How far the player is towards the next bond level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BondProgress {
    pub level: u64,
    /// Total XP at which the next level is reached.
    pub next_level_xp: u64,
    /// XP earned within the current level.
    pub xp_into_level: u64,
    /// `xp_into_level` as a fraction of [`XP_PER_LEVEL`], in `[0, 1)`.
    pub fraction: f64,
}

impl BondProgress {
    pub fn from_xp(xp: u64) -> Self {
        let level = bond_level(xp);
        let xp_into_level = xp % XP_PER_LEVEL;
        Self {
            level,
            next_level_xp: level * XP_PER_LEVEL,
            xp_into_level,
            fraction: xp_into_level as f64 / XP_PER_LEVEL as f64,
        }
    }

    /// XP still needed for the next level.
    pub fn remaining(&self) -> u64 {
        XP_PER_LEVEL - self.xp_into_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_encounter;
    use crate::EncounterType;

    #[test]
    fn test_bond_level_formula() {
        assert_eq!(bond_level(0), 1);
        assert_eq!(bond_level(99), 1);
        assert_eq!(bond_level(100), 2);
        assert_eq!(bond_level(105), 2);
        assert_eq!(bond_level(250), 3);
    }

    #[test]
    fn test_defaults() {
        let state = ProgressionState::default();
        assert_eq!(state.xp(), 0);
        assert_eq!(state.spirit_bond_level(), 1);
        assert!(state.journal().is_empty());
        assert!(state.sound_enabled());
        assert!(state.current_encounter().is_none());
    }

    #[test]
    fn test_record_completion_keeps_level_in_step() {
        let mut state = ProgressionState::default();
        for xp in [25, 80, 3, 92, 100, 1] {
            state.record_completion(sample_encounter(EncounterType::Story, xp));
            assert_eq!(state.spirit_bond_level(), state.xp() / 100 + 1);
        }
        assert_eq!(state.xp(), 301);
        assert_eq!(state.spirit_bond_level(), 4);
        assert_eq!(state.journal().len(), 6);
    }

    #[test]
    fn test_restore_fills_missing_fields() {
        let mut state = ProgressionState::default();
        state.toggle_sound();
        state.record_completion(sample_encounter(EncounterType::Puzzle, 40));

        state.restore(PersistedProgress {
            xp: Some(130),
            ..Default::default()
        });

        assert_eq!(state.xp(), 130);
        assert_eq!(state.spirit_bond_level(), 2);
        assert!(state.journal().is_empty());
        assert!(state.sound_enabled());
    }

    #[test]
    fn test_restore_recomputes_stale_level() {
        let mut state = ProgressionState::default();
        state.restore(PersistedProgress {
            xp: Some(250),
            spirit_bond_level: Some(9),
            journal: None,
            sound_enabled: Some(false),
        });

        assert_eq!(state.spirit_bond_level(), 3);
        assert!(!state.sound_enabled());
    }

    #[test]
    fn test_persisted_shape() {
        let mut state = ProgressionState::default();
        state.record_completion(sample_encounter(EncounterType::Mindfulness, 15));
        state.set_current_encounter(sample_encounter(EncounterType::Story, 20));

        let json = serde_json::to_value(state.to_persisted()).unwrap();
        let object = json.as_object().unwrap();

        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["journal", "soundEnabled", "spiritBondLevel", "xp"]);
        assert_eq!(json["xp"], 15);
        assert_eq!(json["journal"].as_array().unwrap().len(), 1);
    }

    fn object(json: Value) -> Map<String, Value> {
        match json {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn test_from_object_skips_bad_journal_entries() {
        let good = serde_json::to_value(sample_encounter(EncounterType::Story, 20)).unwrap();
        let mut unknown_type = good.clone();
        unknown_type["type"] = Value::from("Nature");
        let mut missing_id = good.clone();
        missing_id.as_object_mut().unwrap().remove("id");

        let saved = PersistedProgress::from_object(&object(serde_json::json!({
            "xp": 480,
            "spiritBondLevel": 5,
            "soundEnabled": false,
            "journal": [unknown_type, good, missing_id, 7],
        })));

        assert_eq!(saved.xp, Some(480));
        assert_eq!(saved.spirit_bond_level, Some(5));
        assert_eq!(saved.sound_enabled, Some(false));
        let journal = saved.journal.unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].xp_earned, 20);
    }

    #[test]
    fn test_from_object_drops_mistyped_fields_only() {
        let saved = PersistedProgress::from_object(&object(serde_json::json!({
            "xp": "lots",
            "spiritBondLevel": 2,
            "soundEnabled": "false",
            "journal": {"not": "a list"},
        })));

        assert_eq!(
            saved,
            PersistedProgress {
                xp: None,
                spirit_bond_level: Some(2),
                journal: None,
                sound_enabled: None,
            }
        );

        let mut state = ProgressionState::default();
        state.restore(saved);
        assert_eq!(state, ProgressionState::default());
    }

    #[test]
    fn test_from_object_reads_what_to_persisted_writes() {
        let mut state = ProgressionState::default();
        state.record_completion(sample_encounter(EncounterType::Puzzle, 25));
        state.toggle_sound();

        let json = serde_json::to_value(state.to_persisted()).unwrap();
        assert_eq!(PersistedProgress::from_object(&object(json)), state.to_persisted());
    }

    #[test]
    fn test_bond_progress() {
        let progress = BondProgress::from_xp(105);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.next_level_xp, 200);
        assert_eq!(progress.xp_into_level, 5);
        assert_eq!(progress.remaining(), 95);
        assert!((progress.fraction - 0.05).abs() < f64::EPSILON);

        let start = BondProgress::from_xp(0);
        assert_eq!(start.next_level_xp, 100);
        assert_eq!(start.fraction, 0.0);
    }
}
