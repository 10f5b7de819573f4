//! Spirit catalog and encounter generation.
//!
//! The catalog is a fixed list of hand-authored spirit templates. Scanning
//! picks one uniformly at random and stamps it with a fresh id and the
//! current time.

use crate::clock::Clock;
use crate::encounter::{Encounter, EncounterType};
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

/// Errors from encounter generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("No spirits of type {0} in the catalog")]
    EmptyCategory(EncounterType),
}

/// An authored spirit, before it is stamped into an [`Encounter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpiritTemplate {
    pub spirit_name: String,
    pub encounter_type: EncounterType,
    pub task: String,
    pub reward: String,
    pub xp_earned: u32,
}

impl SpiritTemplate {
    /// Every spirit grants XP, so `xp_earned` must be positive.
    pub fn new(
        spirit_name: impl Into<String>,
        encounter_type: EncounterType,
        task: impl Into<String>,
        reward: impl Into<String>,
        xp_earned: u32,
    ) -> Self {
        debug_assert!(xp_earned > 0, "a spirit must grant XP");
        Self {
            spirit_name: spirit_name.into(),
            encounter_type,
            task: task.into(),
            reward: reward.into(),
            xp_earned,
        }
    }

    /// Stamp this template into a fresh, uncompleted encounter.
    pub fn instantiate(&self, clock: &dyn Clock) -> Encounter {
        Encounter {
            id: Uuid::new_v4().to_string(),
            spirit_name: self.spirit_name.clone(),
            encounter_type: self.encounter_type,
            task: self.task.clone(),
            reward: self.reward.clone(),
            date: clock.now(),
            personal_note: None,
            completed: false,
            xp_earned: self.xp_earned,
        }
    }
}

/// The set of spirits that can be found while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    spirits: Vec<SpiritTemplate>,
}

impl Catalog {
    pub fn new(spirits: Vec<SpiritTemplate>) -> Self {
        Self { spirits }
    }

    /// The spirits of the forest.
    pub fn reference() -> Self {
        Self::new(vec![
            SpiritTemplate::new(
                "Aurelia, the Breath Keeper",
                EncounterType::Mindfulness,
                "Find a comfortable spot beneath this ancient tree. Close your eyes and take 10 deep breaths, feeling the life energy flowing around you.",
                "Glowing Seed of Tranquility",
                15,
            ),
            SpiritTemplate::new(
                "Whisper, the Story Weaver",
                EncounterType::Story,
                "Listen carefully as I share the tale of how this forest came to be. Let your imagination paint the scenes in your mind.",
                "Memory Crystal",
                20,
            ),
            SpiritTemplate::new(
                "Sage, the Riddle Master",
                EncounterType::Puzzle,
                "I am always growing, yet never fully grown. I reach for the sky but am rooted in stone. What am I?",
                "Wisdom Rune",
                25,
            ),
            SpiritTemplate::new(
                "Luna, the Night Whisperer",
                EncounterType::Mindfulness,
                "Stand still for 5 minutes and listen to all the sounds around you. How many different sounds can you identify?",
                "Echo Stone",
                18,
            ),
            SpiritTemplate::new(
                "Moss, the Patient One",
                EncounterType::Story,
                "I've watched over this place for centuries. Let me tell you about the creatures that have called this forest home.",
                "Ancient Bark Fragment",
                22,
            ),
        ])
    }

    pub fn spirits(&self) -> &[SpiritTemplate] {
        &self.spirits
    }

    pub fn len(&self) -> usize {
        self.spirits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spirits.is_empty()
    }

    /// Whether a spirit with this name is in the catalog.
    pub fn contains_spirit(&self, spirit_name: &str) -> bool {
        self.spirits.iter().any(|s| s.spirit_name == spirit_name)
    }

    /// Pick any spirit uniformly at random.
    ///
    /// Returns `None` only for an empty catalog.
    pub fn random_spirit<R: Rng>(
        &self,
        rng: &mut R,
        clock: &dyn Clock,
    ) -> Option<Encounter> {
        if self.spirits.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.spirits.len());
        Some(self.spirits[index].instantiate(clock))
    }

    /// Pick a spirit of the given type uniformly at random.
    pub fn spirit_by_type<R: Rng>(
        &self,
        encounter_type: EncounterType,
        rng: &mut R,
        clock: &dyn Clock,
    ) -> Result<Encounter, CatalogError> {
        let candidates: Vec<_> = self
            .spirits
            .iter()
            .filter(|s| s.encounter_type == encounter_type)
            .collect();

        pick(&candidates, rng)
            .map(|t| t.instantiate(clock))
            .ok_or(CatalogError::EmptyCategory(encounter_type))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::reference()
    }
}

fn pick<'a, R: Rng>(
    candidates: &[&'a SpiritTemplate],
    rng: &mut R,
) -> Option<&'a SpiritTemplate> {
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}
