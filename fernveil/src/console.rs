//! Line-oriented console for the Fernveil game.
//!
//! Each input line is a `#` command; output lines carry a bracketed tag so
//! scripts and agents can parse them:
//! - `[SPIRIT]` a spirit was found
//! - `[COMPLETED]` / `[LEVEL UP]` progression changed
//! - `[JOURNAL]`, `[STATUS]`, `[SOUND]`, `[EXPORTED]`, `[RESET]`
//! - `[ERROR]` the command could not be carried out

use fernveil_core::{
    clamp_note, filter_journal, newest_first, Catalog, Clock, EncounterType, ExportError,
    JournalFilter, JournalStats, JourneyExport, ProgressionState, ProgressionStore,
    MAX_NOTE_CHARS,
};
use rand::rngs::StdRng;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// Errors that end a console session.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Whether the session continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A console session over a progression store.
pub struct Console<W: Write> {
    store: ProgressionStore,
    catalog: Catalog,
    rng: StdRng,
    clock: Arc<dyn Clock>,
    updates: watch::Receiver<ProgressionState>,
    last_level: u64,
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(
        store: ProgressionStore,
        catalog: Catalog,
        rng: StdRng,
        clock: Arc<dyn Clock>,
        out: W,
    ) -> Self {
        let updates = store.subscribe();
        let last_level = store.state().spirit_bond_level();
        Self {
            store,
            catalog,
            rng,
            clock,
            updates,
            last_level,
            out,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &ProgressionStore {
        &self.store
    }

    /// Print the banner, then handle lines until `#quit` or end of input.
    pub async fn run(&mut self, input: impl BufRead) -> Result<(), ConsoleError> {
        self.print_banner()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let flow = self.handle_line(line).await?;
            self.out.flush()?;
            if flow == Flow::Quit {
                break;
            }
        }

        Ok(())
    }

    /// Handle one input line.
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow, ConsoleError> {
        let Some(command) = line.strip_prefix('#') else {
            writeln!(self.out, "[ERROR] Commands start with '#'. Type #help for help.")?;
            return Ok(Flow::Continue);
        };

        let (name, rest) = match command.trim().split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (command.trim(), ""),
        };

        match name {
            "quit" | "exit" => {
                writeln!(self.out, "The forest grows quiet. Farewell!")?;
                return Ok(Flow::Quit);
            }
            "scan" => self.scan(rest)?,
            "complete" => self.complete(rest).await?,
            "journal" => self.journal(rest)?,
            "status" => self.status()?,
            "sound" => {
                let enabled = self.store.toggle_sound().await;
                writeln!(self.out, "[SOUND] {}", if enabled { "on" } else { "off" })?;
            }
            "export" => self.export(rest).await?,
            "reset" => self.reset(rest).await?,
            "help" => self.print_help()?,
            _ => writeln!(self.out, "[ERROR] Unknown command. Type #help for help.")?,
        }

        self.announce_level_up()?;
        Ok(Flow::Continue)
    }

    fn scan(&mut self, arg: &str) -> Result<(), ConsoleError> {
        let found = if arg.is_empty() {
            self.catalog.random_spirit(&mut self.rng, self.clock.as_ref())
        } else {
            let encounter_type = match arg.parse::<EncounterType>() {
                Ok(t) => t,
                Err(e) => {
                    writeln!(self.out, "[ERROR] {e}. Try mindfulness, story or puzzle.")?;
                    return Ok(());
                }
            };
            match self
                .catalog
                .spirit_by_type(encounter_type, &mut self.rng, self.clock.as_ref())
            {
                Ok(spirit) => Some(spirit),
                Err(e) => {
                    writeln!(self.out, "[ERROR] {e}")?;
                    return Ok(());
                }
            }
        };

        let Some(spirit) = found else {
            writeln!(self.out, "[ERROR] No spirits dwell here.")?;
            return Ok(());
        };

        writeln!(
            self.out,
            "[SPIRIT] {} {} ({}, {} XP)",
            spirit.encounter_type.icon(),
            spirit.spirit_name,
            spirit.encounter_type,
            spirit.xp_earned
        )?;
        writeln!(self.out, "  Task: {}", spirit.task)?;
        writeln!(self.out, "  Reward: {}", spirit.reward)?;
        writeln!(self.out, "Use #complete [note] once you have finished the task.")?;

        self.store.start_encounter(spirit);
        Ok(())
    }

    async fn complete(&mut self, note: &str) -> Result<(), ConsoleError> {
        let Some(current) = self.store.state().current_encounter().cloned() else {
            writeln!(self.out, "[ERROR] No spirit encounter in progress. Use #scan first.")?;
            return Ok(());
        };

        let note = if note.chars().count() > MAX_NOTE_CHARS {
            writeln!(self.out, "[NOTE] Trimmed to {MAX_NOTE_CHARS} characters")?;
            clamp_note(note)
        } else {
            note.to_string()
        };

        let entry = self.store.complete_encounter(&current, note).await;
        let state = self.store.snapshot();
        writeln!(
            self.out,
            "[COMPLETED] {} +{} XP, received {}",
            entry.spirit_name, entry.xp_earned, entry.reward
        )?;
        writeln!(
            self.out,
            "[STATUS] XP {} | Spirit Bond Level {}",
            state.xp(),
            state.spirit_bond_level()
        )?;
        Ok(())
    }

    fn journal(&mut self, arg: &str) -> Result<(), ConsoleError> {
        let filter = if arg.is_empty() || arg.eq_ignore_ascii_case("all") {
            JournalFilter::All
        } else {
            match arg.parse::<EncounterType>() {
                Ok(t) => JournalFilter::Only(t),
                Err(e) => {
                    writeln!(self.out, "[ERROR] {e}")?;
                    return Ok(());
                }
            }
        };

        let state = self.store.snapshot();
        let entries = newest_first(filter_journal(state.journal(), filter));

        if entries.is_empty() {
            let label = match filter {
                JournalFilter::All => String::new(),
                JournalFilter::Only(t) => format!("{t} "),
            };
            writeln!(self.out, "[JOURNAL] No {label}encounters yet. Try #scan.")?;
            return Ok(());
        }

        let plural = if entries.len() == 1 { "" } else { "s" };
        writeln!(self.out, "[JOURNAL] {} encounter{plural} found", entries.len())?;
        for entry in entries {
            writeln!(
                self.out,
                "  {} {} ({}) {} +{} XP",
                entry.encounter_type.icon(),
                entry.spirit_name,
                entry.encounter_type,
                entry.date.format("%b %-d, %Y"),
                entry.xp_earned
            )?;
            if let Some(note) = entry.note() {
                writeln!(self.out, "    \"{note}\"")?;
            }
        }
        Ok(())
    }

    fn status(&mut self) -> Result<(), ConsoleError> {
        let state = self.store.snapshot();
        let progress = state.progress();
        let stats = JournalStats::from_journal(state.journal());

        writeln!(self.out, "[STATUS]")?;
        writeln!(self.out, "  Spirit Bond Level: {}", progress.level)?;
        writeln!(
            self.out,
            "  XP: {} ({}/{} to next level, {:.0}%)",
            state.xp(),
            progress.xp_into_level,
            fernveil_core::XP_PER_LEVEL,
            progress.fraction * 100.0
        )?;
        writeln!(
            self.out,
            "  Encounters: {} (Mindfulness {}, Story {}, Puzzle {})",
            stats.total, stats.mindfulness, stats.story, stats.puzzle
        )?;
        writeln!(
            self.out,
            "  Sound: {}",
            if state.sound_enabled() { "on" } else { "off" }
        )?;
        if let Some(current) = state.current_encounter() {
            writeln!(self.out, "  Current encounter: {}", current.spirit_name)?;
        }
        Ok(())
    }

    async fn export(&mut self, path: &str) -> Result<(), ConsoleError> {
        if path.is_empty() {
            writeln!(self.out, "[ERROR] Usage: #export <path>")?;
            return Ok(());
        }

        let export = JourneyExport::from_state(&self.store.snapshot(), self.clock.now());
        match export.write_json(path).await {
            Ok(()) => writeln!(
                self.out,
                "[EXPORTED] {} encounters and {} XP to {path}",
                export.journal_count, export.xp
            )?,
            Err(ExportError::Io(e)) => writeln!(self.out, "[ERROR] Export failed: {e}")?,
            Err(ExportError::Json(e)) => writeln!(self.out, "[ERROR] Export failed: {e}")?,
        }
        Ok(())
    }

    async fn reset(&mut self, arg: &str) -> Result<(), ConsoleError> {
        if arg != "confirm" {
            writeln!(
                self.out,
                "[WARNING] This permanently deletes all encounters, journal entries and progress."
            )?;
            writeln!(self.out, "Type #reset confirm to continue.")?;
            return Ok(());
        }

        self.store.reset().await;
        writeln!(self.out, "[RESET] Your journey begins anew.")?;
        Ok(())
    }

    fn announce_level_up(&mut self) -> Result<(), ConsoleError> {
        if !self.updates.has_changed().unwrap_or(false) {
            return Ok(());
        }

        let level = self.updates.borrow_and_update().spirit_bond_level();
        if level > self.last_level {
            writeln!(self.out, "[LEVEL UP] Spirit Bond Level {level}")?;
        }
        self.last_level = level;
        Ok(())
    }

    fn print_banner(&mut self) -> Result<(), ConsoleError> {
        let state = self.store.snapshot();
        writeln!(self.out, "=== Fernveil ===")?;
        writeln!(
            self.out,
            "Spirit Bond Level {} | XP {} | {} journal entries",
            state.spirit_bond_level(),
            state.xp(),
            state.journal().len()
        )?;
        writeln!(self.out)?;
        self.print_help()?;
        writeln!(self.out)?;
        Ok(())
    }

    fn print_help(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.out, "Commands:")?;
        writeln!(self.out, "  #scan [type]      - Search for a spirit (mindfulness, story, puzzle)")?;
        writeln!(self.out, "  #complete [note]  - Complete the current encounter")?;
        writeln!(self.out, "  #journal [type]   - Show completed encounters, newest first")?;
        writeln!(self.out, "  #status           - Show XP, bond level and counts")?;
        writeln!(self.out, "  #sound            - Toggle forest sounds")?;
        writeln!(self.out, "  #export <path>    - Export your journey as JSON")?;
        writeln!(self.out, "  #reset            - Delete all progress")?;
        writeln!(self.out, "  #help             - Show this help")?;
        writeln!(self.out, "  #quit             - Exit")?;
        Ok(())
    }
}
