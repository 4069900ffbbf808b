use std::io::{self, Write};

use tracing::{debug, error, info, warn};

use crate::{
    storage::{
        entities::{HabitCollection, MarkDone, MarkDoneError},
        HabitStorage,
    },
    utils::{clock::Clock, time::date_to_stamp},
};

/// Every action follows the same cycle: load the whole collection, change it, save it back and
/// report to the user. Storage problems are reported and never stop the caller.
pub struct HabitActions<S> {
    storage: S,
    clock: Box<dyn Clock>,
}

impl<S: HabitStorage> HabitActions<S> {
    pub fn new(storage: S, clock: Box<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Unreadable or corrupted data is treated as no habits at all.
    fn load(&self, out: &mut impl Write) -> io::Result<HabitCollection> {
        match self.storage.load() {
            Ok(collection) => {
                debug!("Loaded {} habits", collection.len());
                Ok(collection)
            }
            Err(e) => {
                warn!("Falling back to empty habits {e:?}");
                writeln!(out, "Error reading data: {e}")?;
                Ok(HabitCollection::default())
            }
        }
    }

    /// Returns whether the collection was written.
    fn save(&self, collection: &HabitCollection, out: &mut impl Write) -> io::Result<bool> {
        match self.storage.save(collection) {
            Ok(()) => Ok(true),
            Err(e) => {
                error!("Failed to save habits {e:?}");
                writeln!(out, "Error saving data: {e}")?;
                Ok(false)
            }
        }
    }

    pub fn add(&self, name: &str, out: &mut impl Write) -> io::Result<()> {
        let mut collection = self.load(out)?;
        collection.add(name);

        if self.save(&collection, out)? {
            info!("Added habit {name:?}");
            writeln!(out, "Habit added: {name}")?;
        }
        Ok(())
    }

    /// Prints the numbered list of habits. Returns `false` if there was nothing to show.
    pub fn view(&self, out: &mut impl Write) -> io::Result<bool> {
        let collection = self.load(out)?;
        if collection.is_empty() {
            writeln!(out, "No habits yet.")?;
            return Ok(false);
        }

        writeln!(out, "\nHabits:")?;
        for (i, habit) in collection.habits.iter().enumerate() {
            writeln!(
                out,
                "{}. {} ({} kali selesai)",
                i + 1,
                habit.name,
                habit.completion_count()
            )?;
        }
        Ok(true)
    }

    /// Marks habit at 1-based `index` as done for today.
    pub fn mark_done(&self, index: usize, out: &mut impl Write) -> io::Result<()> {
        let mut collection = self.load(out)?;
        let today = self.clock.today();

        match collection.mark_done(index, today) {
            Ok(MarkDone::Completed) => {
                if self.save(&collection, out)? {
                    info!("Habit {index} completed on {}", date_to_stamp(today));
                    writeln!(out, "Good job! Habit completed for today.")?;
                }
            }
            Ok(MarkDone::AlreadyCompleted) => {
                debug!("Habit {index} already has {}", date_to_stamp(today));
                writeln!(out, "Habit already completed today.")?;
            }
            Err(MarkDoneError::NoHabits) => writeln!(out, "No habits yet.")?,
            Err(e @ MarkDoneError::InvalidIndex { .. }) => {
                debug!("Rejected mark done: {e}");
                writeln!(out, "Invalid index.")?;
            }
        }
        Ok(())
    }

    pub fn progress(&self, out: &mut impl Write) -> io::Result<()> {
        let collection = self.load(out)?;
        if collection.is_empty() {
            writeln!(out, "No habits yet.")?;
            return Ok(());
        }

        writeln!(out, "\nProgress:")?;
        for habit in &collection.habits {
            writeln!(
                out,
                "- {}: {} kali selesai",
                habit.name,
                habit.completion_count()
            )?;
        }
        Ok(())
    }
}
