use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// A single tracked habit. `completed` keeps the days the habit was done in the order they were
/// marked.
#[derive(PartialEq, Eq, Debug, Serialize, Deserialize, Clone)]
pub struct Habit {
    pub name: String,
    #[serde(default)]
    pub completed: Vec<NaiveDate>,
}

impl Habit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: Vec::new(),
        }
    }

    pub fn completion_count(&self) -> usize {
        self.completed.len()
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completed.contains(&day)
    }

    pub fn with_completed(self, completed: Vec<NaiveDate>) -> Self {
        Self { completed, ..self }
    }
}

/// Everything that is stored on the disk. Position in `habits` is what the user sees and picks
/// (starting from 1).
#[derive(PartialEq, Eq, Debug, Default, Serialize, Deserialize, Clone)]
pub struct HabitCollection {
    #[serde(default)]
    pub habits: Vec<Habit>,
}

/// Result of marking a habit as done.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum MarkDone {
    Completed,
    /// The day is already recorded. Nothing was changed.
    AlreadyCompleted,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MarkDoneError {
    #[error("there are no habits yet")]
    NoHabits,
    #[error("index {index} is outside of 1..={count}")]
    InvalidIndex { index: usize, count: usize },
}

impl HabitCollection {
    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn add(&mut self, name: impl Into<String>) -> &Habit {
        self.habits.push(Habit::new(name));
        &self.habits[self.habits.len() - 1]
    }

    /// Records `today` for the habit at 1-based `index`. A day is never recorded twice.
    pub fn mark_done(&mut self, index: usize, today: NaiveDate) -> Result<MarkDone, MarkDoneError> {
        if self.habits.is_empty() {
            return Err(MarkDoneError::NoHabits);
        }
        let count = self.habits.len();
        let habit = index
            .checked_sub(1)
            .and_then(|i| self.habits.get_mut(i))
            .ok_or(MarkDoneError::InvalidIndex { index, count })?;

        if habit.is_completed_on(today) {
            return Ok(MarkDone::AlreadyCompleted);
        }
        habit.completed.push(today);
        Ok(MarkDone::Completed)
    }
}
