//! Small command-line tracker for daily habits.
//! Habits are kept in a single json file which is loaded, changed and written back on every
//! action, so the file is the only state that survives between menu actions.
//!

pub mod cli;
pub mod storage;
pub mod utils;
