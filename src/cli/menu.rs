use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use anyhow::anyhow;
use tracing::{debug, info_span};

use crate::storage::HabitStorage;

use super::actions::HabitActions;

const MENU: &str = "\n===== Habit Tracker =====\n\
                    1. Add Habit\n\
                    2. View Habits\n\
                    3. Mark Done Today\n\
                    4. View Progress\n\
                    5. Exit\n\
                    > ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Add,
    View,
    MarkDone,
    Progress,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::Add),
            "2" => Ok(Self::View),
            "3" => Ok(Self::MarkDone),
            "4" => Ok(Self::Progress),
            "5" => Ok(Self::Exit),
            other => Err(anyhow!("Can't parse {other:?} into menu choice")),
        }
    }
}

/// Reads a single line without its terminator. `None` means the input is closed.
/// Bytes that aren't valid UTF-8 are replaced, so such a line simply fails validation later.
fn read_line(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut buffer = Vec::new();
    if input.read_until(b'\n', &mut buffer)? == 0 {
        return Ok(None);
    }
    if buffer.last() == Some(&b'\n') {
        buffer.pop();
        if buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buffer).into_owned()))
}

/// Habit number as typed by the user. Anything that isn't a positive number is rejected here
/// instead of turning into 0.
fn parse_index(line: &str) -> Option<usize> {
    line.trim().parse::<usize>().ok().filter(|v| *v > 0)
}

fn prompt(output: &mut impl Write, text: &str) -> io::Result<()> {
    write!(output, "{text}")?;
    output.flush()
}

/// Runs the interactive menu until the user exits or the input is closed.
pub fn run_menu<S: HabitStorage>(
    actions: &HabitActions<S>,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> io::Result<()> {
    loop {
        prompt(output, MENU)?;

        let Some(line) = read_line(input)? else {
            writeln!(output)?;
            break;
        };

        let choice = match line.parse::<MenuChoice>() {
            Ok(choice) => choice,
            Err(e) => {
                debug!("{e}");
                writeln!(output, "Invalid choice!")?;
                continue;
            }
        };

        let _span = info_span!("menu action", ?choice).entered();
        match choice {
            MenuChoice::Add => {
                prompt(output, "New habit name: ")?;
                let Some(name) = read_line(input)? else {
                    writeln!(output)?;
                    break;
                };
                actions.add(&name, output)?;
            }
            MenuChoice::View => {
                actions.view(output)?;
            }
            MenuChoice::MarkDone => {
                if !actions.view(output)? {
                    continue;
                }
                prompt(output, "\nChoose habit number: ")?;
                let Some(line) = read_line(input)? else {
                    writeln!(output)?;
                    break;
                };
                match parse_index(&line) {
                    Some(index) => actions.mark_done(index, output)?,
                    None => writeln!(output, "Invalid index.")?,
                }
            }
            MenuChoice::Progress => actions.progress(output)?,
            MenuChoice::Exit => break,
        }
    }

    writeln!(output, "Bye!")?;
    Ok(())
}
