//! Interactive menu.
//!
//! A numbered-option loop over the store. Each option maps to one store
//! operation or query. Operation errors are printed and the loop goes on;
//! only the exit option or the end of input stops it.

use std::io::{self, BufRead, Write};

use crate::model::{DispatchType, StatusFilter};
use crate::storage::{LoadOutcome, LoadReport, Store};

use super::format::{format_listing, format_short_timestamp};

const MENU: &str = "\
-------------------------------------
Warehouse Dispatch Tracker
-------------------------------------
1. Register new dispatch (start)
2. Mark dispatch as completed (finish)
3. View all dispatches
4. View dispatches in progress
5. View completed dispatches
6. Exit
-------------------------------------";

/// Runs the menu loop until the operator exits or input ends.
pub(super) fn run<R: BufRead, W: Write>(
    store: &mut Store,
    report: &LoadReport,
    mut input: R,
    mut out: W,
) -> io::Result<()> {
    writeln!(out, "{}", describe_load(store, report))?;

    loop {
        writeln!(out, "\n{MENU}")?;
        let Some(choice) = prompt(&mut input, &mut out, "Enter your option: ")? else {
            writeln!(out)?;
            return Ok(());
        };

        match choice.as_str() {
            "1" => register(store, &mut input, &mut out)?,
            "2" => complete(store, &mut input, &mut out)?,
            "3" => list(store, StatusFilter::All, &mut out)?,
            "4" => list(store, StatusFilter::InProgress, &mut out)?,
            "5" => list(store, StatusFilter::Completed, &mut out)?,
            "6" => {
                writeln!(out, "Exiting...")?;
                return Ok(());
            }
            _ => writeln!(out, "Invalid option. Please try again.")?,
        }
    }
}

fn describe_load(store: &Store, report: &LoadReport) -> String {
    let path = store.path().display();
    let mut message = match &report.outcome {
        LoadOutcome::FirstRun => {
            format!("No data file found at {path}. A new one will be created on first save.")
        }
        LoadOutcome::Loaded { records } => {
            format!("Loaded {records} dispatch(es) from {path}.")
        }
        LoadOutcome::Reset { reason } => {
            format!("Data file {path} is corrupt ({reason}). Starting with an empty list.")
        }
    };
    for warning in &report.warnings {
        message.push_str("\nWarning: ");
        message.push_str(&warning.to_string());
    }
    message
}

/// Prints `message`, then reads one trimmed line. `None` at end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    message: &str,
) -> io::Result<Option<String>> {
    write!(out, "{message}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn register<R: BufRead, W: Write>(store: &mut Store, input: &mut R, out: &mut W) -> io::Result<()> {
    writeln!(out, "\n--- Register new dispatch ---")?;
    let choices: Vec<String> = DispatchType::ALL
        .iter()
        .map(|t| format!("{}: {t}", t.menu_choice()))
        .collect();
    writeln!(out, "Dispatch types: {}", choices.join(", "))?;

    let Some(choice) = prompt(input, out, "Select the dispatch type (1/2/3): ")? else {
        return Ok(());
    };
    let kind = match choice.parse::<DispatchType>() {
        Ok(kind) => kind,
        Err(e) => {
            writeln!(out, "Invalid dispatch type: {e}")?;
            return Ok(());
        }
    };

    let message = format!("Enter the dispatch ID for {kind} (or press Enter for an automatic ID): ");
    let Some(id) = prompt(input, out, &message)? else {
        return Ok(());
    };
    // Checked before the notes prompt.
    if !id.is_empty() && store.contains_id(&id) {
        writeln!(out, "Error: dispatch ID '{id}' already exists.")?;
        return Ok(());
    }

    let Some(notes) = prompt(input, out, "Additional notes (optional): ")? else {
        return Ok(());
    };

    let id_override = Some(id.as_str()).filter(|id| !id.is_empty());
    match store.create(kind, id_override, &notes) {
        Ok(record) => {
            if id_override.is_none() {
                writeln!(out, "Automatically generated ID: {}", record.id)?;
            }
            writeln!(
                out,
                "Dispatch '{}' ({}) registered and in progress.",
                record.id, record.kind
            )?;
        }
        Err(e) => writeln!(out, "Error: {e}")?,
    }
    Ok(())
}

fn complete<R: BufRead, W: Write>(store: &mut Store, input: &mut R, out: &mut W) -> io::Result<()> {
    writeln!(out, "\n--- Mark dispatch as completed ---")?;
    {
        let in_progress = store.query(StatusFilter::InProgress);
        if in_progress.is_empty() {
            writeln!(out, "There are no dispatches in progress to complete.")?;
            return Ok(());
        }
        writeln!(out, "Dispatches in progress:")?;
        for (i, record) in in_progress.iter().enumerate() {
            writeln!(
                out,
                "{}. ID: {} ({}) - Started: {}",
                i + 1,
                record.id,
                record.kind,
                format_short_timestamp(record.started_at)
            )?;
        }
    }

    let Some(choice) = prompt(input, out, "Select the number of the dispatch to complete: ")? else {
        return Ok(());
    };
    let Ok(number) = choice.parse::<usize>() else {
        writeln!(out, "Invalid input. You must enter a number.")?;
        return Ok(());
    };
    let Some(position) = number.checked_sub(1) else {
        writeln!(out, "Invalid option.")?;
        return Ok(());
    };

    match store.complete(position) {
        Ok(record) => writeln!(out, "Dispatch '{}' marked as completed.", record.id)?,
        Err(e) => writeln!(out, "Error: {e}")?,
    }
    Ok(())
}

fn list<W: Write>(store: &Store, filter: StatusFilter, out: &mut W) -> io::Result<()> {
    writeln!(out, "\n{}", format_listing(&store.query(filter), filter))
}
