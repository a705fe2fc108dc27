//! CLI interface for the dispatch tracker.
//!
//! Without a subcommand, `dispatch` opens the interactive menu. The
//! subcommands run a single store operation and exit, so the tracker can
//! also be driven from scripts:
//!
//! - `dispatch new --type flex --notes "Two boxes"`: start a dispatch, print its ID
//! - `dispatch complete 2`: complete the 2nd dispatch in progress
//! - `dispatch list --status in-progress`: list dispatches
//!
//! The global `--data` flag points every command at a specific data file.

mod format;
mod menu;

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::model::{DispatchType, StatusFilter};
use crate::storage::Store;

use format::{format_listing, format_record};

/// Track warehouse dispatches from start to completion.
#[derive(Debug, Parser)]
#[command(name = "dispatch", version)]
pub struct Cli {
    /// Data file to use. Overrides `DISPATCH_DATA` and the config file.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive menu. This is the default.
    Menu,

    /// Start a new dispatch. Prints the dispatch ID.
    New {
        /// Carrier handling the dispatch.
        #[arg(long = "type", value_enum)]
        kind: TypeArg,

        /// Dispatch ID. Generated (e.g. `INT-007`) when omitted.
        #[arg(long)]
        id: Option<String>,

        /// Free-text notes.
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Mark a dispatch in progress as completed.
    Complete {
        /// Position in the in-progress list, as shown by
        /// `dispatch list --status in-progress`, starting at 1.
        number: usize,
    },

    /// List dispatches in the order they were started.
    List {
        /// Which dispatches to show.
        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,
    },
}

/// CLI-facing dispatch type, mapped to the domain `DispatchType`.
#[derive(Debug, Clone, ValueEnum)]
pub enum TypeArg {
    #[value(name = "mercadolibre")]
    MercadoLibre,
    Flex,
    Bluexpress,
}

impl TypeArg {
    fn to_domain(&self) -> DispatchType {
        match self {
            Self::MercadoLibre => DispatchType::MercadoLibre,
            Self::Flex => DispatchType::Flex,
            Self::Bluexpress => DispatchType::Bluexpress,
        }
    }
}

/// CLI-facing status filter, mapped to the domain `StatusFilter`.
#[derive(Debug, Clone, ValueEnum)]
pub enum StatusArg {
    /// Every dispatch.
    All,
    /// Dispatches not yet completed.
    InProgress,
    /// Completed dispatches.
    Completed,
}

impl StatusArg {
    fn to_domain(&self) -> StatusFilter {
        match self {
            Self::All => StatusFilter::All,
            Self::InProgress => StatusFilter::InProgress,
            Self::Completed => StatusFilter::Completed,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config) -> Result<(), String> {
    let cli = Cli::parse();

    let path = config.data_file(cli.data.as_deref());
    let (mut store, report) = Store::open(path, config.id_prefix())
        .map_err(|e| format!("failed to open dispatch store: {e}"))?;

    match cli.command.unwrap_or(Command::Menu) {
        Command::Menu => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            menu::run(&mut store, &report, stdin.lock(), stdout.lock())
                .map_err(|e| format!("console error: {e}"))
        }
        Command::New { kind, id, notes } => {
            cmd_new(&mut store, kind.to_domain(), id.as_deref(), &notes)
        }
        Command::Complete { number } => cmd_complete(&mut store, number),
        Command::List { status } => {
            cmd_list(&store, status.to_domain());
            Ok(())
        }
    }
}

fn cmd_new(
    store: &mut Store,
    kind: DispatchType,
    id: Option<&str>,
    notes: &str,
) -> Result<(), String> {
    let record = store
        .create(kind, id, notes)
        .map_err(|e| format!("failed to start dispatch: {e}"))?;

    println!("{}", record.id);
    Ok(())
}

fn cmd_complete(store: &mut Store, number: usize) -> Result<(), String> {
    let position = number
        .checked_sub(1)
        .ok_or("dispatch numbers start at 1")?;
    let record = store
        .complete(position)
        .map_err(|e| format!("failed to complete dispatch: {e}"))?;

    eprintln!("Dispatch {} completed", record.id);
    println!("{}", format_record(record));
    Ok(())
}

fn cmd_list(store: &Store, filter: StatusFilter) {
    println!("{}", format_listing(&store.query(filter), filter));
}
