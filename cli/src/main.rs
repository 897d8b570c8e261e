//! Terminal frontend for the todo service.

mod transport;

use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use todo_core::{Filter, TodoApp, TodoClient, TodoState};
use tracing_subscriber::EnvFilter;

use crate::transport::UreqTransport;

#[derive(Parser)]
#[command(name = "todo")]
#[command(about = "Manage the todo list from the terminal", long_about = None)]
struct Cli {
    /// Base URL of the todo server
    #[arg(long, global = true, env = "TODO_API_URL", default_value = "http://localhost:3001")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the list
    List {
        #[arg(long, default_value = "all")]
        filter: Filter,
    },
    /// Add a todo
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Mark a todo as completed
    Done { id: String },
    /// Mark a todo as not completed
    Undo { id: String },
    /// Replace a todo's text
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Delete a todo
    Rm { id: String },
    /// Delete every completed todo
    ClearCompleted,
    /// Put todos in the given order
    Reorder {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
    /// Check that the server is up
    Health,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut app = TodoApp::new(TodoClient::new(&cli.url), UreqTransport::new());

    let command = match cli.command {
        Command::Health => {
            let health = app.health()?;
            println!("{} ({})", health.status, health.timestamp);
            return Ok(());
        }
        command => command,
    };

    app.load();
    match command {
        Command::List { filter } => app.state_mut().filter = filter,
        Command::Add { text } => {
            if let Some(item) = app.add(&text.join(" "))? {
                println!("added {}", item.id);
            }
        }
        Command::Done { id } => app.toggle(&id, true)?,
        Command::Undo { id } => app.toggle(&id, false)?,
        Command::Edit { id, text } => app.edit(&id, &text.join(" "))?,
        Command::Rm { id } => app.delete(&id)?,
        Command::ClearCompleted => {
            let cleared = app.clear_completed()?;
            println!("cleared {cleared}");
        }
        Command::Reorder { ids } => app.reorder(ids),
        Command::Health => {}
    }

    print!("{}", render(app.state()));
    Ok(())
}

fn render(state: &TodoState) -> String {
    let mut out = String::new();
    for item in state.visible() {
        let mark = if item.completed { 'x' } else { ' ' };
        out.push_str(&format!("[{mark}] {}  {}\n", item.text, item.id));
    }
    let left = state.items_left();
    let noun = if left == 1 { "item" } else { "items" };
    out.push_str(&format!("{left} {noun} left"));
    if state.filter != Filter::All {
        out.push_str(&format!(" (showing {})", state.filter));
    }
    out.push('\n');
    out
}
