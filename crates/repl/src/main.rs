//! Interactive shell for the graph engine.
//!
//! Manages a directory of named databases and forwards everything that is
//! not a meta-command or admin verb to the selected engine as a query.

mod session;

use anyhow::Result;
use clap::Parser;
use common::EngineConfig;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use session::{Outcome, Session};
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "./databases";

#[derive(Parser, Debug)]
#[command(name = "kitedb-repl", about = "Interactive shell for the KiteDB graph engine")]
struct Args {
    /// Directory holding the database files
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Database to select at startup
    #[arg(long)]
    database: Option<String>,

    /// Page size in bytes for newly created databases
    #[arg(long, default_value_t = 4096)]
    page_size: usize,

    /// Maximum number of pages held in the buffer pool
    #[arg(long, default_value_t = 100)]
    buffer_pages: usize,

    /// Execute one command and exit instead of starting the shell
    #[arg(short = 'e', long = "execute")]
    execute: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = EngineConfig::builder()
        .page_size(args.page_size)
        .buffer_pages(args.buffer_pages)
        .build();
    let mut session = Session::new(args.data_dir, config)?;

    if let Some(name) = &args.database {
        if let Outcome::Output(message) = session.handle_line(&format!("USE {name}"))? {
            println!("{message}");
        }
    }

    if let Some(command) = args.execute {
        let result = execute_once(&mut session, &command);
        session.close_all()?;
        return result;
    }

    interactive_loop(&mut session)?;
    session.close_all()
}

fn execute_once(session: &mut Session, command: &str) -> Result<()> {
    match session.handle_line(command)? {
        Outcome::Output(message) => {
            println!("{message}");
            Ok(())
        }
        Outcome::Exit => Ok(()),
    }
}

fn interactive_loop(session: &mut Session) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("KiteDB shell. Type .help for help, .exit to leave.");

    loop {
        let prompt = match session.current_name() {
            Some(name) => format!("kite ({name})> "),
            None => "kite> ".to_string(),
        };

        match editor.readline(&prompt) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(&line);
                match session.handle_line(&line) {
                    Ok(Outcome::Output(message)) => {
                        if !message.is_empty() {
                            println!("{message}");
                        }
                    }
                    Ok(Outcome::Exit) => break,
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }
    }

    Ok(())
}
