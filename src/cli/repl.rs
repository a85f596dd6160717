//! Interactive shell over a database session.

use std::borrow::Cow;
use std::time::Instant;

use anyhow::Result;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, EditMode, Editor, Helper};
use tabstore::{Config, Database};
use tracing::{debug, error};

use super::commands::{Command, HELP};

const PROMPT: &str = "tabstore> ";

const KEYWORDS: &[&str] = &[
    "create_table",
    "drop_table",
    "list_tables",
    "insert",
    "into",
    "values",
    "select",
    "from",
    "where",
    "update",
    "set",
    "delete",
    "info",
    "help",
    "exit",
];

/// Completes command names and clause keywords.
struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let start = line[..pos]
            .rfind(|c: char| c.is_whitespace() || c == '(' || c == ',')
            .map(|i| i + 1)
            .unwrap_or(0);

        let word = line[start..pos].to_ascii_lowercase();
        let matches = KEYWORDS
            .iter()
            .filter(|kw| !word.is_empty() && kw.starts_with(&word))
            .map(|kw| Pair {
                display: kw.to_string(),
                replacement: kw.to_string(),
            })
            .collect();

        Ok((start, matches))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

/// What the shell does after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The line could not be parsed or the command failed.
    Failed,
    Exit,
}

pub struct Repl {
    db: Database,
    config: Config,
    editor: Editor<ReplHelper, DefaultHistory>,
}

impl Repl {
    pub fn new(config: Config) -> Result<Self> {
        let rl_config = rustyline::Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .max_history_size(1000)?
            .build();

        let mut editor = Editor::with_config(rl_config)?;
        editor.set_helper(Some(ReplHelper));

        Ok(Self {
            db: Database::new(&config),
            config,
            editor,
        })
    }

    pub fn print_banner(&self) {
        println!("tabstore v{}", env!("CARGO_PKG_VERSION"));
        println!("Data directory: {}", self.config.data_dir.display());
        println!("Type help for the list of commands, exit to quit.\n");
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if let Err(e) = self.editor.add_history_entry(line) {
                        debug!("Failed to record history: {}", e);
                    }

                    if self.execute_line(line) == Flow::Exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(e) => {
                    error!("Readline error: {}", e);
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Parse and run one line, printing its output or error.
    pub fn execute_line(&mut self, line: &str) -> Flow {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                println!("Error: {}", e);
                return Flow::Failed;
            }
        };

        match command {
            Command::Exit => {
                println!("Goodbye!");
                return Flow::Exit;
            }
            Command::Help => {
                println!("{}", HELP);
                return Flow::Continue;
            }
            Command::Delete { ref table, .. } if self.config.confirm_deletes => {
                if !self.confirm(&format!("delete rows from '{}'", table)) {
                    println!("Delete cancelled.");
                    return Flow::Continue;
                }
            }
            _ => {}
        }

        let started = Instant::now();
        let outcome = command.execute(&mut self.db);
        let elapsed = started.elapsed();
        debug!(command = command.name(), ?elapsed, ok = outcome.is_ok(), "command finished");

        let flow = match outcome {
            Ok(output) => {
                println!("{}", output);
                Flow::Continue
            }
            Err(e) => {
                println!("Error: {}", e);
                Flow::Failed
            }
        };
        if self.config.show_timing && command.is_timed() {
            println!("{} took {:.3} s", command.name(), elapsed.as_secs_f64());
        }
        flow
    }

    fn confirm(&mut self, action: &str) -> bool {
        let prompt = format!("Do you really want to {}? [y/n]: ", action);
        match self.editor.readline(&prompt) {
            Ok(answer) => answer.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    }
}
