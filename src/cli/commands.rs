//! Command grammar and dispatch onto the database session.

use tabstore::core::{Clause, DbError, Result};
use tabstore::facade::Database;
use tabstore::storage::UpdateOutcome;

pub const HELP: &str = "\
Table commands:
  create_table <table> <column:type> [<column:type> ...]   create a table (types: str, int, bool)
  list_tables                                               list all tables
  drop_table <table>                                        drop a table
  insert into <table> values (<value1>, <value2>, ...)      insert a row
  select from <table> [where <column> = <value>]            read rows
  update <table> set <column> = <value> where <column> = <value>
                                                            update matching rows
  delete from <table> where <column> = <value>              delete matching rows
  info <table>                                              describe a table

General commands:
  help                                                      show this help
  exit                                                      quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    CreateTable { name: String, columns: Vec<String> },
    DropTable { name: String },
    ListTables,
    Insert { table: String, values: Vec<String> },
    Select { table: String, filter: Option<Clause> },
    Update { table: String, set: Clause, filter: Clause },
    Delete { table: String, filter: Clause },
    Info { table: String },
}

impl Command {
    /// Parse one input line. A blank line yields `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let tokens = tokenize(line)?;
        if tokens.is_empty() {
            return Ok(None);
        }

        let mut parser = Parser { tokens, pos: 0 };
        let name = parser.word("command")?;
        let usage = usage(&name.to_ascii_lowercase());
        let command = parser
            .command(&name)
            .map_err(|e| match (e, usage) {
                (DbError::ParseError(msg), Some(usage)) => {
                    DbError::ParseError(format!("{}. Usage: {}", msg, usage))
                }
                (e, _) => e,
            })?;
        Ok(Some(command))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Exit => "exit",
            Self::CreateTable { .. } => "create_table",
            Self::DropTable { .. } => "drop_table",
            Self::ListTables => "list_tables",
            Self::Insert { .. } => "insert",
            Self::Select { .. } => "select",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Info { .. } => "info",
        }
    }

    /// Commands whose elapsed time the shell reports.
    pub fn is_timed(&self) -> bool {
        matches!(
            self,
            Self::Insert { .. } | Self::Select { .. } | Self::Update { .. } | Self::Delete { .. }
        )
    }

    /// Run the command against the session and return the text to show.
    pub fn execute(&self, db: &mut Database) -> Result<String> {
        match self {
            Self::Help => Ok(HELP.to_string()),
            Self::Exit => Ok("Goodbye!".to_string()),
            Self::CreateTable { name, columns } => {
                let schema = db.create_table(name, columns)?;
                let layout: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(|(col, ty)| format!("{}:{}", col, ty))
                    .collect();
                Ok(format!(
                    "Table '{}' created with columns: {}.",
                    name,
                    layout.join(", ")
                ))
            }
            Self::DropTable { name } => {
                db.drop_table(name)?;
                Ok(format!("Table '{}' dropped.", name))
            }
            Self::ListTables => {
                let tables = db.list_tables()?;
                if tables.is_empty() {
                    return Ok("No tables yet.".to_string());
                }
                let lines: Vec<String> = tables.iter().map(|t| format!("-> {}", t)).collect();
                Ok(format!("Tables:\n{}", lines.join("\n")))
            }
            Self::Insert { table, values } => {
                let id = db.insert(table, values)?;
                Ok(format!("Row with ID={} inserted into '{}'.", id, table))
            }
            Self::Select { table, filter } => {
                Ok(db.select(table, filter.as_ref())?.to_string())
            }
            Self::Update { table, set, filter } => match db.update(table, set, filter)? {
                UpdateOutcome::Updated(rows) => Ok(format!(
                    "Updated {} row(s) in '{}'.\n{}",
                    rows,
                    table,
                    db.table(table)?.select(None)?
                )),
                UpdateOutcome::NoMatch => {
                    Ok(format!("No rows in '{}' match {}.", table, filter))
                }
            },
            Self::Delete { table, filter } => {
                let removed = db.delete(table, filter)?;
                if removed == 0 {
                    return Ok(format!("No rows in '{}' match {}.", table, filter));
                }
                Ok(format!(
                    "Deleted {} row(s) from '{}'. Updated table:\n{}",
                    removed,
                    table,
                    db.table(table)?.select(None)?
                ))
            }
            Self::Info { table } => Ok(db.info(table)?.to_string()),
        }
    }
}

fn usage(command: &str) -> Option<&'static str> {
    let usage = match command {
        "create_table" => "create_table <table> <column:type> [<column:type> ...]",
        "drop_table" => "drop_table <table>",
        "list_tables" => "list_tables",
        "insert" => "insert into <table> values (<value1>, <value2>, ...)",
        "select" => "select from <table> [where <column> = <value>]",
        "update" => "update <table> set <column> = <value> where <column> = <value>",
        "delete" => "delete from <table> where <column> = <value>",
        "info" => "info <table>",
        _ => return None,
    };
    Some(usage)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Punct(char),
}

/// Split a line into words and the punctuation `( ) , =`.
///
/// Single or double quotes group characters into one word and are dropped;
/// quoted punctuation is part of the word.
fn tokenize(line: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => flush(&mut tokens, &mut current, &mut in_word),
            '(' | ')' | ',' | '=' => {
                flush(&mut tokens, &mut current, &mut in_word);
                tokens.push(Token::Punct(c));
            }
            '\'' | '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some(q) if q == c => break,
                        Some(ch) => current.push(ch),
                        None => {
                            return Err(DbError::ParseError(format!(
                                "unterminated {} quote",
                                c
                            )));
                        }
                    }
                }
            }
            _ => {
                in_word = true;
                current.push(c);
            }
        }
    }
    flush(&mut tokens, &mut current, &mut in_word);
    Ok(tokens)
}

fn flush(tokens: &mut Vec<Token>, current: &mut String, in_word: &mut bool) {
    if *in_word {
        tokens.push(Token::Word(std::mem::take(current)));
        *in_word = false;
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn command(&mut self, name: &str) -> Result<Command> {
        let command = match name.to_ascii_lowercase().as_str() {
            "help" => Command::Help,
            "exit" => Command::Exit,
            "list_tables" => Command::ListTables,
            "create_table" => {
                let name = self.word("table name")?;
                let mut columns = Vec::new();
                while !self.at_end() {
                    if self.peek_punct(',') {
                        self.pos += 1;
                        continue;
                    }
                    columns.push(self.word("column definition")?);
                }
                if columns.is_empty() {
                    return Err(DbError::ParseError(
                        "at least one column definition is required".to_string(),
                    ));
                }
                Command::CreateTable { name, columns }
            }
            "drop_table" => Command::DropTable {
                name: self.word("table name")?,
            },
            "insert" => {
                self.keyword("into")?;
                let table = self.word("table name")?;
                self.keyword("values")?;
                let values = self.value_list()?;
                Command::Insert { table, values }
            }
            "select" => {
                self.keyword("from")?;
                let table = self.word("table name")?;
                let filter = if self.at_end() {
                    None
                } else {
                    self.keyword("where")?;
                    Some(self.clause()?)
                };
                Command::Select { table, filter }
            }
            "update" => {
                let table = self.word("table name")?;
                self.keyword("set")?;
                let set = self.clause()?;
                self.keyword("where")?;
                let filter = self.clause()?;
                Command::Update { table, set, filter }
            }
            "delete" => {
                self.keyword("from")?;
                let table = self.word("table name")?;
                self.keyword("where")?;
                let filter = self.clause()?;
                Command::Delete { table, filter }
            }
            "info" => Command::Info {
                table: self.word("table name")?,
            },
            other => {
                return Err(DbError::ParseError(format!(
                    "unknown command '{}', type help for the list of commands",
                    other
                )));
            }
        };

        if let Some(extra) = self.tokens.get(self.pos) {
            return Err(DbError::ParseError(format!(
                "unexpected {}",
                describe(extra)
            )));
        }
        Ok(command)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek_punct(&self, expected: char) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Punct(c)) if *c == expected)
    }

    fn word(&mut self, what: &str) -> Result<String> {
        match self.tokens.get(self.pos) {
            Some(Token::Word(w)) => {
                self.pos += 1;
                Ok(w.clone())
            }
            Some(other) => Err(DbError::ParseError(format!(
                "expected {}, found {}",
                what,
                describe(other)
            ))),
            None => Err(DbError::ParseError(format!("missing {}", what))),
        }
    }

    fn keyword(&mut self, keyword: &str) -> Result<()> {
        match self.tokens.get(self.pos) {
            Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                Ok(())
            }
            Some(other) => Err(DbError::ParseError(format!(
                "expected '{}', found {}",
                keyword,
                describe(other)
            ))),
            None => Err(DbError::ParseError(format!("missing '{}'", keyword))),
        }
    }

    fn punct(&mut self, expected: char) -> Result<()> {
        if self.peek_punct(expected) {
            self.pos += 1;
            return Ok(());
        }
        match self.tokens.get(self.pos) {
            Some(other) => Err(DbError::ParseError(format!(
                "expected '{}', found {}",
                expected,
                describe(other)
            ))),
            None => Err(DbError::ParseError(format!("missing '{}'", expected))),
        }
    }

    /// `<column> = <value>`
    fn clause(&mut self) -> Result<Clause> {
        let column = self.word("column name")?;
        self.punct('=')?;
        let value = self.word("value")?;
        Ok(Clause::from_token(column, &value))
    }

    /// `( v1, v2, ... )`
    fn value_list(&mut self) -> Result<Vec<String>> {
        self.punct('(')?;
        let mut values = Vec::new();
        if self.peek_punct(')') {
            self.pos += 1;
            return Ok(values);
        }
        loop {
            values.push(self.word("value")?);
            if self.peek_punct(',') {
                self.pos += 1;
                continue;
            }
            self.punct(')')?;
            return Ok(values);
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Word(w) => format!("'{}'", w),
        Token::Punct(c) => format!("'{}'", c),
    }
}
