pub mod commands;
pub mod repl;
