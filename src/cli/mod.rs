//! Terminal front end: command parsing, the interactive shell and table output.

pub mod outputformatter;
pub mod shell;

pub use outputformatter::Table;
pub use shell::{run_repl, Command, Flow, Prompter, Shell};
