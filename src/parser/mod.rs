// Request and session command parsers

pub mod command;
pub mod lexer;
pub mod request;

// Public API re-exports
pub use command::{parse_command, SessionCommand, DEFAULT_HEAD_ROWS, HELP};
pub use request::parse_request;
