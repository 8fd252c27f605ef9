//! The `missive` command: collect one message, then send it.
//!
//! ## Modules
//!
//! - [`cli`]: command-line flags
//! - [`prompt`]: interactive collection of the message
//! - [`controller`]: configuration discovery and the send itself

pub mod cli;
pub mod controller;
pub mod prompt;

pub use cli::Cli;
pub use controller::Missive;
