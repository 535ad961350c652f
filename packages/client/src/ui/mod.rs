//! UI layer: the handle callers hold and the terminal front end.

pub mod cli;
pub mod handle;

pub use cli::{CliCommand, CliError};
pub use handle::SyncClient;
