mod cli;
mod error;
mod output;

pub use cli::{run, run_cli};
pub use error::{CliError, ExitStatus};
