use std::process::ExitCode;

fn main() -> ExitCode {
    pubkit_cli::run()
}
