//! responsify - rewrite <img> elements into responsive markup

use std::process::ExitCode;

use responsify::cli;

fn main() -> ExitCode {
    cli::run()
}
