mod bootstrap;
mod loop_runner;
mod overworld;
mod preview;

use std::process::ExitCode;

pub(crate) fn run() -> ExitCode {
    loop_runner::run(bootstrap::build_app())
}
