use std::process::ExitCode;

use overworld_engine::{run_screen, AppError};
use tracing::error;

use super::bootstrap::AppWiring;

pub(crate) fn run(app: Result<AppWiring, AppError>) -> ExitCode {
    let app = match app {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = run_screen(app.config, app.screen) {
        error!(error = %err, "app_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
