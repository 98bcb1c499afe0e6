use std::process::ExitCode;

use tracing::error;

use super::bootstrap::AppWiring;
use super::session;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut session = match session::build_session(&app.config) {
        Ok(session) => session,
        Err(message) => {
            error!(error = %message, "session_build_failed");
            return ExitCode::FAILURE;
        }
    };

    session.run_to_completion(app.config.max_gestures);
    ExitCode::SUCCESS
}
