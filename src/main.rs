use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match survey_forge::start_server().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("survey-forge failed to start: {e}");
            ExitCode::FAILURE
        }
    }
}
