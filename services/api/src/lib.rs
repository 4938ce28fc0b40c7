mod cli;
mod gemini;
mod infra;
mod routes;
mod server;

use policyscope::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
