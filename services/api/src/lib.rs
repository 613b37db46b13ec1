mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use rope_safety::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
