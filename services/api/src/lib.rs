mod check;
mod cli;
mod infra;
mod routes;
mod server;

use intervenant_availability::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
