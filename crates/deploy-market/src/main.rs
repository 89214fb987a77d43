use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Environment variables set in the shell take precedence over `.env`.
    dotenvy::dotenv().ok();
    deploy_market::start(std::env::args()).await
}
