use tracing_subscriber::EnvFilter;

mod backend;
mod cli;
mod clinic_manager;
mod configuration;
mod error;
mod google;
mod store;
#[cfg(test)]
mod testutils;
mod types;
mod validation;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(error) = cli::run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
