use clap::Parser;
use nreport::cli::Cli;

#[rocket::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = Cli::parse().run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
