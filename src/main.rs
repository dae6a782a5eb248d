mod cli;

use clap::Parser;
use cli::{Cli, Commands, ConvertArgs};
use livedoc::config::Config;
use livedoc::convert::{DocumentConverter, HtmlConverter};
use livedoc::observability;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

const CONVERT_LOG_FILTER: &str = "warn";

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server(args) => {
            let config =
                tracing::subscriber::with_default(observability::bootstrap_subscriber(), Config::load)?;
            observability::init_tracing(&config.logging.filter);
            livedoc::api::run(config, args.address).await?
        }
        Commands::Convert(args) => {
            observability::init_tracing(CONVERT_LOG_FILTER);
            convert(args)?
        }
    }

    Ok(())
}

fn convert(args: ConvertArgs) -> Result<(), AnyError> {
    let html = std::fs::read_to_string(&args.input)
        .map_err(|e| format!("Failed to read {}: {}", args.input.display(), e))?;

    let converted = HtmlConverter::new().convert(&html, &args.variant)?;
    println!("{}", serde_json::to_string_pretty(&converted)?);

    Ok(())
}
